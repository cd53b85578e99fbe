// Copyright © 2018 Cormac O'Brien
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of this software
// and associated documentation files (the "Software"), to deal in the Software without
// restriction, including without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all copies or
// substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
// BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
// DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Splitting meshes into grid cells.

use std::collections::BTreeMap;

use crate::{
    common::config::CellsConfig,
    import::{mesh::MeshDescription, Placement, RenderUnit, UnitKind},
};

use rayon::prelude::*;

type CellKey = (i64, i64);

fn cell_key(mesh: &MeshDescription, triangle_id: usize, cell_size: f32) -> CellKey {
    let c = mesh.triangle_centroid(triangle_id);
    (
        (c.x / cell_size).floor() as i64,
        (c.y / cell_size).floor() as i64,
    )
}

fn make_unit(
    mesh: &MeshDescription,
    name: String,
    triangle_ids: &[usize],
    kind: UnitKind,
) -> RenderUnit {
    let mut cell = mesh.extract(triangle_ids);
    let translation = cell.recenter();

    RenderUnit {
        name,
        mesh: cell,
        placement: Placement { translation },
        kind,
    }
}

/// Splits a target-space mesh into units, one per non-empty cell.
///
/// Each triangle goes to the XY cell containing its centroid. Every unit is recentered on its own
/// bounds and placed back with its translation. With cells disabled the whole mesh becomes a
/// single unit named `prefix`.
pub fn render_cells(
    mesh: &MeshDescription,
    prefix: &str,
    config: &CellsConfig,
    kind: UnitKind,
) -> Vec<RenderUnit> {
    if mesh.is_empty() {
        return Vec::new();
    }

    if !config.use_cells || config.cell_size == 0 {
        let all: Vec<usize> = (0..mesh.triangle_count()).collect();
        return vec![make_unit(mesh, prefix.to_owned(), &all, kind)];
    }

    let cell_size = config.cell_size as f32;
    let mut cells: BTreeMap<CellKey, Vec<usize>> = BTreeMap::new();
    for t in 0..mesh.triangle_count() {
        cells
            .entry(cell_key(mesh, t, cell_size))
            .or_insert_with(Vec::new)
            .push(t);
    }

    debug!(
        "Splitting {} triangles of {} into {} cells",
        mesh.triangle_count(),
        prefix,
        cells.len()
    );

    let cells: Vec<(CellKey, Vec<usize>)> = cells.into_iter().collect();
    let build = |((x, y), triangle_ids): (CellKey, Vec<usize>)| {
        make_unit(mesh, format!("{}_{}_{}", prefix, x, y), &triangle_ids, kind)
    };

    if config.parallelize_cell_splitting {
        cells.into_par_iter().map(build).collect()
    } else {
        cells.into_iter().map(build).collect()
    }
}
