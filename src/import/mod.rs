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

//! Geometry emission.
//!
//! The importer turns a parsed map into renderable units: world faces, displacements, brush
//! models, clip brushes and sprite detail props, each optionally split into grid cells. Units are
//! handed to a [`MeshSink`], which owns whatever representation the caller wants to produce.

pub mod brushes;
pub mod cells;
pub mod displacement;
pub mod faces;
pub mod mesh;
pub mod props;
pub mod spatial;

use std::path::Path;

use crate::common::{
    bsp::{self, BspContents, BspData, BspError},
    config::{CellsConfig, ImportConfig},
};

use self::{
    brushes::render_brushes_to_collision_mesh,
    cells::render_cells,
    displacement::render_displacements_to_mesh,
    faces::render_faces_to_mesh,
    mesh::MeshDescription,
    props::{render_detail_props_to_mesh, static_prop_placements, PropPlacement},
    spatial::SpatialIndex,
};

use cgmath::Vector3;
use failure::{Error, ResultExt};

/// Material given to clip brush collision meshes.
pub const CLIP_MATERIAL: &str = "tools/toolsplayerclip";

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UnitKind {
    Render,
    RenderAndCollision,
    CollisionOnly,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    pub translation: Vector3<f32>,
}

/// A mesh ready to be handed to a [`MeshSink`], centered on its own bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderUnit {
    pub name: String,
    pub mesh: MeshDescription,
    pub placement: Placement,
    pub kind: UnitKind,
}

/// Receives the units produced by an import.
pub trait MeshSink {
    type Unit;

    /// Called once before any unit is created.
    fn begin_import(&mut self, _map_name: &str, _portable: bool) -> Result<(), Error> {
        Ok(())
    }

    fn create_unit(
        &mut self,
        name: &str,
        mesh: MeshDescription,
        placement: Placement,
        kind: UnitKind,
    ) -> Result<Self::Unit, Error>;
}

/// Receives the map's raw entity text.
pub trait EntitySink {
    fn consume(&mut self, entities: &str) -> Result<(), Error>;
}

pub struct ImportResult<U> {
    pub units: Vec<U>,
    pub props: Vec<PropPlacement>,
    pub spatial_index: SpatialIndex,
}

pub struct BspImporter {
    map_name: String,
    bsp: BspData,
    config: ImportConfig,
}

impl BspImporter {
    /// Parses the map at `path`. The map is named after the file stem.
    pub fn load<P>(path: P, config: ImportConfig) -> Result<BspImporter, BspError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let map_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "map".to_owned());

        let bsp = bsp::load_file(path, &config.bsp)?;
        Ok(BspImporter::from_data(map_name, bsp, config))
    }

    pub fn from_data<S>(map_name: S, bsp: BspData, config: ImportConfig) -> BspImporter
    where
        S: Into<String>,
    {
        BspImporter {
            map_name: map_name.into(),
            bsp,
            config,
        }
    }

    pub fn bsp(&self) -> &BspData {
        &self.bsp
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    /// Renders one model's faces and displacements.
    ///
    /// The world model (0) is gathered from the node tree with sky faces filtered out and is split
    /// into cells. Brush models keep their own face range and are emitted whole.
    pub fn render_model_to_units(&self, model_id: usize) -> Vec<RenderUnit> {
        let bsp = &self.bsp;
        let model = match bsp.models().get(model_id) {
            Some(m) => m,
            None => {
                warn!("No model {} in {}", model_id, self.map_name);
                return Vec::new();
            }
        };

        let model_faces: Vec<usize> = (model.face_id..model.face_id + model.face_count).collect();
        let disp_ids = bsp.gather_displacements(&model_faces);

        let (faces, skybox_filter, prefix, brush_cells, disp_cells) = if model_id == 0 {
            (
                bsp.gather_faces(model.head_node),
                true,
                format!("{}_world", self.map_name),
                self.config.bsp.brush_geometry_cells.clone(),
                self.config.bsp.displacement_cells.clone(),
            )
        } else {
            (
                model_faces,
                false,
                format!("{}_model{}", self.map_name, model_id),
                CellsConfig::disabled(),
                CellsConfig::disabled(),
            )
        };

        let mesh = render_faces_to_mesh(bsp, &faces, skybox_filter);
        let mut units = render_cells(&mesh, &prefix, &brush_cells, UnitKind::RenderAndCollision);

        if !disp_ids.is_empty() {
            let disp_mesh = render_displacements_to_mesh(bsp, &disp_ids);
            units.extend(render_cells(
                &disp_mesh,
                &format!("{}_displacements", prefix),
                &disp_cells,
                UnitKind::RenderAndCollision,
            ));
        }

        units
    }

    /// Renders the world's clip brushes as collision-only units.
    pub fn render_clip_brushes_to_units(&self) -> Vec<RenderUnit> {
        let bsp = &self.bsp;
        let head_node = match bsp.models().get(0) {
            Some(m) => m.head_node,
            None => return Vec::new(),
        };

        let clip = BspContents::PLAYERCLIP | BspContents::MONSTERCLIP;
        let brush_ids: Vec<usize> = bsp
            .gather_brushes(head_node)
            .into_iter()
            .filter(|&b| {
                bsp.brushes()
                    .get(b)
                    .map(|brush| brush.contents.intersects(clip))
                    .unwrap_or(false)
            })
            .collect();

        let mesh = render_brushes_to_collision_mesh(bsp, &brush_ids, CLIP_MATERIAL);
        render_cells(
            &mesh,
            &format!("{}_clip", self.map_name),
            &self.config.bsp.brush_geometry_cells,
            UnitKind::CollisionOnly,
        )
    }

    pub fn render_detail_props_to_units(&self) -> Vec<RenderUnit> {
        let mesh = render_detail_props_to_mesh(&self.bsp);
        render_cells(
            &mesh,
            &format!("{}_detail", self.map_name),
            &self.config.bsp.detail_prop_cells,
            UnitKind::Render,
        )
    }

    pub fn render_tree_to_spatial_index(&self, node_id: usize) -> SpatialIndex {
        SpatialIndex::from_tree(&self.bsp, node_id)
    }

    /// Renders every model, clip brush and detail prop and passes the units to `sink`.
    pub fn import_geometry<S>(&self, sink: &mut S) -> Result<Vec<S::Unit>, Error>
    where
        S: MeshSink,
    {
        sink.begin_import(&self.map_name, self.config.bsp.portable)?;

        let mut units = Vec::new();
        for model_id in 0..self.bsp.models().len() {
            units.extend(self.render_model_to_units(model_id));
        }

        units.extend(self.render_clip_brushes_to_units());

        if self.config.bsp.import_detail_props {
            units.extend(self.render_detail_props_to_units());
        }

        info!(
            "Emitting {} units for {} ({} triangles)",
            units.len(),
            self.map_name,
            units.iter().map(|u| u.mesh.triangle_count()).sum::<usize>()
        );

        let mut out = Vec::with_capacity(units.len());
        for unit in units {
            let RenderUnit {
                name,
                mesh,
                placement,
                kind,
            } = unit;
            let created = sink
                .create_unit(&name, mesh, placement, kind)
                .with_context(|_| format!("Failed to create unit {}", name))?;
            out.push(created);
        }

        Ok(out)
    }

    /// Imports geometry, hands the entity text to `entities` and collects prop placements and
    /// the spatial index.
    pub fn import_all<S, E>(
        &self,
        sink: &mut S,
        entities: &mut E,
    ) -> Result<ImportResult<S::Unit>, Error>
    where
        S: MeshSink,
        E: EntitySink,
    {
        let units = self.import_geometry(sink)?;
        entities
            .consume(self.bsp.entities())
            .context("Failed to interpret entities")?;

        let props = static_prop_placements(&self.bsp);
        let spatial_index = self.render_tree_to_spatial_index(0);

        Ok(ImportResult {
            units,
            props,
            spatial_index,
        })
    }
}
