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

//! Displacement surfaces.
//!
//! A displacement replaces a four-sided face with a `(2^power + 1)`-square grid of vertices. Each
//! grid vertex starts on the bilinear interpolation of the face's corners and is pushed along its
//! own offset vector.

use crate::{
    common::bsp::{BspData, BspDispInfo, MAX_DISP_POWER},
    import::{
        faces::{face_material, MISSING_MATERIAL},
        mesh::{MeshBuilder, MeshDescription, MeshVertex},
    },
};

use cgmath::{InnerSpace, Vector2, Vector3, Zero};

/// A displacement grid in map space.
#[derive(Clone, Debug)]
pub struct DisplacementGrid {
    pub side_len: usize,
    pub positions: Vec<Vector3<f32>>,
    /// Undisplaced positions, used for texture projection.
    pub base_positions: Vec<Vector3<f32>>,
    pub alphas: Vec<f32>,
    pub triangles: Vec<[usize; 3]>,
}

fn lerp(a: Vector3<f32>, b: Vector3<f32>, t: f32) -> Vector3<f32> {
    a + (b - a) * t
}

/// Reorders the face's corners so that the one closest to the displacement's start position
/// comes first.
fn orient_corners(corners: &mut [Vector3<f32>; 4], start: Vector3<f32>) {
    let mut first = 0;
    let mut best = std::f32::INFINITY;
    for (i, c) in corners.iter().enumerate() {
        let d = (c - start).magnitude2();
        if d < best {
            best = d;
            first = i;
        }
    }

    corners.rotate_left(first);
}

fn triangulate(side_len: usize) -> Vec<[usize; 3]> {
    let mut triangles = Vec::with_capacity(2 * (side_len - 1) * (side_len - 1));
    for i in 0..side_len - 1 {
        for j in 0..side_len - 1 {
            let a = i * side_len + j;
            let b = a + 1;
            let c = a + side_len;
            let d = c + 1;

            // alternate the split diagonal so neighboring cells mirror each other
            if (i + j) % 2 == 0 {
                triangles.push([a, c, d]);
                triangles.push([a, d, b]);
            } else {
                triangles.push([a, c, b]);
                triangles.push([c, d, b]);
            }
        }
    }

    triangles
}

/// Builds the vertex grid of a displacement. Returns `None` if the displacement can't be built.
pub fn build_grid(bsp: &BspData, disp: &BspDispInfo) -> Option<DisplacementGrid> {
    if disp.power < 1 || disp.power > MAX_DISP_POWER {
        debug!("Displacement has unsupported power {}", disp.power);
        return None;
    }

    let face_verts = bsp.face_vertices(disp.map_face)?;
    if face_verts.len() != 4 {
        debug!(
            "Displacement face {} has {} corners",
            disp.map_face,
            face_verts.len()
        );
        return None;
    }

    let mut corners = [face_verts[0], face_verts[1], face_verts[2], face_verts[3]];
    orient_corners(&mut corners, disp.start_position);

    let side_len = disp.side_len();
    let verts = bsp
        .disp_verts()
        .get(disp.disp_vert_id..disp.disp_vert_id + disp.vertex_count())?;

    let step = 1.0 / (side_len - 1) as f32;
    let mut positions = Vec::with_capacity(verts.len());
    let mut base_positions = Vec::with_capacity(verts.len());
    let mut alphas = Vec::with_capacity(verts.len());

    for i in 0..side_len {
        let left = lerp(corners[0], corners[1], i as f32 * step);
        let right = lerp(corners[3], corners[2], i as f32 * step);

        for j in 0..side_len {
            let base = lerp(left, right, j as f32 * step);
            let vert = &verts[i * side_len + j];

            base_positions.push(base);
            positions.push(base + vert.vec * vert.dist);
            alphas.push(vert.alpha / 255.0);
        }
    }

    Some(DisplacementGrid {
        side_len,
        positions,
        base_positions,
        alphas,
        triangles: triangulate(side_len),
    })
}

impl DisplacementGrid {
    /// Area-weighted vertex normals.
    pub fn normals(&self, fallback: Vector3<f32>) -> Vec<Vector3<f32>> {
        let mut normals = vec![Vector3::zero(); self.positions.len()];
        for t in self.triangles.iter() {
            let p = [
                self.positions[t[0]],
                self.positions[t[1]],
                self.positions[t[2]],
            ];

            // clockwise from the front
            let n = (p[0] - p[1]).cross(p[2] - p[1]);
            for &v in t.iter() {
                normals[v] += n;
            }
        }

        normals
            .into_iter()
            .map(|n| {
                if n.magnitude2() > 1e-8 {
                    n.normalize()
                } else {
                    fallback
                }
            })
            .collect()
    }
}

/// Renders the given displacements into one mesh.
pub fn render_displacements_to_mesh(bsp: &BspData, disp_ids: &[usize]) -> MeshDescription {
    let mut builder = MeshBuilder::new();

    for &disp_id in disp_ids {
        let disp = match bsp.disp_infos().get(disp_id) {
            Some(d) => d,
            None => continue,
        };

        let grid = match build_grid(bsp, disp) {
            Some(g) => g,
            None => {
                debug!("Skipping displacement {}", disp_id);
                continue;
            }
        };

        let material = builder.material(
            &face_material(bsp, disp.map_face).unwrap_or_else(|| MISSING_MATERIAL.to_owned()),
        );

        let texinfo = bsp.face_texinfo(disp.map_face);
        let uv_scale = texinfo
            .and_then(|t| bsp.texinfo_texdata(t))
            .filter(|t| t.width > 0 && t.height > 0)
            .map(|t| Vector2::new(1.0 / t.width as f32, 1.0 / t.height as f32))
            .unwrap_or_else(|| Vector2::new(1.0, 1.0));

        let fallback = bsp
            .face_normal(disp.map_face)
            .unwrap_or_else(Vector3::unit_z);
        let normals = grid.normals(fallback);

        let vertices: Vec<MeshVertex> = (0..grid.positions.len())
            .map(|i| {
                let uv = match texinfo {
                    Some(t) => {
                        let st = t.texel_coords(grid.base_positions[i]);
                        Vector2::new(st.x * uv_scale.x, st.y * uv_scale.y)
                    }
                    None => Vector2::new(0.0, 0.0),
                };

                let mut vertex = MeshVertex::new(grid.positions[i], normals[i], uv);
                vertex.color[3] = grid.alphas[i];
                vertex
            })
            .collect();

        builder.add_triangles(&vertices, &grid.triangles, material);
    }

    builder.build()
}
