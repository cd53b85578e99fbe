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

//! World face rendering.

use std::collections::HashMap;

use crate::{
    common::{
        bsp::{BspData, SurfaceFlags},
        math,
    },
    import::mesh::{MeshBuilder, MeshDescription, MeshVertex},
};

use cgmath::{InnerSpace, Vector2, Vector3, Zero};
use regex::Regex;

/// Material assigned to faces whose texinfo has no texture data.
pub const MISSING_MATERIAL: &str = "__missing";

const SMOOTHING_EPSILON: f32 = 0.01;

lazy_static! {
    // vbsp rewrites materials of faces that use cubemaps to maps/<map>/<name>_<x>_<y>_<z>
    static ref PATCHED_MATERIAL_REGEX: Regex =
        Regex::new(r"^maps/[^/]+/(.+?)(_-?\d+_-?\d+_-?\d+)?$").unwrap();
}

/// Normalizes a texture name from the texdata string table into a material path.
///
/// Names are lowercased and use forward slashes. Materials patched by the compiler for cubemap
/// reflections are mapped back to the material they were generated from.
pub fn parse_material_name(name: &str) -> String {
    let name = name.to_lowercase().replace('\\', "/");

    if let Some(caps) = PATCHED_MATERIAL_REGEX.captures(&name) {
        if let Some(base) = caps.get(1) {
            return base.as_str().to_owned();
        }
    }

    name
}

pub fn shares_smoothing_group(a: u32, b: u32) -> bool {
    a & b != 0
}

/// Returns the area of a face's polygon, in map or target units.
pub fn face_area(bsp: &BspData, face_id: usize, target_space: bool) -> Option<f32> {
    let polygon = bsp.polygon(face_id)?;
    let area = math::polygon_area(&polygon.vertices);

    Some(if target_space {
        area * math::TARGET_UNITS_PER_MAP_UNIT * math::TARGET_UNITS_PER_MAP_UNIT
    } else {
        area
    })
}

/// Returns the material path of a face, or `None` if it has no texinfo.
pub fn face_material(bsp: &BspData, face_id: usize) -> Option<String> {
    let texinfo = bsp.face_texinfo(face_id)?;
    Some(match bsp.texinfo_texture_name(texinfo) {
        Some(name) => parse_material_name(name),
        None => MISSING_MATERIAL.to_owned(),
    })
}

fn smoothing_key(p: Vector3<f32>) -> [i64; 3] {
    let q = |x: f32| (x / SMOOTHING_EPSILON).round() as i64;
    [q(p.x), q(p.y), q(p.z)]
}

type EdgeKey = ([i64; 3], [i64; 3]);

struct RenderFace<'a> {
    vertices: &'a [Vector3<f32>],
    normal: Vector3<f32>,
    smoothing_groups: u32,
    uv_scale: Vector2<f32>,
    texinfo_id: usize,
    material: String,
}

impl<'a> RenderFace<'a> {
    /// Returns the undirected key of the edge from vertex `e` to the next vertex.
    fn edge_key(&self, e: usize) -> EdgeKey {
        let a = smoothing_key(self.vertices[e]);
        let b = smoothing_key(self.vertices[(e + 1) % self.vertices.len()]);
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

/// Triangulates the given faces into a single mesh.
///
/// Displacement faces, faces without a polygon and invisible tool faces are skipped. If
/// `skybox_filter` is set, sky faces are skipped as well. Vertex normals are shared between faces
/// which border the same edge and whose smoothing groups intersect.
pub fn render_faces_to_mesh(
    bsp: &BspData,
    face_ids: &[usize],
    skybox_filter: bool,
) -> MeshDescription {
    let mut render_faces = Vec::with_capacity(face_ids.len());

    for &face_id in face_ids {
        let face = match bsp.faces().get(face_id) {
            Some(f) => f,
            None => continue,
        };

        if face.dispinfo().is_some() {
            continue;
        }

        let polygon = match bsp.polygon(face_id) {
            Some(p) => p,
            None => continue,
        };

        let texinfo_id = match face.texinfo() {
            Some(t) => t,
            None => continue,
        };
        let texinfo = match bsp.texinfo().get(texinfo_id) {
            Some(t) => t,
            None => continue,
        };

        if texinfo.flags.intersects(SurfaceFlags::invisible()) {
            continue;
        }

        if skybox_filter && texinfo.flags.intersects(SurfaceFlags::sky()) {
            continue;
        }

        let uv_scale = match bsp.texinfo_texdata(texinfo) {
            Some(t) if t.width > 0 && t.height > 0 => {
                Vector2::new(1.0 / t.width as f32, 1.0 / t.height as f32)
            }
            _ => Vector2::new(1.0, 1.0),
        };

        render_faces.push(RenderFace {
            vertices: &polygon.vertices,
            normal: bsp.face_normal(face_id).unwrap_or(polygon.normal),
            smoothing_groups: face.smoothing_groups,
            uv_scale,
            texinfo_id,
            material: face_material(bsp, face_id).unwrap_or_else(|| MISSING_MATERIAL.to_owned()),
        });
    }

    // every face bordering an edge, for smoothing
    let mut incident: HashMap<EdgeKey, Vec<usize>> = HashMap::new();
    for (i, f) in render_faces.iter().enumerate() {
        for e in 0..f.vertices.len() {
            let entry = incident
                .entry(f.edge_key(e))
                .or_insert_with(Vec::new);
            if !entry.contains(&i) {
                entry.push(i);
            }
        }
    }

    let mut builder = MeshBuilder::new();
    for f in render_faces.iter() {
        let texinfo = &bsp.texinfo()[f.texinfo_id];
        let material = builder.material(&f.material);

        let count = f.vertices.len();
        let vertices: Vec<MeshVertex> = f
            .vertices
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                let mut normal = Vector3::zero();
                if f.smoothing_groups != 0 {
                    // faces on either edge leaving this vertex
                    let mut neighbors: Vec<usize> = Vec::new();
                    for e in [(i + count - 1) % count, i].iter() {
                        for &other in incident[&f.edge_key(*e)].iter() {
                            if !neighbors.contains(&other) {
                                neighbors.push(other);
                            }
                        }
                    }

                    for other in neighbors {
                        let other = &render_faces[other];
                        if shares_smoothing_group(f.smoothing_groups, other.smoothing_groups) {
                            normal += other.normal;
                        }
                    }
                }

                if normal.magnitude2() < 1e-6 {
                    normal = f.normal;
                }

                let st = texinfo.texel_coords(position);
                let uv = Vector2::new(st.x * f.uv_scale.x, st.y * f.uv_scale.y);
                MeshVertex::new(position, normal.normalize(), uv)
            })
            .collect();

        builder.add_polygon(&vertices, material);
    }

    let mesh = builder.build();
    debug!(
        "Rendered {} of {} faces into {} triangles",
        render_faces.len(),
        face_ids.len(),
        mesh.triangle_count()
    );
    mesh
}
