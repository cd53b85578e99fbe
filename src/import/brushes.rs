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

//! Brush solids rebuilt from their bounding planes.

use crate::{
    common::{
        bsp::{BspData, SurfaceFlags},
        math::{self, Hyperplane, Winding},
    },
    import::{
        faces::{parse_material_name, MISSING_MATERIAL},
        mesh::{MeshBuilder, MeshDescription, MeshVertex},
    },
};

use cgmath::{Vector2, Vector3};

const MIN_SIDE_AREA: f32 = 0.001;

/// One polygon of a [`ConvexHull`].
#[derive(Clone, Debug)]
pub struct HullFace {
    pub side_id: usize,
    pub plane: Hyperplane,
    /// Clockwise when viewed from outside the brush.
    pub points: Vec<Vector3<f32>>,
    pub texinfo_id: Option<usize>,
}

/// A convex polyhedron in map space.
#[derive(Clone, Debug, Default)]
pub struct ConvexHull {
    pub faces: Vec<HullFace>,
}

impl ConvexHull {
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn bounds(&self) -> Option<(Vector3<f32>, Vector3<f32>)> {
        if self.is_empty() {
            return None;
        }

        Some(math::bounds(self.faces.iter().flat_map(|f| f.points.iter())))
    }
}

/// Builds the polygons bounding a brush.
///
/// Every side's polygon is its plane clipped by the brush's other sides. Bevel sides and sides
/// whose surface flags intersect `rejected` are left out unless `close_geometry` is set, in which
/// case every side that still has area is kept so the hull is closed.
pub fn process_brush(
    bsp: &BspData,
    brush_id: usize,
    close_geometry: bool,
    rejected: SurfaceFlags,
) -> ConvexHull {
    let brush = match bsp.brushes().get(brush_id) {
        Some(b) => b,
        None => return ConvexHull::default(),
    };

    let sides = match bsp
        .brush_sides()
        .get(brush.side_id..brush.side_id + brush.side_count)
    {
        Some(s) => s,
        None => {
            warn!("Brush {} has out-of-range sides", brush_id);
            return ConvexHull::default();
        }
    };

    let mut planes = Vec::with_capacity(sides.len());
    for side in sides {
        match bsp.planes().get(side.plane_id) {
            Some(p) => planes.push(Hyperplane::new(p.normal(), p.dist())),
            None => {
                warn!("Brush {} references invalid plane {}", brush_id, side.plane_id);
                return ConvexHull::default();
            }
        }
    }

    let mut hull = ConvexHull::default();
    for (i, side) in sides.iter().enumerate() {
        let texinfo_id = if side.texinfo_id < 0 {
            None
        } else {
            Some(side.texinfo_id as usize)
        };

        if !close_geometry {
            if side.bevel {
                continue;
            }

            let flags = texinfo_id
                .and_then(|t| bsp.texinfo().get(t))
                .map(|t| t.flags)
                .unwrap_or_else(SurfaceFlags::empty);
            if flags.intersects(rejected) {
                continue;
            }
        }

        let mut winding = Some(Winding::for_plane(&planes[i]));
        for (j, other) in planes.iter().enumerate() {
            if i == j || sides[j].bevel || planes[i].is_opposite(other) {
                continue;
            }

            winding = match winding {
                Some(w) => w.clip(other),
                None => break,
            };
        }

        let winding = match winding {
            Some(w) if w.area() > MIN_SIDE_AREA => w,
            _ => continue,
        };

        hull.faces.push(HullFace {
            side_id: brush.side_id + i,
            plane: planes[i].clone(),
            points: math::remove_collinear(winding.into_points()),
            texinfo_id,
        });
    }

    hull
}

/// Renders brushes as closed meshes.
///
/// If `override_material` is given it is used for every side. Invisible tool sides and bevels are
/// only emitted when `always_emit_faces` is set.
pub fn render_brushes_to_mesh(
    bsp: &BspData,
    brush_ids: &[usize],
    override_material: Option<&str>,
    always_emit_faces: bool,
) -> MeshDescription {
    let mut builder = MeshBuilder::new();

    for &brush_id in brush_ids {
        let hull = process_brush(bsp, brush_id, always_emit_faces, SurfaceFlags::invisible());

        for face in hull.faces.iter() {
            let texinfo = face.texinfo_id.and_then(|t| bsp.texinfo().get(t));

            let material = match override_material {
                Some(m) => builder.material(m),
                None => {
                    let name = texinfo
                        .and_then(|t| bsp.texinfo_texture_name(t))
                        .map(parse_material_name)
                        .unwrap_or_else(|| MISSING_MATERIAL.to_owned());
                    builder.material(&name)
                }
            };

            let uv_scale = texinfo
                .and_then(|t| bsp.texinfo_texdata(t))
                .filter(|t| t.width > 0 && t.height > 0)
                .map(|t| Vector2::new(1.0 / t.width as f32, 1.0 / t.height as f32))
                .unwrap_or_else(|| Vector2::new(1.0, 1.0));

            let normal = face.plane.normal();
            let vertices: Vec<MeshVertex> = face
                .points
                .iter()
                .map(|&p| {
                    let uv = match texinfo {
                        Some(t) => {
                            let st = t.texel_coords(p);
                            Vector2::new(st.x * uv_scale.x, st.y * uv_scale.y)
                        }
                        None => Vector2::new(0.0, 0.0),
                    };
                    MeshVertex::new(p, normal, uv)
                })
                .collect();

            builder.add_polygon(&vertices, material);
        }
    }

    builder.build()
}

/// Renders brushes for collision only, with every side present and a single material.
pub fn render_brushes_to_collision_mesh(
    bsp: &BspData,
    brush_ids: &[usize],
    editor_material: &str,
) -> MeshDescription {
    render_brushes_to_mesh(bsp, brush_ids, Some(editor_material), true)
}
