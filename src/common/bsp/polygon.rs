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

use crate::common::bsp::{BspEdge, BspEdgeIndex, BspFace, BspPlane};

use cgmath::Vector3;

/// Faces with more edges than this are not reconstructed.
pub const MAX_SURFINFO_VERTS: usize = 32;

/// A face outline reconstructed from the edge tables.
#[derive(Clone, Debug, PartialEq)]
pub struct BspPolygon {
    /// Vertices in traversal order: clockwise when viewed from the front of the plane.
    pub vertices: Vec<Vector3<f32>>,
    pub normal: Vector3<f32>,
    pub dist: f32,
}

/// Builds a polygon for every face which can be reconstructed.
///
/// Returns the polygons indexed by face along with the number of faces that were skipped.
pub(crate) fn build_polygons(
    faces: &[BspFace],
    edgelist: &[BspEdgeIndex],
    edges: &[BspEdge],
    vertices: &[Vector3<f32>],
    planes: &[BspPlane],
) -> (Box<[Option<BspPolygon>]>, usize) {
    let mut skipped = 0;
    let polygons = faces
        .iter()
        .enumerate()
        .map(|(face_id, face)| {
            let polygon = build_polygon(face, edgelist, edges, vertices, planes);
            if polygon.is_none() {
                trace!("Skipping face {}", face_id);
                skipped += 1;
            }
            polygon
        })
        .collect();

    (polygons, skipped)
}

fn build_polygon(
    face: &BspFace,
    edgelist: &[BspEdgeIndex],
    edges: &[BspEdge],
    vertices: &[Vector3<f32>],
    planes: &[BspPlane],
) -> Option<BspPolygon> {
    if face.edge_count < 3 || face.edge_count as usize > MAX_SURFINFO_VERTS {
        return None;
    }

    // faces without real texture info are compiler-only surfaces
    if face.texinfo_id <= 0 {
        return None;
    }

    if face.edge_id < 0 {
        return None;
    }

    let first = face.edge_id as usize;
    let count = face.edge_count as usize;

    let mut polygon_verts = Vec::with_capacity(count);
    for edge_index in edgelist.get(first..first + count)? {
        let [start, _] = edge_index.endpoints(edges)?;
        polygon_verts.push(*vertices.get(start)?);
    }

    let plane = planes.get(face.plane_id)?;

    Some(BspPolygon {
        vertices: polygon_verts,
        normal: plane.normal(),
        dist: plane.dist(),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::bsp::{test_util, BspLumpId};

    #[test]
    fn test_quad_polygon() {
        let bsp = test_util::quad_map().load();
        let polygon = bsp.polygon(0).unwrap();
        assert_eq!(
            polygon.vertices,
            vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(0.0, 128.0, 0.0),
                Vector3::new(128.0, 128.0, 0.0),
                Vector3::new(128.0, 0.0, 0.0),
            ]
        );
        assert_eq!(polygon.normal, Vector3::unit_z());
        assert_eq!(bsp.skipped_faces(), 0);
    }

    #[test]
    fn test_surfedge_direction() {
        let edges = [
            BspEdge {
                vertex_ids: [0, 0],
            },
            BspEdge {
                vertex_ids: [0, 0],
            },
            BspEdge {
                vertex_ids: [0, 0],
            },
            BspEdge {
                vertex_ids: [0, 0],
            },
            BspEdge {
                vertex_ids: [0, 0],
            },
            BspEdge {
                vertex_ids: [7, 9],
            },
        ];

        let forward = BspEdgeIndex::from_surfedge(5).endpoints(&edges).unwrap();
        let backward = BspEdgeIndex::from_surfedge(-5).endpoints(&edges).unwrap();
        assert_eq!(forward, [7, 9]);
        assert_eq!(backward, [9, 7]);
        assert!(BspEdgeIndex::from_surfedge(6).endpoints(&edges).is_none());
    }

    #[test]
    fn test_reversed_edges() {
        // the same quad, but with every edge stored backwards and referenced negatively
        let mut writer = test_util::quad_map();
        writer.lump(
            BspLumpId::Edges,
            [
                test_util::edge(0, 0),
                test_util::edge(1, 0),
                test_util::edge(2, 1),
                test_util::edge(3, 2),
                test_util::edge(0, 3),
            ]
            .concat(),
        );
        writer.lump(
            BspLumpId::Surfedges,
            [-1, -2, -3, -4]
                .iter()
                .map(|&s| test_util::surfedge(s))
                .collect::<Vec<_>>()
                .concat(),
        );

        let reversed = writer.load();
        let original = test_util::quad_map().load();
        assert_eq!(reversed.polygon(0), original.polygon(0));
    }

    #[test]
    fn test_skip_rules() {
        let bsp = test_util::quad_map()
            .lump(
                BspLumpId::Faces,
                [
                    // too few edges
                    test_util::face(0, 0, 2, 1),
                    // too many edges
                    test_util::face(0, 0, MAX_SURFINFO_VERTS as i16 + 1, 1),
                    // texinfo 0 is reserved
                    test_util::face(0, 0, 4, 0),
                    // negative texinfo
                    test_util::face(0, 0, 4, -1),
                    // surfedges out of range
                    test_util::face(0, 2, 4, 1),
                    // valid
                    test_util::face(0, 0, 4, 1),
                ]
                .concat(),
            )
            .load();

        assert_eq!(bsp.polygons().len(), 6);
        assert_eq!(bsp.skipped_faces(), 5);
        assert!(bsp.polygon(5).is_some());
        for face_id in 0..5 {
            assert!(bsp.polygon(face_id).is_none());
        }
    }
}
