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

use std::collections::HashMap;

use crate::common::math;

use cgmath::{InnerSpace, Vector2, Vector3, Zero};

/// Vertices closer than this, in target units, are merged.
pub const WELD_TOLERANCE: f32 = 0.01;

const ATTRIBUTE_TOLERANCE: f32 = 0.001;

pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshVertex {
    pub position: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub uv: Vector2<f32>,
    pub color: [f32; 4],
}

impl MeshVertex {
    pub fn new(position: Vector3<f32>, normal: Vector3<f32>, uv: Vector2<f32>) -> MeshVertex {
        MeshVertex {
            position,
            normal,
            uv,
            color: WHITE,
        }
    }

    fn to_target_space(&self) -> MeshVertex {
        MeshVertex {
            position: math::to_target_space(self.position),
            normal: math::direction_to_target_space(self.normal),
            uv: self.uv,
            color: self.color,
        }
    }
}

/// An indexed triangle mesh in target space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshDescription {
    pub vertices: Vec<MeshVertex>,
    pub triangles: Vec<[u32; 3]>,
    /// Material slot of each triangle, indexing `materials`.
    pub triangle_materials: Vec<u32>,
    pub materials: Vec<String>,
}

impl MeshDescription {
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn bounds(&self) -> Option<(Vector3<f32>, Vector3<f32>)> {
        if self.vertices.is_empty() {
            return None;
        }

        Some(math::bounds(self.vertices.iter().map(|v| &v.position)))
    }

    pub fn triangle_centroid(&self, triangle_id: usize) -> Vector3<f32> {
        let [a, b, c] = self.triangles[triangle_id];
        (self.vertices[a as usize].position
            + self.vertices[b as usize].position
            + self.vertices[c as usize].position)
            / 3.0
    }

    /// Copies the given triangles into a new mesh, keeping only the vertices and materials they
    /// use.
    pub fn extract(&self, triangle_ids: &[usize]) -> MeshDescription {
        let mut vertex_map = HashMap::new();
        let mut material_map = HashMap::new();
        let mut out = MeshDescription::default();

        for &t in triangle_ids {
            let mut tri = [0; 3];
            for (i, &v) in self.triangles[t].iter().enumerate() {
                let vertices = &mut out.vertices;
                tri[i] = *vertex_map.entry(v).or_insert_with(|| {
                    vertices.push(self.vertices[v as usize]);
                    vertices.len() as u32 - 1
                });
            }

            let material = self.triangle_materials[t];
            let materials = &mut out.materials;
            let slot = *material_map.entry(material).or_insert_with(|| {
                materials.push(self.materials[material as usize].clone());
                materials.len() as u32 - 1
            });

            out.triangles.push(tri);
            out.triangle_materials.push(slot);
        }

        out
    }

    pub fn translate(&mut self, offset: Vector3<f32>) {
        for v in self.vertices.iter_mut() {
            v.position += offset;
        }
    }

    /// Moves the mesh so that its bounds are centered on the origin and returns the old center.
    pub fn recenter(&mut self) -> Vector3<f32> {
        let center = match self.bounds() {
            Some((min, max)) => (min + max) * 0.5,
            None => return Vector3::zero(),
        };

        self.translate(-center);
        center
    }

    /// Appends another mesh, merging material slots by name.
    pub fn append(&mut self, other: &MeshDescription) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);

        let slots: Vec<u32> = other
            .materials
            .iter()
            .map(|name| match self.materials.iter().position(|m| m == name) {
                Some(i) => i as u32,
                None => {
                    self.materials.push(name.clone());
                    self.materials.len() as u32 - 1
                }
            })
            .collect();

        for (tri, material) in other.triangles.iter().zip(other.triangle_materials.iter()) {
            self.triangles
                .push([tri[0] + base, tri[1] + base, tri[2] + base]);
            self.triangle_materials.push(slots[*material as usize]);
        }
    }
}

type WeldCell = [i64; 3];

/// Accumulates map-space geometry into a welded, target-space [`MeshDescription`].
pub struct MeshBuilder {
    mesh: MeshDescription,
    vertex_lookup: HashMap<WeldCell, Vec<u32>>,
    material_lookup: HashMap<String, u32>,
    weld_tolerance: f32,
}

impl MeshBuilder {
    pub fn new() -> MeshBuilder {
        MeshBuilder::with_weld_tolerance(WELD_TOLERANCE)
    }

    pub fn with_weld_tolerance(weld_tolerance: f32) -> MeshBuilder {
        MeshBuilder {
            mesh: MeshDescription::default(),
            vertex_lookup: HashMap::new(),
            material_lookup: HashMap::new(),
            weld_tolerance,
        }
    }

    /// Returns the material slot for `name`, creating it if necessary.
    pub fn material(&mut self, name: &str) -> u32 {
        if let Some(slot) = self.material_lookup.get(name) {
            return *slot;
        }

        let slot = self.mesh.materials.len() as u32;
        self.mesh.materials.push(name.to_owned());
        self.material_lookup.insert(name.to_owned(), slot);
        slot
    }

    fn weld_cell(&self, position: Vector3<f32>) -> WeldCell {
        let q = |x: f32| (x / self.weld_tolerance).floor() as i64;
        [q(position.x), q(position.y), q(position.z)]
    }

    fn welds_with(&self, a: &MeshVertex, b: &MeshVertex) -> bool {
        let close = |x: f32, y: f32| (x - y).abs() <= ATTRIBUTE_TOLERANCE;
        (a.position - b.position).magnitude2() <= self.weld_tolerance * self.weld_tolerance
            && close(a.normal.x, b.normal.x)
            && close(a.normal.y, b.normal.y)
            && close(a.normal.z, b.normal.z)
            && close(a.uv.x, b.uv.x)
            && close(a.uv.y, b.uv.y)
            && a.color.iter().zip(b.color.iter()).all(|(x, y)| close(*x, *y))
    }

    /// Finds an emitted vertex to weld with. Any match lies in the vertex's cell or a neighbor.
    fn find_weld(&self, vertex: &MeshVertex) -> Option<u32> {
        let cell = self.weld_cell(vertex.position);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let neighbor = [cell[0] + dx, cell[1] + dy, cell[2] + dz];
                    let found = self.vertex_lookup.get(&neighbor).and_then(|ids| {
                        ids.iter()
                            .find(|&&id| self.welds_with(&self.mesh.vertices[id as usize], vertex))
                    });
                    if let Some(id) = found {
                        return Some(*id);
                    }
                }
            }
        }

        None
    }

    fn add_vertex(&mut self, vertex: &MeshVertex) -> u32 {
        let mut vertex = vertex.to_target_space();
        if vertex.normal.magnitude2() > 0.0 {
            vertex.normal = vertex.normal.normalize();
        }

        if let Some(id) = self.find_weld(&vertex) {
            return id;
        }

        let id = self.mesh.vertices.len() as u32;
        let cell = self.weld_cell(vertex.position);
        self.mesh.vertices.push(vertex);
        self.vertex_lookup.entry(cell).or_insert_with(Vec::new).push(id);
        id
    }

    /// Adds map-space triangles which index into `vertices`.
    ///
    /// Triangles are expected in map winding order. Triangles which collapse after welding are
    /// dropped.
    pub fn add_triangles(&mut self, vertices: &[MeshVertex], triangles: &[[usize; 3]], material: u32) {
        let ids: Vec<u32> = vertices.iter().map(|v| self.add_vertex(v)).collect();

        for t in triangles {
            let (a, b, c) = (ids[t[0]], ids[t[1]], ids[t[2]]);
            if a == b || b == c || a == c {
                continue;
            }

            // the mirror into target space flips handedness
            self.mesh.triangles.push([a, c, b]);
            self.mesh.triangle_materials.push(material);
        }
    }

    /// Adds a convex map-space polygon as a triangle fan.
    pub fn add_polygon(&mut self, vertices: &[MeshVertex], material: u32) {
        if vertices.len() < 3 {
            return;
        }

        let fan: Vec<[usize; 3]> = (1..vertices.len() - 1).map(|i| [0, i, i + 1]).collect();
        self.add_triangles(vertices, &fan, material);
    }

    pub fn build(self) -> MeshDescription {
        self.mesh
    }
}

impl Default for MeshBuilder {
    fn default() -> Self {
        MeshBuilder::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn vertex(x: f32, y: f32, z: f32) -> MeshVertex {
        MeshVertex::new(
            Vector3::new(x, y, z),
            Vector3::unit_z(),
            Vector2::new(0.0, 0.0),
        )
    }

    fn square() -> Vec<MeshVertex> {
        vec![
            vertex(0.0, 0.0, 0.0),
            vertex(0.0, 1.0, 0.0),
            vertex(1.0, 1.0, 0.0),
            vertex(1.0, 0.0, 0.0),
        ]
    }

    #[test]
    fn test_polygon_fan() {
        let mut builder = MeshBuilder::new();
        let material = builder.material("brick/wall01");
        builder.add_polygon(&square(), material);
        let mesh = builder.build();

        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.triangles, vec![[0, 2, 1], [0, 3, 2]]);
        assert_eq!(mesh.triangle_materials, vec![0, 0]);
        assert_eq!(mesh.materials, vec!["brick/wall01".to_owned()]);
    }

    #[test]
    fn test_target_space_winding() {
        let mut builder = MeshBuilder::new();
        builder.add_polygon(&square(), 0);
        let mesh = builder.build();

        // map faces are clockwise from the front; after conversion they still are
        for tri in mesh.triangles.iter() {
            let p: Vec<Vector3<f32>> = tri
                .iter()
                .map(|&i| mesh.vertices[i as usize].position)
                .collect();
            let n = (p[0] - p[1]).cross(p[2] - p[1]);
            assert!(n.z > 0.0);
        }

        assert_eq!(mesh.vertices[1].position, Vector3::new(0.0, -1.905, 0.0));
    }

    #[test]
    fn test_weld() {
        let mut builder = MeshBuilder::new();
        builder.add_polygon(&square(), 0);
        builder.add_polygon(&square(), 0);

        let mut flipped = square();
        for v in flipped.iter_mut() {
            v.normal = -v.normal;
        }
        builder.add_polygon(&flipped, 0);

        let mesh = builder.build();
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.triangle_count(), 6);
    }

    #[test]
    fn test_weld_across_cell_boundary() {
        // target-space x of 0.0099 and 0.0101 sit in different weld cells
        let scale = 1.0 / math::TARGET_UNITS_PER_MAP_UNIT;
        let mut builder = MeshBuilder::new();
        let a = builder.add_vertex(&vertex(0.0099 * scale, 0.0, 0.0));
        let b = builder.add_vertex(&vertex(0.0101 * scale, 0.0, 0.0));
        let c = builder.add_vertex(&vertex(0.0301 * scale, 0.0, 0.0));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_degenerate_dropped() {
        let mut builder = MeshBuilder::new();
        let verts = vec![vertex(0.0, 0.0, 0.0), vertex(0.0, 0.0, 0.0), vertex(1.0, 0.0, 0.0)];
        builder.add_polygon(&verts, 0);
        assert!(builder.build().is_empty());
    }

    #[test]
    fn test_extract_and_recenter() {
        let mut builder = MeshBuilder::new();
        let a = builder.material("a");
        let b = builder.material("b");
        builder.add_polygon(&square(), a);
        let mut far = square();
        for v in far.iter_mut() {
            v.position.x += 10.0;
        }
        builder.add_polygon(&far, b);
        let mesh = builder.build();

        let sub = mesh.extract(&[2, 3]);
        assert_eq!(sub.vertices.len(), 4);
        assert_eq!(sub.materials, vec!["b".to_owned()]);
        assert_eq!(sub.triangle_materials, vec![0, 0]);

        let mut sub = sub;
        let center = sub.recenter();
        assert!((center.x - 10.5 * 1.905).abs() < 0.001);
        let (min, max) = sub.bounds().unwrap();
        assert!((min + max).magnitude() < 0.001);
    }

    #[test]
    fn test_append() {
        let mut builder = MeshBuilder::new();
        let slot = builder.material("a");
        builder.add_polygon(&square(), slot);
        let mut mesh = builder.build();
        let other = mesh.clone();
        mesh.append(&other);

        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.triangles[2], [4, 6, 5]);
        assert_eq!(mesh.materials.len(), 1);
    }
}
