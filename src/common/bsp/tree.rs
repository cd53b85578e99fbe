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

use std::collections::HashSet;

use crate::common::{
    bsp::{BspData, BspErrorKind, BspNode, BspNodeChild},
    math::{self, HyperplaneSide},
};

use cgmath::Vector3;
use failure::Error;

impl BspNodeChild {
    /// Decodes a stored child index. Negative values encode leaf `-1 - raw`.
    pub fn from_raw(raw: i32) -> BspNodeChild {
        if raw < 0 {
            BspNodeChild::Leaf(!raw as usize)
        } else {
            BspNodeChild::Node(raw as usize)
        }
    }
}

/// Checks that every index stored in the tree refers to an existing record.
pub(crate) fn validate_tree(
    nodes: &[BspNode],
    leaf_count: usize,
    plane_count: usize,
) -> Result<(), Error> {
    let bad = |kind, index, count| -> Error { BspErrorKind::BadTreeIndex { kind, index, count }.into() };

    for node in nodes {
        if node.plane_id >= plane_count {
            return Err(bad("plane", node.plane_id, plane_count));
        }

        for child in node.children.iter() {
            match *child {
                BspNodeChild::Node(n) if n >= nodes.len() => {
                    return Err(bad("node", n, nodes.len()));
                }
                BspNodeChild::Leaf(l) if l >= leaf_count => {
                    return Err(bad("leaf", l, leaf_count));
                }
                _ => (),
            }
        }
    }

    Ok(())
}

impl BspData {
    /// Visits every leaf below `node_id` depth-first, front child first.
    ///
    /// Each node is entered at most once, so malformed trees which share subtrees terminate.
    fn visit_leaves<F>(&self, node_id: usize, mut f: F)
    where
        F: FnMut(usize),
    {
        if node_id >= self.nodes.len() {
            return;
        }

        let mut visited = HashSet::new();
        let mut stack = vec![BspNodeChild::Node(node_id)];
        while let Some(child) = stack.pop() {
            match child {
                BspNodeChild::Node(n) => {
                    if !visited.insert(n) {
                        continue;
                    }

                    let [front, back] = self.nodes[n].children;
                    stack.push(back);
                    stack.push(front);
                }
                BspNodeChild::Leaf(l) => f(l),
            }
        }
    }

    /// Collects the distinct faces referenced by the leaves below `node_id`, in first-seen order.
    pub fn gather_faces(&self, node_id: usize) -> Vec<usize> {
        let mut seen = HashSet::new();
        let mut faces = Vec::new();

        self.visit_leaves(node_id, |leaf_id| {
            let leaf = &self.leaves[leaf_id];
            let end = leaf.leafface_id + leaf.leafface_count;
            for &face_id in self.leaf_faces.get(leaf.leafface_id..end).unwrap_or(&[]) {
                if seen.insert(face_id) {
                    faces.push(face_id as usize);
                }
            }
        });

        faces
    }

    /// Collects the distinct brushes referenced by the leaves below `node_id`, in first-seen
    /// order.
    pub fn gather_brushes(&self, node_id: usize) -> Vec<usize> {
        let mut seen = HashSet::new();
        let mut brushes = Vec::new();

        self.visit_leaves(node_id, |leaf_id| {
            let leaf = &self.leaves[leaf_id];
            let end = leaf.leafbrush_id + leaf.leafbrush_count;
            for &brush_id in self.leaf_brushes.get(leaf.leafbrush_id..end).unwrap_or(&[]) {
                if seen.insert(brush_id) {
                    brushes.push(brush_id as usize);
                }
            }
        });

        brushes
    }

    /// Returns the displacements attached to the given faces, in face order.
    pub fn gather_displacements(&self, face_ids: &[usize]) -> Vec<usize> {
        let mut seen = HashSet::new();
        face_ids
            .iter()
            .filter_map(|&f| self.faces.get(f).and_then(|face| face.dispinfo()))
            .filter(|&d| d < self.disp_infos.len() && seen.insert(d))
            .collect()
    }

    /// Locates the leaf containing the given map-space position and returns its index.
    ///
    /// Returns `None` if the map has no nodes.
    pub fn find_leaf<V>(&self, pos: V) -> Option<usize>
    where
        V: Into<Vector3<f32>>,
    {
        self.find_leaf_from(0, pos.into())
    }

    pub(crate) fn find_leaf_from(&self, node_id: usize, pos: Vector3<f32>) -> Option<usize> {
        let mut node = self.nodes.get(node_id)?;

        // validated trees cannot point outside the node array, but they can contain cycles
        for _ in 0..=self.nodes.len() {
            let plane = &self.planes[node.plane_id];
            let side = HyperplaneSide::from_dist(plane.point_dist(pos));

            match node.children[side as usize] {
                BspNodeChild::Node(node_id) => node = &self.nodes[node_id],
                BspNodeChild::Leaf(leaf_id) => return Some(leaf_id),
            }
        }

        None
    }

    /// Returns the bounding box of a model, in map space or converted to target space.
    pub fn model_bounds(
        &self,
        model_id: usize,
        target_space: bool,
    ) -> Option<(Vector3<f32>, Vector3<f32>)> {
        let model = self.models.get(model_id)?;
        Some(convert_bounds(model.min, model.max, target_space))
    }

    /// Returns the bounding box of a node, in map space or converted to target space.
    pub fn node_bounds(
        &self,
        node_id: usize,
        target_space: bool,
    ) -> Option<(Vector3<f32>, Vector3<f32>)> {
        let node = self.nodes.get(node_id)?;
        let v = |c: [i16; 3]| Vector3::new(c[0] as f32, c[1] as f32, c[2] as f32);
        Some(convert_bounds(v(node.min), v(node.max), target_space))
    }

    /// Generates a Graphviz description of the node tree below `node_id`.
    pub fn gen_dot_graph(&self, node_id: usize) -> String {
        let mut dot = String::new();
        dot += "digraph bsp {\n";
        dot += "    rankdir=LR\n";

        let mut rank_lists: Vec<Vec<usize>> = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![(node_id, 0)];

        while let Some((n, rank)) = stack.pop() {
            if n >= self.nodes.len() || !visited.insert(n) {
                continue;
            }

            if rank >= rank_lists.len() {
                rank_lists.push(Vec::new());
            }
            rank_lists[rank].push(n);

            for child in self.nodes[n].children.iter().rev() {
                match *child {
                    BspNodeChild::Node(c) => {
                        dot += &format!("    n{} -> n{}\n", n, c);
                        stack.push((c, rank + 1));
                    }
                    BspNodeChild::Leaf(l) => dot += &format!("    n{} -> l{}\n", n, l),
                }
            }
        }

        for rank in rank_lists {
            let names: Vec<String> = rank.iter().map(|n| format!("n{}", n)).collect();
            dot += &format!("    {{rank=same;{}}}\n", names.join(","));
        }

        dot += "}\n";

        dot
    }
}

fn convert_bounds(
    min: Vector3<f32>,
    max: Vector3<f32>,
    target_space: bool,
) -> (Vector3<f32>, Vector3<f32>) {
    if target_space {
        math::bounds_to_target_space(min, max)
    } else {
        (min, max)
    }
}
