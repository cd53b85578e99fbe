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

//! A target-space copy of the node tree for point queries after import.

use crate::common::{
    bsp::{BspContents, BspData, BspNodeChild},
    math::{self, Hyperplane, HyperplaneSide},
};

use cgmath::Vector3;

#[derive(Clone, Debug)]
pub struct SpatialNode {
    pub plane: Hyperplane,
    /// Front and back children.
    pub children: [BspNodeChild; 2],
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

#[derive(Clone, Debug)]
pub struct SpatialLeaf {
    pub contents: BspContents,
    pub cluster: Option<usize>,
    pub area: u16,
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

/// The map's node tree converted into target space.
///
/// Node and leaf indices are the same as in the source map.
#[derive(Clone, Debug)]
pub struct SpatialIndex {
    root: usize,
    nodes: Vec<SpatialNode>,
    leaves: Vec<SpatialLeaf>,
    visibility: Option<Vec<Vec<usize>>>,
}

fn int_bounds(min: [i16; 3], max: [i16; 3]) -> (Vector3<f32>, Vector3<f32>) {
    let v = |c: [i16; 3]| Vector3::new(c[0] as f32, c[1] as f32, c[2] as f32);
    math::bounds_to_target_space(v(min), v(max))
}

impl SpatialIndex {
    /// Builds an index over the subtree rooted at `node_id`.
    pub fn from_tree(bsp: &BspData, node_id: usize) -> SpatialIndex {
        let nodes = bsp
            .nodes()
            .iter()
            .map(|node| {
                let plane = &bsp.planes()[node.plane_id];
                let (normal, dist) = math::plane_to_target_space(plane.normal(), plane.dist());
                let (min, max) = int_bounds(node.min, node.max);

                SpatialNode {
                    plane: Hyperplane::new(normal, dist),
                    children: node.children,
                    min,
                    max,
                }
            })
            .collect();

        let leaves = bsp
            .leaves()
            .iter()
            .map(|leaf| {
                let (min, max) = int_bounds(leaf.min, leaf.max);
                SpatialLeaf {
                    contents: leaf.contents,
                    cluster: leaf.cluster,
                    area: leaf.area,
                    min,
                    max,
                }
            })
            .collect();

        SpatialIndex {
            root: node_id,
            nodes,
            leaves,
            visibility: bsp.visibility().map(|v| v.to_vec()),
        }
    }

    pub fn nodes(&self) -> &[SpatialNode] {
        &self.nodes
    }

    pub fn leaves(&self) -> &[SpatialLeaf] {
        &self.leaves
    }

    /// Returns the index of the leaf containing a target-space point.
    pub fn leaf_at(&self, point: Vector3<f32>) -> Option<usize> {
        let mut node = self.nodes.get(self.root)?;

        for _ in 0..=self.nodes.len() {
            let side = node.plane.point_side(point);
            let child = match side {
                HyperplaneSide::Positive => node.children[0],
                HyperplaneSide::Negative => node.children[1],
            };

            match child {
                BspNodeChild::Node(n) => node = self.nodes.get(n)?,
                BspNodeChild::Leaf(l) => return Some(l),
            }
        }

        None
    }

    pub fn cluster_at(&self, point: Vector3<f32>) -> Option<usize> {
        self.leaves.get(self.leaf_at(point)?)?.cluster
    }

    /// Returns the clusters visible from `cluster`, if visibility was parsed.
    pub fn visible_clusters(&self, cluster: usize) -> Option<&[usize]> {
        self.visibility
            .as_ref()
            .and_then(|v| v.get(cluster))
            .map(|c| c.as_slice())
    }

    /// Returns `true` if the cluster containing `to` is visible from the cluster containing
    /// `from`. Without visibility data every pair of clusters is considered visible.
    pub fn point_visible(&self, from: Vector3<f32>, to: Vector3<f32>) -> bool {
        let (a, b) = match (self.cluster_at(from), self.cluster_at(to)) {
            (Some(a), Some(b)) => (a, b),
            _ => return false,
        };

        match self.visibility {
            Some(_) => self
                .visible_clusters(a)
                .map(|v| v.contains(&b))
                .unwrap_or(false),
            None => true,
        }
    }
}
