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

use std::ops::Neg;

use cgmath::{Deg, InnerSpace, Vector3, Zero};

/// Number of target units in one map unit.
pub const TARGET_UNITS_PER_MAP_UNIT: f32 = 1.905;

/// Points closer than this to a clipping plane are considered to lie on it.
pub const CLIP_EPSILON: f32 = 0.01;

/// Half-extent of the quad produced by [`Winding::for_plane`].
pub const BASE_WINDING_EXTENT: f32 = 65536.0;

const COLLINEAR_EPSILON: f32 = 0.0001;

/// Converts a point from map space into target space.
///
/// The y-axis is mirrored and every component is scaled by `TARGET_UNITS_PER_MAP_UNIT`. Because
/// the mirror flips handedness, triangles converted with this function must have their winding
/// reversed to keep facing the same way.
pub fn to_target_space(point: Vector3<f32>) -> Vector3<f32> {
    Vector3::new(point.x, -point.y, point.z) * TARGET_UNITS_PER_MAP_UNIT
}

/// Converts a point from target space back into map space.
pub fn to_map_space(point: Vector3<f32>) -> Vector3<f32> {
    Vector3::new(point.x, -point.y, point.z) / TARGET_UNITS_PER_MAP_UNIT
}

/// Converts a direction from map space into target space. Directions are mirrored but not scaled.
pub fn direction_to_target_space(dir: Vector3<f32>) -> Vector3<f32> {
    Vector3::new(dir.x, -dir.y, dir.z)
}

/// Converts a plane from map space into target space, returning the new normal and distance.
pub fn plane_to_target_space(normal: Vector3<f32>, dist: f32) -> (Vector3<f32>, f32) {
    (
        direction_to_target_space(normal),
        dist * TARGET_UNITS_PER_MAP_UNIT,
    )
}

/// Converts an axis-aligned box from map space into target space.
///
/// The corners are reordered so that `min <= max` still holds on every axis after the mirror.
pub fn bounds_to_target_space(
    min: Vector3<f32>,
    max: Vector3<f32>,
) -> (Vector3<f32>, Vector3<f32>) {
    let a = to_target_space(min);
    let b = to_target_space(max);
    (
        Vector3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
        Vector3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
    )
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Angles {
    pub pitch: Deg<f32>,
    pub yaw: Deg<f32>,
    pub roll: Deg<f32>,
}

impl Angles {
    pub fn zero() -> Angles {
        Angles {
            pitch: Deg(0.0),
            yaw: Deg(0.0),
            roll: Deg(0.0),
        }
    }

    /// Creates a set of angles from a stored (pitch, yaw, roll) triple.
    pub fn from_vector(v: Vector3<f32>) -> Angles {
        Angles {
            pitch: Deg(v.x),
            yaw: Deg(v.y),
            roll: Deg(v.z),
        }
    }

    /// Mirrors these angles across the y-axis to match [`to_target_space`].
    ///
    /// Rotations about the z- and x-axes change direction under the mirror; rotation about the
    /// mirrored axis does not.
    pub fn to_target_space(&self) -> Angles {
        Angles {
            pitch: self.pitch,
            yaw: -self.yaw,
            roll: -self.roll,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum HyperplaneSide {
    Positive = 0,
    Negative = 1,
}

impl Neg for HyperplaneSide {
    type Output = HyperplaneSide;

    fn neg(self) -> Self::Output {
        match self {
            HyperplaneSide::Positive => HyperplaneSide::Negative,
            HyperplaneSide::Negative => HyperplaneSide::Positive,
        }
    }
}

impl HyperplaneSide {
    /// Points at exactly zero distance belong to the positive (front) side.
    pub fn from_dist(dist: f32) -> HyperplaneSide {
        if dist >= 0.0 {
            HyperplaneSide::Positive
        } else {
            HyperplaneSide::Negative
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum Alignment {
    Axis(Axis),
    Normal(Vector3<f32>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Hyperplane {
    alignment: Alignment,
    dist: f32,
}

impl Neg for Hyperplane {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Hyperplane::new(-self.normal(), -self.dist)
    }
}

impl Hyperplane {
    /// Creates the plane `normal . p = dist`.
    ///
    /// Unit axis normals are stored as axial planes so that distance tests read a single
    /// component.
    pub fn new(normal: Vector3<f32>, dist: f32) -> Hyperplane {
        match normal {
            n if n == Vector3::unit_x() => Self::axis(Axis::X, dist),
            n if n == Vector3::unit_y() => Self::axis(Axis::Y, dist),
            n if n == Vector3::unit_z() => Self::axis(Axis::Z, dist),
            _ => Self::from_normal(normal, dist),
        }
    }

    /// Creates a new hyperplane aligned along the given axis, `dist` units away from the origin.
    pub fn axis(axis: Axis, dist: f32) -> Hyperplane {
        Hyperplane {
            alignment: Alignment::Axis(axis),
            dist,
        }
    }

    /// Creates the plane `normal . p = dist` without the axial shortcut. The normal is normalized.
    pub fn from_normal(normal: Vector3<f32>, dist: f32) -> Hyperplane {
        Hyperplane {
            alignment: Alignment::Normal(normal.normalize()),
            dist,
        }
    }

    pub fn normal(&self) -> Vector3<f32> {
        match self.alignment {
            Alignment::Axis(ax) => match ax {
                Axis::X => Vector3::unit_x(),
                Axis::Y => Vector3::unit_y(),
                Axis::Z => Vector3::unit_z(),
            },
            Alignment::Normal(normal) => normal,
        }
    }

    pub fn dist(&self) -> f32 {
        self.dist
    }

    /// Signed distance from the plane to `point`, positive in front.
    pub fn point_dist(&self, point: Vector3<f32>) -> f32 {
        match self.alignment {
            Alignment::Axis(a) => point[a as usize] - self.dist,
            Alignment::Normal(n) => point.dot(n) - self.dist,
        }
    }

    /// Points on the plane count as being in front.
    pub fn point_side(&self, point: Vector3<f32>) -> HyperplaneSide {
        HyperplaneSide::from_dist(self.point_dist(point))
    }

    /// Returns `true` if `other` describes the same plane facing the opposite direction.
    pub fn is_opposite(&self, other: &Hyperplane) -> bool {
        let n = self.normal() + other.normal();
        n.magnitude2() < COLLINEAR_EPSILON && (self.dist + other.dist).abs() < CLIP_EPSILON
    }
}

/// A convex polygon lying on a plane.
///
/// Windings follow the map convention: vertices run clockwise when viewed from the front of the
/// plane.
#[derive(Clone, Debug, PartialEq)]
pub struct Winding {
    points: Vec<Vector3<f32>>,
}

impl Winding {
    pub fn new(points: Vec<Vector3<f32>>) -> Winding {
        Winding { points }
    }

    /// Creates a large square winding on the given plane.
    pub fn for_plane(plane: &Hyperplane) -> Winding {
        let normal = plane.normal();

        let mut major = 0;
        for i in 1..3 {
            if normal[i].abs() > normal[major].abs() {
                major = i;
            }
        }

        let up = match major {
            2 => Vector3::unit_x(),
            _ => Vector3::unit_z(),
        };
        let up = (up - normal * up.dot(normal)).normalize() * BASE_WINDING_EXTENT;
        let right = up.cross(normal).normalize() * BASE_WINDING_EXTENT;
        let origin = normal * plane.dist();

        Winding {
            points: vec![
                origin - right + up,
                origin + right + up,
                origin + right - up,
                origin - right - up,
            ],
        }
    }

    pub fn points(&self) -> &[Vector3<f32>] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Vector3<f32>> {
        self.points
    }

    /// Clips this winding to the negative side of `plane`.
    ///
    /// Returns `None` if nothing remains behind the plane.
    pub fn clip(self, plane: &Hyperplane) -> Option<Winding> {
        let dists: Vec<f32> = self.points.iter().map(|p| plane.point_dist(*p)).collect();

        let front = dists.iter().any(|d| *d > CLIP_EPSILON);
        let back = dists.iter().any(|d| *d < -CLIP_EPSILON);

        if !front {
            return Some(self);
        }

        if !back {
            return None;
        }

        let normal = plane.normal();
        let len = self.points.len();
        let mut out = Vec::with_capacity(len + 4);

        for i in 0..len {
            let p1 = self.points[i];
            let d1 = dists[i];

            if d1.abs() <= CLIP_EPSILON {
                out.push(p1);
                continue;
            }

            if d1 < 0.0 {
                out.push(p1);
            }

            let next = (i + 1) % len;
            let d2 = dists[next];
            if d2.abs() <= CLIP_EPSILON || (d2 < 0.0) == (d1 < 0.0) {
                continue;
            }

            let p2 = self.points[next];
            let ratio = d1 / (d1 - d2);
            let mut mid = p1 + (p2 - p1) * ratio;

            // snap axial planes exactly
            for c in 0..3 {
                if normal[c] == 1.0 {
                    mid[c] = plane.dist();
                } else if normal[c] == -1.0 {
                    mid[c] = -plane.dist();
                }
            }

            out.push(mid);
        }

        if out.len() < 3 {
            return None;
        }

        Some(Winding { points: out })
    }

    pub fn area(&self) -> f32 {
        polygon_area(&self.points)
    }
}

/// Calculates the area of a planar convex polygon.
pub fn polygon_area(points: &[Vector3<f32>]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }

    let mut total = Vector3::zero();
    for i in 1..points.len() - 1 {
        total += (points[i] - points[0]).cross(points[i + 1] - points[0]);
    }

    total.magnitude() * 0.5
}

/// Returns `true` if every step along `vs` heads in the same direction.
///
/// Two points are always collinear, a single point never is.
pub fn collinear(vs: &[Vector3<f32>]) -> bool {
    if vs.len() < 2 {
        return false;
    }

    let dir = (vs[1] - vs[0]).normalize();
    vs.windows(2).skip(1).all(|w| {
        let step = (w[1] - w[0]).normalize();
        (0..3).all(|c| (step[c] - dir[c]).abs() <= COLLINEAR_EPSILON)
    })
}

/// Removes every vertex that lies on the straight line between its neighbors.
///
/// The first vertex is always kept. Inputs with fewer than three vertices are returned as-is.
pub fn remove_collinear(vs: Vec<Vector3<f32>>) -> Vec<Vector3<f32>> {
    if vs.len() < 3 {
        return vs;
    }

    let len = vs.len();
    let mut out = vec![vs[0]];
    for i in 1..len {
        let tri = [vs[i - 1], vs[i], vs[(i + 1) % len]];
        if !collinear(&tri) {
            out.push(vs[i]);
        }
    }

    out
}

pub fn bounds<'a, I>(points: I) -> (Vector3<f32>, Vector3<f32>)
where
    I: IntoIterator<Item = &'a Vector3<f32>>,
{
    let mut min = Vector3::new(std::f32::INFINITY, std::f32::INFINITY, std::f32::INFINITY);
    let mut max = -min;
    for p in points.into_iter() {
        for c in 0..3 {
            min[c] = p[c].min(min[c]);
            max[c] = p[c].max(max[c]);
        }
    }
    (min, max)
}
