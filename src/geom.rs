//! Geometry Primitives
//!
//! Plain value types the collision kernels work with: axis-aligned box,
//! sphere, capsule, segment, plane, and convex half-space intersection.
//! All of them are aggregates of the scalar type and translate by vector
//! addition/subtraction.

use crate::math::{Scalar, Vec3};

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

// ============================================================================
// Axis-aligned box
// ============================================================================

/// Axis-aligned box given by its two extreme corners.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AaBox<S> {
    /// Minimum corner.
    pub mins: Vec3<S>,
    /// Maximum corner.
    pub maxs: Vec3<S>,
}

impl<S: Scalar> AaBox<S> {
    /// Create from corners.
    #[inline]
    pub fn new(mins: Vec3<S>, maxs: Vec3<S>) -> Self {
        Self { mins, maxs }
    }

    /// Cube of half-extent `radius` centered at the origin.
    #[inline]
    pub fn from_radius(radius: S) -> Self {
        Self {
            mins: Vec3::new(-radius, -radius, -radius),
            maxs: Vec3::new(radius, radius, radius),
        }
    }

    /// Grow to cover another box.
    pub fn merge(&mut self, other: &AaBox<S>) {
        self.mins.x = S::min_val(self.mins.x, other.mins.x);
        self.mins.y = S::min_val(self.mins.y, other.mins.y);
        self.mins.z = S::min_val(self.mins.z, other.mins.z);
        self.maxs.x = S::max_val(self.maxs.x, other.maxs.x);
        self.maxs.y = S::max_val(self.maxs.y, other.maxs.y);
        self.maxs.z = S::max_val(self.maxs.z, other.maxs.z);
    }

    /// Grow to cover a point.
    pub fn merge_point(&mut self, p: Vec3<S>) {
        self.mins.x = S::min_val(self.mins.x, p.x);
        self.mins.y = S::min_val(self.mins.y, p.y);
        self.mins.z = S::min_val(self.mins.z, p.z);
        self.maxs.x = S::max_val(self.maxs.x, p.x);
        self.maxs.y = S::max_val(self.maxs.y, p.y);
        self.maxs.z = S::max_val(self.maxs.z, p.z);
    }

    /// Expand every face outward by `amount`.
    pub fn expand(&mut self, amount: S) {
        self.mins.x -= amount;
        self.mins.y -= amount;
        self.mins.z -= amount;
        self.maxs.x += amount;
        self.maxs.y += amount;
        self.maxs.z += amount;
    }

    /// Translated copy.
    #[inline]
    pub fn translated(&self, v: Vec3<S>) -> Self {
        Self {
            mins: self.mins + v,
            maxs: self.maxs + v,
        }
    }

    /// True if `point` lies inside or on the boundary.
    #[inline]
    pub fn contains(&self, point: Vec3<S>) -> bool {
        point.x >= self.mins.x
            && point.y >= self.mins.y
            && point.z >= self.mins.z
            && point.x <= self.maxs.x
            && point.y <= self.maxs.y
            && point.z <= self.maxs.z
    }

    /// True if the two boxes overlap (closed intervals).
    #[inline]
    pub fn intersects(&self, other: &AaBox<S>) -> bool {
        !(self.mins.x > other.maxs.x
            || self.mins.y > other.maxs.y
            || self.mins.z > other.maxs.z
            || other.mins.x > self.maxs.x
            || other.mins.y > self.maxs.y
            || other.mins.z > self.maxs.z)
    }

    /// Support point: the corner furthest along `dir`.
    #[inline]
    pub fn support(&self, dir: Vec3<S>) -> Vec3<S> {
        Vec3::new(
            if dir.x < S::zero() { self.mins.x } else { self.maxs.x },
            if dir.y < S::zero() { self.mins.y } else { self.maxs.y },
            if dir.z < S::zero() { self.mins.z } else { self.maxs.z },
        )
    }
}

// ============================================================================
// Sphere
// ============================================================================

/// Sphere given by origin and radius.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sphere<S> {
    /// Center point.
    pub origin: Vec3<S>,
    /// Radius.
    pub radius: S,
}

impl<S: Scalar> Sphere<S> {
    /// Create from origin and radius.
    #[inline]
    pub fn new(origin: Vec3<S>, radius: S) -> Self {
        Self { origin, radius }
    }

    /// Sphere of `radius` at the origin.
    #[inline]
    pub fn from_radius(radius: S) -> Self {
        Self {
            origin: Vec3::zero(),
            radius,
        }
    }

    /// Translated copy.
    #[inline]
    pub fn translated(&self, v: Vec3<S>) -> Self {
        Self {
            origin: self.origin + v,
            radius: self.radius,
        }
    }

    /// True if `point` lies inside or on the surface.
    #[inline]
    pub fn contains(&self, point: Vec3<S>) -> bool {
        (point - self.origin).length_squared() <= self.radius * self.radius
    }

    /// Axis-aligned bound.
    pub fn bound(&self) -> AaBox<S> {
        AaBox::from_radius(self.radius).translated(self.origin)
    }

    /// Support point: radially along `dir` (normalized internally).
    #[inline]
    pub fn support(&self, dir: Vec3<S>) -> Vec3<S> {
        self.origin + dir.normalize() * self.radius
    }
}

// ============================================================================
// Capsule
// ============================================================================

/// Capsule: a segment from `origin` to `origin + direction`, inflated by
/// `radius`. The direction encodes the core length.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Capsule<S> {
    /// Start of the core segment.
    pub origin: Vec3<S>,
    /// Core segment direction; the far cap sits at `origin + direction`.
    pub direction: Vec3<S>,
    /// Radius around the core.
    pub radius: S,
}

impl<S: Scalar> Capsule<S> {
    /// Create from origin, direction and radius.
    #[inline]
    pub fn new(origin: Vec3<S>, direction: Vec3<S>, radius: S) -> Self {
        Self {
            origin,
            direction,
            radius,
        }
    }

    /// Translated copy.
    #[inline]
    pub fn translated(&self, v: Vec3<S>) -> Self {
        Self {
            origin: self.origin + v,
            direction: self.direction,
            radius: self.radius,
        }
    }

    /// Axis-aligned bound: the sphere bound stretched along the signed
    /// components of `direction`.
    pub fn bound(&self) -> AaBox<S> {
        let r = self.radius;
        let d = self.direction;
        let mut b = AaBox::default();

        if d.x < S::zero() {
            b.mins.x = d.x - r;
            b.maxs.x = r;
        } else {
            b.mins.x = -r;
            b.maxs.x = d.x + r;
        }
        if d.y < S::zero() {
            b.mins.y = d.y - r;
            b.maxs.y = r;
        } else {
            b.mins.y = -r;
            b.maxs.y = d.y + r;
        }
        if d.z < S::zero() {
            b.mins.z = d.z - r;
            b.maxs.z = r;
        } else {
            b.mins.z = -r;
            b.maxs.z = d.z + r;
        }

        b.translated(self.origin)
    }

    /// Support point: radial offset plus whichever core endpoint aligns
    /// better with `dir`.
    #[inline]
    pub fn support(&self, dir: Vec3<S>) -> Vec3<S> {
        let radial = dir.normalize() * self.radius;
        if self.direction.dot(dir) > S::zero() {
            self.origin + self.direction + radial
        } else {
            self.origin + radial
        }
    }
}

// ============================================================================
// Segment
// ============================================================================

/// Directed segment from `origin` to `origin + direction`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Segment<S> {
    /// Start point.
    pub origin: Vec3<S>,
    /// Offset to the end point.
    pub direction: Vec3<S>,
}

impl<S: Scalar> Segment<S> {
    /// Build from start and end points.
    #[inline]
    pub fn from_start_end(start: Vec3<S>, end: Vec3<S>) -> Self {
        Self {
            origin: start,
            direction: end - start,
        }
    }

    /// Build from start point and direction.
    #[inline]
    pub fn from_start_dir(start: Vec3<S>, dir: Vec3<S>) -> Self {
        Self {
            origin: start,
            direction: dir,
        }
    }

    /// End point.
    #[inline]
    pub fn end_point(&self) -> Vec3<S> {
        self.origin + self.direction
    }

    /// Point at parameter `t`.
    #[inline]
    pub fn at(&self, t: S) -> Vec3<S> {
        self.origin + self.direction * t
    }
}

// ============================================================================
// Plane
// ============================================================================

/// Plane `dot(normal, p) == distance`, normal pointing outward.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Plane<S> {
    /// Outward unit normal.
    pub normal: Vec3<S>,
    /// Signed distance from the origin along the normal.
    pub distance: S,
}

impl<S: Scalar> Plane<S> {
    /// Create from normal and signed distance.
    #[inline]
    pub fn new(normal: Vec3<S>, distance: S) -> Self {
        Self { normal, distance }
    }

    /// True if `point` lies on the inner (non-normal) side or on the plane.
    #[inline]
    pub fn contains(&self, point: Vec3<S>) -> bool {
        point.dot(self.normal) <= self.distance
    }

    /// Signed distance of `point` above the plane.
    #[inline]
    pub fn height(&self, point: Vec3<S>) -> S {
        point.dot(self.normal) - self.distance
    }
}

// ============================================================================
// Convex half-space intersection
// ============================================================================

/// Convex solid described as an intersection of outward half-spaces.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConvexSolid<S> {
    /// Ordered list of bounding planes, normals pointing outward.
    pub planes: Vec<Plane<S>>,
}

impl<S: Scalar> ConvexSolid<S> {
    /// Create from a plane list.
    pub fn new(planes: Vec<Plane<S>>) -> Self {
        Self { planes }
    }

    /// True if `point` lies inside every half-space.
    pub fn contains(&self, point: Vec3<S>) -> bool {
        self.planes.iter().all(|p| p.height(point) <= S::zero())
    }

    /// Axis-aligned bound, found by intersecting all unordered plane
    /// triples and keeping the vertices that lie within every other
    /// half-space (within `epsilon`).
    pub fn bound(&self, epsilon: S) -> AaBox<S> {
        let mut result = AaBox::default();
        let planes = &self.planes;
        let n = planes.len();
        let mut first_vertex = true;

        for i in 0..n.saturating_sub(2) {
            for j in (i + 1)..n.saturating_sub(1) {
                for k in (j + 1)..n {
                    let Some(v) =
                        intersection_of_three_planes(&planes[i], &planes[j], &planes[k], epsilon)
                    else {
                        continue;
                    };
                    let legal = (0..n)
                        .filter(|&l| l != i && l != j && l != k)
                        .all(|l| planes[l].height(v) <= epsilon);
                    if legal {
                        if first_vertex {
                            result.mins = v;
                            result.maxs = v;
                            first_vertex = false;
                        } else {
                            result.merge_point(v);
                        }
                    }
                }
            }
        }

        result
    }
}

/// Intersection point of three planes via Cramer's rule.
///
/// Returns `None` when the determinant magnitude is below `epsilon`
/// (planes near-parallel).
pub fn intersection_of_three_planes<S: Scalar>(
    p1: &Plane<S>,
    p2: &Plane<S>,
    p3: &Plane<S>,
    epsilon: S,
) -> Option<Vec3<S>> {
    let p2xp3 = p2.normal.cross(p3.normal);
    let den = p1.normal.dot(p2xp3);
    if den < epsilon && den > -epsilon {
        return None;
    }

    let p3xp1 = p3.normal.cross(p1.normal);
    let p1xp2 = p1.normal.cross(p2.normal);
    let sum = p1xp2 * p3.distance + p2xp3 * p1.distance + p3xp1 * p2.distance;
    Some(sum / den)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Fix16;

    #[cfg(not(feature = "std"))]
    use alloc::vec;

    fn unit_box<S: Scalar>() -> AaBox<S> {
        AaBox::new(Vec3::from_int(-1, -1, -1), Vec3::from_int(1, 1, 1))
    }

    #[test]
    fn test_point_in_box() {
        let b = unit_box::<f32>();
        assert!(b.contains(Vec3::zero()));
        assert!(!b.contains(Vec3::from_int(2, 0, 0)));

        let bf = unit_box::<Fix16>();
        assert!(bf.contains(Vec3::zero()));
        assert!(!bf.contains(Vec3::from_int(2, 0, 0)));
    }

    #[test]
    fn test_box_box_intersection() {
        let a = unit_box::<f32>();
        let b = AaBox::new(Vec3::zero(), Vec3::from_int(2, 2, 2));
        let c = AaBox::new(Vec3::from_int(3, 3, 3), Vec3::from_int(4, 4, 4));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_box_translate_round_trip() {
        let b = unit_box::<Fix16>();
        let v = Vec3::<Fix16>::from_milli(1500, -2250, 775);
        let back = b.translated(v).translated(-v);
        assert_eq!(back, b);

        let bf = unit_box::<f32>();
        let vf = Vec3::<f32>::new(1.5, -2.25, 0.75);
        assert_eq!(bf.translated(vf).translated(-vf), bf);
    }

    #[test]
    fn test_capsule_bound_stretches_along_direction() {
        let c = Capsule::<f32>::new(Vec3::zero(), Vec3::new(0.0, 0.0, -2.0), 0.5);
        let b = c.bound();
        assert_eq!(b.mins.z, -2.5);
        assert_eq!(b.maxs.z, 0.5);
        assert_eq!(b.mins.x, -0.5);
        assert_eq!(b.maxs.x, 0.5);
    }

    #[test]
    fn test_box_support_picks_corner() {
        let b = unit_box::<f32>();
        let s = b.support(Vec3::new(-1.0, 1.0, -1.0));
        assert_eq!(s, Vec3::new(-1.0, 1.0, -1.0));
    }

    #[test]
    fn test_capsule_support_picks_aligned_end() {
        let c = Capsule::<f32>::new(Vec3::zero(), Vec3::new(0.0, 0.0, 2.0), 0.5);
        let up = c.support(Vec3::unit_z());
        assert_eq!(up.z, 2.5);
        let down = c.support(-Vec3::unit_z());
        assert_eq!(down.z, -0.5);
    }

    #[test]
    fn test_three_plane_intersection() {
        // The +X/+Y/+Z faces of the unit cube meet at (1, 1, 1)
        let px = Plane::new(Vec3::<f32>::unit_x(), 1.0);
        let py = Plane::new(Vec3::<f32>::unit_y(), 1.0);
        let pz = Plane::new(Vec3::<f32>::unit_z(), 1.0);
        let v = intersection_of_three_planes(&px, &py, &pz, 0.0001).unwrap();
        assert!((v - Vec3::from_int(1, 1, 1)).length() < 0.001);

        // Two parallel planes never meet
        let px2 = Plane::new(Vec3::<f32>::unit_x(), 2.0);
        assert!(intersection_of_three_planes(&px, &px2, &py, 0.0001).is_none());
    }

    #[test]
    fn test_convex_bound_of_cube() {
        let one = 1.0f32;
        let cube = ConvexSolid::new(vec![
            Plane::new(Vec3::unit_x(), one),
            Plane::new(-Vec3::unit_x(), one),
            Plane::new(Vec3::unit_y(), one),
            Plane::new(-Vec3::unit_y(), one),
            Plane::new(Vec3::unit_z(), one),
            Plane::new(-Vec3::unit_z(), one),
        ]);
        let b = cube.bound(0.0001);
        assert!((b.mins - Vec3::from_int(-1, -1, -1)).length() < 0.01);
        assert!((b.maxs - Vec3::from_int(1, 1, 1)).length() < 0.01);
        assert!(cube.contains(Vec3::zero()));
        assert!(!cube.contains(Vec3::from_int(2, 0, 0)));
    }

    #[test]
    fn test_segment_end_point() {
        let s = Segment::<f32>::from_start_end(Vec3::from_int(1, 0, 0), Vec3::from_int(4, 0, 0));
        assert_eq!(s.direction, Vec3::from_int(3, 0, 0));
        assert_eq!(s.end_point(), Vec3::from_int(4, 0, 0));
    }
}
