//! Segment Intersection Kernels
//!
//! Root finders for a directed segment against the primitive shapes, plus
//! the closest-point projections the capsule kernel builds on. Every finder
//! returns a parameter in `[0, 1]` along the segment together with the
//! contact point and an outward unit normal; a miss is `None`.

use crate::geom::{AaBox, Plane, Segment, Sphere};
use crate::math::{Scalar, Vec3};

/// A segment-vs-primitive hit.
#[derive(Clone, Copy, Debug)]
pub struct SegmentHit<S> {
    /// Parameter along the segment, 0 = origin, 1 = end point.
    pub time: S,
    /// Contact point.
    pub point: Vec3<S>,
    /// Outward unit normal at the contact.
    pub normal: Vec3<S>,
}

/// Segment vs plane.
///
/// `t = (d - n·o) / (n·dir)`; parameters outside `[0, 1]` and parallel
/// segments miss.
pub fn segment_plane<S: Scalar>(seg: &Segment<S>, plane: &Plane<S>) -> Option<SegmentHit<S>> {
    let denom = plane.normal.dot(seg.direction);
    if denom == S::zero() {
        return None;
    }
    let t = (plane.distance - plane.normal.dot(seg.origin)) / denom;
    if t < S::zero() || t > S::one() {
        return None;
    }
    Some(SegmentHit {
        time: t,
        point: seg.at(t),
        normal: plane.normal,
    })
}

/// Segment vs sphere.
///
/// Solves the quadratic in `t`. When the segment starts inside the sphere
/// the *exit* point is returned, so a contained segment never reports a
/// stalling zero-advance hit.
pub fn segment_sphere<S: Scalar>(seg: &Segment<S>, sphere: &Sphere<S>) -> Option<SegmentHit<S>> {
    let zero = S::zero();
    let one = S::one();

    let diff = seg.origin - sphere.origin;
    let a = seg.direction.length_squared();
    if a <= zero {
        return None;
    }

    let b = diff.dot(seg.direction);
    let c = diff.length_squared() - sphere.radius * sphere.radius;

    let discr = b * b - a * c;
    let time;
    let point;
    if discr < zero {
        return None;
    } else if discr > zero {
        let root = discr.sqrt();
        let inv_a = one / a;
        let time1 = (-b - root) * inv_a;
        let time2 = (-b + root) * inv_a;

        if time1 > one || time2 < zero {
            return None;
        } else if time1 >= zero {
            time = time1;
        } else {
            // Started inside the sphere; use the exit point
            time = time2;
        }
        point = seg.at(time);
    } else {
        let t = -b / a;
        if t < zero || t > one {
            return None;
        }
        time = t;
        point = seg.at(time);
    }

    let normal = (point - sphere.origin).normalize();
    Some(SegmentHit {
        time,
        point,
        normal,
    })
}

/// Segment vs axis-aligned box, slab method.
///
/// The entry face supplies the normal (±X/±Y/±Z). An origin strictly inside
/// the box reports an immediate `t = 0` contact at the origin.
pub fn segment_aa_box<S: Scalar>(seg: &Segment<S>, bx: &AaBox<S>) -> Option<SegmentHit<S>> {
    let zero = S::zero();
    let one = S::one();
    let neg_one = -one;

    let so = seg.origin;
    let sd = seg.direction;

    let mut inside = true;
    // 0 = below mins, 1 = above maxs, 2 = between
    let (mut qx, mut qy, mut qz) = (2u8, 2u8, 2u8);
    let (mut cand_x, mut cand_y, mut cand_z) = (zero, zero, zero);
    let (mut cnorm_x, mut cnorm_y, mut cnorm_z) = (neg_one, neg_one, neg_one);

    if so.x <= bx.mins.x {
        qx = 0;
        cand_x = bx.mins.x;
        inside = false;
    } else if so.x >= bx.maxs.x {
        qx = 1;
        cand_x = bx.maxs.x;
        cnorm_x = one;
        inside = false;
    }
    if so.y <= bx.mins.y {
        qy = 0;
        cand_y = bx.mins.y;
        inside = false;
    } else if so.y >= bx.maxs.y {
        qy = 1;
        cand_y = bx.maxs.y;
        cnorm_y = one;
        inside = false;
    }
    if so.z <= bx.mins.z {
        qz = 0;
        cand_z = bx.mins.z;
        inside = false;
    } else if so.z >= bx.maxs.z {
        qz = 1;
        cand_z = bx.maxs.z;
        cnorm_z = one;
        inside = false;
    }

    if inside {
        return Some(SegmentHit {
            time: zero,
            point: so,
            normal: Vec3::zero(),
        });
    }

    // Per-axis entry candidates; -1 marks "not a candidate"
    let max_tx = if qx != 2 && sd.x != zero {
        (cand_x - so.x) / sd.x
    } else {
        neg_one
    };
    let max_ty = if qy != 2 && sd.y != zero {
        (cand_y - so.y) / sd.y
    } else {
        neg_one
    };
    let max_tz = if qz != 2 && sd.z != zero {
        (cand_z - so.z) / sd.z
    } else {
        neg_one
    };

    let which_plane;
    let time;
    let mut normal = Vec3::zero();
    if max_tx > max_ty && max_tx > max_tz {
        which_plane = 0;
        time = max_tx;
        normal.x = cnorm_x;
    } else if max_ty > max_tz {
        which_plane = 1;
        time = max_ty;
        normal.y = cnorm_y;
    } else {
        which_plane = 2;
        time = max_tz;
        normal.z = cnorm_z;
    }

    if time < zero || time > one {
        return None;
    }

    let mut point = Vec3::zero();
    if which_plane != 0 {
        point.x = so.x + time * sd.x;
        if point.x < bx.mins.x || point.x > bx.maxs.x {
            return None;
        }
    } else {
        point.x = cand_x;
    }
    if which_plane != 1 {
        point.y = so.y + time * sd.y;
        if point.y < bx.mins.y || point.y > bx.maxs.y {
            return None;
        }
    } else {
        point.y = cand_y;
    }
    if which_plane != 2 {
        point.z = so.z + time * sd.z;
        if point.z < bx.mins.z || point.z > bx.maxs.z {
            return None;
        }
    } else {
        point.z = cand_z;
    }

    Some(SegmentHit {
        time,
        point,
        normal,
    })
}

/// Closest point on `seg` to `point`, optionally clamped to the segment.
pub fn closest_point_on_segment<S: Scalar>(
    seg: &Segment<S>,
    point: Vec3<S>,
    limit_to_segment: bool,
) -> Vec3<S> {
    let o = seg.origin;
    let d = seg.direction;
    let zero = S::zero();

    if d.x == zero && d.y == zero && d.z == zero {
        return o;
    }

    let mut u = d.dot(point - o) / d.length_squared();
    if limit_to_segment {
        u = S::clamp_val(zero, S::one(), u);
    }
    o + d * u
}

/// Closest points between two segments.
///
/// Returns `(point_on_seg1, point_on_seg2)`. Near-parallel configurations
/// fall back to projecting one origin onto the other segment.
pub fn closest_points_between_segments<S: Scalar>(
    seg1: &Segment<S>,
    seg2: &Segment<S>,
    epsilon: S,
) -> (Vec3<S>, Vec3<S>) {
    let zero = S::zero();
    let one = S::one();

    let a = seg1.direction.dot(seg1.direction);
    let b = seg1.direction.dot(seg2.direction);
    let c = seg2.direction.dot(seg2.direction);

    if a <= epsilon {
        let p1 = seg1.origin;
        let p2 = closest_point_on_segment(seg2, p1, true);
        return (p1, p2);
    } else if c < epsilon {
        let p2 = seg2.origin;
        let p1 = closest_point_on_segment(seg1, p2, true);
        return (p1, p2);
    }

    let w = seg1.origin - seg2.origin;
    let d = seg1.direction.dot(w);
    let e = seg2.direction.dot(w);
    let denom = a * c - b * b;

    let mut u1n;
    let mut u2n;
    let mut u1d = denom;
    let mut u2d = denom;

    if denom < S::from_milli(1) {
        u1n = zero;
        u1d = one;
        u2n = e;
        u2d = c;
    } else {
        u1n = b * e - c * d;
        u2n = a * e - b * d;

        if u1n < zero {
            u1n = zero;
            u2n = e;
            u2d = c;
        } else if u1n > u1d {
            u1n = u1d;
            u2n = e + b;
            u2d = c;
        }
    }

    if u2n < zero {
        u2n = zero;
        if -d < zero {
            u1n = zero;
        } else if -d > a {
            u1n = u1d;
        } else {
            u1n = -d;
            u1d = a;
        }
    } else if u2n > u2d {
        u2n = u2d;
        if (-d + b) < zero {
            u1n = zero;
        } else if (-d + b) > a {
            u1n = u1d;
        } else {
            u1n = -d + b;
            u1d = a;
        }
    }

    let u1 = u1n / u1d;
    let u2 = u2n / u2d;

    (seg1.at(u1), seg2.at(u2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Fix16;

    #[test]
    fn test_ray_box() {
        fn check<S: Scalar>() {
            let bx = AaBox::<S>::from_radius(S::one());
            let seg =
                Segment::from_start_dir(Vec3::from_int(-5, 0, 0), Vec3::from_int(10, 0, 0));
            let hit = segment_aa_box(&seg, &bx).expect("should hit");
            let t = hit.time.to_f32();
            assert!(t > 0.3 && t < 0.5, "t = {t}");
            assert!(hit.normal.x < S::zero());
        }
        check::<f32>();
        check::<Fix16>();
    }

    #[test]
    fn test_ray_box_origin_inside() {
        let bx = AaBox::<f32>::from_radius(1.0);
        let seg = Segment::from_start_dir(Vec3::zero(), Vec3::from_int(10, 0, 0));
        let hit = segment_aa_box(&seg, &bx).unwrap();
        assert_eq!(hit.time, 0.0);
        assert_eq!(hit.point, Vec3::zero());
    }

    #[test]
    fn test_ray_box_miss() {
        let bx = AaBox::<f32>::from_radius(1.0);
        let seg =
            Segment::from_start_dir(Vec3::from_int(-5, 5, 0), Vec3::from_int(10, 0, 0));
        assert!(segment_aa_box(&seg, &bx).is_none());
    }

    #[test]
    fn test_ray_sphere() {
        fn check<S: Scalar>() {
            let sph = Sphere::<S>::from_radius(S::one());
            let seg =
                Segment::from_start_dir(Vec3::from_int(-5, 0, 0), Vec3::from_int(10, 0, 0));
            let hit = segment_sphere(&seg, &sph).expect("should hit");
            let t = hit.time.to_f32();
            assert!(t > 0.3 && t < 0.5, "t = {t}");
        }
        check::<f32>();
        check::<Fix16>();
    }

    #[test]
    fn test_ray_sphere_through_center_times_sum() {
        // Entry and exit parameters of a center ray are symmetric about the
        // midpoint parameter.
        let sph = Sphere::<f32>::from_radius(1.0);
        let seg = Segment::from_start_dir(Vec3::from_int(-5, 0, 0), Vec3::from_int(10, 0, 0));
        let entry = segment_sphere(&seg, &sph).unwrap().time;

        // The reversed ray enters where the forward ray exits, so the
        // forward exit parameter is 1 minus the reversed entry. Entry and
        // exit must straddle the midpoint parameter (0.5) symmetrically.
        let reversed =
            Segment::from_start_dir(Vec3::from_int(5, 0, 0), Vec3::from_int(-10, 0, 0));
        let exit = 1.0 - segment_sphere(&reversed, &sph).unwrap().time;
        assert!((entry + exit - 2.0 * 0.5).abs() < 0.01);
    }

    #[test]
    fn test_ray_sphere_inside_returns_exit() {
        let sph = Sphere::<f32>::from_radius(1.0);
        let seg = Segment::from_start_dir(Vec3::zero(), Vec3::from_int(10, 0, 0));
        let hit = segment_sphere(&seg, &sph).unwrap();
        // Exit at x = 1, t = 0.1
        assert!((hit.time - 0.1).abs() < 0.001);
        assert!((hit.point.x - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_segment_plane() {
        let pl = Plane::new(Vec3::<f32>::unit_z(), 0.0);
        let seg =
            Segment::from_start_end(Vec3::from_int(0, 0, 2), Vec3::from_int(0, 0, -2));
        let hit = segment_plane(&seg, &pl).unwrap();
        assert!((hit.time - 0.5).abs() < 0.001);
        assert_eq!(hit.normal, Vec3::unit_z());

        // Parallel segment misses
        let par = Segment::from_start_dir(Vec3::from_int(0, 0, 2), Vec3::unit_x());
        assert!(segment_plane(&par, &pl).is_none());
    }

    #[test]
    fn test_closest_point_on_segment() {
        let seg =
            Segment::<f32>::from_start_end(Vec3::from_int(0, 0, 0), Vec3::from_int(10, 0, 0));
        let p = closest_point_on_segment(&seg, Vec3::from_int(3, 5, 0), true);
        assert_eq!(p, Vec3::from_int(3, 0, 0));
        // Clamped to the segment end
        let q = closest_point_on_segment(&seg, Vec3::from_int(20, 1, 0), true);
        assert_eq!(q, Vec3::from_int(10, 0, 0));
    }

    #[test]
    fn test_closest_points_between_segments() {
        let a = Segment::<f32>::from_start_end(Vec3::from_int(-5, 0, 0), Vec3::from_int(5, 0, 0));
        let b =
            Segment::<f32>::from_start_end(Vec3::from_int(0, -5, 3), Vec3::from_int(0, 5, 3));
        let (p1, p2) = closest_points_between_segments(&a, &b, 0.0001);
        assert!((p1 - Vec3::zero()).length() < 0.01);
        assert!((p2 - Vec3::new(0.0, 0.0, 3.0)).length() < 0.01);
    }
}
