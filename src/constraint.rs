//! Spring/Damper Constraints
//!
//! A [`Constraint`] links a solid either to another solid or to a fixed
//! world point. Each step it contributes `k·Δx + c·Δv` to the anchored
//! bodies, where Δx is scaled down to zero inside the rest distance.

use crate::math::{Scalar, Vec3};

/// The far endpoint of a constraint.
#[derive(Clone, Copy, Debug)]
pub enum ConstraintEnd<S> {
    /// Anchored to another solid.
    Solid(usize),
    /// Anchored to a fixed world point (treated as having zero velocity).
    Point(Vec3<S>),
}

/// Two-endpoint spring/damper link.
#[derive(Clone, Debug)]
pub struct Constraint<S: Scalar> {
    /// The solid the constraint starts at.
    pub start: usize,
    /// The far endpoint.
    pub end: ConstraintEnd<S>,
    /// Spring constant k.
    pub spring_constant: S,
    /// Damping constant c.
    pub damping_constant: S,
    /// Separation below which the spring applies no force.
    pub rest_distance: S,
}

impl<S: Scalar> Constraint<S> {
    /// Link two solids.
    pub fn between(start: usize, end: usize) -> Self {
        Self {
            start,
            end: ConstraintEnd::Solid(end),
            spring_constant: S::one(),
            damping_constant: S::one(),
            rest_distance: S::one(),
        }
    }

    /// Link a solid to a fixed world point.
    pub fn to_point(start: usize, point: Vec3<S>) -> Self {
        Self {
            start,
            end: ConstraintEnd::Point(point),
            spring_constant: S::one(),
            damping_constant: S::one(),
            rest_distance: S::one(),
        }
    }

    /// Set the spring constant.
    pub fn with_spring(mut self, k: S) -> Self {
        self.spring_constant = k;
        self
    }

    /// Set the damping constant.
    pub fn with_damping(mut self, c: S) -> Self {
        self.damping_constant = c;
        self
    }

    /// Set the rest distance.
    pub fn with_rest_distance(mut self, d: S) -> Self {
        self.rest_distance = d;
        self
    }

    /// The endpoint opposite `solid`, when it is another solid.
    pub(crate) fn partner_of(&self, solid: usize) -> Option<usize> {
        if self.start != solid {
            Some(self.start)
        } else if let ConstraintEnd::Solid(end) = self.end {
            Some(end)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let c = Constraint::<f32>::between(0, 1)
            .with_spring(10.0)
            .with_damping(1.0)
            .with_rest_distance(2.0);
        assert_eq!(c.spring_constant, 10.0);
        assert_eq!(c.damping_constant, 1.0);
        assert_eq!(c.rest_distance, 2.0);
    }

    #[test]
    fn test_partner_lookup() {
        let c = Constraint::<f32>::between(3, 8);
        assert_eq!(c.partner_of(3), Some(8));
        assert_eq!(c.partner_of(8), Some(3));

        let p = Constraint::<f32>::to_point(3, Vec3::zero());
        assert_eq!(p.partner_of(3), None);
        assert_eq!(p.partner_of(9), Some(3));
    }
}
