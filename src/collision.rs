//! Collision Records and Listeners
//!
//! A [`Collision`] describes the earliest contact found along a swept trace.
//! Records are buffered during a step and delivered to listeners after all
//! integrations, so listeners observe a consistent world.

use crate::math::{Scalar, Vec3};

/// Result of a swept trace.
///
/// `time` is the parameter along the traced segment in `[0, 1]`; `time == 1`
/// means no contact. For body-vs-body traces `impact` is where on the moving
/// body the contact occurs, distinct from the segment-intersection `point`
/// at its center.
#[derive(Clone, Copy, Debug)]
pub struct Collision<S> {
    /// Contact time along the segment; 1 = miss.
    pub time: S,
    /// World-space contact point along the traced path.
    pub point: Vec3<S>,
    /// Unit normal pointing away from the obstacle.
    pub normal: Vec3<S>,
    /// Contact location on the moving body's surface.
    pub impact: Vec3<S>,
    /// Relative velocity at contact, filled at report time.
    pub velocity: Vec3<S>,
    /// The moving solid.
    pub collider: Option<usize>,
    /// The solid that was hit.
    pub collidee: Option<usize>,
    /// Union of the zero-time contact scopes of all contributors.
    pub scope: u32,
}

impl<S: Scalar> Collision<S> {
    /// A fresh no-contact record (`time == 1`).
    pub fn miss() -> Self {
        Self {
            time: S::one(),
            point: Vec3::zero(),
            normal: Vec3::zero(),
            impact: Vec3::zero(),
            velocity: Vec3::zero(),
            collider: None,
            collidee: None,
            scope: 0,
        }
    }

    /// True when a contact was found.
    #[inline]
    pub fn hit(&self) -> bool {
        self.time < S::one()
    }

    /// Flip the record's point of view: swap collider and collidee and
    /// negate the normal and relative velocity.
    pub fn invert(&mut self) {
        core::mem::swap(&mut self.collider, &mut self.collidee);
        self.normal = -self.normal;
        self.velocity = -self.velocity;
    }
}

/// Receives collision reports for a solid.
///
/// `on_collision` is invoked once per body per contact per step, with
/// `collision.collider` set to the listening body and the normal pointing
/// away from the other body.
pub trait CollisionListener<S: Scalar> {
    /// Called for each buffered contact after the step's integrations.
    fn on_collision(&mut self, collision: &Collision<S>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_record() {
        let c = Collision::<f32>::miss();
        assert!(!c.hit());
        assert_eq!(c.scope, 0);
        assert!(c.collider.is_none());
    }

    #[test]
    fn test_invert_swaps_and_negates() {
        let mut c = Collision::<f32>::miss();
        c.collider = Some(3);
        c.collidee = Some(7);
        c.normal = Vec3::unit_z();
        c.velocity = Vec3::new(1.0, 0.0, -2.0);
        c.invert();
        assert_eq!(c.collider, Some(7));
        assert_eq!(c.collidee, Some(3));
        assert_eq!(c.normal, -Vec3::unit_z());
        assert_eq!(c.velocity, Vec3::new(-1.0, 0.0, 2.0));
    }
}
