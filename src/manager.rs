//! Broad-Phase Manager Hook
//!
//! The engine's only spatial index is a linear scan; a [`Manager`] lets an
//! external structure (grid, BVH, world database) answer box queries and
//! contribute its own trace results, and gives game code lifecycle hooks
//! around the step.
//!
//! All methods have default no-op implementations, so a manager overrides
//! only what it needs.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::collision::Collision;
use crate::geom::{AaBox, Segment};
use crate::math::{Scalar, Vec3};
use crate::solid::Solid;

/// External broad-phase and lifecycle hook.
pub trait Manager<S: Scalar> {
    /// Fill `found` with ids of solids whose world bound touches `bound`.
    ///
    /// Return the number found, or −1 to abstain, in which case the
    /// simulator falls back to a linear scan over its own solids.
    fn find_solids_in_aa_box(&mut self, bound: &AaBox<S>, found: &mut Vec<usize>) -> i32 {
        let _ = (bound, found);
        -1
    }

    /// Contribute to a segment trace. Merge a hit into `result` if earlier.
    fn trace_segment(&mut self, result: &mut Collision<S>, seg: &Segment<S>, collide_with: u32) {
        let _ = (result, seg, collide_with);
    }

    /// Contribute to a swept-solid trace. Merge a hit into `result` if
    /// earlier.
    fn trace_solid(
        &mut self,
        result: &mut Collision<S>,
        solid: &Solid<S>,
        seg: &Segment<S>,
        collide_with: u32,
    ) {
        let _ = (result, solid, seg, collide_with);
    }

    /// Called once before any solid is integrated.
    fn pre_update(&mut self, dt_ms: i32, dt: S) {
        let _ = (dt_ms, dt);
    }

    /// Called once after report delivery.
    fn post_update(&mut self, dt_ms: i32, dt: S) {
        let _ = (dt_ms, dt);
    }

    /// Called before a solid with `do_update_callback` is integrated.
    fn pre_update_solid(&mut self, solid: &mut Solid<S>, dt_ms: i32, dt: S) {
        let _ = (solid, dt_ms, dt);
    }

    /// Called between a solid's integration and its swept-collision loop.
    fn intra_update_solid(&mut self, solid: &mut Solid<S>, dt_ms: i32, dt: S) {
        let _ = (solid, dt_ms, dt);
    }

    /// Called after a solid finished its step.
    fn post_update_solid(&mut self, solid: &mut Solid<S>, dt_ms: i32, dt: S) {
        let _ = (solid, dt_ms, dt);
    }

    /// Override the impulse response for a contact. Return `true` when the
    /// collision has been handled; `position` and `remainder` may be
    /// adjusted in place.
    fn collision_response(
        &mut self,
        solid: &mut Solid<S>,
        position: &mut Vec3<S>,
        remainder: &mut Vec3<S>,
        collision: &Collision<S>,
    ) -> bool {
        let _ = (solid, position, remainder, collision);
        false
    }
}
