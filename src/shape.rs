//! Collision Shapes
//!
//! A [`Shape`] is one variant per supported primitive plus a hook variant
//! for externally-implemented geometry (meshes, heightfields). Shapes are
//! owned by solids; `Traceable` handles are reference-counted and may be
//! shared between solids.

use core::fmt;

#[cfg(not(feature = "std"))]
use alloc::rc::Rc;
#[cfg(feature = "std")]
use std::rc::Rc;

use crate::collision::Collision;
use crate::geom::{AaBox, Capsule, ConvexSolid, Segment, Sphere};
use crate::math::{Scalar, Vec3};
use crate::solid::Solid;

/// Shape kind bit for axis-aligned boxes.
pub const SHAPE_AA_BOX: u32 = 1 << 0;
/// Shape kind bit for spheres.
pub const SHAPE_SPHERE: u32 = 1 << 1;
/// Shape kind bit for capsules.
pub const SHAPE_CAPSULE: u32 = 1 << 2;
/// Shape kind bit for convex solids.
pub const SHAPE_CONVEX: u32 = 1 << 3;
/// Shape kind bit for traceable hooks.
pub const SHAPE_TRACEABLE: u32 = 1 << 4;

/// External shape implementation.
///
/// Results are in world coordinates. For [`Traceable::trace_solid`] the hook
/// assumes it is the *stationary* party; the dispatcher inverts the result
/// when the traceable is the moving shape.
pub trait Traceable<S: Scalar> {
    /// Axis-aligned bound in the owning solid's local frame.
    fn bound(&self) -> AaBox<S>;

    /// Trace a bare segment against this shape placed at `position`.
    fn trace_segment(&self, result: &mut Collision<S>, position: &Vec3<S>, seg: &Segment<S>);

    /// Trace the swept solid `moving` against this shape placed at
    /// `position`.
    fn trace_solid(
        &self,
        result: &mut Collision<S>,
        moving: &Solid<S>,
        position: &Vec3<S>,
        seg: &Segment<S>,
    );
}

/// A collision shape in the owning solid's local frame.
pub enum Shape<S: Scalar> {
    /// Axis-aligned box.
    AaBox(AaBox<S>),
    /// Sphere.
    Sphere(Sphere<S>),
    /// Capsule.
    Capsule(Capsule<S>),
    /// Convex half-space intersection.
    Convex(ConvexSolid<S>),
    /// Externally-implemented geometry.
    Traceable(Rc<dyn Traceable<S>>),
}

impl<S: Scalar> Shape<S> {
    /// Kind bit of this shape (see the `SHAPE_*` constants).
    pub fn kind_bit(&self) -> u32 {
        match self {
            Shape::AaBox(_) => SHAPE_AA_BOX,
            Shape::Sphere(_) => SHAPE_SPHERE,
            Shape::Capsule(_) => SHAPE_CAPSULE,
            Shape::Convex(_) => SHAPE_CONVEX,
            Shape::Traceable(_) => SHAPE_TRACEABLE,
        }
    }

    /// Axis-aligned bound in the owning solid's local frame.
    pub fn bound(&self) -> AaBox<S> {
        match self {
            Shape::AaBox(b) => *b,
            Shape::Sphere(s) => s.bound(),
            Shape::Capsule(c) => c.bound(),
            Shape::Convex(cs) => cs.bound(S::default_epsilon().value),
            Shape::Traceable(t) => t.bound(),
        }
    }
}

impl<S: Scalar> Clone for Shape<S> {
    fn clone(&self) -> Self {
        match self {
            Shape::AaBox(b) => Shape::AaBox(*b),
            Shape::Sphere(s) => Shape::Sphere(*s),
            Shape::Capsule(c) => Shape::Capsule(*c),
            Shape::Convex(cs) => Shape::Convex(cs.clone()),
            Shape::Traceable(t) => Shape::Traceable(Rc::clone(t)),
        }
    }
}

impl<S: Scalar> fmt::Debug for Shape<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::AaBox(b) => f.debug_tuple("AaBox").field(b).finish(),
            Shape::Sphere(s) => f.debug_tuple("Sphere").field(s).finish(),
            Shape::Capsule(c) => f.debug_tuple("Capsule").field(c).finish(),
            Shape::Convex(cs) => f.debug_tuple("Convex").field(cs).finish(),
            Shape::Traceable(_) => f.write_str("Traceable(..)"),
        }
    }
}
