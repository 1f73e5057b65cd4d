//! Solids
//!
//! A [`Solid`] is the dynamic unit of the simulation: a position, a
//! velocity, a mass, a set of shapes, and the coefficients the step loop
//! reads. Solids are owned by the simulator and addressed by the `usize`
//! id returned from `Simulator::add_solid`.
//!
//! A solid is configured freely before it is added; afterwards, state
//! writes that must wake the body (position, velocity, force, shapes)
//! should go through the simulator's setters.

use core::fmt;

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::collision::CollisionListener;
use crate::geom::AaBox;
use crate::math::{Scalar, Vec3};
use crate::shape::Shape;

/// The dynamic unit of the simulation.
pub struct Solid<S: Scalar> {
    /// User scope bits; `update` can filter on these.
    pub scope: u32,
    /// Engine-reserved bits, OR-ed into collision reports for zero-time
    /// contacts.
    pub internal_scope: u32,
    /// Bits this body exposes to traces.
    pub collision_scope: u32,
    /// Bits this body searches for when it moves.
    pub collide_with_scope: u32,

    /// Mass; 0 is massless, [`Solid::infinite_mass`] is immovable.
    pub mass: S,
    /// Cached 1/mass; 0 when the mass is 0 or infinite.
    pub inv_mass: S,

    /// Position of the shape-list origin in world space.
    pub position: Vec3<S>,
    /// Velocity.
    pub velocity: Vec3<S>,
    /// Force accumulated for the next step; cleared after integration.
    pub force: Vec3<S>,

    /// Gravity multiplier (1 = normal, 0 = unaffected).
    pub gravity_scale: S,
    /// Coefficient of restitution.
    pub restitution: S,
    /// When set, this body's restitution is used alone instead of the
    /// pair mean.
    pub restitution_override: bool,
    /// Coulomb static friction coefficient.
    pub static_friction: S,
    /// Coulomb dynamic friction coefficient.
    pub dynamic_friction: S,
    /// Linear drag coefficient against the fluid velocity.
    pub drag: S,

    /// Collision listener, invoked during report delivery.
    pub listener: Option<Box<dyn CollisionListener<S>>>,

    /// Whether the body is scheduled by the step loop.
    pub active: bool,
    /// Consecutive near-still steps; −1 pins the body awake.
    pub deactivate_count: i32,
    /// Gate for the manager's per-solid hooks and response override.
    pub do_update_callback: bool,
    /// Millisecond dt of the most recent step that touched this body.
    pub last_dt: i32,

    shapes: Vec<Shape<S>>,
    shape_kinds: u32,
    local_bound: AaBox<S>,
    world_bound: AaBox<S>,

    pub(crate) constraints: Vec<usize>,
    pub(crate) touching: Option<usize>,
    pub(crate) touching_normal: Vec3<S>,
    pub(crate) touched1: Option<usize>,
    pub(crate) touched1_normal: Vec3<S>,
    pub(crate) touched2: Option<usize>,
    pub(crate) touched2_normal: Vec3<S>,
}

impl<S: Scalar> Solid<S> {
    /// The sentinel mass of an immovable body.
    #[inline]
    pub fn infinite_mass() -> S {
        -S::one()
    }

    /// A fresh solid: unit mass, all scopes open, restitution and friction
    /// at one half, no shapes.
    pub fn new() -> Self {
        Self {
            scope: !0,
            internal_scope: 0,
            collision_scope: !0,
            collide_with_scope: !0,
            mass: S::one(),
            inv_mass: S::one(),
            position: Vec3::zero(),
            velocity: Vec3::zero(),
            force: Vec3::zero(),
            gravity_scale: S::one(),
            restitution: S::half(),
            restitution_override: false,
            static_friction: S::half(),
            dynamic_friction: S::half(),
            drag: S::zero(),
            listener: None,
            active: true,
            deactivate_count: 0,
            do_update_callback: false,
            last_dt: 0,
            shapes: Vec::new(),
            shape_kinds: 0,
            local_bound: AaBox::default(),
            world_bound: AaBox::default(),
            constraints: Vec::new(),
            touching: None,
            touching_normal: Vec3::zero(),
            touched1: None,
            touched1_normal: Vec3::zero(),
            touched2: None,
            touched2_normal: Vec3::zero(),
        }
    }

    /// Set the mass and refresh the cached inverse.
    pub fn set_mass(&mut self, mass: S) {
        self.mass = mass;
        self.inv_mass = if mass > S::zero() {
            S::one() / mass
        } else {
            S::zero()
        };
    }

    /// Make the body immovable.
    pub fn set_infinite_mass(&mut self) {
        self.mass = Self::infinite_mass();
        self.inv_mass = S::zero();
    }

    /// True when the body is immovable.
    #[inline]
    pub fn has_infinite_mass(&self) -> bool {
        self.mass == Self::infinite_mass()
    }

    /// Append a shape and refresh the bounds.
    pub fn add_shape(&mut self, shape: Shape<S>) {
        self.shapes.push(shape);
        self.update_local_bound();
    }

    /// Remove the shape at `index` and refresh the bounds.
    pub fn remove_shape(&mut self, index: usize) -> Shape<S> {
        let s = self.shapes.remove(index);
        self.update_local_bound();
        s
    }

    /// Drop all shapes.
    pub fn clear_shapes(&mut self) {
        self.shapes.clear();
        self.update_local_bound();
    }

    /// The shape list.
    #[inline]
    pub fn shapes(&self) -> &[Shape<S>] {
        &self.shapes
    }

    /// OR of the kind bits of all attached shapes.
    #[inline]
    pub fn shape_kinds(&self) -> u32 {
        self.shape_kinds
    }

    /// Bound of all shapes in the body frame.
    #[inline]
    pub fn local_bound(&self) -> &AaBox<S> {
        &self.local_bound
    }

    /// `local_bound` translated to the current position.
    #[inline]
    pub fn world_bound(&self) -> &AaBox<S> {
        &self.world_bound
    }

    /// The solid this body has persistently contacted, if any.
    #[inline]
    pub fn touching(&self) -> Option<usize> {
        self.touching
    }

    /// Contact normal of the persistent contact.
    #[inline]
    pub fn touching_normal(&self) -> Vec3<S> {
        self.touching_normal
    }

    /// Recompute `local_bound` (and `world_bound`) from the shape list.
    pub fn update_local_bound(&mut self) {
        self.shape_kinds = 0;
        if self.shapes.is_empty() {
            self.local_bound = AaBox::default();
        } else {
            self.shape_kinds = self.shapes[0].kind_bit();
            self.local_bound = self.shapes[0].bound();
            for shape in &self.shapes[1..] {
                self.shape_kinds |= shape.kind_bit();
                let b = shape.bound();
                self.local_bound.merge(&b);
            }
        }
        self.world_bound = self.local_bound.translated(self.position);
    }

    /// Write the position and refresh `world_bound`, without waking the
    /// body. The step loop uses this for its end-of-step write.
    #[inline]
    pub fn set_position_direct(&mut self, position: Vec3<S>) {
        self.position = position;
        self.world_bound = self.local_bound.translated(position);
    }

    /// Reset the local part of the wake state. The simulator's
    /// `activate` also wakes constraint partners.
    pub(crate) fn wake_local(&mut self) {
        if self.deactivate_count > 0 {
            self.deactivate_count = 0;
        }
        self.active = true;
    }
}

impl<S: Scalar> Default for Solid<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Scalar> fmt::Debug for Solid<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solid")
            .field("position", &self.position)
            .field("velocity", &self.velocity)
            .field("mass", &self.mass)
            .field("active", &self.active)
            .field("shapes", &self.shapes.len())
            .finish()
    }
}
