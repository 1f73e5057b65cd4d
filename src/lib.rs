//! swept: Deterministic Swept-Collision Physics
//!
//! A rigid-body engine specialized for *continuous* collision detection
//! against simple primitives — axis-aligned boxes, spheres, capsules, and
//! convex half-space intersections. Bodies move through time in discrete
//! steps, and each step is resolved as a sequence of swept traces, so a
//! fast-moving body never tunnels through thin static geometry.
//!
//! # Features
//!
//! - **Two interchangeable scalar backends**: IEEE-754 `f32` and the Q16.16
//!   fixed-point [`Fix16`]. With fixed-point arithmetic and snap-to-grid
//!   enabled, trajectories are bit-reproducible across platforms.
//! - **Swept traces with Minkowski expansion**: shape-vs-shape sweeps
//!   reduce to ray-vs-primitive root finding.
//! - **Slide response**: contacts resolve with a single-impulse restitution
//!   model, then the leftover motion slides along the surface (at most five
//!   sub-iterations per step).
//! - **Translational only**: no orientation state, by design.
//! - **Pluggable broad phase**: the engine scans linearly by default; a
//!   [`Manager`] hook lets an external spatial index answer box queries.
//!
//! # Example
//!
//! ```
//! use swept::{Shape, Simulator, Solid, Sphere, Vec3};
//!
//! let mut sim = Simulator::<f32>::new();
//!
//! // A static floor
//! let mut floor = Solid::new();
//! floor.set_infinite_mass();
//! floor.gravity_scale = 0.0;
//! floor.add_shape(Shape::AaBox(swept::AaBox::new(
//!     Vec3::from_int(-10, -10, -1),
//!     Vec3::from_int(10, 10, 0),
//! )));
//! sim.add_solid(floor);
//!
//! // A bouncing ball
//! let mut ball = Solid::new();
//! ball.add_shape(Shape::Sphere(Sphere::from_radius(0.5)));
//! ball.position = Vec3::from_int(0, 0, 5);
//! let ball = sim.add_solid(ball);
//!
//! // Step 2 seconds in 10 ms increments
//! for _ in 0..200 {
//!     sim.update(10, 0, None);
//! }
//! assert!(sim.solid(ball).unwrap().position.z > 0.0);
//! ```
//!
//! # Modules
//!
//! - [`fixed`]: the Q16.16 fixed-point scalar
//! - [`math`]: the [`Scalar`] trait, epsilon state, and [`Vec3`]
//! - [`geom`]: primitive shapes and bounds
//! - [`intersect`]: segment-vs-primitive root finders
//! - [`shape`]: the shape sum type and the [`Traceable`] hook
//! - [`collision`]: collision records and listeners
//! - [`solid`]: the dynamic unit
//! - [`constraint`]: spring/damper links
//! - [`manager`]: the broad-phase / lifecycle hook
//! - [`simulator`]: the step loop

#![warn(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod collision;
pub mod constraint;
pub mod fixed;
pub mod geom;
pub mod intersect;
pub mod manager;
pub mod math;
pub mod shape;
pub mod simulator;
pub mod solid;

pub use collision::{Collision, CollisionListener};
pub use constraint::{Constraint, ConstraintEnd};
pub use fixed::Fix16;
pub use geom::{AaBox, Capsule, ConvexSolid, Plane, Segment, Sphere};
pub use manager::Manager;
pub use math::{Epsilon, Scalar, Vec3};
pub use shape::{Shape, Traceable};
pub use simulator::{Integrator, Simulator, SCOPE_REPORT_COLLISIONS};
pub use solid::Solid;
