//! The Step Loop
//!
//! [`Simulator`] owns the solids and constraints and advances them through
//! time in discrete millisecond steps. Each step integrates every active
//! solid, then resolves its motion as a sequence of swept traces so that a
//! fast body never tunnels through thin geometry: trace to the earliest
//! contact, respond with an impulse, slide the remainder along the surface,
//! repeat (at most five times).
//!
//! # Determinism
//!
//! With the [`Fix16`](crate::Fix16) scalar backend and snap-to-grid enabled,
//! stepping the same initial state with the same dt sequence is bit-exact
//! across platforms and runs.

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::collision::Collision;
use crate::constraint::{Constraint, ConstraintEnd};
use crate::geom::{AaBox, Capsule, ConvexSolid, Segment, Sphere};
use crate::intersect::{closest_points_between_segments, segment_aa_box, segment_sphere};
use crate::manager::Manager;
use crate::math::{Epsilon, Scalar, Vec3};
use crate::shape::Shape;
use crate::solid::Solid;

/// Scope bit that requests buffered collision reports to be delivered at
/// the end of `update`. Reserved out of the user range (top bit).
pub const SCOPE_REPORT_COLLISIONS: u32 = 1 << 31;

/// Capacity of the per-step collision report ring.
const COLLISION_RING_CAPACITY: usize = 64;

/// Integration rule used for the per-step advance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Integrator {
    /// One force evaluation per step.
    Euler,
    /// Midpoint rule; two evaluations averaged with weight dt/2.
    Improved,
    /// Two evaluations at dt and 2·dt/3, blended (k₁ + 3k₂)·dt/4.
    ///
    /// The asymmetric tableau is intentional; the engine's behavior is
    /// tuned against it.
    #[default]
    Heun,
    /// Classical 4th-order Runge–Kutta.
    RungeKutta,
}

/// Deterministic swept-collision simulator over a scalar backend `S`.
pub struct Simulator<S: Scalar> {
    integrator: Integrator,
    gravity: Vec3<S>,
    fluid_velocity: Vec3<S>,
    epsilon: Epsilon<S>,
    snap_enabled: bool,
    average_normals: bool,
    max_position_component: S,
    max_velocity_component: S,
    max_force_component: S,
    micro_collision_threshold: S,
    deactivate_speed: S,
    deactivate_count_threshold: i32,
    manager: Option<Box<dyn Manager<S>>>,

    solids: Vec<Option<Solid<S>>>,
    free_solids: Vec<usize>,
    constraints: Vec<Option<Constraint<S>>>,
    free_constraints: Vec<usize>,

    // Per-step scratch; steady-state stepping performs no allocations.
    collisions: Vec<Collision<S>>,
    spacials: Vec<usize>,
}

impl<S: Scalar> Simulator<S> {
    /// Create a simulator with the backend's default tuning and gravity
    /// `(0, 0, -9.810)`.
    pub fn new() -> Self {
        let epsilon = S::default_epsilon();
        Self {
            integrator: Integrator::default(),
            gravity: Vec3::new(S::zero(), S::zero(), S::from_milli(-9810)),
            fluid_velocity: Vec3::zero(),
            snap_enabled: false,
            average_normals: false,
            max_position_component: S::default_max_position_component(),
            max_velocity_component: S::default_max_velocity_component(),
            max_force_component: S::default_max_force_component(),
            micro_collision_threshold: S::one(),
            deactivate_speed: S::default_deactivate_speed(&epsilon),
            deactivate_count_threshold: 4,
            epsilon,
            manager: None,
            solids: Vec::new(),
            free_solids: Vec::new(),
            constraints: Vec::new(),
            free_constraints: Vec::new(),
            collisions: Vec::with_capacity(COLLISION_RING_CAPACITY),
            spacials: Vec::new(),
        }
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Replace the epsilon state.
    pub fn set_epsilon(&mut self, epsilon: Epsilon<S>) {
        self.epsilon = epsilon;
    }

    /// Current epsilon state.
    pub fn epsilon(&self) -> &Epsilon<S> {
        &self.epsilon
    }

    /// Select the integration rule.
    pub fn set_integrator(&mut self, integrator: Integrator) {
        self.integrator = integrator;
    }

    /// Current integration rule.
    pub fn integrator(&self) -> Integrator {
        self.integrator
    }

    /// Enable quantization of post-collision positions onto the ε grid.
    /// Required for bit-reproducible fixed-point trajectories.
    pub fn set_snap_to_grid(&mut self, snap: bool) {
        self.snap_enabled = snap;
    }

    /// Whether grid snapping is enabled.
    pub fn snap_to_grid(&self) -> bool {
        self.snap_enabled
    }

    /// Average normals of simultaneous contacts instead of keeping one.
    pub fn set_average_normals(&mut self, average: bool) {
        self.average_normals = average;
    }

    /// Whether simultaneous contact normals are averaged.
    pub fn average_normals(&self) -> bool {
        self.average_normals
    }

    /// Set the per-component position bound.
    pub fn set_max_position_component(&mut self, v: S) {
        self.max_position_component = v;
    }

    /// Set the per-component velocity bound.
    pub fn set_max_velocity_component(&mut self, v: S) {
        self.max_velocity_component = v;
    }

    /// Set the per-component force bound.
    pub fn set_max_force_component(&mut self, v: S) {
        self.max_force_component = v;
    }

    /// Set the gravity vector and wake every solid.
    pub fn set_gravity(&mut self, gravity: Vec3<S>) {
        self.gravity = gravity;
        for slot in self.solids.iter_mut().flatten() {
            slot.wake_local();
        }
    }

    /// Current gravity vector.
    pub fn gravity(&self) -> Vec3<S> {
        self.gravity
    }

    /// Set the ambient fluid velocity seen by drag.
    pub fn set_fluid_velocity(&mut self, v: Vec3<S>) {
        self.fluid_velocity = v;
    }

    /// Current fluid velocity.
    pub fn fluid_velocity(&self) -> Vec3<S> {
        self.fluid_velocity
    }

    /// Install or clear the broad-phase manager hook.
    pub fn set_manager(&mut self, manager: Option<Box<dyn Manager<S>>>) {
        self.manager = manager;
    }

    /// Closing speeds below this threshold collide with zero restitution,
    /// which kills micro-bounce jitter on resting contacts.
    pub fn set_micro_collision_threshold(&mut self, t: S) {
        self.micro_collision_threshold = t;
    }

    /// Current micro-collision threshold.
    pub fn micro_collision_threshold(&self) -> S {
        self.micro_collision_threshold
    }

    /// Set the per-axis displacement below which a step counts as still.
    pub fn set_deactivate_speed(&mut self, speed: S) {
        self.deactivate_speed = speed;
    }

    /// Set how many consecutive still steps deactivate a solid.
    pub fn set_deactivate_count(&mut self, count: i32) {
        self.deactivate_count_threshold = count;
    }

    // ========================================================================
    // Solid management
    // ========================================================================

    /// Add a solid; returns its id. The solid starts awake.
    pub fn add_solid(&mut self, mut solid: Solid<S>) -> usize {
        solid.wake_local();
        let position = solid.position;
        solid.set_position_direct(position);
        let id = match self.free_solids.pop() {
            Some(slot) => {
                self.solids[slot] = Some(solid);
                slot
            }
            None => {
                self.solids.push(Some(solid));
                self.solids.len() - 1
            }
        };
        log::debug!("added solid {id}");
        id
    }

    /// Remove a solid, detaching its constraints and scrubbing it from all
    /// touch histories and pending collision records.
    pub fn remove_solid(&mut self, id: usize) -> Option<Solid<S>> {
        let solid = self.solids.get_mut(id)?.take()?;

        for cid in solid.constraints.clone() {
            self.remove_constraint(cid);
        }

        for other in self.solids.iter_mut().flatten() {
            if other.touching == Some(id) {
                other.touching = None;
            }
            if other.touched1 == Some(id) {
                other.touched1 = None;
            }
            if other.touched2 == Some(id) {
                other.touched2 = None;
            }
        }

        for record in &mut self.collisions {
            if record.collider == Some(id) {
                record.collider = None;
            }
            if record.collidee == Some(id) {
                record.collidee = None;
            }
        }

        self.free_solids.push(id);
        log::debug!("removed solid {id}");
        Some(solid)
    }

    /// Borrow a solid.
    #[inline]
    pub fn solid(&self, id: usize) -> Option<&Solid<S>> {
        self.solids.get(id).and_then(Option::as_ref)
    }

    /// Mutably borrow a solid. Direct writes do not wake the body; use the
    /// simulator's setters for writes that should.
    #[inline]
    pub fn solid_mut(&mut self, id: usize) -> Option<&mut Solid<S>> {
        self.solids.get_mut(id).and_then(Option::as_mut)
    }

    /// Number of live solids.
    pub fn solid_count(&self) -> usize {
        self.solids.iter().filter(|s| s.is_some()).count()
    }

    /// Number of live, active solids.
    pub fn active_solid_count(&self) -> usize {
        self.solids
            .iter()
            .flatten()
            .filter(|s| s.active)
            .count()
    }

    /// Ids of all live solids, in update order.
    pub fn solid_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.solids
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|_| i))
    }

    /// Wake a solid and, transitively, its constraint partners.
    pub fn activate(&mut self, id: usize) {
        let mut stack: Vec<usize> = Vec::new();
        stack.push(id);
        while let Some(i) = stack.pop() {
            let constraint_ids = {
                let Some(s) = self.solids.get_mut(i).and_then(Option::as_mut) else {
                    continue;
                };
                if s.deactivate_count > 0 {
                    s.deactivate_count = 0;
                }
                if s.active {
                    continue;
                }
                s.active = true;
                s.constraints.clone()
            };
            for cid in constraint_ids {
                if let Some(c) = self.constraints.get(cid).and_then(Option::as_ref) {
                    if let Some(partner) = c.partner_of(i) {
                        stack.push(partner);
                    }
                }
            }
        }
    }

    /// Put a solid to sleep immediately.
    pub fn deactivate(&mut self, id: usize) {
        if let Some(s) = self.solid_mut(id) {
            s.active = false;
            s.deactivate_count = 0;
        }
    }

    /// Pin a solid awake (`stay == true`) or let it deactivate normally.
    pub fn set_stay_active(&mut self, id: usize, stay: bool) {
        if let Some(s) = self.solid_mut(id) {
            s.deactivate_count = if stay { -1 } else { 0 };
        }
        self.activate(id);
    }

    /// Set a solid's position and wake it.
    pub fn set_position(&mut self, id: usize, position: Vec3<S>) {
        if let Some(s) = self.solid_mut(id) {
            s.set_position_direct(position);
        }
        self.activate(id);
    }

    /// Set a solid's velocity and wake it.
    pub fn set_velocity(&mut self, id: usize, velocity: Vec3<S>) {
        if let Some(s) = self.solid_mut(id) {
            s.velocity = velocity;
        }
        self.activate(id);
    }

    /// Accumulate force on a solid for the next step and wake it. The
    /// accumulated force is clamped per component like position and
    /// velocity.
    pub fn apply_force(&mut self, id: usize, force: Vec3<S>) {
        let limit = self.max_force_component;
        if let Some(s) = self.solid_mut(id) {
            s.force = (s.force + force).cap(limit);
        }
        self.activate(id);
    }

    /// Attach a shape to a solid and wake it.
    pub fn add_shape(&mut self, id: usize, shape: Shape<S>) {
        if let Some(s) = self.solid_mut(id) {
            s.add_shape(shape);
        }
        self.activate(id);
    }

    // ========================================================================
    // Constraint management
    // ========================================================================

    /// Add a constraint, wiring it into both endpoints and waking them.
    pub fn add_constraint(&mut self, constraint: Constraint<S>) -> usize {
        let start = constraint.start;
        let end = match constraint.end {
            ConstraintEnd::Solid(e) => Some(e),
            ConstraintEnd::Point(_) => None,
        };
        let id = match self.free_constraints.pop() {
            Some(slot) => {
                self.constraints[slot] = Some(constraint);
                slot
            }
            None => {
                self.constraints.push(Some(constraint));
                self.constraints.len() - 1
            }
        };
        if let Some(s) = self.solid_mut(start) {
            s.constraints.push(id);
        }
        if let Some(e) = end {
            if let Some(s) = self.solid_mut(e) {
                s.constraints.push(id);
            }
        }
        self.activate(start);
        if let Some(e) = end {
            self.activate(e);
        }
        id
    }

    /// Remove a constraint, unwiring it from both endpoints and waking them.
    pub fn remove_constraint(&mut self, id: usize) -> Option<Constraint<S>> {
        let constraint = self.constraints.get_mut(id)?.take()?;
        let start = constraint.start;
        let end = match constraint.end {
            ConstraintEnd::Solid(e) => Some(e),
            ConstraintEnd::Point(_) => None,
        };
        if let Some(s) = self.solid_mut(start) {
            s.constraints.retain(|&c| c != id);
        }
        if let Some(e) = end {
            if let Some(s) = self.solid_mut(e) {
                s.constraints.retain(|&c| c != id);
            }
        }
        self.free_constraints.push(id);
        self.activate(start);
        if let Some(e) = end {
            self.activate(e);
        }
        Some(constraint)
    }

    /// Borrow a constraint.
    pub fn constraint(&self, id: usize) -> Option<&Constraint<S>> {
        self.constraints.get(id).and_then(Option::as_ref)
    }

    /// Mutably borrow a constraint (spring, damping and rest distance may
    /// be tuned freely; endpoints must not be changed in place).
    pub fn constraint_mut(&mut self, id: usize) -> Option<&mut Constraint<S>> {
        self.constraints.get_mut(id).and_then(Option::as_mut)
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Advance the world by `dt_ms` milliseconds.
    ///
    /// `scope` filters which solids step (0 = all); OR in
    /// [`SCOPE_REPORT_COLLISIONS`] to deliver buffered collision reports at
    /// the end of the step. `target` restricts the step to one solid.
    pub fn update(&mut self, dt_ms: i32, scope: u32, target: Option<usize>) {
        let fdt = S::from_milli(dt_ms);
        self.collisions.clear();

        if let Some(m) = self.manager.as_mut() {
            m.pre_update(dt_ms, fdt);
        }

        let slot_count = self.solids.len();
        let mut index = 0;
        loop {
            let id = match target {
                Some(t) => {
                    if index > 0 {
                        break;
                    }
                    t
                }
                None => {
                    if index >= slot_count {
                        break;
                    }
                    index
                }
            };
            index += 1;

            let do_callback = {
                let Some(s) = self.solids.get(id).and_then(Option::as_ref) else {
                    continue;
                };
                if !s.active || (scope != 0 && (s.scope & scope) == 0) {
                    continue;
                }
                s.do_update_callback
            };

            if let Some(s) = self.solids[id].as_mut() {
                s.last_dt = dt_ms;
            }

            if do_callback {
                if let (Some(m), Some(s)) = (self.manager.as_mut(), self.solids[id].as_mut()) {
                    m.pre_update_solid(s, dt_ms, fdt);
                }
            }

            self.update_solid(id, dt_ms, fdt);

            if do_callback {
                if let (Some(m), Some(s)) = (self.manager.as_mut(), self.solids[id].as_mut()) {
                    m.post_update_solid(s, dt_ms, fdt);
                }
            }
        }

        if scope & SCOPE_REPORT_COLLISIONS != 0 {
            self.report_collisions();
        }

        if let Some(m) = self.manager.as_mut() {
            m.post_update(dt_ms, fdt);
        }
    }

    /// Integrate one solid and resolve its motion through the swept-slide
    /// loop.
    fn update_solid(&mut self, id: usize, dt_ms: i32, fdt: S) {
        let one = S::one();
        let zero = S::zero();
        let two = S::two();

        let (start_position, collide_mask, do_callback) = {
            let s = match self.solids.get(id).and_then(Option::as_ref) {
                Some(s) => s,
                None => return,
            };
            (s.position, s.collide_with_scope, s.do_update_callback)
        };

        let mut old_pos = start_position;

        // Integrate, then cap the velocity and clear the force it consumed.
        let (mut new_pos, vel) = self.integrate(id, fdt);
        let vel = vel.cap(self.max_velocity_component);
        {
            let s = self.solids[id].as_mut().unwrap();
            s.velocity = vel;
            s.force = Vec3::zero();
        }

        if do_callback {
            if let (Some(m), Some(s)) = (self.manager.as_mut(), self.solids[id].as_mut()) {
                m.intra_update_solid(s, dt_ms, fdt);
            }
        }

        old_pos = self.snap_vec(old_pos).cap(self.max_position_component);
        new_pos = self.snap_vec(new_pos).cap(self.max_position_component);

        // Gather candidate collidees covering the whole displacement.
        if collide_mask != 0 {
            let margin = (new_pos - old_pos).max_component_abs() + self.epsilon.value;
            let mut bound = self.solids[id]
                .as_ref()
                .unwrap()
                .local_bound()
                .translated(new_pos);
            bound.expand(margin);
            self.gather_spacials(&bound);
        } else {
            self.spacials.clear();
        }

        // Swept-slide loop.
        let mut first = true;
        let mut loop_count = 0usize;
        let mut collided = false;
        let mut c = Collision::miss();

        loop {
            if !first {
                old_pos = self.snap_vec(old_pos);
                new_pos = self.snap_vec(new_pos);
                if (new_pos - old_pos).is_within(self.epsilon.value) {
                    new_pos = old_pos;
                    break;
                }
            }

            let path = Segment::from_start_end(old_pos, new_pos);
            self.trace_solid_with_current_spacials(id, &path, collide_mask, &mut c);

            if !(c.time < one) {
                break;
            }
            collided = true;

            let contact = self.snap_vec(c.point);
            let travelled = contact - old_pos;
            old_pos = self.epsilon_offset(travelled, c.normal) + contact;
            let mut left_over = new_pos - old_pos;

            // Buffer the contact for report delivery. Repeated hits against
            // the current touching partner are not re-reported.
            let (self_velocity, self_touching, self_has_listener, self_collision_scope) = {
                let s = self.solids[id].as_ref().unwrap();
                (s.velocity, s.touching, s.listener.is_some(), s.collision_scope)
            };
            let hit_has_listener = c
                .collidee
                .and_then(|h| self.solids.get(h).and_then(Option::as_ref))
                .is_some_and(|h| h.listener.is_some());
            if c.collidee != self_touching && (self_has_listener || hit_has_listener) {
                let mut record = c;
                record.collider = Some(id);
                record.velocity = match c.collidee.and_then(|h| self.solid(h)) {
                    Some(hit) => self_velocity - hit.velocity,
                    None => self_velocity,
                };
                if self.collisions.len() < COLLISION_RING_CAPACITY {
                    self.collisions.push(record);
                } else {
                    log::warn!("collision report ring full; contact dropped");
                }
            }

            let hit = c.collidee;

            let mut responded = false;
            if do_callback {
                if let (Some(m), Some(s)) = (self.manager.as_mut(), self.solids[id].as_mut()) {
                    responded = m.collision_response(s, &mut old_pos, &mut left_over, &c);
                }
            }

            if !responded {
                // Conservation of momentum along the contact normal.
                let (s_mass, s_inv_mass, s_restitution, s_override, s_velocity) = {
                    let s = self.solids[id].as_ref().unwrap();
                    (s.mass, s.inv_mass, s.restitution, s.restitution_override, s.velocity)
                };
                let hit_state = hit
                    .and_then(|h| self.solids.get(h).and_then(Option::as_ref))
                    .map(|h| (h.mass, h.inv_mass, h.restitution, h.velocity, h.collide_with_scope));

                let mut cor = if s_override || hit_state.is_none() {
                    s_restitution
                } else {
                    (s_restitution + hit_state.unwrap().2) / two
                };

                let relative = match hit_state {
                    Some((_, _, _, hit_velocity, _)) => hit_velocity - s_velocity,
                    None => -s_velocity,
                };

                if relative.dot(c.normal) < self.micro_collision_threshold {
                    cor = zero;
                }

                let numerator = (one + cor) * relative.dot(c.normal);
                let infinite = Solid::<S>::infinite_mass();
                let mut reaction = Vec3::zero();

                if s_mass != zero && hit_state.map_or(true, |h| h.0 != zero) {
                    let inv_hit_mass = hit_state.map_or(zero, |h| h.1);
                    let inv_sum = s_inv_mass + inv_hit_mass;
                    let impulse = if inv_sum != zero { numerator / inv_sum } else { zero };

                    if s_mass != infinite {
                        let s = self.solids[id].as_mut().unwrap();
                        s.velocity += c.normal * (impulse * s_inv_mass);
                    }
                    if let Some((hit_mass, ..)) = hit_state {
                        if hit_mass != infinite {
                            reaction = c.normal * (impulse * inv_hit_mass);
                        }
                    }
                } else if hit_state.is_some() {
                    reaction = c.normal * numerator;
                } else if s_mass == zero {
                    let s = self.solids[id].as_mut().unwrap();
                    s.velocity += c.normal * numerator;
                }

                if let (Some(h), Some((.., hit_collide_with))) = (hit, hit_state) {
                    let significant = reaction.x.abs() >= self.deactivate_speed
                        || reaction.y.abs() >= self.deactivate_speed
                        || reaction.z.abs() >= self.deactivate_speed;
                    if (hit_collide_with & self_collision_scope) != 0 && significant {
                        self.activate(h);
                        if let Some(hs) = self.solids[h].as_mut() {
                            hs.velocity -= reaction;
                        }
                    }
                }
            }

            // Touch history: a partner must repeat in two consecutive
            // iterations before it counts as "touching".
            {
                let s = self.solids[id].as_mut().unwrap();
                s.touched2 = s.touched1;
                s.touched2_normal = s.touched1_normal;
                if s.touched1 == c.collidee {
                    s.touching = c.collidee;
                    s.touching_normal = c.normal;
                } else {
                    s.touched1 = c.collidee;
                    s.touched1_normal = c.normal;
                    s.touching = None;
                }
            }

            if left_over.is_within(self.epsilon.value) {
                new_pos = old_pos;
                break;
            } else if loop_count > 4 {
                self.solids[id].as_mut().unwrap().velocity = Vec3::zero();
                new_pos = old_pos;
                break;
            } else {
                let velocity = self.solids[id].as_ref().unwrap().velocity;
                match velocity.normalize_carefully(self.epsilon.value) {
                    None => {
                        new_pos = old_pos;
                        break;
                    }
                    Some(direction) => {
                        let mut slide = direction * left_over.length();
                        slide -= c.normal * slide.dot(c.normal);
                        new_pos = old_pos + slide;
                    }
                }
                first = false;
            }
            loop_count += 1;
        }

        // A clean first trace ends any touch streak.
        if !collided {
            let s = self.solids[id].as_mut().unwrap();
            s.touching = None;
            s.touched1 = None;
            s.touched2 = None;
        }

        // Deactivation: enough consecutive near-still steps put the body to
        // sleep, unless an attached constraint partner is still moving.
        let deactivate_count = self.solids[id].as_ref().unwrap().deactivate_count;
        if deactivate_count >= 0 {
            let displacement = new_pos - start_position;
            if displacement.x.abs() < self.deactivate_speed
                && displacement.y.abs() < self.deactivate_speed
                && displacement.z.abs() < self.deactivate_speed
            {
                let threshold = self.deactivate_count_threshold;
                let count = {
                    let s = self.solids[id].as_mut().unwrap();
                    s.deactivate_count += 1;
                    s.deactivate_count
                };
                if count > threshold {
                    let constraint_ids = self.solids[id].as_ref().unwrap().constraints.clone();
                    let mut partner_moving = false;
                    for cid in constraint_ids {
                        let partner = self
                            .constraints
                            .get(cid)
                            .and_then(Option::as_ref)
                            .and_then(|con| con.partner_of(id));
                        if let Some(p) = partner.and_then(|p| self.solid(p)) {
                            if p.active && p.deactivate_count <= threshold {
                                partner_moving = true;
                                break;
                            }
                        }
                    }
                    if !partner_moving {
                        let s = self.solids[id].as_mut().unwrap();
                        s.active = false;
                        s.deactivate_count = 0;
                        log::debug!("solid {id} deactivated");
                    }
                }
            } else {
                self.solids[id].as_mut().unwrap().deactivate_count = 0;
            }
        }

        self.solids[id].as_mut().unwrap().set_position_direct(new_pos);
    }

    // ========================================================================
    // Integration
    // ========================================================================

    /// Run the configured integration rule from the solid's current state.
    /// Returns the proposed position and velocity.
    fn integrate(&self, id: usize, fdt: S) -> (Vec3<S>, Vec3<S>) {
        let s = self.solids[id].as_ref().unwrap();
        let x0 = s.position;
        let v0 = s.velocity;
        let zero = Vec3::zero();
        let two = S::two();

        match self.integrator {
            Integrator::Euler => {
                let (dx1, dv1) = self.integration_step(id, x0, v0, zero, zero, fdt);
                (x0 + dx1 * fdt, v0 + dv1 * fdt)
            }
            Integrator::Improved => {
                let half_dt = fdt / two;
                let (dx1, dv1) = self.integration_step(id, x0, v0, zero, zero, fdt);
                let (dx2, dv2) = self.integration_step(id, x0, v0, dx1, dv1, fdt);
                (x0 + (dx1 + dx2) * half_dt, v0 + (dv1 + dv2) * half_dt)
            }
            Integrator::Heun => {
                let quarter_dt = fdt / S::four();
                let two_thirds_dt = fdt * two / S::three();
                let (dx1, dv1) = self.integration_step(id, x0, v0, zero, zero, fdt);
                let (dx2, dv2) = self.integration_step(id, x0, v0, dx1, dv1, two_thirds_dt);
                (
                    x0 + (dx1 + dx2 * S::three()) * quarter_dt,
                    v0 + (dv1 + dv2 * S::three()) * quarter_dt,
                )
            }
            Integrator::RungeKutta => {
                let half_dt = fdt / two;
                let sixth_dt = fdt / S::from_int(6);
                let (dx1, dv1) = self.integration_step(id, x0, v0, zero, zero, fdt);
                let (dx2, dv2) = self.integration_step(id, x0, v0, dx1, dv1, half_dt);
                let (dx3, dv3) = self.integration_step(id, x0, v0, dx2, dv2, half_dt);
                let (dx4, dv4) = self.integration_step(id, x0, v0, dx3, dv3, fdt);
                (
                    x0 + (dx1 + dx2 * two + dx3 * two + dx4) * sixth_dt,
                    v0 + (dv1 + dv2 * two + dv3 * two + dv4) * sixth_dt,
                )
            }
        }
    }

    /// One force evaluation at the substep state `(x + dx·h, v + dv·h)`.
    /// Returns the position and velocity derivatives there.
    fn integration_step(
        &self,
        id: usize,
        x: Vec3<S>,
        v: Vec3<S>,
        dx: Vec3<S>,
        dv: Vec3<S>,
        h: S,
    ) -> (Vec3<S>, Vec3<S>) {
        let tx = x + dx * h;
        let tv = v + dv * h;
        (tv, self.acceleration(id, tx, tv, h))
    }

    /// Acceleration at state `(x, v)`: gravity plus the mass-scaled sum of
    /// constraint, friction, external and drag forces.
    fn acceleration(&self, id: usize, x: Vec3<S>, v: Vec3<S>, h: S) -> Vec3<S> {
        let s = self.solids[id].as_ref().unwrap();
        let mut result = self.gravity * s.gravity_scale;

        if s.mass != S::zero() {
            let mut applied = self.constraint_force(id, x, v) + s.force;
            if let Some(t1) = s.touched1 {
                applied += self.friction_force(id, v, t1, s.touched1_normal, applied, h);
                if let Some(t2) = s.touched2 {
                    if s.touched2 != s.touched1 {
                        applied += self.friction_force(id, v, t2, s.touched2_normal, applied, h);
                    }
                }
            }
            applied += (self.fluid_velocity - v) * s.drag;
            result += applied * s.inv_mass;
        }

        result
    }

    /// Sum of spring/damper forces from all constraints anchored at `id`.
    fn constraint_force(&self, id: usize, x: Vec3<S>, v: Vec3<S>) -> Vec3<S> {
        let s = self.solids[id].as_ref().unwrap();
        let mut result = Vec3::zero();

        for &cid in &s.constraints {
            let Some(c) = self.constraints.get(cid).and_then(Option::as_ref) else {
                continue;
            };

            let (dx, dv) = if c.start == id {
                match c.end {
                    ConstraintEnd::Solid(e) => match self.solid(e) {
                        Some(end) => (end.position - x, end.velocity - v),
                        None => continue,
                    },
                    ConstraintEnd::Point(p) => (p - x, -v),
                }
            } else {
                match self.solid(c.start) {
                    Some(start) => (start.position - x, start.velocity - v),
                    None => continue,
                }
            };

            let distance = dx.length();
            let stretch = if distance > c.rest_distance {
                dx * ((distance - c.rest_distance) / distance)
            } else {
                Vec3::zero()
            };
            result += stretch * c.spring_constant + dv * c.damping_constant;
        }

        result
    }

    /// Coulomb friction against one touched solid.
    ///
    /// Static grip is tried first; if the force needed to stop the
    /// tangential slip exceeds it, dynamic friction takes over.
    fn friction_force(
        &self,
        id: usize,
        velocity: Vec3<S>,
        hit: usize,
        normal: Vec3<S>,
        applied: Vec3<S>,
        h: S,
    ) -> Vec3<S> {
        let zero = S::zero();
        let s = self.solids[id].as_ref().unwrap();
        let Some(hit_solid) = self.solid(hit) else {
            return Vec3::zero();
        };

        if !(s.mass > zero
            && hit_solid.mass != zero
            && (s.static_friction > zero || s.dynamic_friction > zero))
        {
            return Vec3::zero();
        }

        let normal_load =
            self.gravity.dot(normal) * s.gravity_scale * s.mass + applied.dot(normal);

        let mut relative = velocity - hit_solid.velocity;
        relative -= normal * relative.dot(normal);
        let relative = relative.cap(self.max_velocity_component);
        let slip_speed = relative.length();

        if normal_load == zero || !(slip_speed > zero) || !(h > zero) {
            return Vec3::zero();
        }

        let slip_direction = relative / slip_speed;
        let traction = slip_direction * normal_load;
        let static_force = traction * s.static_friction * h;

        let mut stopping = relative * (-s.mass);
        stopping += (applied - normal * applied.dot(normal)) * h;
        let stopping = stopping.cap(self.max_force_component);

        if stopping.length_squared() > static_force.length_squared() {
            traction * s.dynamic_friction
        } else {
            stopping / h
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Fill `found` with ids of solids whose world bound touches `bound`
    /// (expanded by ε). The manager is consulted first; −1 falls back to a
    /// linear scan.
    pub fn find_solids_in_aa_box(&mut self, bound: &AaBox<S>, found: &mut Vec<usize>) -> usize {
        found.clear();
        let mut expanded = *bound;
        expanded.expand(self.epsilon.value);

        let mut amount = -1i32;
        if let Some(m) = self.manager.as_mut() {
            amount = m.find_solids_in_aa_box(&expanded, found);
        }

        if amount < 0 {
            found.clear();
            for (i, slot) in self.solids.iter().enumerate() {
                if let Some(s) = slot {
                    if expanded.intersects(s.world_bound()) {
                        found.push(i);
                    }
                }
            }
        }

        found.len()
    }

    /// Trace a bare segment against the world, skipping `ignore`.
    pub fn trace_segment(
        &mut self,
        seg: &Segment<S>,
        collide_with: u32,
        ignore: Option<usize>,
    ) -> Collision<S> {
        let mut total = AaBox::new(seg.origin, seg.origin);
        total.merge_point(seg.end_point());
        self.gather_spacials(&total);

        let mut result = Collision::miss();
        result.scope = 0;
        self.trace_segment_with_current_spacials(seg, collide_with, ignore, &mut result);
        result
    }

    /// Sweep the solid `id` along `seg` against the world and return the
    /// earliest contact.
    pub fn trace_solid(&mut self, id: usize, seg: &Segment<S>, collide_with: u32) -> Collision<S> {
        let mut bound = AaBox::new(seg.origin, seg.origin);
        bound.merge_point(seg.end_point());
        if let Some(s) = self.solid(id) {
            let local = *s.local_bound();
            bound.mins += local.mins;
            bound.maxs += local.maxs;
        }
        self.gather_spacials(&bound);

        let mut result = Collision::miss();
        self.trace_solid_with_current_spacials(id, seg, collide_with, &mut result);
        result
    }

    /// Refill the spacial scratch collection for `bound`.
    fn gather_spacials(&mut self, bound: &AaBox<S>) {
        let mut spacials = core::mem::take(&mut self.spacials);
        self.find_solids_in_aa_box(bound, &mut spacials);
        self.spacials = spacials;
    }

    fn trace_segment_with_current_spacials(
        &mut self,
        seg: &Segment<S>,
        collide_with: u32,
        ignore: Option<usize>,
        result: &mut Collision<S>,
    ) {
        let one = S::one();
        result.time = one;
        result.scope = 0;

        let mut col = Collision::miss();
        for k in 0..self.spacials.len() {
            let s2 = self.spacials[k];
            if Some(s2) == ignore {
                continue;
            }
            let Some(other) = self.solid(s2) else { continue };
            if collide_with & other.collision_scope == 0 {
                continue;
            }
            col.time = one;
            self.test_segment(seg, s2, &mut col);
            let scope = result.scope;
            if col.time < one {
                if col.time < result.time {
                    *result = col;
                } else if self.average_normals && result.time == col.time {
                    let sum = result.normal + col.normal;
                    match sum.normalize_carefully(self.epsilon.value) {
                        Some(n) => result.normal = n,
                        None => *result = col,
                    }
                }
            }
            result.scope = scope | col.scope;
        }

        if self.manager.is_some() {
            col.time = one;
            if let Some(m) = self.manager.as_mut() {
                m.trace_segment(&mut col, seg, collide_with);
            }
            let scope = result.scope;
            if col.time < one {
                if col.time < result.time {
                    *result = col;
                } else if self.average_normals && result.time == col.time {
                    let sum = result.normal + col.normal;
                    match sum.normalize_carefully(self.epsilon.value) {
                        Some(n) => result.normal = n,
                        None => *result = col,
                    }
                }
            }
            result.scope = scope | col.scope;
        }

        if result.time == one {
            result.point = seg.end_point();
            result.impact = result.point;
        }
    }

    fn trace_solid_with_current_spacials(
        &mut self,
        id: usize,
        seg: &Segment<S>,
        collide_with: u32,
        result: &mut Collision<S>,
    ) {
        let one = S::one();
        result.time = one;
        if collide_with == 0 {
            return;
        }

        let mut col = Collision::miss();
        for k in 0..self.spacials.len() {
            let s2 = self.spacials[k];
            if s2 == id {
                continue;
            }
            let Some(other) = self.solid(s2) else { continue };
            if collide_with & other.collision_scope == 0 {
                continue;
            }
            col.time = one;
            self.test_solid(id, seg, s2, &mut col);
            let scope = result.scope;
            if col.time < one {
                if col.time < result.time {
                    *result = col;
                } else if self.average_normals && result.time == col.time {
                    let sum = result.normal + col.normal;
                    match sum.normalize_carefully(self.epsilon.value) {
                        Some(n) => result.normal = n,
                        None => *result = col,
                    }
                }
            }
            result.scope = scope | col.scope;
        }

        if self.manager.is_some() {
            col.time = one;
            {
                let Self {
                    manager, solids, ..
                } = &mut *self;
                if let (Some(m), Some(s)) =
                    (manager.as_mut(), solids.get(id).and_then(Option::as_ref))
                {
                    m.trace_solid(&mut col, s, seg, collide_with);
                }
            }
            let scope = result.scope;
            if col.time < one {
                if col.time < result.time {
                    *result = col;
                } else if self.average_normals && result.time == col.time {
                    let sum = result.normal + col.normal;
                    match sum.normalize_carefully(self.epsilon.value) {
                        Some(n) => result.normal = n,
                        None => *result = col,
                    }
                }
            }
            result.scope = scope | col.scope;
        }

        if result.time == one {
            result.point = seg.end_point();
            result.impact = result.point;
        }
    }

    // ========================================================================
    // Pairwise tests
    // ========================================================================

    /// Trace `seg` against every shape of solid `s2`, merging the earliest
    /// contact into `result`.
    ///
    /// # Panics
    ///
    /// Segment-tracing a convex shape is a programming error.
    pub fn test_segment(&self, seg: &Segment<S>, s2: usize, result: &mut Collision<S>) {
        let Some(other) = self.solid(s2) else { return };
        let one = S::one();
        let zero = S::zero();
        let position = other.position;

        let mut col = Collision::miss();
        col.collidee = Some(s2);
        let mut modify_scope = false;

        for shape in other.shapes() {
            col.time = one;
            match shape {
                Shape::AaBox(b) => {
                    self.trace_aa_box(&mut col, seg, &b.translated(position));
                }
                Shape::Sphere(s) => {
                    self.trace_sphere(&mut col, seg, &s.translated(position));
                }
                Shape::Capsule(cap) => {
                    self.trace_capsule(&mut col, seg, &cap.translated(position));
                }
                Shape::Convex(_) => {
                    panic!("segment traces against convex shapes are not supported");
                }
                Shape::Traceable(t) => {
                    t.trace_segment(&mut col, &position, seg);
                    modify_scope = true;
                }
            }

            // Bare segments carry no Minkowski expansion: impact == point.
            if col.time < one {
                col.impact = col.point;
            }
            if col.time == zero {
                col.scope |= other.internal_scope;
            }

            let scope = result.scope;
            if col.time < one {
                if col.time < result.time {
                    *result = col;
                } else if result.time == col.time {
                    let sum = result.normal + col.normal;
                    match sum.normalize_carefully(self.epsilon.value) {
                        Some(n) => result.normal = n,
                        None => *result = col,
                    }
                }
                modify_scope |= col.time == zero;
            }
            result.scope = if modify_scope { scope | col.scope } else { scope };
        }
    }

    /// Sweep every shape of solid `s1` along `seg` against every shape of
    /// solid `s2` via Minkowski expansion, merging the earliest contact
    /// into `result`.
    pub fn test_solid(&self, s1: usize, seg: &Segment<S>, s2: usize, result: &mut Collision<S>) {
        let (Some(mover), Some(other)) = (self.solid(s1), self.solid(s2)) else {
            return;
        };
        let one = S::one();
        let zero = S::zero();
        let p2 = other.position;

        let mut col = Collision::miss();
        col.collidee = Some(s2);

        for sh1 in mover.shapes() {
            for sh2 in other.shapes() {
                col.time = one;
                let mut modify_scope = false;

                match (sh1, sh2) {
                    // Swept box: expand the target by the box extents.
                    (Shape::AaBox(b1), Shape::AaBox(b2)) => {
                        let mut bx = b2.translated(p2);
                        bx.maxs -= b1.mins;
                        bx.mins -= b1.maxs;
                        self.trace_aa_box(&mut col, seg, &bx);
                    }
                    (Shape::AaBox(b1), Shape::Sphere(sp2)) => {
                        let mut bx = AaBox::from_radius(sp2.radius)
                            .translated(sp2.origin)
                            .translated(p2);
                        bx.maxs -= b1.mins;
                        bx.mins -= b1.maxs;
                        self.trace_aa_box(&mut col, seg, &bx);
                    }
                    (Shape::AaBox(b1), Shape::Capsule(c2)) => {
                        let mut bx = c2.bound().translated(p2);
                        bx.maxs -= b1.mins;
                        bx.mins -= b1.maxs;
                        self.trace_aa_box(&mut col, seg, &bx);
                    }

                    // Swept sphere.
                    (Shape::Sphere(sp1), Shape::AaBox(b2)) => {
                        let b1 = AaBox::from_radius(sp1.radius).translated(sp1.origin);
                        let mut bx = b2.translated(p2);
                        bx.maxs -= b1.mins;
                        bx.mins -= b1.maxs;
                        self.trace_aa_box(&mut col, seg, &bx);
                    }
                    (Shape::Sphere(sp1), Shape::Sphere(sp2)) => {
                        let origin = p2 - sp1.origin + sp2.origin;
                        let sph = Sphere::new(origin, sp1.radius + sp2.radius);
                        self.trace_sphere(&mut col, seg, &sph);
                    }
                    (Shape::Sphere(sp1), Shape::Capsule(c2)) => {
                        let origin = p2 - sp1.origin + c2.origin;
                        let cap = Capsule::new(origin, c2.direction, c2.radius + sp1.radius);
                        self.trace_capsule(&mut col, seg, &cap);
                    }
                    (Shape::Sphere(sp1), Shape::Convex(cs2)) => {
                        let mut cs = cs2.clone();
                        for plane in &mut cs.planes {
                            plane.distance += sp1.radius;
                        }
                        let mut shifted = *seg;
                        shifted.origin = seg.origin - p2 + sp1.origin;
                        self.trace_convex_solid(&mut col, &shifted, &cs);
                        if col.time < one {
                            col.point += p2;
                        }
                    }

                    // Swept capsule.
                    (Shape::Capsule(c1), Shape::AaBox(b2)) => {
                        let b1 = c1.bound();
                        let mut bx = b2.translated(p2);
                        bx.maxs -= b1.mins;
                        bx.mins -= b1.maxs;
                        self.trace_aa_box(&mut col, seg, &bx);
                    }
                    (Shape::Capsule(c1), Shape::Sphere(sp2)) => {
                        let origin = p2 - c1.origin + sp2.origin;
                        let cap = Capsule::new(origin, -c1.direction, c1.radius + sp2.radius);
                        self.trace_capsule(&mut col, seg, &cap);
                    }
                    (Shape::Capsule(c1), Shape::Capsule(c2)) => {
                        let origin = p2 - c1.origin + c2.origin;
                        let cap = Capsule::new(origin, c2.direction, c1.radius + c2.radius);
                        self.trace_capsule(&mut col, seg, &cap);
                    }

                    // Traceable hooks. The hook computes in its own frame
                    // assuming it is stationary; when the mover is the
                    // traceable, trade frames and invert the result.
                    (Shape::Traceable(t1), sh2) if !matches!(sh2, Shape::Traceable(_)) => {
                        let mut inverse = Segment::from_start_dir(p2, -seg.direction);
                        t1.trace_solid(&mut col, other, &seg.origin, &inverse);
                        col.invert();
                        inverse.origin -= col.point;
                        col.point = seg.origin + inverse.origin;
                        modify_scope = true;
                    }
                    (sh1, Shape::Traceable(t2)) if !matches!(sh1, Shape::Traceable(_)) => {
                        t2.trace_solid(&mut col, mover, &p2, seg);
                        modify_scope = true;
                    }

                    // Remaining pairings have no swept kernel.
                    _ => {}
                }

                let traceable_pair = matches!(sh1, Shape::Traceable(_))
                    || matches!(sh2, Shape::Traceable(_));

                // Where on the mover the hit lands: walk from the contact
                // point along the support of the swept shape opposite the
                // normal.
                if col.time < one && !traceable_pair {
                    let against = -col.normal;
                    let support = match sh1 {
                        Shape::AaBox(b) => b.support(against),
                        Shape::Sphere(s) => s.support(against),
                        Shape::Capsule(c) => c.support(against),
                        _ => Vec3::zero(),
                    };
                    col.impact = col.point + support;
                } else if col.time < one {
                    col.impact = col.point;
                }

                if !traceable_pair && col.time == zero {
                    col.scope = other.scope;
                }
                if col.time == zero {
                    col.scope |= other.internal_scope;
                }

                let scope = result.scope;
                if col.time < one {
                    if col.time < result.time {
                        *result = col;
                    } else if result.time == col.time {
                        let sum = result.normal + col.normal;
                        match sum.normalize_carefully(self.epsilon.value) {
                            Some(n) => result.normal = n,
                            None => *result = col,
                        }
                    }
                    modify_scope |= col.time == zero;
                }
                result.scope = if modify_scope { scope | col.scope } else { scope };
            }
        }
    }

    // ========================================================================
    // Trace kernels
    // ========================================================================

    /// Trace a segment against a world-space box. An origin inside the box
    /// yields a `t = 0` contact against the face of least penetration,
    /// unless the motion leads away from it.
    fn trace_aa_box(&self, col: &mut Collision<S>, seg: &Segment<S>, bx: &AaBox<S>) {
        let zero = S::zero();
        let one = S::one();

        if bx.contains(seg.origin) {
            if seg.direction.length_squared() > zero {
                let o = seg.origin;
                let di = Vec3::new(
                    (o.x - bx.mins.x).abs(),
                    (o.y - bx.mins.y).abs(),
                    (o.z - bx.mins.z).abs(),
                );
                let da = Vec3::new(
                    (o.x - bx.maxs.x).abs(),
                    (o.y - bx.maxs.y).abs(),
                    (o.z - bx.maxs.z).abs(),
                );

                let normal;
                if di.x <= di.y && di.x <= di.z && di.x <= da.x && di.x <= da.y && di.x <= da.z {
                    normal = -Vec3::unit_x();
                } else if di.y <= di.z && di.y <= da.x && di.y <= da.y && di.y <= da.z {
                    normal = -Vec3::unit_y();
                } else if di.z <= da.x && di.z <= da.y && di.z <= da.z {
                    normal = -Vec3::unit_z();
                } else if da.x <= da.y && da.x <= da.z {
                    normal = Vec3::unit_x();
                } else if da.y <= da.z {
                    normal = Vec3::unit_y();
                } else {
                    normal = Vec3::unit_z();
                }

                // Moving out through that face: no contact.
                if seg.direction.dot(normal) >= zero {
                    return;
                }
                col.normal = normal;
            }
            col.time = zero;
            col.point = seg.origin;
        } else {
            match segment_aa_box(seg, bx) {
                Some(hit) => {
                    col.time = hit.time;
                    col.point = hit.point;
                    col.normal = hit.normal;
                }
                None => col.time = one,
            }
        }
    }

    /// Trace a segment against a world-space sphere. An origin inside the
    /// sphere yields a `t = 0` contact with the outward radial normal,
    /// unless the motion is already outward.
    fn trace_sphere(&self, col: &mut Collision<S>, seg: &Segment<S>, sph: &Sphere<S>) {
        let zero = S::zero();
        let one = S::one();

        if sph.contains(seg.origin) {
            let outward = seg.origin - sph.origin;
            let normal = match outward.normalize_carefully(self.epsilon.value) {
                Some(n) => n,
                // Origin at the exact center: oppose the motion.
                None => -seg.direction.normalize(),
            };
            if normal.dot(seg.direction) <= self.epsilon.value {
                col.time = zero;
                col.point = seg.origin;
                col.normal = normal;
            } else {
                col.time = one;
            }
        } else {
            match segment_sphere(seg, sph) {
                Some(hit) => {
                    col.time = hit.time;
                    col.point = hit.point;
                    col.normal = hit.normal;
                }
                None => col.time = one,
            }
        }
    }

    /// Trace a segment against a world-space capsule by collapsing it to
    /// the sphere at the closest point of the capsule's core.
    fn trace_capsule(&self, col: &mut Collision<S>, seg: &Segment<S>, cap: &Capsule<S>) {
        let core = Segment::from_start_dir(cap.origin, cap.direction);
        let (closest, _) = closest_points_between_segments(&core, seg, self.epsilon.value);
        let sph = Sphere::new(closest, cap.radius);
        self.trace_sphere(col, seg, &sph);
    }

    /// Trace a segment against a convex half-space intersection. An origin
    /// inside all planes yields a `t = 0` contact against the plane of
    /// deepest penetration.
    fn trace_convex_solid(&self, col: &mut Collision<S>, seg: &Segment<S>, cs: &ConvexSolid<S>) {
        let zero = S::zero();
        let one = S::one();
        col.time = one;

        let mut inside = true;
        let mut deepest = -S::default_max_position_component();
        let mut deepest_plane = None;
        for (i, plane) in cs.planes.iter().enumerate() {
            let d = plane.height(seg.origin);
            if d > zero {
                inside = false;
                break;
            }
            if d > deepest {
                deepest = d;
                deepest_plane = Some(i);
            }
        }
        if inside {
            if let Some(i) = deepest_plane {
                col.time = zero;
                col.point = seg.origin;
                col.normal = cs.planes[i].normal;
            }
            return;
        }

        for (i, plane) in cs.planes.iter().enumerate() {
            let denom = plane.normal.dot(seg.direction);
            // Only planes the segment moves into can be entry faces.
            if denom >= zero {
                continue;
            }
            let t = (plane.distance - plane.normal.dot(seg.origin)) / denom;
            if t < zero || t > one {
                continue;
            }
            let point = seg.at(t);
            let within_others = cs
                .planes
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .all(|(_, p)| p.height(point) <= zero);
            if within_others && t < col.time {
                col.time = t;
                col.point = point;
                col.normal = plane.normal;
            }
        }
    }

    // ========================================================================
    // Offsets and report delivery
    // ========================================================================

    /// Back-off applied after a contact so the next sub-iteration does not
    /// immediately re-enter the surface.
    fn epsilon_offset(&self, direction: Vec3<S>, normal: Vec3<S>) -> Vec3<S> {
        let eps = self.epsilon.value;
        if self.snap_enabled {
            let quarter = self.epsilon.quarter;
            let axis = |n: S| {
                if n >= quarter {
                    eps
                } else if n <= -quarter {
                    -eps
                } else {
                    S::zero()
                }
            };
            Vec3::new(axis(normal.x), axis(normal.y), axis(normal.z))
        } else {
            let len = direction.length();
            if len > eps {
                -direction / len * eps
            } else {
                Vec3::zero()
            }
        }
    }

    /// Snap a vector onto the ε grid when snapping is enabled.
    #[inline]
    fn snap_vec(&self, v: Vec3<S>) -> Vec3<S> {
        if self.snap_enabled {
            v.snap_to_grid(&self.epsilon)
        } else {
            v
        }
    }

    /// Deliver buffered collision records to both parties' listeners. Each
    /// listener sees itself as the record's collider: the moving body gets
    /// the record as stored, the hit body gets it inverted. Masks are
    /// re-checked at delivery time.
    fn report_collisions(&mut self) {
        for i in 0..self.collisions.len() {
            let record = self.collisions[i];
            let (Some(mover), Some(hit)) = (record.collider, record.collidee) else {
                continue;
            };

            let (deliver_to_mover, deliver_to_hit) = {
                match (self.solid(mover), self.solid(hit)) {
                    (Some(m), Some(h)) => (
                        m.collide_with_scope & h.collision_scope != 0,
                        h.collide_with_scope & m.collision_scope != 0,
                    ),
                    _ => (false, false),
                }
            };

            if deliver_to_mover {
                if let Some(listener) = self
                    .solids
                    .get_mut(mover)
                    .and_then(Option::as_mut)
                    .and_then(|s| s.listener.as_mut())
                {
                    listener.on_collision(&record);
                }
            }
            if deliver_to_hit {
                let mut inverted = record;
                inverted.invert();
                if let Some(listener) = self
                    .solids
                    .get_mut(hit)
                    .and_then(Option::as_mut)
                    .and_then(|s| s.listener.as_mut())
                {
                    listener.on_collision(&inverted);
                }
            }
        }
        self.collisions.clear();
    }
}

impl<S: Scalar> Default for Simulator<S> {
    fn default() -> Self {
        Self::new()
    }
}
