//! Scenario tests for the swept-collision step loop.
//!
//! These exercise the public API end to end: gravity, bouncing, elastic and
//! inelastic impacts, scope filtering, constraints, deactivation, report
//! delivery, and fixed-point reproducibility.

use std::cell::RefCell;
use std::rc::Rc;

use swept::{
    AaBox, Collision, CollisionListener, Constraint, Fix16, Scalar, Shape, Simulator, Solid,
    Sphere, Vec3, SCOPE_REPORT_COLLISIONS,
};

// ============================================================================
// Helpers
// ============================================================================

/// Static floor occupying z ∈ [−1, 0] over a 20×20 footprint.
fn make_floor<S: Scalar>(sim: &mut Simulator<S>, restitution: S) -> usize {
    let mut wall = Solid::new();
    wall.set_infinite_mass();
    wall.gravity_scale = S::zero();
    wall.restitution = restitution;
    wall.add_shape(Shape::AaBox(AaBox::new(
        Vec3::from_int(-10, -10, -1),
        Vec3::from_int(10, 10, 0),
    )));
    sim.add_solid(wall)
}

/// Frictionless unit-mass sphere of radius 0.5 with pinned restitution.
fn make_ball<S: Scalar>(sim: &mut Simulator<S>, restitution: S, position: Vec3<S>) -> usize {
    let mut ball = Solid::new();
    ball.set_mass(S::one());
    ball.restitution = restitution;
    ball.restitution_override = true;
    ball.static_friction = S::zero();
    ball.dynamic_friction = S::zero();
    ball.add_shape(Shape::Sphere(Sphere::from_radius(S::half())));
    ball.position = position;
    sim.add_solid(ball)
}

fn run<S: Scalar>(sim: &mut Simulator<S>, steps: usize) {
    for _ in 0..steps {
        sim.update(10, 0, None);
    }
}

// ============================================================================
// Scenario 1 — gravity freefall
// ============================================================================

#[test]
fn freefall_float() {
    let mut sim = Simulator::<f32>::new();
    let mut s = Solid::new();
    s.collide_with_scope = 0;
    s.add_shape(Shape::Sphere(Sphere::from_radius(1.0)));
    s.position = Vec3::from_int(0, 0, 10);
    let id = sim.add_solid(s);

    run(&mut sim, 100);

    // z ≈ 10 − ½·9.81·1² = 5.095
    let z = sim.solid(id).unwrap().position.z;
    assert!(z > 4.0 && z < 6.5, "z = {z}");
}

#[test]
fn freefall_fixed() {
    let mut sim = Simulator::<Fix16>::new();
    let mut s = Solid::new();
    s.collide_with_scope = 0;
    s.add_shape(Shape::Sphere(Sphere::from_radius(Fix16::ONE)));
    s.position = Vec3::from_int(0, 0, 10);
    let id = sim.add_solid(s);

    run(&mut sim, 100);

    let z = sim.solid(id).unwrap().position.z.to_f32();
    assert!(z > 4.0 && z < 6.5, "z = {z}");
}

// ============================================================================
// Scenario 2 — sphere-floor bounce, COR = 1
// ============================================================================

#[test]
fn elastic_bounce_keeps_bouncing() {
    let mut sim = Simulator::<f32>::new();
    make_floor(&mut sim, 1.0);
    let ball = make_ball(&mut sim, 1.0, Vec3::from_int(0, 0, 5));

    run(&mut sim, 200);

    let z = sim.solid(ball).unwrap().position.z;
    assert!(z > 0.4, "ball settled unexpectedly, z = {z}");
}

#[test]
fn elastic_bounce_energy_stays_bounded() {
    let mut sim = Simulator::<f32>::new();
    make_floor(&mut sim, 1.0);
    let ball = make_ball(&mut sim, 1.0, Vec3::from_int(0, 0, 5));
    sim.set_stay_active(ball, true);

    let g = 9.81f32;
    let energy = |sim: &Simulator<f32>| {
        let s = sim.solid(ball).unwrap();
        0.5 * s.velocity.length_squared() + g * s.position.z
    };
    let initial = energy(&sim);

    // ~10 bounces worth of simulated time
    let mut max_seen = initial;
    for _ in 0..2000 {
        sim.update(10, 0, None);
        let e = energy(&sim);
        if e > max_seen {
            max_seen = e;
        }
    }

    assert!(
        max_seen < initial * 1.05,
        "energy grew: {max_seen} vs {initial}"
    );
    let final_energy = energy(&sim);
    assert!(
        final_energy > initial * 0.8,
        "too much energy lost: {final_energy} vs {initial}"
    );
}

// ============================================================================
// Scenario 3 — elastic 1D swap
// ============================================================================

#[test]
fn equal_mass_elastic_swap() {
    let mut sim = Simulator::<f32>::new();
    sim.set_gravity(Vec3::zero());

    let a = make_ball(&mut sim, 1.0, Vec3::from_int(-3, 0, 0));
    let b = make_ball(&mut sim, 1.0, Vec3::from_int(3, 0, 0));
    sim.set_velocity(a, Vec3::from_int(2, 0, 0));
    sim.set_velocity(b, Vec3::from_int(-2, 0, 0));

    run(&mut sim, 200);

    let v1 = sim.solid(a).unwrap().velocity.x;
    let v2 = sim.solid(b).unwrap().velocity.x;
    assert!(v1 < -1.0, "v1 = {v1}");
    assert!(v2 > 1.0, "v2 = {v2}");
}

// ============================================================================
// Scenario 4 — inelastic rest
// ============================================================================

#[test]
fn inelastic_drop_comes_to_rest() {
    let mut sim = Simulator::<f32>::new();
    make_floor(&mut sim, 0.0);
    let ball = make_ball(&mut sim, 0.0, Vec3::from_int(0, 0, 3));

    run(&mut sim, 300);

    let s = sim.solid(ball).unwrap();
    assert!(s.velocity.z.abs() < 1.0, "vz = {}", s.velocity.z);
    assert!(s.position.z < 1.5, "z = {}", s.position.z);
}

#[test]
fn resting_body_deactivates_near_radius() {
    let mut sim = Simulator::<f32>::new();
    make_floor(&mut sim, 0.0);
    let ball = make_ball(&mut sim, 0.0, Vec3::from_int(0, 0, 2));

    run(&mut sim, 500);

    let s = sim.solid(ball).unwrap();
    assert!(!s.active, "ball should be asleep");
    assert!(s.velocity.z.abs() < 0.01, "vz = {}", s.velocity.z);
    // Resting height: the contact backs off by about one epsilon
    assert!(
        (s.position.z - 0.5).abs() < 0.05,
        "z = {}",
        s.position.z
    );
}

// ============================================================================
// Scenario 5 — scope filtering
// ============================================================================

#[test]
fn disjoint_scopes_pass_through() {
    let mut sim = Simulator::<f32>::new();
    sim.set_gravity(Vec3::zero());

    let a = make_ball(&mut sim, 0.5, Vec3::from_int(-2, 0, 0));
    let b = make_ball(&mut sim, 0.5, Vec3::from_int(2, 0, 0));
    {
        let s = sim.solid_mut(a).unwrap();
        s.collision_scope = 1;
        s.collide_with_scope = 1;
    }
    {
        let s = sim.solid_mut(b).unwrap();
        s.collision_scope = 2;
        s.collide_with_scope = 2;
    }
    sim.set_velocity(a, Vec3::from_int(3, 0, 0));
    sim.set_velocity(b, Vec3::from_int(-3, 0, 0));

    run(&mut sim, 100);

    let xa = sim.solid(a).unwrap().position.x;
    let xb = sim.solid(b).unwrap().position.x;
    assert!(xa > 0.0, "xa = {xa}");
    assert!(xb < 0.0, "xb = {xb}");
}

// ============================================================================
// Scenario 6 — spring constraint
// ============================================================================

#[test]
fn spring_pulls_bodies_together() {
    let mut sim = Simulator::<f32>::new();
    sim.set_gravity(Vec3::zero());

    let a = make_ball(&mut sim, 0.5, Vec3::from_int(-2, 0, 0));
    let b = make_ball(&mut sim, 0.5, Vec3::from_int(2, 0, 0));
    sim.solid_mut(a).unwrap().collide_with_scope = 0;
    sim.solid_mut(b).unwrap().collide_with_scope = 0;

    sim.add_constraint(
        Constraint::between(a, b)
            .with_spring(10.0)
            .with_damping(1.0)
            .with_rest_distance(1.0),
    );

    run(&mut sim, 200);

    let separation =
        (sim.solid(a).unwrap().position.x - sim.solid(b).unwrap().position.x).abs();
    assert!(separation < 4.0, "separation = {separation}");
}

#[test]
fn point_constraint_holds_body() {
    let mut sim = Simulator::<f32>::new();
    sim.set_gravity(Vec3::zero());

    let a = make_ball(&mut sim, 0.5, Vec3::from_int(5, 0, 0));
    sim.solid_mut(a).unwrap().collide_with_scope = 0;
    sim.add_constraint(
        Constraint::to_point(a, Vec3::zero())
            .with_spring(20.0)
            .with_damping(2.0)
            .with_rest_distance(1.0),
    );

    run(&mut sim, 400);

    let distance = sim.solid(a).unwrap().position.length();
    assert!(distance < 2.0, "distance = {distance}");
}

// ============================================================================
// Collision reporting
// ============================================================================

#[derive(Default)]
struct RecordingListener {
    events: Rc<RefCell<Vec<Collision<f32>>>>,
}

impl CollisionListener<f32> for RecordingListener {
    fn on_collision(&mut self, collision: &Collision<f32>) {
        self.events.borrow_mut().push(*collision);
    }
}

#[test]
fn listeners_hear_about_contacts_on_both_sides() {
    let mut sim = Simulator::<f32>::new();
    let floor = make_floor(&mut sim, 0.0);
    let ball = make_ball(&mut sim, 0.0, Vec3::from_int(0, 0, 2));

    let ball_events = Rc::new(RefCell::new(Vec::new()));
    sim.solid_mut(ball).unwrap().listener = Some(Box::new(RecordingListener {
        events: Rc::clone(&ball_events),
    }));
    let floor_events = Rc::new(RefCell::new(Vec::new()));
    sim.solid_mut(floor).unwrap().listener = Some(Box::new(RecordingListener {
        events: Rc::clone(&floor_events),
    }));

    for _ in 0..200 {
        sim.update(10, SCOPE_REPORT_COLLISIONS, None);
    }

    // Each listener sees itself as the collider. The moving ball gets the
    // record as stored, normal pointing away from the floor it hit.
    let ball_seen = ball_events.borrow();
    assert!(!ball_seen.is_empty(), "ball listener heard nothing");
    let first = &ball_seen[0];
    assert_eq!(first.collider, Some(ball));
    assert_eq!(first.collidee, Some(floor));
    assert!(first.normal.z > 0.0, "normal should point away from the floor");

    // The floor gets the inverted record.
    let floor_seen = floor_events.borrow();
    assert!(!floor_seen.is_empty(), "floor listener heard nothing");
    assert_eq!(floor_seen[0].collider, Some(floor));
    assert_eq!(floor_seen[0].collidee, Some(ball));
    assert!(floor_seen[0].normal.z < 0.0);
}

#[test]
fn disjoint_scopes_produce_no_reports() {
    let mut sim = Simulator::<f32>::new();
    sim.set_gravity(Vec3::zero());

    let a = make_ball(&mut sim, 0.5, Vec3::from_int(-2, 0, 0));
    let b = make_ball(&mut sim, 0.5, Vec3::from_int(2, 0, 0));
    {
        let s = sim.solid_mut(a).unwrap();
        s.collision_scope = 1;
        s.collide_with_scope = 1;
    }
    {
        let s = sim.solid_mut(b).unwrap();
        s.collision_scope = 2;
        s.collide_with_scope = 2;
    }

    let events = Rc::new(RefCell::new(Vec::new()));
    sim.solid_mut(a).unwrap().listener = Some(Box::new(RecordingListener {
        events: Rc::clone(&events),
    }));

    sim.set_velocity(a, Vec3::from_int(3, 0, 0));
    sim.set_velocity(b, Vec3::from_int(-3, 0, 0));
    for _ in 0..100 {
        sim.update(10, SCOPE_REPORT_COLLISIONS, None);
    }

    assert!(events.borrow().is_empty(), "filtered pair still reported");
}

// ============================================================================
// Fixed-point reproducibility
// ============================================================================

#[test]
fn fixed_point_snap_trajectories_are_bit_exact() {
    fn simulate() -> Vec<(i32, i32, i32)> {
        let mut sim = Simulator::<Fix16>::new();
        sim.set_snap_to_grid(true);
        make_floor(&mut sim, Fix16::from_milli(800));

        let ball = make_ball(
            &mut sim,
            Fix16::from_milli(800),
            Vec3::from_int(0, 0, 5),
        );
        sim.set_velocity(ball, Vec3::from_milli(1500, -500, 0));

        let mut trajectory = Vec::new();
        for _ in 0..300 {
            sim.update(10, 0, None);
            let p = sim.solid(ball).unwrap().position;
            trajectory.push((p.x.raw, p.y.raw, p.z.raw));
        }
        trajectory
    }

    let a = simulate();
    let b = simulate();
    assert_eq!(a, b, "fixed-point trajectories diverged");
}

#[test]
fn fixed_point_bounce_stays_above_floor() {
    let mut sim = Simulator::<Fix16>::new();
    make_floor(&mut sim, Fix16::from_milli(800));

    let mut b = Solid::new();
    b.set_mass(Fix16::ONE);
    b.restitution = Fix16::from_milli(800);
    b.restitution_override = true;
    b.static_friction = Fix16::ZERO;
    b.dynamic_friction = Fix16::ZERO;
    b.add_shape(Shape::AaBox(AaBox::from_radius(Fix16::from_milli(500))));
    b.position = Vec3::from_int(0, 0, 5);
    let id = sim.add_solid(b);

    run(&mut sim, 200);

    let z = sim.solid(id).unwrap().position.z.to_f32();
    assert!(z > 0.3, "z = {z}");
}

// ============================================================================
// Swept motion vs tunneling
// ============================================================================

#[test]
fn fast_body_does_not_tunnel_through_thin_wall() {
    let mut sim = Simulator::<f32>::new();
    sim.set_gravity(Vec3::zero());

    // A thin wall at x = 5, only 0.1 thick
    let mut wall = Solid::new();
    wall.set_infinite_mass();
    wall.gravity_scale = 0.0;
    wall.add_shape(Shape::AaBox(AaBox::new(
        Vec3::new(5.0, -10.0, -10.0),
        Vec3::new(5.1, 10.0, 10.0),
    )));
    sim.add_solid(wall);

    // 200 m/s toward the wall: 2 m per 10 ms step, far past the wall width
    let ball = make_ball(&mut sim, 0.0, Vec3::from_int(-5, 0, 0));
    sim.set_velocity(ball, Vec3::new(200.0, 0.0, 0.0));

    run(&mut sim, 100);

    let x = sim.solid(ball).unwrap().position.x;
    assert!(x < 5.0, "ball tunneled through the wall, x = {x}");
}

#[test]
fn capsule_rests_on_floor() {
    let mut sim = Simulator::<f32>::new();
    make_floor(&mut sim, 0.8);

    let mut cap = Solid::new();
    cap.set_mass(1.0);
    cap.restitution = 0.8;
    cap.restitution_override = true;
    cap.static_friction = 0.0;
    cap.dynamic_friction = 0.0;
    cap.add_shape(Shape::Capsule(swept::Capsule::new(
        Vec3::zero(),
        Vec3::new(0.0, 0.0, 1.0),
        0.3,
    )));
    cap.position = Vec3::from_int(0, 0, 5);
    let id = sim.add_solid(cap);

    run(&mut sim, 200);

    let z = sim.solid(id).unwrap().position.z;
    assert!(z > 0.2, "z = {z}");
}
