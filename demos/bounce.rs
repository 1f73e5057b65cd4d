//! Console bounce demo: a box, a sphere, and a capsule knocking around a
//! closed room, printed as a position trace.
//!
//! ```bash
//! cargo run --example bounce           # f32 backend
//! cargo run --example bounce -- --fixed  # Q16.16 backend
//! ```

use swept::{AaBox, Capsule, Scalar, Shape, Simulator, Solid, Sphere, Vec3};

/// Wall helper: infinite mass, no gravity, lively restitution.
fn make_wall<S: Scalar>(sim: &mut Simulator<S>, shape: AaBox<S>, position: Vec3<S>) {
    let mut wall = Solid::new();
    wall.set_infinite_mass();
    wall.gravity_scale = S::zero();
    wall.restitution = S::from_milli(900);
    wall.add_shape(Shape::AaBox(shape));
    wall.position = position;
    sim.add_solid(wall);
}

fn run<S: Scalar>(label: &str) {
    let mut sim = Simulator::<S>::new();

    // A 6x6x6 room: floor, ceiling and four walls, one unit thick.
    let half = S::from_int(3);
    let size = S::from_int(6);
    let thick = S::one();
    let zero = S::zero();

    make_wall(
        &mut sim,
        AaBox::new(Vec3::new(-half, -half, -thick), Vec3::new(half, half, zero)),
        Vec3::zero(),
    );
    make_wall(
        &mut sim,
        AaBox::new(Vec3::new(-half, -half, zero), Vec3::new(half, half, thick)),
        Vec3::new(zero, zero, size),
    );
    make_wall(
        &mut sim,
        AaBox::new(Vec3::new(-thick, -half, zero), Vec3::new(zero, half, size)),
        Vec3::new(-half, zero, zero),
    );
    make_wall(
        &mut sim,
        AaBox::new(Vec3::new(zero, -half, zero), Vec3::new(thick, half, size)),
        Vec3::new(half, zero, zero),
    );
    make_wall(
        &mut sim,
        AaBox::new(Vec3::new(-half, -thick, zero), Vec3::new(half, zero, size)),
        Vec3::new(zero, -half, zero),
    );
    make_wall(
        &mut sim,
        AaBox::new(Vec3::new(-half, zero, zero), Vec3::new(half, thick, size)),
        Vec3::new(zero, half, zero),
    );

    let cor = S::from_milli(800);

    let mut body = Solid::new();
    body.set_mass(S::one());
    body.restitution = cor;
    body.restitution_override = true;
    body.static_friction = S::zero();
    body.dynamic_friction = S::zero();
    body.add_shape(Shape::AaBox(AaBox::from_radius(S::half())));
    body.position = Vec3::new(S::one(), zero, S::from_int(4));
    body.velocity = Vec3::from_int(3, -2, 0);
    let bouncing_box = sim.add_solid(body);

    let mut ball = Solid::new();
    ball.set_mass(S::one());
    ball.restitution = cor;
    ball.restitution_override = true;
    ball.static_friction = S::zero();
    ball.dynamic_friction = S::zero();
    ball.add_shape(Shape::Sphere(Sphere::from_radius(S::half())));
    ball.position = Vec3::new(-S::one(), S::one(), S::from_int(5));
    ball.velocity = Vec3::from_int(-2, 3, 0);
    let ball = sim.add_solid(ball);

    let mut pill = Solid::new();
    pill.set_mass(S::one());
    pill.restitution = cor;
    pill.restitution_override = true;
    pill.static_friction = S::zero();
    pill.dynamic_friction = S::zero();
    pill.add_shape(Shape::Capsule(Capsule::new(
        Vec3::zero(),
        Vec3::new(zero, zero, S::one()),
        S::from_milli(300),
    )));
    pill.position = Vec3::new(zero, -S::one(), S::from_int(3));
    pill.velocity = Vec3::from_int(1, 1, 2);
    let pill = sim.add_solid(pill);

    println!("bounce demo ({label})");
    println!("{:>5}  {:>22}  {:>22}  {:>22}", "t", "box", "sphere", "capsule");

    let fmt = |v: Vec3<S>| {
        format!("{:6.2} {:6.2} {:6.2}", v.x.to_f32(), v.y.to_f32(), v.z.to_f32())
    };

    // 5 simulated seconds at 100 Hz, one printed row per half second.
    for step in 0..=500 {
        if step % 50 == 0 {
            let t = step as f32 / 100.0;
            println!(
                "{:4.1}s  {}  {}  {}",
                t,
                fmt(sim.solid(bouncing_box).unwrap().position),
                fmt(sim.solid(ball).unwrap().position),
                fmt(sim.solid(pill).unwrap().position),
            );
        }
        sim.update(10, 0, None);
    }

    println!("active solids at end: {}", sim.active_solid_count());
}

fn main() {
    let fixed = std::env::args().any(|a| a == "--fixed");
    if fixed {
        run::<swept::Fix16>("fixed16");
    } else {
        run::<f32>("float");
    }
}
