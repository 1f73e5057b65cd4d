//! Benchmarks for the swept-collision step loop.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use swept::{AaBox, Fix16, Scalar, Shape, Simulator, Solid, Sphere, Vec3};

fn make_room<S: Scalar>(sim: &mut Simulator<S>) {
    let mut floor = Solid::new();
    floor.set_infinite_mass();
    floor.gravity_scale = S::zero();
    floor.restitution = S::from_milli(900);
    floor.add_shape(Shape::AaBox(AaBox::new(
        Vec3::from_int(-10, -10, -1),
        Vec3::from_int(10, 10, 0),
    )));
    sim.add_solid(floor);
}

fn make_ball<S: Scalar>(sim: &mut Simulator<S>, x: i32, z: i32) -> usize {
    let mut ball = Solid::new();
    ball.set_mass(S::one());
    ball.restitution = S::from_milli(800);
    ball.restitution_override = true;
    ball.add_shape(Shape::Sphere(Sphere::from_radius(S::half())));
    ball.position = Vec3::from_int(x, 0, z);
    sim.add_solid(ball)
}

fn bench_freefall(c: &mut Criterion) {
    let mut group = c.benchmark_group("freefall");

    group.bench_function("float_100_steps", |b| {
        b.iter(|| {
            let mut sim = Simulator::<f32>::new();
            let mut s = Solid::new();
            s.collide_with_scope = 0;
            s.position = Vec3::from_int(0, 0, 100);
            let id = sim.add_solid(s);
            for _ in 0..100 {
                sim.update(black_box(10), 0, None);
            }
            sim.solid(id).unwrap().position
        });
    });

    group.bench_function("fixed_100_steps", |b| {
        b.iter(|| {
            let mut sim = Simulator::<Fix16>::new();
            sim.set_snap_to_grid(true);
            let mut s = Solid::new();
            s.collide_with_scope = 0;
            s.position = Vec3::from_int(0, 0, 100);
            let id = sim.add_solid(s);
            for _ in 0..100 {
                sim.update(black_box(10), 0, None);
            }
            sim.solid(id).unwrap().position
        });
    });

    group.finish();
}

fn bench_bouncing(c: &mut Criterion) {
    let mut group = c.benchmark_group("bouncing");

    group.bench_function("ten_balls_100_steps", |b| {
        b.iter(|| {
            let mut sim = Simulator::<f32>::new();
            make_room(&mut sim);
            for i in 0..10 {
                make_ball(&mut sim, i - 5, 3 + (i % 3));
            }
            for _ in 0..100 {
                sim.update(black_box(10), 0, None);
            }
            sim.active_solid_count()
        });
    });

    group.finish();
}

fn bench_trace(c: &mut Criterion) {
    let mut group = c.benchmark_group("trace");

    group.bench_function("segment_through_field", |b| {
        let mut sim = Simulator::<f32>::new();
        for i in 0..50 {
            let mut s = Solid::new();
            s.set_infinite_mass();
            s.gravity_scale = 0.0;
            s.add_shape(Shape::Sphere(Sphere::from_radius(0.5)));
            s.position = Vec3::from_int(i * 2 - 50, 0, 0);
            sim.add_solid(s);
        }
        let seg = swept::Segment::from_start_dir(
            Vec3::from_int(-60, 0, 0),
            Vec3::from_int(120, 0, 0),
        );
        b.iter(|| sim.trace_segment(black_box(&seg), !0, None));
    });

    group.finish();
}

criterion_group!(benches, bench_freefall, bench_bouncing, bench_trace);
criterion_main!(benches);
