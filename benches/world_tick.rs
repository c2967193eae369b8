//! Tick-path benchmarks for the Wildmere server
//!
//! Measures the per-tick systems (projectiles, movement validation, interest
//! queries) and world generation at realistic player counts.
//!
//! Run with: cargo bench --bench world_tick

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use wildmere_server::config::WorldConfig;
use wildmere_server::game::objects::{Bullet, PlayerId};
use wildmere_server::game::placement;
use wildmere_server::game::state::{Player, World};
use wildmere_server::game::systems::bullets::advance_bullets;
use wildmere_server::game::systems::movement::apply_move;
use wildmere_server::game::worldgen::generate_world;
use wildmere_server::net::interest::players_in_range;
use wildmere_server::util::vec2::Vec2;

/// A generated world populated with players and in-flight bullets.
fn populated_world(player_count: usize, bullets_per_player: usize) -> World {
    let mut rng = StdRng::seed_from_u64(7);
    let mut world = World::new(WorldConfig::default());
    generate_world(&mut world, &mut rng);

    for i in 0..player_count {
        let mut player = Player::new(
            Uuid::new_v4(),
            format!("player{}", i),
            "#3498db".to_string(),
            &world.config,
        );
        player.position = placement::find_safe_spawn_position(&world, &mut rng);
        world.add_player(player);
    }

    let ids: Vec<PlayerId> = world.players.keys().copied().collect();
    let bullet_count = player_count * bullets_per_player;
    for (i, owner) in ids.iter().cycle().take(bullet_count).enumerate() {
        let angle = i as f32 * 0.7;
        world.bullets.push(Bullet {
            owner: *owner,
            position: Vec2::new(
                rng.gen_range(0.0..world.config.width),
                rng.gen_range(0.0..world.config.height),
            ),
            direction: Vec2::new(angle.cos(), angle.sin()),
            spawn_time_ms: 0,
        });
    }
    world
}

/// Advance every bullet one tick, including obstacle and hit checks.
fn bench_bullet_advance(c: &mut Criterion) {
    let mut group = c.benchmark_group("bullet_advance");
    group.sample_size(50);

    for count in [8, 16, 32] {
        group.throughput(Throughput::Elements((count * 2) as u64));
        group.bench_with_input(BenchmarkId::new("players", count), &count, |b, &count| {
            b.iter_batched(
                || populated_world(count, 2),
                |mut world| black_box(advance_bullets(&mut world, 100)),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

/// Validate and commit one movement against the full obstacle set.
fn bench_movement_validation(c: &mut Criterion) {
    let mut world = populated_world(32, 0);
    let mover = *world.players.keys().next().unwrap();
    // Re-committing the current position keeps every iteration on the
    // accept path without drifting into an obstacle.
    let target = world.get_player(mover).unwrap().position;

    c.bench_function("movement_validation", |b| {
        let mut sequence = 0u64;
        b.iter(|| {
            sequence += 1;
            black_box(apply_move(&mut world, mover, target, sequence, 100))
        });
    });
}

/// Interest query cost as the world fills up.
fn bench_interest_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("interest_query");

    for count in [8, 32, 64] {
        let world = populated_world(count, 0);
        let origin = world.center();
        let radius = world.config.interest_radius;

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("players", count), &count, |b, _| {
            b.iter(|| black_box(players_in_range(&world, origin, radius)));
        });
    }
    group.finish();
}

/// Full map generation: water bodies, obstacles, pickups.
fn bench_worldgen(c: &mut Criterion) {
    c.bench_function("worldgen", |b| {
        b.iter_batched(
            || World::new(WorldConfig::default()),
            |mut world| {
                let mut rng = StdRng::seed_from_u64(11);
                generate_world(&mut world, &mut rng);
                black_box(world)
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_bullet_advance,
    bench_movement_validation,
    bench_interest_query,
    bench_worldgen
);
criterion_main!(benches);
