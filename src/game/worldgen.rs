//! Procedural world generation
//!
//! Order is load-bearing: water bodies first so obstacles can route around
//! them, obstacles before pickups so the placer can see their hitboxes.
//! Counts are ceilings; a category that exhausts its attempts ships fewer
//! instances instead of spinning.

use rand::Rng;

use crate::config::WorldConfig;
use crate::game::collision::{lake_rect, pond_rect, sprite_box};
use crate::game::constants::{pickup, worldgen};
use crate::game::objects::{Lake, Pickup, PickupKind, Pond, Rock, Tree};
use crate::game::placement;
use crate::game::state::{GameObjects, World};
use crate::util::vec2::Vec2;

/// Regenerate every static object and pickup, bumping the world epoch so
/// respawn timers scheduled against the previous layout become stale.
pub fn generate_world(world: &mut World, rng: &mut impl Rng) {
    world.epoch = world.epoch.wrapping_add(1);

    let mut objects = GameObjects::default();
    gen_ponds(world, &mut objects, rng);
    gen_lakes(world, &mut objects, rng);
    gen_trees(world, &mut objects, rng);
    gen_rocks(world, &mut objects, rng);
    gen_pickups(world, &mut objects, rng);
    world.objects = objects;

    tracing::info!(
        epoch = world.epoch,
        ponds = world.objects.ponds.len(),
        lakes = world.objects.lakes.len(),
        trees = world.objects.trees.len(),
        rocks = world.objects.rocks.len(),
        coins = world.objects.coins.len(),
        ammo = world.objects.ammo_packs.len(),
        bait = world.objects.bait_packs.len(),
        "world generated"
    );
}

fn roll_count(range: (u32, u32), rng: &mut impl Rng) -> u32 {
    rng.gen_range(range.0..=range.1)
}

fn gen_ponds(world: &mut World, objects: &mut GameObjects, rng: &mut impl Rng) {
    let target = roll_count(worldgen::POND_COUNT, rng);
    for _ in 0..target {
        for _ in 0..worldgen::POND_ATTEMPTS {
            let width = rng.gen_range(worldgen::POND_WIDTH.0..=worldgen::POND_WIDTH.1);
            let height = rng.gen_range(worldgen::POND_HEIGHT.0..=worldgen::POND_HEIGHT.1);
            let position = Vec2::new(
                rng.gen_range(0.0..=(world.config.width - width).max(0.0)),
                rng.gen_range(0.0..=(world.config.height - height).max(0.0)),
            );
            let center = position + Vec2::new(width / 2.0, height / 2.0);
            let spaced = objects
                .ponds
                .iter()
                .all(|p| p.center().distance_to(center) >= worldgen::POND_SPACING);
            if spaced {
                objects.ponds.push(Pond {
                    id: world.alloc_object_id(),
                    position,
                    width,
                    height,
                });
                break;
            }
        }
    }
}

fn gen_lakes(world: &mut World, objects: &mut GameObjects, rng: &mut impl Rng) {
    let target = roll_count(worldgen::LAKE_COUNT, rng);
    for _ in 0..target {
        for _ in 0..worldgen::POND_ATTEMPTS {
            let width = rng.gen_range(worldgen::LAKE_EXTENT.0..=worldgen::LAKE_EXTENT.1);
            let height = rng.gen_range(worldgen::LAKE_EXTENT.0..=worldgen::LAKE_EXTENT.1);
            let position = Vec2::new(
                rng.gen_range(0.0..=(world.config.width - width).max(0.0)),
                rng.gen_range(0.0..=(world.config.height - height).max(0.0)),
            );
            let center = position + Vec2::new(width / 2.0, height / 2.0);
            let spaced = objects
                .ponds
                .iter()
                .map(|p| p.center())
                .chain(objects.lakes.iter().map(|l| l.center()))
                .all(|c| c.distance_to(center) >= worldgen::LAKE_SPACING);
            if spaced {
                objects.lakes.push(Lake {
                    id: world.alloc_object_id(),
                    position,
                    width,
                    height,
                });
                break;
            }
        }
    }
}

fn gen_trees(world: &mut World, objects: &mut GameObjects, rng: &mut impl Rng) {
    let target = roll_count(worldgen::TREE_COUNT, rng);
    for _ in 0..target {
        for _ in 0..worldgen::OBSTACLE_ATTEMPTS {
            let size = rng.gen_range(worldgen::TREE_SIZE.0..=worldgen::TREE_SIZE.1);
            let buffer = rng.gen_range(worldgen::WATER_BUFFER.0..=worldgen::WATER_BUFFER.1);
            let position = placement::random_position(size, &world.config, rng);
            let bbox = sprite_box(position, size);
            let clear = objects
                .ponds
                .iter()
                .all(|p| !bbox.overlaps(&pond_rect(p, buffer)))
                && objects
                    .lakes
                    .iter()
                    .all(|l| !bbox.overlaps(&lake_rect(l, buffer)));
            if clear {
                objects.trees.push(Tree {
                    id: world.alloc_object_id(),
                    position,
                    size,
                });
                break;
            }
        }
    }
}

fn gen_rocks(world: &mut World, objects: &mut GameObjects, rng: &mut impl Rng) {
    let target = roll_count(worldgen::ROCK_COUNT, rng);
    for _ in 0..target {
        for _ in 0..worldgen::OBSTACLE_ATTEMPTS {
            let size = rng.gen_range(worldgen::ROCK_SIZE.0..=worldgen::ROCK_SIZE.1);
            let position = placement::random_position(size, &world.config, rng);
            let bbox = sprite_box(position, size);
            let clear = objects
                .ponds
                .iter()
                .all(|p| !bbox.overlaps(&pond_rect(p, 0.0)))
                && objects
                    .lakes
                    .iter()
                    .all(|l| !bbox.overlaps(&lake_rect(l, 0.0)))
                && objects
                    .trees
                    .iter()
                    .all(|t| !bbox.overlaps(&sprite_box(t.position, t.size)));
            if clear {
                objects.rocks.push(Rock {
                    id: world.alloc_object_id(),
                    position,
                    size,
                });
                break;
            }
        }
    }
}

fn gen_pickups(world: &mut World, objects: &mut GameObjects, rng: &mut impl Rng) {
    for _ in 0..roll_count(worldgen::COIN_COUNT, rng) {
        let position =
            placement::find_valid_position(pickup::COIN_SIZE, objects, &world.config, rng);
        objects.coins.push(Pickup::new(
            world.alloc_object_id(),
            PickupKind::Coin,
            position,
        ));
    }
    for _ in 0..roll_count(worldgen::AMMO_COUNT, rng) {
        let position =
            placement::find_valid_position(pickup::AMMO_SIZE, objects, &world.config, rng);
        objects.ammo_packs.push(Pickup::new(
            world.alloc_object_id(),
            PickupKind::Ammo,
            position,
        ));
    }
    for _ in 0..roll_count(worldgen::BAIT_COUNT, rng) {
        let biased = !objects.ponds.is_empty() && rng.gen_bool(worldgen::BAIT_POND_BIAS);
        let position = if biased {
            pond_edge_position(objects, &world.config, rng)
        } else {
            placement::find_valid_position(pickup::BAIT_SIZE, objects, &world.config, rng)
        };
        objects.bait_packs.push(Pickup::new(
            world.alloc_object_id(),
            PickupKind::Bait,
            position,
        ));
    }
}

/// Position on a ring outside a random pond's ellipse edge, clamped into
/// bounds. Bait clusters where the fish are.
fn pond_edge_position(objects: &GameObjects, config: &WorldConfig, rng: &mut impl Rng) -> Vec2 {
    let pond = &objects.ponds[rng.gen_range(0..objects.ponds.len())];
    let (rx, ry) = pond.half_extents();
    let center = pond.center();
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let ring = rng.gen_range(worldgen::BAIT_RING.0..=worldgen::BAIT_RING.1);

    let edge = center + Vec2::new(angle.cos() * rx, angle.sin() * ry);
    let outward = (edge - center).normalize();
    let half = pickup::BAIT_SIZE / 2.0;
    let pos = edge + outward * ring - Vec2::new(half, half);
    Vec2::new(
        pos.x.clamp(0.0, (config.width - pickup::BAIT_SIZE).max(0.0)),
        pos.y.clamp(0.0, (config.height - pickup::BAIT_SIZE).max(0.0)),
    )
}
