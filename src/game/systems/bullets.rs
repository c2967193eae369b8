//! Projectile gate and per-tick simulation
//!
//! Shooting is validated before any mutation. The tick walks live bullets
//! in reverse index order so removal never skips an element; per bullet the
//! first matching outcome wins: lifetime, bounds, obstacle, player hit.

use smallvec::SmallVec;
use thiserror::Error;

use crate::game::collision::{point_in_any_obstacle, sprite_box};
use crate::game::objects::{Bullet, PlayerId};
use crate::game::state::World;
use crate::util::vec2::Vec2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShootError {
    #[error("player not in world")]
    UnknownPlayer,
    #[error("no ammo")]
    NoAmmo,
    #[error("claimed origin too far from the shooter")]
    OriginTooFar,
    #[error("direction is zero or non-finite")]
    BadDirection,
}

/// A resolved bullet-player hit from one tick
#[derive(Debug, Clone, Copy)]
pub struct HitEvent {
    pub shooter: PlayerId,
    pub victim: PlayerId,
    pub damage: i64,
}

/// What one projectile tick changed
#[derive(Debug, Default)]
pub struct BulletTick {
    /// Bullets destroyed this tick; a nonzero count triggers a list broadcast
    pub destroyed: u32,
    pub hits: SmallVec<[HitEvent; 4]>,
}

/// Validate a shoot request and spawn the bullet. Nothing mutates on a
/// rejection.
pub fn try_shoot(
    world: &mut World,
    player_id: PlayerId,
    origin: Vec2,
    direction: Vec2,
    now_ms: u64,
) -> Result<(), ShootError> {
    let player = world.get_player(player_id).ok_or(ShootError::UnknownPlayer)?;
    if player.ammo == 0 {
        return Err(ShootError::NoAmmo);
    }
    if !origin.is_finite() || !direction.is_finite() || direction.length_sq() <= f32::EPSILON {
        return Err(ShootError::BadDirection);
    }
    let center = player.center(world.config.player_size);
    if origin.distance_to(center) > world.config.shoot_origin_tolerance {
        return Err(ShootError::OriginTooFar);
    }

    let direction = direction.normalize();
    if let Some(player) = world.get_player_mut(player_id) {
        player.ammo -= 1;
    }
    world.bullets.push(Bullet {
        owner: player_id,
        position: origin,
        direction,
        spawn_time_ms: now_ms,
    });
    Ok(())
}

/// Advance and resolve every live bullet for one tick
pub fn advance_bullets(world: &mut World, now_ms: u64) -> BulletTick {
    let mut tick = BulletTick::default();
    let speed = world.config.bullet_speed;
    let lifetime = world.config.bullet_lifetime_ms;
    let transfer = world.config.hit_score_transfer;
    let player_size = world.config.player_size;
    let (width, height) = (world.config.width, world.config.height);

    let mut i = world.bullets.len();
    while i > 0 {
        i -= 1;

        let (position, owner, spawn_time_ms) = {
            let bullet = &mut world.bullets[i];
            bullet.position += bullet.direction * speed;
            (bullet.position, bullet.owner, bullet.spawn_time_ms)
        };

        if now_ms.saturating_sub(spawn_time_ms) > lifetime {
            world.bullets.swap_remove(i);
            tick.destroyed += 1;
            continue;
        }

        if position.x < 0.0 || position.y < 0.0 || position.x > width || position.y > height {
            world.bullets.swap_remove(i);
            tick.destroyed += 1;
            continue;
        }

        if point_in_any_obstacle(position, &world.objects.trees, &world.objects.rocks) {
            world.bullets.swap_remove(i);
            tick.destroyed += 1;
            continue;
        }

        // Bullets hit the full sprite box, not the movement hitbox
        let victim_id = world
            .players
            .values()
            .find(|p| p.id != owner && sprite_box(p.position, player_size).contains_point(position))
            .map(|p| p.id);
        if let Some(victim_id) = victim_id {
            if let Some(shooter) = world.get_player_mut(owner) {
                shooter.score += transfer;
            }
            if let Some(victim) = world.get_player_mut(victim_id) {
                victim.score = (victim.score - transfer).max(0);
            }
            // The flush sweep skips ids that have since departed
            world.mark_score_dirty(owner);
            world.mark_score_dirty(victim_id);
            tick.hits.push(HitEvent {
                shooter: owner,
                victim: victim_id,
                damage: transfer,
            });
            world.bullets.swap_remove(i);
            tick.destroyed += 1;
        }
    }
    tick
}
