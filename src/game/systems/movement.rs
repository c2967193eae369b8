//! Movement validation
//!
//! The server never trusts a proposed position: it clamps into world bounds,
//! re-checks collision, and either commits or answers with the unchanged
//! authoritative position. A rejection is an echo, not an error.

use rand::Rng;

use crate::game::collision::{collides_any_obstacle, player_hitbox};
use crate::game::objects::PlayerId;
use crate::game::placement;
use crate::game::state::World;
use crate::util::vec2::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// Committed at the clamped position; broadcast within the interest radius
    Accepted { position: Vec2 },
    /// Validation failed; echo the authoritative position to the mover only
    Rejected { position: Vec2 },
}

/// Validate and commit a proposed move. `None` when the player is unknown.
pub fn apply_move(
    world: &mut World,
    player_id: PlayerId,
    proposed: Vec2,
    sequence: u64,
    now_ms: u64,
) -> Option<MoveOutcome> {
    let size = world.config.player_size;
    let current = world.get_player(player_id)?.position;

    if !proposed.is_finite() {
        return Some(MoveOutcome::Rejected { position: current });
    }

    let clamped = Vec2::new(
        proposed.x.clamp(0.0, (world.config.width - size).max(0.0)),
        proposed.y.clamp(0.0, (world.config.height - size).max(0.0)),
    );
    let hitbox = player_hitbox(clamped, size, world.config.hitbox_inset);
    if collides_any_obstacle(&hitbox, &world.objects.trees, &world.objects.rocks) {
        return Some(MoveOutcome::Rejected { position: current });
    }

    let player = world.get_player_mut(player_id)?;
    player.position = clamped;
    player.last_processed_sequence = sequence;
    player.last_update_ms = now_ms;
    Some(MoveOutcome::Accepted { position: clamped })
}

/// Teleport a stuck player to a fresh safe spawn. Answered like a
/// correction so the client snaps without interpolation.
pub fn unstuck(
    world: &mut World,
    player_id: PlayerId,
    now_ms: u64,
    rng: &mut impl Rng,
) -> Option<Vec2> {
    world.get_player(player_id)?;
    let position = placement::find_safe_spawn_position(world, rng);
    let player = world.get_player_mut(player_id)?;
    player.position = position;
    player.last_update_ms = now_ms;
    Some(position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::game::objects::Tree;
    use crate::game::state::Player;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    fn world_with_player(position: Vec2) -> (World, PlayerId) {
        let mut world = World::new(WorldConfig::default());
        let id = Uuid::new_v4();
        let mut player = Player::new(id, "mover".to_string(), "#FF0000".to_string(), &world.config);
        player.position = position;
        world.add_player(player);
        (world, id)
    }

    #[test]
    fn test_valid_move_commits() {
        let (mut world, id) = world_with_player(Vec2::new(100.0, 100.0));
        let outcome = apply_move(&mut world, id, Vec2::new(120.0, 110.0), 7, 500);
        assert_eq!(
            outcome,
            Some(MoveOutcome::Accepted {
                position: Vec2::new(120.0, 110.0)
            })
        );
        let player = world.get_player(id).unwrap();
        assert_eq!(player.position, Vec2::new(120.0, 110.0));
        assert_eq!(player.last_processed_sequence, 7);
        assert_eq!(player.last_update_ms, 500);
    }

    #[test]
    fn test_out_of_bounds_is_clamped_then_committed() {
        let (mut world, id) = world_with_player(Vec2::new(100.0, 100.0));
        let outcome = apply_move(&mut world, id, Vec2::new(-40.0, 9999.0), 1, 0);
        let expected = Vec2::new(0.0, world.config.height - world.config.player_size);
        assert_eq!(
            outcome,
            Some(MoveOutcome::Accepted { position: expected })
        );
        assert_eq!(world.get_player(id).unwrap().position, expected);
    }

    #[test]
    fn test_collision_rejects_without_mutation() {
        let (mut world, id) = world_with_player(Vec2::new(60.0, 60.0));
        // Trunk hitbox spans (90,90)..(150,140)
        world.objects.trees.push(Tree {
            id: 0,
            position: Vec2::new(70.0, 40.0),
            size: 100.0,
        });
        let outcome = apply_move(&mut world, id, Vec2::new(100.0, 80.0), 4, 100);
        assert_eq!(
            outcome,
            Some(MoveOutcome::Rejected {
                position: Vec2::new(60.0, 60.0)
            })
        );
        let player = world.get_player(id).unwrap();
        assert_eq!(player.position, Vec2::new(60.0, 60.0));
        assert_eq!(player.last_processed_sequence, 0);
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let (mut world, id) = world_with_player(Vec2::new(60.0, 60.0));
        let outcome = apply_move(&mut world, id, Vec2::new(f32::NAN, 10.0), 2, 0);
        assert_eq!(
            outcome,
            Some(MoveOutcome::Rejected {
                position: Vec2::new(60.0, 60.0)
            })
        );
        assert_eq!(world.get_player(id).unwrap().position, Vec2::new(60.0, 60.0));
    }

    #[test]
    fn test_unknown_player_is_none() {
        let mut world = World::new(WorldConfig::default());
        assert_eq!(
            apply_move(&mut world, Uuid::new_v4(), Vec2::new(1.0, 1.0), 0, 0),
            None
        );
    }

    #[test]
    fn test_unstuck_relocates() {
        let (mut world, id) = world_with_player(Vec2::new(100.0, 100.0));
        let mut rng = StdRng::seed_from_u64(3);
        let position = unstuck(&mut world, id, 900, &mut rng).unwrap();
        let player = world.get_player(id).unwrap();
        assert_eq!(player.position, position);
        assert_eq!(player.last_update_ms, 900);
    }
}
