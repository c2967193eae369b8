//! Interest scoping for movement broadcasts
//!
//! Position updates only go to players near the mover, which keeps
//! per-tick bandwidth flat as the world fills up. Full-state broadcasts
//! are coalesced through [`FullStateThrottle`] so bursts of object
//! churn (pickups, respawns) collapse into one snapshot per window.

use smallvec::SmallVec;

use crate::game::objects::PlayerId;
use crate::game::state::World;
use crate::util::vec2::Vec2;

/// Squared-distance check against an interest radius
#[inline]
pub fn within_radius(a: Vec2, b: Vec2, radius: f32) -> bool {
    (a - b).length_sq() <= radius * radius
}

/// Collect the ids of every player within `radius` of `origin`,
/// including the player standing at the origin
pub fn players_in_range(world: &World, origin: Vec2, radius: f32) -> SmallVec<[PlayerId; 16]> {
    world
        .players
        .values()
        .filter(|p| within_radius(p.position, origin, radius))
        .map(|p| p.id)
        .collect()
}

/// Coalesces full-state broadcast requests into at most one emit per window.
///
/// The first request after a quiet period fires on the next poll; anything
/// requested inside the window rides along with the emit that closes it.
#[derive(Debug)]
pub struct FullStateThrottle {
    window_ms: u64,
    last_sent_ms: u64,
    pending: bool,
}

impl FullStateThrottle {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            last_sent_ms: 0,
            pending: false,
        }
    }

    /// Mark that the object set changed and clients need a fresh snapshot
    pub fn request(&mut self) {
        self.pending = true;
    }

    /// True when a pending snapshot is due; arms the next window
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if self.pending && now_ms.saturating_sub(self.last_sent_ms) >= self.window_ms {
            self.pending = false;
            self.last_sent_ms = now_ms;
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::game::state::Player;
    use uuid::Uuid;

    fn world_with_players(positions: &[Vec2]) -> (World, Vec<PlayerId>) {
        let config = WorldConfig::default();
        let mut world = World::new(config.clone());
        let mut ids = Vec::new();
        for (i, pos) in positions.iter().enumerate() {
            let id = Uuid::new_v4();
            let mut player = Player::new(id, format!("p{}", i), "#ff0000".to_string(), &config);
            player.position = *pos;
            world.add_player(player);
            ids.push(id);
        }
        (world, ids)
    }

    #[test]
    fn test_within_radius_boundary() {
        let a = Vec2::new(0.0, 0.0);
        assert!(within_radius(a, Vec2::new(1500.0, 0.0), 1500.0));
        assert!(!within_radius(a, Vec2::new(1500.1, 0.0), 1500.0));
    }

    #[test]
    fn test_players_in_range_filters_far_players() {
        let (world, ids) = world_with_players(&[
            Vec2::new(100.0, 100.0),
            Vec2::new(600.0, 100.0),
            Vec2::new(4000.0, 4000.0),
        ]);

        let near = players_in_range(&world, Vec2::new(100.0, 100.0), 1500.0);
        assert_eq!(near.len(), 2);
        assert!(near.contains(&ids[0]));
        assert!(near.contains(&ids[1]));
        assert!(!near.contains(&ids[2]));
    }

    #[test]
    fn test_players_in_range_includes_origin_player() {
        let (world, ids) = world_with_players(&[Vec2::new(250.0, 250.0)]);
        let near = players_in_range(&world, Vec2::new(250.0, 250.0), 1500.0);
        assert_eq!(near.as_slice(), &[ids[0]]);
    }

    #[test]
    fn test_throttle_first_request_fires_next_poll() {
        let mut throttle = FullStateThrottle::new(3000);
        assert!(!throttle.poll(10_000));

        throttle.request();
        assert!(throttle.poll(10_033));
        assert!(!throttle.is_pending());
    }

    #[test]
    fn test_throttle_coalesces_burst_into_one_emit() {
        let mut throttle = FullStateThrottle::new(3000);
        throttle.request();
        assert!(throttle.poll(5000));

        // Three changes inside the window produce a single emit at its close
        throttle.request();
        throttle.request();
        assert!(!throttle.poll(6000));
        throttle.request();
        assert!(!throttle.poll(7900));
        assert!(throttle.poll(8000));
        assert!(!throttle.poll(8033));
    }

    #[test]
    fn test_throttle_idle_without_requests() {
        let mut throttle = FullStateThrottle::new(3000);
        for t in (0..20_000).step_by(33) {
            assert!(!throttle.poll(t));
        }
    }
}
