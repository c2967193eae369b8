//! World entity definitions
//!
//! Static obstacles, pickups, water bodies, and bullets. Players live in
//! `state.rs` next to the aggregate that owns them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::constants::pickup;
use crate::util::vec2::Vec2;

/// Unique player identifier
pub type PlayerId = Uuid;

/// Identifier for non-player world objects, unique within a world epoch
pub type ObjectId = u64;

/// Static obstacle; the collidable trunk is a sub-region of the sprite box
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub id: ObjectId,
    /// Top-left corner of the sprite box
    pub position: Vec2,
    /// Sprite box edge length
    pub size: f32,
}

/// Static obstacle with a reduced core hitbox
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rock {
    pub id: ObjectId,
    pub position: Vec2,
    pub size: f32,
}

/// The three collectible kinds share shape; behavior differs per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupKind {
    Coin,
    Ammo,
    Bait,
}

impl PickupKind {
    /// Delay before a replacement is placed after collection
    pub fn respawn_delay_ms(&self) -> u64 {
        match self {
            PickupKind::Coin => pickup::COIN_RESPAWN_MS,
            PickupKind::Ammo => pickup::AMMO_RESPAWN_MS,
            PickupKind::Bait => pickup::BAIT_RESPAWN_MS,
        }
    }

    pub fn size(&self) -> f32 {
        match self {
            PickupKind::Coin => pickup::COIN_SIZE,
            PickupKind::Ammo => pickup::AMMO_SIZE,
            PickupKind::Bait => pickup::BAIT_SIZE,
        }
    }
}

/// A collectible world item. Once `collected` it is inert until pruned by the
/// scheduled respawn for its kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: ObjectId,
    pub kind: PickupKind,
    pub position: Vec2,
    pub collected: bool,
}

impl Pickup {
    pub fn new(id: ObjectId, kind: PickupKind, position: Vec2) -> Self {
        Self {
            id,
            kind,
            position,
            collected: false,
        }
    }

    pub fn center(&self) -> Vec2 {
        let half = self.kind.size() / 2.0;
        self.position + Vec2::new(half, half)
    }
}

/// Fishable water body with an elliptical deep zone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pond {
    pub id: ObjectId,
    /// Top-left corner of the bounding rectangle
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
}

impl Pond {
    pub fn center(&self) -> Vec2 {
        self.position + Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Ellipse half-extents (rx, ry)
    pub fn half_extents(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }
}

/// Cosmetic water body; constrains placement, no gameplay effect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lake {
    pub id: ObjectId,
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
}

impl Lake {
    pub fn center(&self) -> Vec2 {
        self.position + Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Live projectile; travels `direction * speed` per tick until destroyed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub owner: PlayerId,
    pub position: Vec2,
    /// Normalized at the shoot gate
    pub direction: Vec2,
    /// Wall-clock spawn time in milliseconds
    pub spawn_time_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_respawn_delays_ordered() {
        assert!(PickupKind::Coin.respawn_delay_ms() < PickupKind::Ammo.respawn_delay_ms());
        assert!(PickupKind::Ammo.respawn_delay_ms() < PickupKind::Bait.respawn_delay_ms());
    }

    #[test]
    fn test_pond_center() {
        let pond = Pond {
            id: 1,
            position: Vec2::new(100.0, 200.0),
            width: 200.0,
            height: 100.0,
        };
        assert_eq!(pond.center(), Vec2::new(200.0, 250.0));
        assert_eq!(pond.half_extents(), (100.0, 50.0));
    }

    #[test]
    fn test_pickup_center() {
        let p = Pickup::new(1, PickupKind::Coin, Vec2::new(10.0, 20.0));
        assert_eq!(p.center(), Vec2::new(25.0, 35.0));
        assert!(!p.collected);
    }
}
