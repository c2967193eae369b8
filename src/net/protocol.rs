use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::fishing::CaughtFish;
use crate::game::objects::{Bullet, ObjectId, PlayerId};
use crate::game::state::{GameObjects, Player, World};

/// Messages from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Request to join the world; `token` resumes a previous session
    Join {
        username: String,
        color: String,
        token: Option<Vec<u8>>,
    },
    /// Proposed position for server validation
    Move {
        x: f32,
        y: f32,
        sequence: u64,
        timestamp: u64,
    },
    /// Spawn a bullet at the claimed origin heading along (dir_x, dir_y)
    Shoot {
        x: f32,
        y: f32,
        dir_x: f32,
        dir_y: f32,
    },
    /// Collect a coin instance
    CollectCoin { id: ObjectId },
    /// Collect an ammo pack instance
    CollectAmmo { id: ObjectId },
    /// Collect a bait pack instance
    CollectBait { id: ObjectId },
    /// Cast a line; consumes one bait
    CatchFish,
    /// Teleport to a fresh safe spawn
    RequestUnstuck,
    /// Broadcast a chat line
    Chat { text: String },
    /// Swap the avatar color
    ChangeColor { color: String },
    /// List the caller's caught fish
    RequestFishInventory,
    /// Delete one of the caller's caught fish
    DeleteFish { fish_id: Uuid },
    /// Ping for latency measurement
    Ping { timestamp: u64 },
    /// Polite disconnect
    Leave,
}

/// Messages from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Join confirmation with identity, resume token, and the initial world
    JoinAccepted {
        player_id: PlayerId,
        session_token: Vec<u8>,
        world_snapshot: WorldSnapshot,
    },
    /// Join was rejected
    JoinRejected { reason: String },
    /// Player snapshot, optionally with objects and the caller's last
    /// committed input sequence
    GameState {
        players: Vec<PlayerSnapshot>,
        objects: Option<GameObjects>,
        sequence: Option<u64>,
    },
    /// An accepted move, sent within the mover's interest radius
    PlayerMove {
        id: PlayerId,
        x: f32,
        y: f32,
        timestamp: u64,
        client_timestamp: u64,
    },
    /// Authoritative position echo after a rejected move or a teleport
    PositionCorrection { x: f32, y: f32, timestamp: u64 },
    /// Full bullet list, sent on spawn and on destruction
    BulletsUpdate { bullets: Vec<BulletSnapshot> },
    /// A bullet connected
    PlayerHit {
        player_id: PlayerId,
        shooter_id: PlayerId,
        damage: i64,
    },
    /// Partial player records after a hit resolution
    PlayersUpdate { players: Vec<PlayerSnapshot> },
    /// The caller's catch resolved
    FishCaught { fish: CaughtFish },
    /// The caller's ledger contents
    FishInventory { fish: Vec<CaughtFish> },
    /// Ledger delete acknowledged
    FishDeleted { fish_id: Uuid },
    /// Ammo collection ack
    AmmoUpdate { ammo: u32 },
    /// Bait collection ack or reject-at-capacity echo
    BaitUpdate { bait: u32 },
    /// A new player entered the world
    PlayerJoined { player: PlayerSnapshot },
    /// A player left the world
    PlayerLeft {
        player_id: PlayerId,
        username: String,
    },
    /// Relayed chat line
    Chat {
        username: String,
        text: String,
        timestamp: u64,
    },
    /// Throttled full world broadcast
    FullGameState {
        players: Vec<PlayerSnapshot>,
        objects: GameObjects,
        timestamp: u64,
    },
    /// Lookup failure visible to the client
    Error { message: String },
    /// Pong response echoing the client timestamp
    Pong { timestamp: u64 },
}

/// Player state for network transmission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub username: String,
    pub color: String,
    pub x: f32,
    pub y: f32,
    pub score: i64,
    pub ammo: u32,
    pub bait: u32,
    pub sequence: u64,
}

impl PlayerSnapshot {
    pub fn from_player(player: &Player) -> Self {
        Self {
            id: player.id,
            username: player.username.clone(),
            color: player.color.clone(),
            x: player.position.x,
            y: player.position.y,
            score: player.score,
            ammo: player.ammo,
            bait: player.bait,
            sequence: player.last_processed_sequence,
        }
    }
}

/// Bullet state for network transmission; clients extrapolate from this
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulletSnapshot {
    pub owner: PlayerId,
    pub x: f32,
    pub y: f32,
    pub dir_x: f32,
    pub dir_y: f32,
    pub spawn_time_ms: u64,
}

impl BulletSnapshot {
    pub fn from_bullet(bullet: &Bullet) -> Self {
        Self {
            owner: bullet.owner,
            x: bullet.position.x,
            y: bullet.position.y,
            dir_x: bullet.direction.x,
            dir_y: bullet.direction.y,
            spawn_time_ms: bullet.spawn_time_ms,
        }
    }
}

/// Everything a joining client needs to render the world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub players: Vec<PlayerSnapshot>,
    pub objects: GameObjects,
    pub bullets: Vec<BulletSnapshot>,
    pub timestamp: u64,
}

impl WorldSnapshot {
    pub fn from_world(world: &World, timestamp: u64) -> Self {
        Self {
            players: world
                .players
                .values()
                .map(PlayerSnapshot::from_player)
                .collect(),
            objects: world.objects.clone(),
            bullets: world
                .bullets
                .iter()
                .map(BulletSnapshot::from_bullet)
                .collect(),
            timestamp,
        }
    }
}

/// Encode a message using bincode
/// Uses legacy config for fixed-size integers (compatible with the
/// browser client's decoder)
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, EncodeError> {
    bincode::serde::encode_to_vec(message, bincode::config::legacy())
        .map_err(|e| EncodeError(e.to_string()))
}

/// Decode a message using bincode
/// Uses legacy config for fixed-size integers (compatible with the
/// browser client's decoder)
pub fn decode<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, DecodeError> {
    bincode::serde::decode_from_slice(data, bincode::config::legacy())
        .map(|(msg, _)| msg)
        .map_err(|e| DecodeError(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
#[error("Encode error: {0}")]
pub struct EncodeError(String);

#[derive(Debug, thiserror::Error)]
#[error("Decode error: {0}")]
pub struct DecodeError(String);
