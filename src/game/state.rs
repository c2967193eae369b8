//! World state definitions
//!
//! The `World` aggregate owns every mutable piece of the simulation: players,
//! bullets, generated objects, the dirty-score set, and the respawn queue.
//! All mutation goes through the single game-loop task; nothing here is
//! shared across threads.

#![allow(dead_code)]

use hashbrown::HashMap;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::config::WorldConfig;
use crate::game::objects::{Bullet, Lake, ObjectId, Pickup, PickupKind, PlayerId, Pond, Rock, Tree};
use crate::util::vec2::Vec2;

/// Player state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner of the sprite box, world-bounded
    pub position: Vec2,
    /// Display color, client-chosen or palette-assigned
    pub color: String,
    /// Persisted score; never negative
    pub score: i64,
    pub ammo: u32,
    pub bait: u32,
    /// Last input sequence the server committed, echoed for reconciliation
    pub last_processed_sequence: u64,
    /// Wall-clock time of the last accepted update in milliseconds
    pub last_update_ms: u64,
    pub id: PlayerId,
    pub username: String,
}

impl Player {
    pub fn new(id: PlayerId, username: String, color: String, config: &WorldConfig) -> Self {
        Self {
            position: Vec2::ZERO,
            color,
            score: 0,
            ammo: config.starting_ammo,
            bait: config.starting_bait,
            last_processed_sequence: 0,
            last_update_ms: 0,
            id,
            username,
        }
    }

    /// Center of the sprite box
    pub fn center(&self, player_size: f32) -> Vec2 {
        let half = player_size / 2.0;
        self.position + Vec2::new(half, half)
    }
}

/// Generated world objects, replaced wholesale on regeneration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameObjects {
    pub trees: Vec<Tree>,
    pub rocks: Vec<Rock>,
    pub coins: Vec<Pickup>,
    pub ammo_packs: Vec<Pickup>,
    pub bait_packs: Vec<Pickup>,
    pub ponds: Vec<Pond>,
    pub lakes: Vec<Lake>,
}

impl GameObjects {
    pub fn pickups_of(&self, kind: PickupKind) -> &Vec<Pickup> {
        match kind {
            PickupKind::Coin => &self.coins,
            PickupKind::Ammo => &self.ammo_packs,
            PickupKind::Bait => &self.bait_packs,
        }
    }

    pub fn pickups_of_mut(&mut self, kind: PickupKind) -> &mut Vec<Pickup> {
        match kind {
            PickupKind::Coin => &mut self.coins,
            PickupKind::Ammo => &mut self.ammo_packs,
            PickupKind::Bait => &mut self.bait_packs,
        }
    }
}

/// A scheduled pickup replacement. Carries the epoch it was scheduled under;
/// a regeneration in between makes it a no-op.
#[derive(Debug, Clone)]
pub struct PendingRespawn {
    pub due_ms: u64,
    pub kind: PickupKind,
    pub epoch: u64,
    /// Position of the collected instance (bait displacement rule)
    pub origin: Vec2,
}

/// Process-lifetime world aggregate
#[derive(Debug)]
pub struct World {
    pub config: WorldConfig,
    pub players: HashMap<PlayerId, Player>,
    pub bullets: Vec<Bullet>,
    pub objects: GameObjects,
    /// Incremented on every regeneration; stale respawns check against it
    pub epoch: u64,
    /// Players whose score changed since the last flush
    pub dirty_scores: FxHashSet<PlayerId>,
    pending_respawns: Vec<PendingRespawn>,
    username_index: HashMap<String, PlayerId>,
    next_object_id: ObjectId,
}

impl World {
    pub fn new(config: WorldConfig) -> Self {
        Self {
            config,
            players: HashMap::new(),
            bullets: Vec::new(),
            objects: GameObjects::default(),
            epoch: 0,
            dirty_scores: FxHashSet::default(),
            pending_respawns: Vec::new(),
            username_index: HashMap::new(),
            next_object_id: 0,
        }
    }

    pub fn alloc_object_id(&mut self) -> ObjectId {
        let id = self.next_object_id;
        self.next_object_id += 1;
        id
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn get_player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn player_id_by_username(&self, username: &str) -> Option<PlayerId> {
        self.username_index.get(username).copied()
    }

    /// Insert a player, keeping the username index in sync. The caller is
    /// responsible for evicting any prior holder of the username first.
    pub fn add_player(&mut self, player: Player) {
        self.username_index
            .insert(player.username.clone(), player.id);
        self.players.insert(player.id, player);
    }

    /// Remove a player and everything keyed to them
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        let player = self.players.remove(&id)?;
        // The index may already point at a newer holder of this username
        if self.username_index.get(player.username.as_str()) == Some(&id) {
            self.username_index.remove(player.username.as_str());
        }
        self.dirty_scores.remove(&id);
        self.bullets.retain(|b| b.owner != id);
        Some(player)
    }

    pub fn mark_score_dirty(&mut self, id: PlayerId) {
        self.dirty_scores.insert(id);
    }

    /// Drain the dirty set into (username, score) pairs for the flush sweep
    pub fn take_dirty_scores(&mut self) -> Vec<(String, i64)> {
        let ids: Vec<PlayerId> = self.dirty_scores.drain().collect();
        ids.into_iter()
            .filter_map(|id| {
                self.players
                    .get(&id)
                    .map(|p| (p.username.clone(), p.score))
            })
            .collect()
    }

    pub fn schedule_respawn(&mut self, kind: PickupKind, due_ms: u64, origin: Vec2) {
        self.pending_respawns.push(PendingRespawn {
            due_ms,
            kind,
            epoch: self.epoch,
            origin,
        });
    }

    /// Remove and return every respawn entry that is due, stale epochs included;
    /// the caller drops entries whose epoch no longer matches.
    pub fn take_due_respawns(&mut self, now_ms: u64) -> Vec<PendingRespawn> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.pending_respawns.len() {
            if self.pending_respawns[i].due_ms <= now_ms {
                due.push(self.pending_respawns.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due
    }

    pub fn pending_respawn_count(&self) -> usize {
        self.pending_respawns.len()
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.config.width / 2.0, self.config.height / 2.0)
    }
}
