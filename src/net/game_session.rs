//! Authoritative game loop.
//!
//! A single task owns the [`World`] and is its only writer. Connection tasks
//! submit [`Command`]s over a bounded queue and the loop drains them at the
//! top of each tick, then advances projectiles, fills due respawns, and fans
//! state back out through per-connection writer channels. Persistence never
//! blocks a tick: score and ledger writes run on spawned tasks.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use hashbrown::HashMap;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::game::command_queue::{CommandQueue, CommandSender};
use crate::game::constants::{player as player_constants, world as world_constants};
use crate::game::fishing::{try_catch, CatchError, FishCatalog};
use crate::game::objects::{ObjectId, PickupKind, PlayerId};
use crate::game::placement;
use crate::game::state::{Player, World};
use crate::game::systems::bullets::{advance_bullets, try_shoot};
use crate::game::systems::movement::{apply_move, unstuck, MoveOutcome};
use crate::game::systems::pickups::{collect, process_respawns, CollectOutcome};
use crate::game::worldgen::generate_world;
use crate::metrics::ServerMetrics;
use crate::net::interest::{players_in_range, FullStateThrottle};
use crate::net::protocol::{encode, BulletSnapshot, PlayerSnapshot, ServerMessage, WorldSnapshot};
use crate::net::session::SessionManager;
use crate::store::{spawn_catch_insert, spawn_score_write, CatchLedger, ScoreStore};
use crate::util::vec2::Vec2;

/// Pre-encoded frames headed for one connection's writer task.
pub type OutboundSender = mpsc::Sender<Vec<u8>>;

/// Outbound frames buffered per connection before the loop starts dropping.
pub const OUTBOUND_BUFFER: usize = 256;

/// Commands buffered for the loop before connections see backpressure.
const COMMAND_QUEUE_CAPACITY: usize = 1024;

/// Cadence of the lightweight player-list reconciliation broadcast.
const STATE_SYNC_INTERVAL_MS: u64 = 1000;

/// Cadence of the session sweep and the metrics summary line.
const MAINTENANCE_INTERVAL_MS: u64 = 60_000;

/// A client intent, validated and applied on the game loop.
///
/// The connection task resolves identity up front: it allocates the
/// `player_id`, resolves the persisted score (session resume or store load)
/// and sanitizes text fields, so the loop never awaits anything.
#[derive(Debug)]
pub enum Command {
    Join {
        player_id: PlayerId,
        username: String,
        /// Validated hex color, or empty to have the server assign one.
        color: String,
        /// Persisted score resolved by the connection task.
        score: i64,
        writer: OutboundSender,
        /// Adjudication result: `true` once the player is in the world. The
        /// connection binds its identity only on `true`.
        ack: oneshot::Sender<bool>,
    },
    Move {
        player_id: PlayerId,
        proposed: Vec2,
        sequence: u64,
        timestamp: u64,
    },
    Shoot {
        player_id: PlayerId,
        origin: Vec2,
        direction: Vec2,
    },
    Collect {
        player_id: PlayerId,
        kind: PickupKind,
        item_id: ObjectId,
    },
    CatchFish {
        player_id: PlayerId,
    },
    Unstuck {
        player_id: PlayerId,
    },
    Chat {
        player_id: PlayerId,
        text: String,
    },
    ChangeColor {
        player_id: PlayerId,
        /// Validated hex color.
        color: String,
    },
    Disconnect {
        player_id: PlayerId,
    },
}

/// The game loop and everything it owns.
pub struct GameSession {
    world: World,
    config: ServerConfig,
    queue: CommandQueue<Command>,
    writers: HashMap<PlayerId, OutboundSender>,
    sessions: Arc<Mutex<SessionManager>>,
    catalog: FishCatalog,
    throttle: FullStateThrottle,
    metrics: Arc<ServerMetrics>,
    score_store: Arc<dyn ScoreStore>,
    catch_ledger: Arc<dyn CatchLedger>,
    rng: StdRng,
    last_flush_ms: u64,
    last_state_sync_ms: u64,
    last_maintenance_ms: u64,
}

impl GameSession {
    pub fn new(
        config: ServerConfig,
        sessions: Arc<Mutex<SessionManager>>,
        catalog: FishCatalog,
        metrics: Arc<ServerMetrics>,
        score_store: Arc<dyn ScoreStore>,
        catch_ledger: Arc<dyn CatchLedger>,
    ) -> Self {
        let world = World::new(config.world.clone());
        let throttle = FullStateThrottle::new(config.full_state_window_ms);
        Self {
            world,
            config,
            queue: CommandQueue::new(COMMAND_QUEUE_CAPACITY),
            writers: HashMap::default(),
            sessions,
            catalog,
            throttle,
            metrics,
            score_store,
            catch_ledger,
            rng: StdRng::from_entropy(),
            last_flush_ms: 0,
            last_state_sync_ms: 0,
            last_maintenance_ms: 0,
        }
    }

    /// Handle for connection tasks to submit commands.
    pub fn command_sender(&self) -> CommandSender<Command> {
        self.queue.handle()
    }

    /// Drive the loop forever at the fixed tick rate.
    pub async fn run(mut self) {
        let mut ticker = interval(Duration::from_millis(world_constants::TICK_DURATION_MS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let now_ms = unix_now_ms();
        self.last_flush_ms = now_ms;
        self.last_state_sync_ms = now_ms;
        self.last_maintenance_ms = now_ms;

        info!("Game loop running at {} Hz", world_constants::TICK_RATE);
        loop {
            ticker.tick().await;
            let started = Instant::now();
            self.tick(unix_now_ms());
            self.metrics.record_tick(started.elapsed());
        }
    }

    /// One simulation step: drain commands, advance the world, broadcast.
    pub fn tick(&mut self, now_ms: u64) {
        let commands = self.queue.drain();
        let command_count = commands.len() as u64;
        for command in commands {
            self.handle_command(command, now_ms);
        }
        if command_count > 0 {
            self.metrics.add_commands(command_count);
        }

        let outcome = advance_bullets(&mut self.world, now_ms);
        for hit in &outcome.hits {
            self.broadcast(&ServerMessage::PlayerHit {
                player_id: hit.victim,
                shooter_id: hit.shooter,
                damage: hit.damage,
            });
            let affected: Vec<PlayerSnapshot> = [hit.shooter, hit.victim]
                .into_iter()
                .filter_map(|id| self.world.get_player(id))
                .map(PlayerSnapshot::from_player)
                .collect();
            if !affected.is_empty() {
                self.broadcast(&ServerMessage::PlayersUpdate { players: affected });
            }
            let mut sessions = self.sessions.lock();
            for id in [hit.shooter, hit.victim] {
                if let Some(player) = self.world.get_player(id) {
                    sessions.cache_score(id, player.score);
                }
            }
        }
        if outcome.destroyed > 0 {
            self.broadcast_bullets();
        }

        if process_respawns(&mut self.world, now_ms, &mut self.rng) > 0 {
            self.throttle.request();
        }

        if self.throttle.poll(now_ms) {
            let players = self
                .world
                .players
                .values()
                .map(PlayerSnapshot::from_player)
                .collect();
            self.broadcast(&ServerMessage::FullGameState {
                players,
                objects: self.world.objects.clone(),
                timestamp: now_ms,
            });
        }

        if self.world.player_count() > 0
            && now_ms.saturating_sub(self.last_state_sync_ms) >= STATE_SYNC_INTERVAL_MS
        {
            self.last_state_sync_ms = now_ms;
            let players = self
                .world
                .players
                .values()
                .map(PlayerSnapshot::from_player)
                .collect();
            self.broadcast(&ServerMessage::GameState {
                players,
                objects: None,
                sequence: None,
            });
        }

        if now_ms.saturating_sub(self.last_flush_ms) >= self.config.score_flush_interval_ms {
            self.last_flush_ms = now_ms;
            self.flush_dirty_scores();
        }

        if now_ms.saturating_sub(self.last_maintenance_ms) >= MAINTENANCE_INTERVAL_MS {
            self.last_maintenance_ms = now_ms;
            let expired = self.sessions.lock().cleanup_expired();
            if expired > 0 {
                debug!("Expired {} idle sessions", expired);
            }
            self.metrics.log_summary(self.world.player_count());
        }
    }

    pub fn handle_command(&mut self, command: Command, now_ms: u64) {
        match command {
            Command::Join {
                player_id,
                username,
                color,
                score,
                writer,
                ack,
            } => self.handle_join(player_id, username, color, score, writer, ack, now_ms),
            Command::Move {
                player_id,
                proposed,
                sequence,
                timestamp,
            } => self.handle_move(player_id, proposed, sequence, timestamp, now_ms),
            Command::Shoot {
                player_id,
                origin,
                direction,
            } => self.handle_shoot(player_id, origin, direction, now_ms),
            Command::Collect {
                player_id,
                kind,
                item_id,
            } => self.handle_collect(player_id, kind, item_id, now_ms),
            Command::CatchFish { player_id } => self.handle_catch(player_id, now_ms),
            Command::Unstuck { player_id } => self.handle_unstuck(player_id, now_ms),
            Command::Chat { player_id, text } => self.handle_chat(player_id, text, now_ms),
            Command::ChangeColor { player_id, color } => {
                self.handle_change_color(player_id, color)
            }
            Command::Disconnect { player_id } => {
                self.drop_player(player_id, true, "disconnected");
            }
        }
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        username: String,
        color: String,
        score: i64,
        writer: OutboundSender,
        ack: oneshot::Sender<bool>,
        now_ms: u64,
    ) {
        // At most one live entity per username: the old holder is evicted
        // like a disconnect, except its resume token dies with it.
        if let Some(old_id) = self.world.player_id_by_username(&username) {
            info!("{} rejoined, evicting the previous connection", username);
            self.drop_player(old_id, false, "evicted by rejoin");
        }

        if self.world.player_count() >= self.config.max_players {
            self.send_raw(
                &writer,
                &ServerMessage::JoinRejected {
                    reason: "server is full".to_string(),
                },
            );
            let _ = ack.send(false);
            return;
        }

        // A fresh map for the first player in; regenerating later would pull
        // the ground out from under anyone already walking on it.
        if self.world.player_count() == 0 {
            generate_world(&mut self.world, &mut self.rng);
        }

        let color = if color.is_empty() {
            let palette = &player_constants::COLOR_PALETTE;
            palette[self.world.player_count() % palette.len()].to_string()
        } else {
            color
        };

        let mut player = Player::new(player_id, username.clone(), color, &self.config.world);
        player.score = score;
        player.position = placement::find_safe_spawn_position(&self.world, &mut self.rng);
        player.last_update_ms = now_ms;
        self.world.add_player(player);

        let token = {
            let mut sessions = self.sessions.lock();
            sessions
                .create_session(player_id, username.clone(), score)
                .map(|session| session.token.to_vec())
                .unwrap_or_default()
        };
        if token.is_empty() {
            warn!("Session table full, {} joins without a resume token", username);
        }

        self.writers.insert(player_id, writer);
        self.send_to(
            player_id,
            &ServerMessage::JoinAccepted {
                player_id,
                session_token: token,
                world_snapshot: WorldSnapshot::from_world(&self.world, now_ms),
            },
        );
        if let Some(player) = self.world.get_player(player_id) {
            let joined = ServerMessage::PlayerJoined {
                player: PlayerSnapshot::from_player(player),
            };
            self.broadcast_except(player_id, &joined);
        }
        info!(
            "{} joined ({} players online)",
            username,
            self.world.player_count()
        );
        let _ = ack.send(true);
    }

    fn handle_move(
        &mut self,
        player_id: PlayerId,
        proposed: Vec2,
        sequence: u64,
        client_timestamp: u64,
        now_ms: u64,
    ) {
        match apply_move(&mut self.world, player_id, proposed, sequence, now_ms) {
            Some(MoveOutcome::Accepted { position }) => {
                self.broadcast_interest(
                    position,
                    player_id,
                    &ServerMessage::PlayerMove {
                        id: player_id,
                        x: position.x,
                        y: position.y,
                        timestamp: now_ms,
                        client_timestamp,
                    },
                );
            }
            Some(MoveOutcome::Rejected { position }) => {
                self.send_to(
                    player_id,
                    &ServerMessage::PositionCorrection {
                        x: position.x,
                        y: position.y,
                        timestamp: now_ms,
                    },
                );
            }
            None => {}
        }
    }

    fn handle_shoot(&mut self, player_id: PlayerId, origin: Vec2, direction: Vec2, now_ms: u64) {
        match try_shoot(&mut self.world, player_id, origin, direction, now_ms) {
            Ok(()) => self.broadcast_bullets(),
            Err(err) => debug!("Dropped shot from {}: {}", player_id, err),
        }
    }

    fn handle_collect(
        &mut self,
        player_id: PlayerId,
        kind: PickupKind,
        item_id: ObjectId,
        now_ms: u64,
    ) {
        match collect(&mut self.world, player_id, kind, item_id, now_ms) {
            CollectOutcome::Coin { score } => {
                // Coins are valuable enough to persist right away; hit
                // transfers ride the periodic flush instead.
                if let Some(player) = self.world.get_player(player_id) {
                    spawn_score_write(self.score_store.clone(), player.username.clone(), score);
                }
                self.sessions.lock().cache_score(player_id, score);
                self.throttle.request();
            }
            CollectOutcome::Ammo { ammo } => {
                self.send_to(player_id, &ServerMessage::AmmoUpdate { ammo });
                self.throttle.request();
            }
            CollectOutcome::Bait { bait } => {
                self.send_to(player_id, &ServerMessage::BaitUpdate { bait });
                self.throttle.request();
            }
            CollectOutcome::AtCapacity { bait } => {
                // Item stays on the field; echo the count so the client
                // un-predicts the pickup.
                self.send_to(player_id, &ServerMessage::BaitUpdate { bait });
            }
            outcome @ (CollectOutcome::AlreadyCollected
            | CollectOutcome::UnknownItem
            | CollectOutcome::UnknownPlayer) => {
                debug!("Ignored {:?} collect from {}: {:?}", kind, player_id, outcome);
            }
        }
    }

    fn handle_catch(&mut self, player_id: PlayerId, now_ms: u64) {
        match try_catch(
            &mut self.world,
            player_id,
            &self.catalog,
            now_ms,
            &mut self.rng,
        ) {
            Ok(fish) => {
                info!(
                    "{} caught a {} ({:.1} cm)",
                    fish.username, fish.species, fish.size
                );
                spawn_catch_insert(self.catch_ledger.clone(), fish.clone());
                self.send_to(player_id, &ServerMessage::FishCaught { fish });
                if let Some(player) = self.world.get_player(player_id) {
                    let update = ServerMessage::BaitUpdate { bait: player.bait };
                    self.send_to(player_id, &update);
                }
            }
            Err(CatchError::NoBait) => {
                // State echo, so a client with a stale bait count resyncs.
                if let Some(player) = self.world.get_player(player_id) {
                    let update = ServerMessage::BaitUpdate { bait: player.bait };
                    self.send_to(player_id, &update);
                }
            }
            Err(CatchError::UnknownPlayer) => {}
        }
    }

    fn handle_unstuck(&mut self, player_id: PlayerId, now_ms: u64) {
        if let Some(position) = unstuck(&mut self.world, player_id, now_ms, &mut self.rng) {
            self.send_to(
                player_id,
                &ServerMessage::PositionCorrection {
                    x: position.x,
                    y: position.y,
                    timestamp: now_ms,
                },
            );
        }
    }

    fn handle_chat(&mut self, player_id: PlayerId, text: String, now_ms: u64) {
        if let Some(player) = self.world.get_player(player_id) {
            let message = ServerMessage::Chat {
                username: player.username.clone(),
                text,
                timestamp: now_ms,
            };
            self.broadcast(&message);
        }
    }

    /// Apply a validated color and announce the one refreshed record. The
    /// color is session-scoped; the store keeps scores and catches only.
    fn handle_change_color(&mut self, player_id: PlayerId, color: String) {
        let snapshot = match self.world.get_player_mut(player_id) {
            Some(player) => {
                player.color = color;
                PlayerSnapshot::from_player(player)
            }
            None => return,
        };
        self.broadcast(&ServerMessage::PlayersUpdate {
            players: vec![snapshot],
        });
    }

    /// Remove a player from the world, flush their score, and tell everyone.
    /// `keep_session` distinguishes a disconnect (token stays resumable) from
    /// an eviction (token dies).
    fn drop_player(
        &mut self,
        player_id: PlayerId,
        keep_session: bool,
        reason: &str,
    ) -> Option<Player> {
        let player = self.world.remove_player(player_id)?;
        self.writers.remove(&player_id);
        spawn_score_write(
            self.score_store.clone(),
            player.username.clone(),
            player.score,
        );
        {
            let mut sessions = self.sessions.lock();
            if keep_session {
                sessions.cache_score(player_id, player.score);
            } else {
                sessions.remove_session(player_id);
            }
        }
        self.broadcast(&ServerMessage::PlayerLeft {
            player_id,
            username: player.username.clone(),
        });
        info!(
            "{} {} ({} players online)",
            player.username,
            reason,
            self.world.player_count()
        );
        Some(player)
    }

    fn flush_dirty_scores(&mut self) {
        let dirty = self.world.take_dirty_scores();
        if dirty.is_empty() {
            return;
        }
        debug!("Flushing {} dirty scores", dirty.len());
        for (username, score) in dirty {
            spawn_score_write(self.score_store.clone(), username, score);
        }
    }

    fn broadcast_bullets(&self) {
        let bullets = self
            .world
            .bullets
            .iter()
            .map(BulletSnapshot::from_bullet)
            .collect();
        self.broadcast(&ServerMessage::BulletsUpdate { bullets });
    }

    /// Encode once, clone bytes per recipient.
    fn broadcast(&self, message: &ServerMessage) {
        let encoded = match encode(message) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Failed to encode broadcast: {}", err);
                return;
            }
        };
        for (player_id, writer) in &self.writers {
            self.deliver(*player_id, writer, encoded.clone());
        }
    }

    fn broadcast_except(&self, skip: PlayerId, message: &ServerMessage) {
        let encoded = match encode(message) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Failed to encode broadcast: {}", err);
                return;
            }
        };
        for (player_id, writer) in &self.writers {
            if *player_id == skip {
                continue;
            }
            self.deliver(*player_id, writer, encoded.clone());
        }
    }

    /// Deliver only to players within the interest radius of `origin`,
    /// excluding `skip` (the mover already knows).
    fn broadcast_interest(&self, origin: Vec2, skip: PlayerId, message: &ServerMessage) {
        let encoded = match encode(message) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Failed to encode broadcast: {}", err);
                return;
            }
        };
        let radius = self.config.world.interest_radius;
        for player_id in players_in_range(&self.world, origin, radius) {
            if player_id == skip {
                continue;
            }
            if let Some(writer) = self.writers.get(&player_id) {
                self.deliver(player_id, writer, encoded.clone());
            }
        }
    }

    fn send_to(&self, player_id: PlayerId, message: &ServerMessage) {
        let Some(writer) = self.writers.get(&player_id) else {
            return;
        };
        let encoded = match encode(message) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Failed to encode message for {}: {}", player_id, err);
                return;
            }
        };
        self.deliver(player_id, writer, encoded);
    }

    /// Send to a writer that is not registered yet (join rejections).
    fn send_raw(&self, writer: &OutboundSender, message: &ServerMessage) {
        if let Ok(encoded) = encode(message) {
            let bytes = encoded.len() as u64;
            if writer.try_send(encoded).is_ok() {
                self.metrics.add_broadcast(bytes);
            }
        }
    }

    fn deliver(&self, player_id: PlayerId, writer: &OutboundSender, encoded: Vec<u8>) {
        let bytes = encoded.len() as u64;
        if writer.try_send(encoded).is_ok() {
            self.metrics.add_broadcast(bytes);
        } else {
            // Slow or gone; the disconnect path cleans the writer up.
            debug!("Dropped outbound frame for {}", player_id);
        }
    }
}

fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
