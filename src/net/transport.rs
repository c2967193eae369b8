//! WebTransport connection handling.
//!
//! Each accepted session gets one bidirectional stream. A writer task owns
//! the send half and drains a channel of pre-encoded frames; the read half
//! is parsed, sanitized, and turned into [`Command`]s for the game loop.
//! Identity resolution (player id, persisted score, session resume) happens
//! here so the loop itself never has to await a store. The resolved id binds
//! to the connection only once the loop admits the join, so a rejected join
//! leaves the stream open for another attempt.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;
use wtransport::endpoint::IncomingSession;
use wtransport::Endpoint;

use crate::config::ServerConfig;
use crate::game::command_queue::{CommandSender, QueueError};
use crate::game::constants::{net as net_constants, player as player_constants};
use crate::game::objects::{PickupKind, PlayerId};
use crate::net::dos_protection::{DoSConfig, DoSProtection, TokenBucket};
use crate::net::framing;
use crate::net::game_session::{Command, OutboundSender, OUTBOUND_BUFFER};
use crate::net::protocol::{decode, encode, ClientMessage, ServerMessage};
use crate::net::session::SessionManager;
use crate::net::tls::ServerIdentity;
use crate::store::{CatchLedger, ScoreStore, StoreError};
use crate::util::vec2::Vec2;

/// How long a connection waits for the loop to adjudicate its join. The
/// answer normally arrives within one tick.
const JOIN_ACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Handles shared by every connection task.
#[derive(Clone)]
struct ConnectionShared {
    commands: CommandSender<Command>,
    sessions: Arc<Mutex<SessionManager>>,
    score_store: Arc<dyn ScoreStore>,
    catch_ledger: Arc<dyn CatchLedger>,
    metrics: Arc<crate::metrics::ServerMetrics>,
}

/// The WebTransport accept loop and its self-signed identity.
pub struct WebTransportServer {
    config: ServerConfig,
    identity: ServerIdentity,
    dos: Arc<Mutex<DoSProtection>>,
    shared: ConnectionShared,
}

impl WebTransportServer {
    pub fn new(
        config: ServerConfig,
        commands: CommandSender<Command>,
        sessions: Arc<Mutex<SessionManager>>,
        metrics: Arc<crate::metrics::ServerMetrics>,
        score_store: Arc<dyn ScoreStore>,
        catch_ledger: Arc<dyn CatchLedger>,
    ) -> anyhow::Result<Self> {
        let identity = ServerIdentity::generate(&config.cert_hostnames)?;
        let dos = Arc::new(Mutex::new(DoSProtection::new(DoSConfig::from_server_config(
            &config,
        ))));
        Ok(Self {
            config,
            identity,
            dos,
            shared: ConnectionShared {
                commands,
                sessions,
                score_store,
                catch_ledger,
                metrics,
            },
        })
    }

    /// Base64 SHA-256 certificate hash for `serverCertificateHashes` clients.
    pub fn cert_hash(&self) -> &str {
        self.identity.get_cert_hash()
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let WebTransportServer {
            config,
            identity,
            dos,
            shared,
        } = self;

        identity.log_cert_info();
        // Dual-stack bind so both localhost and LAN clients can reach us.
        let server_config = wtransport::ServerConfig::builder()
            .with_bind_default(config.port)
            .with_identity(identity.identity)
            .build();
        let server = Endpoint::server(server_config)?;
        info!("WebTransport server listening on port {}", config.port);

        loop {
            let incoming = server.accept().await;
            let dos = dos.clone();
            let shared = shared.clone();
            tokio::spawn(async move {
                if let Err(err) = handle_connection(incoming, dos, shared).await {
                    warn!("Connection error: {}", err);
                }
            });
        }
    }
}

/// Gate one incoming session on the connection caps, then drive it. The
/// registration is undone on every exit path.
async fn handle_connection(
    incoming: IncomingSession,
    dos: Arc<Mutex<DoSProtection>>,
    shared: ConnectionShared,
) -> anyhow::Result<()> {
    let client_ip = incoming.remote_address().ip();
    if let Err(err) = dos.lock().register_connection(client_ip) {
        shared.metrics.connection_rejected();
        warn!("Rejected connection from {}: {}", client_ip, err);
        return Ok(());
    }
    shared.metrics.connection_accepted();

    let bucket = dos.lock().message_bucket();
    let result = drive_connection(incoming, client_ip, bucket, &shared).await;
    dos.lock().unregister_connection(client_ip);
    result
}

#[cfg_attr(
    not(feature = "dos_ratelimit"),
    allow(unused_variables, unused_mut)
)]
async fn drive_connection(
    incoming: IncomingSession,
    client_ip: IpAddr,
    mut bucket: TokenBucket,
    shared: &ConnectionShared,
) -> anyhow::Result<()> {
    let session_request = incoming.await?;
    debug!(
        "Session request from {} for {}",
        client_ip,
        session_request.path()
    );
    let connection = session_request.accept().await?;
    let (send, mut recv) = connection.accept_bi().await?;

    // The writer task is the only owner of the send half; the game loop and
    // this task both feed it pre-encoded frames.
    let (writer_tx, mut writer_rx) = mpsc::channel::<Vec<u8>>(OUTBOUND_BUFFER);
    let writer_task = tokio::spawn(async move {
        let mut send = send;
        while let Some(frame) = writer_rx.recv().await {
            if let Err(err) = framing::write_message(&mut send, &frame).await {
                debug!("Writer stopped: {}", err);
                break;
            }
        }
    });

    let mut player_id: Option<PlayerId> = None;
    let mut username: Option<String> = None;

    loop {
        let frame = match framing::read_message(&mut recv).await {
            Ok(frame) => frame,
            Err(err) => {
                debug!("Stream closed for {}: {}", client_ip, err);
                break;
            }
        };

        #[cfg(feature = "dos_ratelimit")]
        if !bucket.try_consume() {
            warn!("Rate limit exceeded, closing connection from {}", client_ip);
            break;
        }

        let message: ClientMessage = match decode(&frame) {
            Ok(message) => message,
            Err(err) => {
                warn!("Undecodable frame from {}, closing: {}", client_ip, err);
                break;
            }
        };

        if let Some(id) = player_id {
            shared.sessions.lock().touch_session(id);
        }

        match message {
            ClientMessage::Join { .. } if player_id.is_some() => {
                debug!("Duplicate join from {}", client_ip);
            }
            ClientMessage::Join {
                username: raw_name,
                color,
                token,
            } => {
                let name = sanitize_username(&raw_name);
                if name.is_empty() {
                    warn!("Rejecting join from {} with unusable username", client_ip);
                    send_message(
                        &writer_tx,
                        &ServerMessage::JoinRejected {
                            reason: "invalid username".to_string(),
                        },
                    );
                    continue;
                }
                let color = sanitize_color(&color);

                // A valid resume token skips the store read; the cached score
                // only counts when it belongs to the same username.
                let resumed = token
                    .as_deref()
                    .and_then(|bytes| shared.sessions.lock().resume(bytes));
                let score = match resumed {
                    Some((resumed_name, score)) if resumed_name == name => {
                        debug!("{} resumed a session", name);
                        score
                    }
                    _ => match shared.score_store.load_score(&name).await {
                        Ok(score) => score.unwrap_or(0),
                        Err(err) => {
                            warn!("Score lookup for {} failed, starting at zero: {}", name, err);
                            0
                        }
                    },
                };

                let id = Uuid::new_v4();
                let (ack_tx, ack_rx) = oneshot::channel();
                match shared.commands.try_send(Command::Join {
                    player_id: id,
                    username: name.clone(),
                    color,
                    score,
                    writer: writer_tx.clone(),
                    ack: ack_tx,
                }) {
                    Ok(()) => match tokio::time::timeout(JOIN_ACK_TIMEOUT, ack_rx).await {
                        Ok(Ok(true)) => {
                            player_id = Some(id);
                            username = Some(name);
                        }
                        Ok(Ok(false)) => debug!("Join rejected for {}", client_ip),
                        Ok(Err(_)) | Err(_) => {
                            warn!("Join for {} went unanswered, closing", client_ip);
                            break;
                        }
                    },
                    Err(QueueError::Full) => {
                        debug!("Command queue full, dropping join from {}", client_ip);
                    }
                    Err(QueueError::Disconnected) => {
                        warn!("Game loop is gone, closing {}", client_ip);
                        break;
                    }
                }
            }
            ClientMessage::Move {
                x,
                y,
                sequence,
                timestamp,
            } => {
                if let Some(id) = player_id {
                    if !submit(
                        shared,
                        client_ip,
                        Command::Move {
                            player_id: id,
                            proposed: Vec2::new(x, y),
                            sequence,
                            timestamp,
                        },
                    ) {
                        break;
                    }
                }
            }
            ClientMessage::Shoot { x, y, dir_x, dir_y } => {
                if let Some(id) = player_id {
                    if !submit(
                        shared,
                        client_ip,
                        Command::Shoot {
                            player_id: id,
                            origin: Vec2::new(x, y),
                            direction: Vec2::new(dir_x, dir_y),
                        },
                    ) {
                        break;
                    }
                }
            }
            ClientMessage::CollectCoin { id: item_id } => {
                if let Some(id) = player_id {
                    if !submit(
                        shared,
                        client_ip,
                        Command::Collect {
                            player_id: id,
                            kind: PickupKind::Coin,
                            item_id,
                        },
                    ) {
                        break;
                    }
                }
            }
            ClientMessage::CollectAmmo { id: item_id } => {
                if let Some(id) = player_id {
                    if !submit(
                        shared,
                        client_ip,
                        Command::Collect {
                            player_id: id,
                            kind: PickupKind::Ammo,
                            item_id,
                        },
                    ) {
                        break;
                    }
                }
            }
            ClientMessage::CollectBait { id: item_id } => {
                if let Some(id) = player_id {
                    if !submit(
                        shared,
                        client_ip,
                        Command::Collect {
                            player_id: id,
                            kind: PickupKind::Bait,
                            item_id,
                        },
                    ) {
                        break;
                    }
                }
            }
            ClientMessage::CatchFish => {
                if let Some(id) = player_id {
                    if !submit(shared, client_ip, Command::CatchFish { player_id: id }) {
                        break;
                    }
                }
            }
            ClientMessage::RequestUnstuck => {
                if let Some(id) = player_id {
                    if !submit(shared, client_ip, Command::Unstuck { player_id: id }) {
                        break;
                    }
                }
            }
            ClientMessage::Chat { text } => {
                if let Some(id) = player_id {
                    let text = sanitize_chat(&text);
                    if text.is_empty() {
                        continue;
                    }
                    if !submit(
                        shared,
                        client_ip,
                        Command::Chat {
                            player_id: id,
                            text,
                        },
                    ) {
                        break;
                    }
                }
            }
            ClientMessage::ChangeColor { color } => {
                if let Some(id) = player_id {
                    let color = sanitize_color(&color);
                    if color.is_empty() {
                        continue;
                    }
                    if !submit(
                        shared,
                        client_ip,
                        Command::ChangeColor {
                            player_id: id,
                            color,
                        },
                    ) {
                        break;
                    }
                }
            }
            // Ledger traffic is read-mostly and answered off the game loop.
            ClientMessage::RequestFishInventory => {
                if let Some(name) = username.as_deref() {
                    match shared.catch_ledger.list_for(name).await {
                        Ok(fish) => {
                            send_message(&writer_tx, &ServerMessage::FishInventory { fish })
                        }
                        Err(err) => {
                            warn!("Fish inventory lookup for {} failed: {}", name, err);
                            send_message(
                                &writer_tx,
                                &ServerMessage::Error {
                                    message: "inventory unavailable".to_string(),
                                },
                            );
                        }
                    }
                }
            }
            ClientMessage::DeleteFish { fish_id } => {
                if let Some(name) = username.as_deref() {
                    match shared.catch_ledger.delete(name, fish_id).await {
                        Ok(()) => {
                            send_message(&writer_tx, &ServerMessage::FishDeleted { fish_id })
                        }
                        Err(StoreError::NotFound) => send_message(
                            &writer_tx,
                            &ServerMessage::Error {
                                message: "no such fish".to_string(),
                            },
                        ),
                        Err(err) => {
                            warn!("Fish delete for {} failed: {}", name, err);
                            send_message(
                                &writer_tx,
                                &ServerMessage::Error {
                                    message: "inventory unavailable".to_string(),
                                },
                            );
                        }
                    }
                }
            }
            ClientMessage::Ping { timestamp } => {
                send_message(&writer_tx, &ServerMessage::Pong { timestamp });
            }
            ClientMessage::Leave => {
                debug!("{} left politely", client_ip);
                break;
            }
        }
    }

    if let Some(id) = player_id {
        // The queue drains every tick, so one retry covers a full burst.
        if shared.commands.try_send(Command::Disconnect { player_id: id }).is_err() {
            tokio::time::sleep(Duration::from_millis(50)).await;
            if shared
                .commands
                .try_send(Command::Disconnect { player_id: id })
                .is_err()
            {
                warn!("Failed to deliver disconnect for {}", id);
            }
        }
    }
    writer_task.abort();
    Ok(())
}

/// Submit a command to the game loop. Backpressure drops the intent; a
/// stopped loop closes the connection.
fn submit(shared: &ConnectionShared, client_ip: IpAddr, command: Command) -> bool {
    match shared.commands.try_send(command) {
        Ok(()) => true,
        Err(QueueError::Full) => {
            debug!("Command queue full, dropping intent from {}", client_ip);
            true
        }
        Err(QueueError::Disconnected) => {
            warn!("Game loop is gone, closing {}", client_ip);
            false
        }
    }
}

/// Direct reply from the connection task, bypassing the game loop.
fn send_message(writer: &OutboundSender, message: &ServerMessage) {
    if let Ok(encoded) = encode(message) {
        if writer.try_send(encoded).is_err() {
            debug!("Outbound buffer full, dropping direct reply");
        }
    }
}

/// Shared cleanup for client text: trim, strip control and markup
/// characters, collapse whitespace runs, cap the length.
fn sanitize_text(raw: &str, max_chars: usize) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .filter(|c| !matches!(c, '<' | '>' | '&'))
        .take(max_chars)
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn sanitize_username(raw: &str) -> String {
    sanitize_text(raw, player_constants::MAX_NAME_LEN)
}

fn sanitize_chat(raw: &str) -> String {
    sanitize_text(raw, net_constants::MAX_CHAT_LEN)
}

/// Accept only `#rrggbb`; anything else means the server assigns a color.
fn sanitize_color(raw: &str) -> String {
    let raw = raw.trim();
    let mut chars = raw.chars();
    if raw.len() == 7 && chars.next() == Some('#') && chars.all(|c| c.is_ascii_hexdigit()) {
        raw.to_ascii_lowercase()
    } else {
        String::new()
    }
}
