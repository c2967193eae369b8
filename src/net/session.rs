use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use crate::game::constants::net::{MAX_SESSIONS, SESSION_TIMEOUT_SECS};
use crate::game::objects::PlayerId;

/// Session token for authenticated connections
/// Uses CSPRNG for cryptographic security
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionToken([u8; 32]);

// Comparison must not leak how many leading bytes matched
impl PartialEq for SessionToken {
    fn eq(&self, other: &Self) -> bool {
        ring::constant_time::verify_slices_are_equal(&self.0, &other.0).is_ok()
    }
}

impl Eq for SessionToken {}

impl Hash for SessionToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl SessionToken {
    /// Generate a new cryptographically secure session token
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to Vec<u8> for network transmission
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Try to create from a slice
    pub fn try_from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() != 32 {
            return None;
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(slice);
        Some(Self(bytes))
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::generate()
    }
}

/// Session data bound to one joined player
///
/// Outlives the connection: the cached score lets a token resume rebuild
/// the player without a store round-trip.
#[derive(Debug, Clone)]
pub struct Session {
    pub player_id: PlayerId,
    pub token: SessionToken,
    pub created_at: Instant,
    pub last_activity: Instant,
    pub username: String,
    /// Last known score, kept fresh on every score mutation
    pub last_score: i64,
}

impl Session {
    pub fn new(player_id: PlayerId, username: String, last_score: i64) -> Self {
        let now = Instant::now();
        Self {
            player_id,
            token: SessionToken::generate(),
            created_at: now,
            last_activity: now,
            username,
            last_score,
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }
}

/// Session manager for tracking joined players
pub struct SessionManager {
    /// Sessions indexed by player ID
    sessions: HashMap<PlayerId, Session>,
    /// Token to player ID mapping for O(1) token lookup
    token_index: HashMap<SessionToken, PlayerId>,
    timeout: Duration,
    max_sessions: usize,
}

impl SessionManager {
    pub fn new(timeout: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            token_index: HashMap::new(),
            timeout,
            max_sessions,
        }
    }

    /// Create a session for a freshly joined player. Tokens are never
    /// reused: each join gets a new one.
    pub fn create_session(
        &mut self,
        player_id: PlayerId,
        username: String,
        score: i64,
    ) -> Option<&Session> {
        if self.sessions.len() >= self.max_sessions {
            self.cleanup_expired();
            if self.sessions.len() >= self.max_sessions {
                return None;
            }
        }

        self.remove_session(player_id);

        let session = Session::new(player_id, username, score);
        self.token_index.insert(session.token.clone(), player_id);
        self.sessions.insert(player_id, session);
        self.sessions.get(&player_id)
    }

    /// Consume a resume token: a live, unexpired session yields its
    /// identity and cached score, and is removed so the join that follows
    /// rotates to a fresh token.
    pub fn resume(&mut self, token_bytes: &[u8]) -> Option<(String, i64)> {
        let token = SessionToken::try_from_slice(token_bytes)?;
        let player_id = *self.token_index.get(&token)?;
        let expired = self
            .sessions
            .get(&player_id)
            .map(|s| s.is_expired(self.timeout))
            .unwrap_or(true);
        if expired {
            self.remove_session(player_id);
            return None;
        }
        let session = self.remove_session(player_id)?;
        Some((session.username, session.last_score))
    }

    pub fn get_session(&self, player_id: PlayerId) -> Option<&Session> {
        self.sessions.get(&player_id)
    }

    /// Keep the resume cache fresh after a score mutation
    pub fn cache_score(&mut self, player_id: PlayerId, score: i64) {
        if let Some(session) = self.sessions.get_mut(&player_id) {
            session.last_score = score;
        }
    }

    pub fn remove_session(&mut self, player_id: PlayerId) -> Option<Session> {
        let session = self.sessions.remove(&player_id)?;
        self.token_index.remove(&session.token);
        Some(session)
    }

    /// Touch a session (update last activity)
    pub fn touch_session(&mut self, player_id: PlayerId) -> bool {
        if let Some(session) = self.sessions.get_mut(&player_id) {
            session.touch();
            true
        } else {
            false
        }
    }

    /// Drop every session idle past the timeout
    pub fn cleanup_expired(&mut self) -> usize {
        let expired: Vec<_> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.is_expired(self.timeout))
            .map(|(id, _)| *id)
            .collect();

        let count = expired.len();
        for player_id in expired {
            self.remove_session(player_id);
        }
        count
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn has_session(&self, player_id: PlayerId) -> bool {
        self.sessions.contains_key(&player_id)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(Duration::from_secs(SESSION_TIMEOUT_SECS), MAX_SESSIONS)
    }
}
