//! Persistence seam for scores and the catch ledger
//!
//! The game loop never awaits storage directly. Batched flushes and the
//! immediate-durability paths (coin collect, disconnect) go through the
//! spawn helpers below, which log failures and move on.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::game::fishing::CaughtFish;

/// Storage failures surfaced to callers, who log and degrade
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("record not found")]
    NotFound,
}

/// Persisted per-username scores
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Look up a username's score; `None` for a name never seen
    async fn load_score(&self, username: &str) -> Result<Option<i64>, StoreError>;
    async fn store_score(&self, username: &str, score: i64) -> Result<(), StoreError>;
    async fn exists(&self, username: &str) -> Result<bool, StoreError>;
}

/// Per-username record of caught fish
#[async_trait]
pub trait CatchLedger: Send + Sync {
    async fn insert(&self, record: CaughtFish) -> Result<(), StoreError>;
    async fn list_for(&self, username: &str) -> Result<Vec<CaughtFish>, StoreError>;
    /// Remove one fish, scoped to its owner; `NotFound` when absent
    async fn delete(&self, username: &str, fish_id: Uuid) -> Result<(), StoreError>;
}

/// Fire-and-forget score write; persistence failures never stall the loop
pub fn spawn_score_write(store: Arc<dyn ScoreStore>, username: String, score: i64) {
    tokio::spawn(async move {
        if let Err(e) = store.store_score(&username, score).await {
            tracing::warn!("Failed to persist score for {}: {}", username, e);
        }
    });
}

/// Fire-and-forget ledger insert for a resolved catch
pub fn spawn_catch_insert(ledger: Arc<dyn CatchLedger>, record: CaughtFish) {
    tokio::spawn(async move {
        let username = record.username.clone();
        if let Err(e) = ledger.insert(record).await {
            tracing::warn!("Failed to record catch for {}: {}", username, e);
        }
    });
}
