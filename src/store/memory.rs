//! In-memory reference implementation of the storage traits
//!
//! Scores and catches live in maps behind `parking_lot::RwLock`. State is
//! lost on restart; a durable backend implements the same traits.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::game::fishing::CaughtFish;
use crate::store::{CatchLedger, ScoreStore, StoreError};

#[derive(Default)]
pub struct InMemoryStore {
    scores: RwLock<HashMap<String, i64>>,
    catches: RwLock<HashMap<String, Vec<CaughtFish>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScoreStore for InMemoryStore {
    async fn load_score(&self, username: &str) -> Result<Option<i64>, StoreError> {
        Ok(self.scores.read().get(username).copied())
    }

    async fn store_score(&self, username: &str, score: i64) -> Result<(), StoreError> {
        self.scores.write().insert(username.to_string(), score);
        Ok(())
    }

    async fn exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.scores.read().contains_key(username))
    }
}

#[async_trait]
impl CatchLedger for InMemoryStore {
    async fn insert(&self, record: CaughtFish) -> Result<(), StoreError> {
        self.catches
            .write()
            .entry(record.username.clone())
            .or_default()
            .push(record);
        Ok(())
    }

    async fn list_for(&self, username: &str) -> Result<Vec<CaughtFish>, StoreError> {
        Ok(self
            .catches
            .read()
            .get(username)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete(&self, username: &str, fish_id: Uuid) -> Result<(), StoreError> {
        let mut catches = self.catches.write();
        let list = catches.get_mut(username).ok_or(StoreError::NotFound)?;
        let before = list.len();
        list.retain(|f| f.id != fish_id);
        if list.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
