//! Fish catalog and catch resolution
//!
//! Species are sampled by unnormalized weight, so a catalog override can
//! use any positive scale. Size is rolled uniformly inside the species
//! range and kept to one decimal.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::game::objects::PlayerId;
use crate::game::state::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FishSpecies {
    pub name: String,
    /// Unnormalized sampling weight
    pub weight: f64,
    pub min_size: f32,
    pub max_size: f32,
    pub rarity: Rarity,
}

/// A resolved catch, sent on the wire and stored in the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaughtFish {
    pub id: Uuid,
    pub username: String,
    pub species: String,
    pub size: f32,
    pub rarity: Rarity,
    pub caught_at_ms: u64,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog has no species")]
    Empty,
    #[error("species '{0}' has a non-positive or non-finite weight")]
    InvalidWeight(String),
    #[error("species '{0}' has an invalid size range")]
    InvalidSizeRange(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatchError {
    #[error("player not in world")]
    UnknownPlayer,
    #[error("no bait")]
    NoBait,
}

#[derive(Debug, Clone)]
pub struct FishCatalog {
    species: Vec<FishSpecies>,
    total_weight: f64,
}

impl FishCatalog {
    /// The stock catalog used when no override file is configured
    pub fn builtin() -> Self {
        let species = vec![
            stock("carp", 0.30, 20.0, 60.0, Rarity::Common),
            stock("perch", 0.25, 10.0, 35.0, Rarity::Common),
            stock("bream", 0.18, 15.0, 45.0, Rarity::Common),
            stock("pike", 0.12, 40.0, 110.0, Rarity::Uncommon),
            stock("trout", 0.08, 25.0, 70.0, Rarity::Uncommon),
            stock("eel", 0.04, 40.0, 130.0, Rarity::Rare),
            stock("sturgeon", 0.02, 100.0, 250.0, Rarity::Rare),
            stock("golden koi", 0.01, 15.0, 45.0, Rarity::Legendary),
        ];
        let total_weight = species.iter().map(|s| s.weight).sum();
        Self {
            species,
            total_weight,
        }
    }

    pub fn from_json_file(path: &str) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Parse a JSON array of species and validate it
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let species: Vec<FishSpecies> = serde_json::from_str(raw)?;
        Self::from_species(species)
    }

    fn from_species(species: Vec<FishSpecies>) -> Result<Self, CatalogError> {
        if species.is_empty() {
            return Err(CatalogError::Empty);
        }
        for s in &species {
            if !s.weight.is_finite() || s.weight <= 0.0 {
                return Err(CatalogError::InvalidWeight(s.name.clone()));
            }
            if !s.min_size.is_finite()
                || !s.max_size.is_finite()
                || s.min_size <= 0.0
                || s.max_size < s.min_size
            {
                return Err(CatalogError::InvalidSizeRange(s.name.clone()));
            }
        }
        let total_weight = species.iter().map(|s| s.weight).sum();
        Ok(Self {
            species,
            total_weight,
        })
    }

    pub fn species(&self) -> &[FishSpecies] {
        &self.species
    }

    /// Weighted sample: cumulative walk over unnormalized weights
    pub fn determine_catch(&self, rng: &mut impl Rng) -> &FishSpecies {
        let mut roll = rng.gen_range(0.0..self.total_weight);
        for s in &self.species {
            if roll < s.weight {
                return s;
            }
            roll -= s.weight;
        }
        // float edge on the last boundary
        &self.species[self.species.len() - 1]
    }

    /// Uniform size inside the species range, one decimal
    pub fn roll_size(species: &FishSpecies, rng: &mut impl Rng) -> f32 {
        let raw = species.min_size + rng.gen::<f32>() * (species.max_size - species.min_size);
        (raw * 10.0).round() / 10.0
    }
}

fn stock(name: &str, weight: f64, min_size: f32, max_size: f32, rarity: Rarity) -> FishSpecies {
    FishSpecies {
        name: name.to_string(),
        weight,
        min_size,
        max_size,
        rarity,
    }
}

/// Resolve a catch attempt: one bait is consumed, a species and size are
/// rolled. Zero bait rejects without touching the world.
pub fn try_catch(
    world: &mut World,
    player_id: PlayerId,
    catalog: &FishCatalog,
    now_ms: u64,
    rng: &mut impl Rng,
) -> Result<CaughtFish, CatchError> {
    let player = world
        .get_player_mut(player_id)
        .ok_or(CatchError::UnknownPlayer)?;
    if player.bait == 0 {
        return Err(CatchError::NoBait);
    }
    player.bait -= 1;
    let username = player.username.clone();

    let species = catalog.determine_catch(rng);
    let size = FishCatalog::roll_size(species, rng);
    Ok(CaughtFish {
        id: Uuid::new_v4(),
        username,
        species: species.name.clone(),
        size,
        rarity: species.rarity,
        caught_at_ms: now_ms,
    })
}
