use crate::game::constants::{bullet, net, pickup, player, world};

/// Gameplay constants for one world instance, passed to the simulation
/// constructor so thresholds stay auditable and testable in isolation.
#[derive(Debug, Clone)]
pub struct WorldConfig {
    /// World width in units
    pub width: f32,
    /// World height in units
    pub height: f32,
    /// Player sprite box edge length
    pub player_size: f32,
    /// Collision hitbox inset per side
    pub hitbox_inset: f32,
    /// Move-delta broadcast radius
    pub interest_radius: f32,
    pub starting_ammo: u32,
    pub max_ammo: u32,
    pub ammo_pack_amount: u32,
    pub starting_bait: u32,
    pub max_bait: u32,
    pub coin_score: i64,
    pub hit_score_transfer: i64,
    /// Bullet travel per tick
    pub bullet_speed: f32,
    pub bullet_lifetime_ms: u64,
    /// Maximum distance between a claimed shot origin and the shooter center
    pub shoot_origin_tolerance: f32,
    pub coin_respawn_ms: u64,
    pub ammo_respawn_ms: u64,
    pub bait_respawn_ms: u64,
    /// Minimum displacement of a respawned bait pack
    pub bait_respawn_min_dist: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: world::WIDTH,
            height: world::HEIGHT,
            player_size: player::SIZE,
            hitbox_inset: player::HITBOX_INSET,
            interest_radius: world::INTEREST_RADIUS,
            starting_ammo: player::STARTING_AMMO,
            max_ammo: player::MAX_AMMO,
            ammo_pack_amount: player::AMMO_PACK_AMOUNT,
            starting_bait: player::STARTING_BAIT,
            max_bait: player::MAX_BAIT,
            coin_score: player::COIN_SCORE,
            hit_score_transfer: player::HIT_SCORE_TRANSFER,
            bullet_speed: bullet::SPEED,
            bullet_lifetime_ms: bullet::LIFETIME_MS,
            shoot_origin_tolerance: bullet::ORIGIN_TOLERANCE,
            coin_respawn_ms: pickup::COIN_RESPAWN_MS,
            ammo_respawn_ms: pickup::AMMO_RESPAWN_MS,
            bait_respawn_ms: pickup::BAIT_RESPAWN_MS,
            bait_respawn_min_dist: pickup::BAIT_RESPAWN_MIN_DIST,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.width <= self.player_size || self.height <= self.player_size {
            return Err("world extent must exceed player size".to_string());
        }
        if self.hitbox_inset * 2.0 >= self.player_size {
            return Err("hitbox inset leaves no collidable area".to_string());
        }
        if self.interest_radius <= 0.0 {
            return Err("interest_radius must be positive".to_string());
        }
        if self.starting_ammo > self.max_ammo {
            return Err("starting_ammo cannot exceed max_ammo".to_string());
        }
        if self.starting_bait > self.max_bait {
            return Err("starting_bait cannot exceed max_bait".to_string());
        }
        if self.bullet_speed <= 0.0 || self.bullet_lifetime_ms == 0 {
            return Err("bullet speed and lifetime must be positive".to_string());
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Maximum players in the world
    pub max_players: usize,
    /// Maximum concurrent connections
    pub max_connections: usize,
    /// Maximum connections per IP address
    pub max_connections_per_ip: usize,
    /// Per-connection message rate cap
    pub messages_per_second: u32,
    /// Optional JSON file replacing the built-in fish catalog
    pub fish_catalog_path: Option<String>,
    /// Hostnames placed in the self-signed certificate
    pub cert_hostnames: Vec<String>,
    /// Session idle expiry in seconds
    pub session_timeout_secs: u64,
    /// Dirty-score flush cadence in milliseconds
    pub score_flush_interval_ms: u64,
    /// Full-state broadcast coalescing window in milliseconds
    pub full_state_window_ms: u64,
    /// Gameplay constants
    pub world: WorldConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 4433,
            max_players: 32,
            max_connections: 64,
            max_connections_per_ip: 5,
            messages_per_second: 60,
            fish_catalog_path: None,
            cert_hostnames: vec!["localhost".to_string(), "127.0.0.1".to_string()],
            session_timeout_secs: net::SESSION_TIMEOUT_SECS,
            score_flush_interval_ms: world::SCORE_FLUSH_INTERVAL_MS,
            full_state_window_ms: world::FULL_STATE_WINDOW_MS,
            world: WorldConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(port) = std::env::var("WILDMERE_PORT") {
            if let Ok(parsed) = port.parse::<u16>() {
                if parsed > 0 {
                    config.port = parsed;
                } else {
                    tracing::warn!("WILDMERE_PORT must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid WILDMERE_PORT '{}', using default", port);
            }
        }

        if let Ok(max) = std::env::var("WILDMERE_MAX_PLAYERS") {
            if let Ok(parsed) = max.parse::<usize>() {
                if parsed > 0 && parsed <= 1000 {
                    config.max_players = parsed;
                } else {
                    tracing::warn!("WILDMERE_MAX_PLAYERS must be 1-1000, using default");
                }
            } else {
                tracing::warn!("Invalid WILDMERE_MAX_PLAYERS '{}', using default", max);
            }
        }

        if let Ok(width) = std::env::var("WILDMERE_WORLD_WIDTH") {
            if let Ok(parsed) = width.parse::<f32>() {
                if parsed.is_finite() && parsed >= 500.0 {
                    config.world.width = parsed;
                } else {
                    tracing::warn!("WILDMERE_WORLD_WIDTH must be >= 500, using default");
                }
            } else {
                tracing::warn!("Invalid WILDMERE_WORLD_WIDTH '{}', using default", width);
            }
        }

        if let Ok(height) = std::env::var("WILDMERE_WORLD_HEIGHT") {
            if let Ok(parsed) = height.parse::<f32>() {
                if parsed.is_finite() && parsed >= 500.0 {
                    config.world.height = parsed;
                } else {
                    tracing::warn!("WILDMERE_WORLD_HEIGHT must be >= 500, using default");
                }
            } else {
                tracing::warn!("Invalid WILDMERE_WORLD_HEIGHT '{}', using default", height);
            }
        }

        if let Ok(rate) = std::env::var("WILDMERE_MSGS_PER_SEC") {
            if let Ok(parsed) = rate.parse::<u32>() {
                if parsed > 0 {
                    config.messages_per_second = parsed;
                } else {
                    tracing::warn!("WILDMERE_MSGS_PER_SEC must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid WILDMERE_MSGS_PER_SEC '{}', using default", rate);
            }
        }

        if let Ok(max) = std::env::var("WILDMERE_MAX_CONNECTIONS") {
            if let Ok(parsed) = max.parse::<usize>() {
                if parsed > 0 {
                    config.max_connections = parsed;
                } else {
                    tracing::warn!("WILDMERE_MAX_CONNECTIONS must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid WILDMERE_MAX_CONNECTIONS '{}', using default", max);
            }
        }

        if let Ok(interval) = std::env::var("WILDMERE_FLUSH_INTERVAL_MS") {
            if let Ok(parsed) = interval.parse::<u64>() {
                if parsed > 0 {
                    config.score_flush_interval_ms = parsed;
                } else {
                    tracing::warn!("WILDMERE_FLUSH_INTERVAL_MS must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid WILDMERE_FLUSH_INTERVAL_MS '{}', using default", interval);
            }
        }

        if let Ok(window) = std::env::var("WILDMERE_FULL_STATE_WINDOW_MS") {
            if let Ok(parsed) = window.parse::<u64>() {
                if parsed > 0 {
                    config.full_state_window_ms = parsed;
                } else {
                    tracing::warn!("WILDMERE_FULL_STATE_WINDOW_MS must be > 0, using default");
                }
            } else {
                tracing::warn!(
                    "Invalid WILDMERE_FULL_STATE_WINDOW_MS '{}', using default",
                    window
                );
            }
        }

        if let Ok(path) = std::env::var("WILDMERE_FISH_CATALOG") {
            if !path.trim().is_empty() {
                config.fish_catalog_path = Some(path);
            }
        }

        if let Ok(hosts) = std::env::var("WILDMERE_CERT_HOSTS") {
            let parsed: Vec<String> = hosts
                .split(',')
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
                .collect();
            if !parsed.is_empty() {
                config.cert_hostnames = parsed;
            } else {
                tracing::warn!("WILDMERE_CERT_HOSTS is empty, using default");
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port cannot be 0".to_string());
        }
        if self.max_players == 0 {
            return Err("max_players must be at least 1".to_string());
        }
        if self.max_connections < self.max_players {
            return Err("max_connections cannot be below max_players".to_string());
        }
        if self.messages_per_second == 0 {
            return Err("messages_per_second must be at least 1".to_string());
        }
        if self.cert_hostnames.is_empty() {
            return Err("cert_hostnames cannot be empty".to_string());
        }
        self.world.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 4433);
        assert_eq!(config.max_players, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_world_config() {
        let world = WorldConfig::default();
        assert_eq!(world.width, 2000.0);
        assert_eq!(world.height, 1500.0);
        assert_eq!(world.player_size, 50.0);
        assert_eq!(world.interest_radius, 1500.0);
        assert!(world.validate().is_ok());
    }

    #[test]
    fn test_world_validate_rejects_bad_inset() {
        let world = WorldConfig {
            hitbox_inset: 25.0,
            ..Default::default()
        };
        assert!(world.validate().is_err());
    }

    #[test]
    fn test_world_validate_rejects_inverted_ammo() {
        let world = WorldConfig {
            starting_ammo: 50,
            max_ammo: 30,
            ..Default::default()
        };
        assert!(world.validate().is_err());
    }

    #[test]
    fn test_load_or_default() {
        let config = ServerConfig::load_or_default();
        assert!(config.port > 0);
    }
}
