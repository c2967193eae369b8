/// World and tick constants
pub mod world {
    /// Default world width in units
    pub const WIDTH: f32 = 2000.0;
    /// Default world height in units
    pub const HEIGHT: f32 = 1500.0;
    /// Server tick rate in Hz
    pub const TICK_RATE: u32 = 30;
    /// Tick duration in milliseconds
    pub const TICK_DURATION_MS: u64 = 33;
    /// Distance within which a player receives another player's move deltas
    pub const INTEREST_RADIUS: f32 = 1500.0;
    /// Coalescing window for full-state broadcasts in milliseconds
    pub const FULL_STATE_WINDOW_MS: u64 = 3000;
    /// Dirty-score flush interval in milliseconds
    pub const SCORE_FLUSH_INTERVAL_MS: u64 = 10_000;
}

/// Player constants
pub mod player {
    /// Sprite box edge length in units
    pub const SIZE: f32 = 50.0;
    /// Inset applied to all four sides of the sprite box for the collision hitbox
    pub const HITBOX_INSET: f32 = 10.0;
    /// Score granted per collected coin
    pub const COIN_SCORE: i64 = 10;
    /// Score transferred on a bullet hit (shooter gains, victim loses)
    pub const HIT_SCORE_TRANSFER: i64 = 10;
    /// Ammo granted on join
    pub const STARTING_AMMO: u32 = 10;
    /// Ammo capacity
    pub const MAX_AMMO: u32 = 30;
    /// Ammo granted per ammo pack
    pub const AMMO_PACK_AMOUNT: u32 = 5;
    /// Bait granted on join
    pub const STARTING_BAIT: u32 = 1;
    /// Bait capacity
    pub const MAX_BAIT: u32 = 5;
    /// Maximum username length after sanitization
    pub const MAX_NAME_LEN: usize = 16;
    /// Colors assigned to players who join without one
    pub const COLOR_PALETTE: [&str; 8] = [
        "#e74c3c", "#3498db", "#2ecc71", "#f1c40f", "#9b59b6", "#e67e22", "#1abc9c", "#fd79a8",
    ];
}

/// Bullet constants
pub mod bullet {
    /// Distance advanced along the direction vector per tick
    pub const SPEED: f32 = 10.0;
    /// Lifetime in milliseconds before a bullet expires
    pub const LIFETIME_MS: u64 = 5000;
    /// Maximum distance between the claimed origin and the shooter's center
    pub const ORIGIN_TOLERANCE: f32 = 50.0;
}

/// Pickup respawn and placement constants
pub mod pickup {
    /// Coin respawn delay in milliseconds
    pub const COIN_RESPAWN_MS: u64 = 5000;
    /// Ammo pack respawn delay in milliseconds
    pub const AMMO_RESPAWN_MS: u64 = 10_000;
    /// Bait pack respawn delay in milliseconds
    pub const BAIT_RESPAWN_MS: u64 = 15_000;
    /// Minimum displacement of a respawned bait pack from the collected one
    pub const BAIT_RESPAWN_MIN_DIST: f32 = 200.0;
    /// Attempts at the displacement rule before falling back to the plain placer
    pub const BAIT_RESPAWN_ATTEMPTS: u32 = 25;
    /// Coin sprite edge length
    pub const COIN_SIZE: f32 = 30.0;
    /// Ammo pack sprite edge length
    pub const AMMO_SIZE: f32 = 30.0;
    /// Bait pack sprite edge length
    pub const BAIT_SIZE: f32 = 30.0;
}

/// Placement search constants
pub mod placement {
    /// Strict-pass attempts (clear of obstacles and deep water)
    pub const STRICT_ATTEMPTS: u32 = 30;
    /// Relaxed-pass attempts (deep water only)
    pub const RELAXED_ATTEMPTS: u32 = 10;
    /// Safe-spawn attempts before falling back to world center
    pub const SPAWN_ATTEMPTS: u32 = 30;
}

/// World generation ranges; counts are ceilings, not guarantees
pub mod worldgen {
    /// Pond count range (inclusive)
    pub const POND_COUNT: (u32, u32) = (4, 5);
    /// Minimum center-to-center spacing between ponds
    pub const POND_SPACING: f32 = 600.0;
    /// Placement attempts per pond
    pub const POND_ATTEMPTS: u32 = 100;
    /// Pond width range
    pub const POND_WIDTH: (f32, f32) = (160.0, 260.0);
    /// Pond height range
    pub const POND_HEIGHT: (f32, f32) = (110.0, 180.0);
    /// Decorative lake count range
    pub const LAKE_COUNT: (u32, u32) = (3, 4);
    /// Minimum spacing between a lake and any water body
    pub const LAKE_SPACING: f32 = 500.0;
    /// Lake extent range (both axes)
    pub const LAKE_EXTENT: (f32, f32) = (90.0, 160.0);
    /// Tree count range
    pub const TREE_COUNT: (u32, u32) = (40, 60);
    /// Tree size range
    pub const TREE_SIZE: (f32, f32) = (70.0, 100.0);
    /// Buffer around water rectangles when placing trees
    pub const WATER_BUFFER: (f32, f32) = (5.0, 10.0);
    /// Placement attempts per tree or rock
    pub const OBSTACLE_ATTEMPTS: u32 = 50;
    /// Rock count range
    pub const ROCK_COUNT: (u32, u32) = (30, 50);
    /// Rock size range
    pub const ROCK_SIZE: (f32, f32) = (40.0, 60.0);
    /// Coin count range
    pub const COIN_COUNT: (u32, u32) = (20, 29);
    /// Ammo pack count range
    pub const AMMO_COUNT: (u32, u32) = (10, 19);
    /// Bait pack count range
    pub const BAIT_COUNT: (u32, u32) = (7, 14);
    /// Chance a bait pack is biased toward a pond edge
    pub const BAIT_POND_BIAS: f64 = 0.7;
    /// Distance ring from the pond edge for biased bait placement
    pub const BAIT_RING: (f32, f32) = (50.0, 150.0);
}

/// Hitbox reduction factors, as fractions of the sprite box
pub mod hitbox {
    /// Tree trunk horizontal band start (fraction of width)
    pub const TREE_X_MIN: f32 = 0.2;
    /// Tree trunk horizontal band width (fraction of width)
    pub const TREE_WIDTH: f32 = 0.6;
    /// Tree trunk vertical band start (fraction of height)
    pub const TREE_Y_MIN: f32 = 0.5;
    /// Tree trunk vertical band height (fraction of height)
    pub const TREE_HEIGHT: f32 = 0.5;
    /// Rock core start on both axes (fraction of size)
    pub const ROCK_MIN: f32 = 0.1;
    /// Rock core extent on both axes (fraction of size)
    pub const ROCK_EXTENT: f32 = 0.8;
}

/// Pond ellipse membership thresholds; these two are intentionally distinct
pub mod pond {
    /// Normalized elliptical distance below which a point is inside the pond surface
    pub const SURFACE_THRESHOLD: f32 = 1.0;
    /// Normalized elliptical distance below which a point is inside the deep zone
    /// (0.7 half-extent factor squared)
    pub const DEEP_ZONE_THRESHOLD: f32 = 0.49;
}

/// Network constants
pub mod net {
    /// Maximum framed message size in bytes
    pub const MAX_MESSAGE_SIZE: usize = 65536;
    /// Session idle expiry in seconds
    pub const SESSION_TIMEOUT_SECS: u64 = 300;
    /// Maximum tracked sessions
    pub const MAX_SESSIONS: usize = 10_000;
    /// Maximum chat message length after sanitization
    pub const MAX_CHAT_LEN: usize = 200;
}
