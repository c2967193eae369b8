//! Wildmere game server library.
//!
//! An authoritative real-time world server over WebTransport: clients move
//! avatars through a shared 2D map, collect pickups, shoot, and fish, while
//! a single game loop owns every world mutation and broadcasts the results.
//!
//! # Features
//!
//! - `dos_ratelimit` - per-connection message rate limiting (enabled by
//!   default; connection caps are always on)

pub mod config;
pub mod game;
pub mod metrics;
pub mod net;
pub mod store;
pub mod util;
