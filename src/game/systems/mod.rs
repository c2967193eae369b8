//! Simulation systems: free functions over `&mut World`, one file per concern

pub mod bullets;
pub mod movement;
pub mod pickups;
