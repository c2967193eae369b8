pub mod collision;
pub mod command_queue;
pub mod constants;
pub mod fishing;
pub mod objects;
pub mod placement;
pub mod state;
pub mod systems;
pub mod worldgen;
