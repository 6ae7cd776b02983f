pub mod commands;
pub mod supervisor;

pub use commands::{CommandSpec, PlayerAction, PlayerCommands};
