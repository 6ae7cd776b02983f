mod geometry;
mod state;

pub use geometry::{ScaleFactor, WindowGeometry};
pub use state::{Controller, PlayerState};
