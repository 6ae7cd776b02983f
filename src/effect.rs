use crate::core::WindowGeometry;
use crate::player::PlayerAction;

/// Side effects requested by the controller, executed by the app through the
/// platform traits. The controller itself never touches a process or the X
/// connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Spawn the supervised player, placed at `geometry`. Issued at most
    /// once per run.
    SpawnPlayer { geometry: WindowGeometry },
    /// Fire a one-shot control command at the player. Fire-and-forget; the
    /// resulting child is never tracked.
    Player(PlayerAction),
    /// Ask the window manager to toggle fullscreen. Pure windowing request,
    /// not a player command.
    ToggleFullscreen,
}
