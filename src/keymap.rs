use crate::player::PlayerAction;

/// X11 keysym constants for the bound keys (see keysymdef.h).
pub mod keysyms {
    pub const XK_F: u32 = 0x0066;
    pub const XK_P: u32 = 0x0070;
    pub const XK_Q: u32 = 0x0071;
    pub const XK_S: u32 = 0x0073;
    pub const XK_V: u32 = 0x0076;
    pub const XK_LEFT: u32 = 0xff51;
    pub const XK_RIGHT: u32 = 0xff53;
    pub const XK_PAGE_UP: u32 = 0xff55;
    pub const XK_PAGE_DOWN: u32 = 0xff56;
}

/// Quit and fullscreen are structurally special: the controller handles them
/// before consulting the table.
pub const QUIT_KEY: u32 = keysyms::XK_Q;
pub const FULLSCREEN_KEY: u32 = keysyms::XK_F;

/// One-shot command bindings. Everything here dispatches with no state
/// transition.
static BINDINGS: &[(u32, PlayerAction)] = &[
    (keysyms::XK_P, PlayerAction::TogglePause),
    (keysyms::XK_S, PlayerAction::Stop),
    (keysyms::XK_LEFT, PlayerAction::SeekBackSmall),
    (keysyms::XK_RIGHT, PlayerAction::SeekForwardSmall),
    (keysyms::XK_PAGE_UP, PlayerAction::SeekForwardLarge),
    (keysyms::XK_PAGE_DOWN, PlayerAction::SeekBackLarge),
    (keysyms::XK_V, PlayerAction::ToggleSubtitles),
];

pub fn action_for(keysym: u32) -> Option<PlayerAction> {
    BINDINGS
        .iter()
        .find(|(bound, _)| *bound == keysym)
        .map(|(_, action)| *action)
}
