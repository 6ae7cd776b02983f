use std::time::Duration;

/// Application constants, grouped in one place.
///
/// The player command templates that consume these live in
/// `player::commands`.
pub const CLASS_NAME: &str = "omxwin";

pub const PLAYER_BIN: &str = "omxplayer.bin";
pub const DBUS_SEND_BIN: &str = "dbus-send";

/// Fonts passed to omxplayer for subtitle rendering. The opengl kms driver
/// needs --no-osd instead; not supported here.
pub const PLAYER_FONT: &str = "/usr/share/fonts/TTF/Vera.ttf";
pub const PLAYER_ITALIC_FONT: &str = "/usr/share/fonts/TTF/VeraIt.ttf";

/// Quiet window after which a move/resize gesture is considered settled.
/// This is the only signal available for "mouse button released": we trade
/// half a second of lag for not having to track drag state.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Shutdown escalation timing: poll the player up to `SHUTDOWN_POLLS` times
/// with `SHUTDOWN_POLL_INTERVAL` sleeps before reaching for SIGTERM.
pub const SHUTDOWN_POLLS: u32 = 3;
pub const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Window sizing, in player (HDMI reference) units; scaled to X units at
/// window creation.
pub const DEFAULT_SIZE: (u32, u32) = (1024, 576);
pub const MIN_SIZE: (u32, u32) = (320, 240);
pub const MAX_SIZE: (u32, u32) = (1920, 1080);

/// The resolution omxplayer renders against, regardless of the framebuffer
/// mode X is running at.
pub const REFERENCE_RESOLUTION: (u32, u32) = (1920, 1080);

/// Framebuffer device probed for scale calibration, overridable at runtime.
pub const FB_DEVICE: &str = "/dev/fb0";
pub const FB_DEVICE_ENV: &str = "OMXWIN_FB_DEV";
