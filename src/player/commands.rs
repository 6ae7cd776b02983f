use std::fmt;

use crate::config;
use crate::core::WindowGeometry;

/// One-shot control commands understood by the player, plus the launch
/// itself. Reposition carries the consolidated geometry for this quiet
/// window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    Quit,
    Reposition(WindowGeometry),
    Hide,
    Unhide,
    TogglePause,
    Stop,
    SeekBackSmall,
    SeekForwardSmall,
    SeekBackLarge,
    SeekForwardLarge,
    ToggleSubtitles,
}

/// omxplayer dbus Action codes, per its MPRIS interface.
const ACTION_TOGGLE_SUBTITLES: i32 = 12;
const ACTION_STOP: i32 = 15;
const ACTION_TOGGLE_PAUSE: i32 = 16;
const ACTION_SEEK_BACK_SMALL: i32 = 19;
const ACTION_SEEK_FORWARD_SMALL: i32 = 20;
const ACTION_SEEK_BACK_LARGE: i32 = 21;
const ACTION_SEEK_FORWARD_LARGE: i32 = 22;
const ACTION_HIDE_VIDEO: i32 = 28;
const ACTION_UNHIDE_VIDEO: i32 = 29;

const MPRIS_PATH: &str = "/org/mpris/MediaPlayer2";

/// A fully substituted command line, ready to exec. Value semantics: each
/// dispatch copies the spec into a fresh process image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    fn new(program: &str, args: impl IntoIterator<Item = String>) -> Self {
        Self {
            program: program.to_string(),
            args: args.into_iter().collect(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Builds the command lines that control one player instance.
///
/// The D-Bus name embeds our own pid, so concurrent controllers address
/// their own players; the same pid doubles as the player's dispmanx layer.
pub struct PlayerCommands {
    dbus_name: String,
    dest: String,
    layer: String,
    media_file: String,
}

impl PlayerCommands {
    pub fn new(control_pid: u32, media_file: &str) -> Self {
        let dbus_name = format!("org.mpris.MediaPlayer2.omxplayer{control_pid}");
        Self {
            dest: format!("--dest={dbus_name}"),
            dbus_name,
            layer: control_pid.to_string(),
            media_file: media_file.to_string(),
        }
    }

    /// The player launch line, with `geometry` as initial placement.
    pub fn launch(&self, geometry: &WindowGeometry) -> CommandSpec {
        CommandSpec::new(
            config::PLAYER_BIN,
            [
                "--font".to_string(),
                config::PLAYER_FONT.to_string(),
                "--italic-font".to_string(),
                config::PLAYER_ITALIC_FONT.to_string(),
                "--sid".to_string(),
                "1".to_string(),
                "--no-keys".to_string(),
                "--dbus_name".to_string(),
                self.dbus_name.clone(),
                "--layer".to_string(),
                self.layer.clone(),
                "--win".to_string(),
                win_param(geometry),
                "--aspect-mode".to_string(),
                "Letterbox".to_string(),
                self.media_file.clone(),
            ],
        )
    }

    pub fn for_action(&self, action: &PlayerAction) -> CommandSpec {
        match action {
            PlayerAction::Quit => self.method_call("org.mpris.MediaPlayer2.Quit", None),
            PlayerAction::Reposition(geometry) => self.method_call(
                "org.mpris.MediaPlayer2.Player.VideoPos",
                Some(vec![
                    "objpath:/not/used".to_string(),
                    format!("string:{}", win_param(geometry)),
                ]),
            ),
            PlayerAction::Hide => self.action(ACTION_HIDE_VIDEO),
            PlayerAction::Unhide => self.action(ACTION_UNHIDE_VIDEO),
            PlayerAction::TogglePause => self.action(ACTION_TOGGLE_PAUSE),
            PlayerAction::Stop => self.action(ACTION_STOP),
            PlayerAction::SeekBackSmall => self.action(ACTION_SEEK_BACK_SMALL),
            PlayerAction::SeekForwardSmall => self.action(ACTION_SEEK_FORWARD_SMALL),
            PlayerAction::SeekBackLarge => self.action(ACTION_SEEK_BACK_LARGE),
            PlayerAction::SeekForwardLarge => self.action(ACTION_SEEK_FORWARD_LARGE),
            PlayerAction::ToggleSubtitles => self.action(ACTION_TOGGLE_SUBTITLES),
        }
    }

    fn action(&self, code: i32) -> CommandSpec {
        self.method_call(
            "org.mpris.MediaPlayer2.Player.Action",
            Some(vec![format!("int32:{code}")]),
        )
    }

    fn method_call(&self, method: &str, extra: Option<Vec<String>>) -> CommandSpec {
        let mut args = vec![
            "--type=method_call".to_string(),
            "--session".to_string(),
            self.dest.clone(),
            MPRIS_PATH.to_string(),
            method.to_string(),
        ];
        args.extend(extra.unwrap_or_default());
        CommandSpec::new(config::DBUS_SEND_BIN, args)
    }
}

/// The "x1 y1 x2 y2" form omxplayer expects for --win and VideoPos.
fn win_param(geometry: &WindowGeometry) -> String {
    format!(
        "{} {} {} {}",
        geometry.x,
        geometry.y,
        geometry.right(),
        geometry.bottom()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands() -> PlayerCommands {
        PlayerCommands::new(1234, "/videos/clip.mp4")
    }

    fn geometry() -> WindowGeometry {
        WindowGeometry {
            x: 10,
            y: 10,
            width: 1024,
            height: 576,
        }
    }

    #[test]
    fn test_launch_line_carries_placement_and_identity() {
        let spec = commands().launch(&geometry());
        assert_eq!(spec.program, "omxplayer.bin");
        assert!(spec
            .args
            .windows(2)
            .any(|w| w == ["--win", "10 10 1034 586"]));
        assert!(spec
            .args
            .windows(2)
            .any(|w| w == ["--dbus_name", "org.mpris.MediaPlayer2.omxplayer1234"]));
        assert!(spec.args.windows(2).any(|w| w == ["--layer", "1234"]));
        assert_eq!(spec.args.last().map(String::as_str), Some("/videos/clip.mp4"));
    }

    #[test]
    fn test_quit_is_an_mpris_method_call() {
        let spec = commands().for_action(&PlayerAction::Quit);
        assert_eq!(spec.program, "dbus-send");
        assert_eq!(
            spec.args,
            vec![
                "--type=method_call",
                "--session",
                "--dest=org.mpris.MediaPlayer2.omxplayer1234",
                "/org/mpris/MediaPlayer2",
                "org.mpris.MediaPlayer2.Quit",
            ]
        );
    }

    #[test]
    fn test_reposition_formats_the_corner_pair_string() {
        let spec = commands().for_action(&PlayerAction::Reposition(geometry()));
        assert_eq!(
            spec.args.last().map(String::as_str),
            Some("string:10 10 1034 586")
        );
        assert!(spec
            .args
            .contains(&"org.mpris.MediaPlayer2.Player.VideoPos".to_string()));
    }

    #[test]
    fn test_action_codes_match_the_player_interface() {
        let cases = [
            (PlayerAction::TogglePause, "int32:16"),
            (PlayerAction::Stop, "int32:15"),
            (PlayerAction::SeekBackSmall, "int32:19"),
            (PlayerAction::SeekForwardSmall, "int32:20"),
            (PlayerAction::SeekBackLarge, "int32:21"),
            (PlayerAction::SeekForwardLarge, "int32:22"),
            (PlayerAction::ToggleSubtitles, "int32:12"),
            (PlayerAction::Hide, "int32:28"),
            (PlayerAction::Unhide, "int32:29"),
        ];
        for (action, expected) in cases {
            let spec = commands().for_action(&action);
            assert_eq!(spec.args.last().map(String::as_str), Some(expected));
        }
    }

    #[test]
    fn test_display_form_is_the_exec_line() {
        let spec = commands().for_action(&PlayerAction::Quit);
        assert!(spec.to_string().starts_with("dbus-send --type=method_call"));
    }
}
