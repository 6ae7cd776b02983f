use nix::unistd::Pid;

use super::{ScaleFactor, WindowGeometry};
use crate::effect::Effect;
use crate::event::{Event, Visibility};
use crate::keymap;
use crate::platform::Reaped;
use crate::player::PlayerAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    NotStarted,
    Running,
    Stopped,
}

/// The debounce and lifecycle state machine driving the control loop.
///
/// Pure: every input is a method call, every output a list of [`Effect`]s.
/// Geometry events only accumulate; a quiet tick consumes the accumulator
/// and emits at most one consolidated action.
#[derive(Debug)]
pub struct Controller {
    state: PlayerState,
    player_pid: Option<Pid>,
    pending: u32,
    latest: WindowGeometry,
    scale: ScaleFactor,
}

impl Controller {
    pub fn new(scale: ScaleFactor) -> Self {
        Self {
            state: PlayerState::NotStarted,
            player_pid: None,
            pending: 0,
            latest: WindowGeometry::default(),
            scale,
        }
    }

    /// The supervised player's pid, once spawned and until reaped.
    pub fn player_pid(&self) -> Option<Pid> {
        self.player_pid
    }

    /// The loop runs as long as this holds.
    pub fn is_active(&self) -> bool {
        self.state != PlayerState::Stopped
    }

    /// A full quiet window elapsed with no events: any accumulated gesture
    /// has settled. Emits the one consolidated action for this window and
    /// resets the accumulator (a no-op when nothing was pending).
    pub fn on_quiet(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.pending > 0 {
            match self.state {
                PlayerState::NotStarted => {
                    effects.push(Effect::SpawnPlayer {
                        geometry: self.latest,
                    });
                }
                PlayerState::Running => {
                    effects.push(Effect::Player(PlayerAction::Reposition(self.latest)));
                }
                PlayerState::Stopped => {}
            }
        }
        self.pending = 0;
        effects
    }

    /// The wait primitive was interrupted or failed. If the player is
    /// running, ask it to quit; either way the run is over once it was.
    pub fn on_interrupt(&mut self) -> Vec<Effect> {
        if self.state == PlayerState::Running {
            self.state = PlayerState::Stopped;
            vec![Effect::Player(PlayerAction::Quit)]
        } else {
            Vec::new()
        }
    }

    /// Route one drained event.
    pub fn on_event(&mut self, event: &Event) -> Vec<Effect> {
        match *event {
            Event::GeometryChanged {
                x,
                y,
                width,
                height,
            } => {
                // Negative origins are spurious off-screen reports.
                if x >= 0 && y >= 0 {
                    self.latest = self.scale.to_player(x, y, width, height);
                    self.pending += 1;
                }
                Vec::new()
            }
            Event::KeyPressed { keysym } => self.on_key(keysym),
            Event::CloseRequested => self.quit(),
            Event::VisibilityChanged(Visibility::FullyObscured) => {
                vec![Effect::Player(PlayerAction::Hide)]
            }
            Event::VisibilityChanged(Visibility::Unobscured) => {
                vec![Effect::Player(PlayerAction::Unhide)]
            }
        }
    }

    /// A child was reaped. Only the supervised identifier may change state;
    /// one-shot command children reap to nothing here.
    pub fn on_reaped(&mut self, reaped: &Reaped) {
        if self.state == PlayerState::Running && self.player_pid == Some(reaped.pid) {
            tracing::info!("player (pid {}) exited: {:?}", reaped.pid, reaped.exit);
            self.state = PlayerState::Stopped;
            self.player_pid = None;
        }
    }

    /// Outcome of executing [`Effect::SpawnPlayer`]. Failure ends the run
    /// without ever entering `Running`.
    pub fn record_spawn(&mut self, pid: Option<Pid>) {
        match pid {
            Some(pid) => {
                self.player_pid = Some(pid);
                self.state = PlayerState::Running;
            }
            None => self.state = PlayerState::Stopped,
        }
    }

    fn on_key(&mut self, keysym: u32) -> Vec<Effect> {
        if keysym == keymap::QUIT_KEY {
            return self.quit();
        }
        if keysym == keymap::FULLSCREEN_KEY {
            return vec![Effect::ToggleFullscreen];
        }
        match keymap::action_for(keysym) {
            Some(action) => vec![Effect::Player(action)],
            None => Vec::new(),
        }
    }

    /// Quit key or WM close request: one quit dispatch, state goes straight
    /// to `Stopped` without waiting for the player to actually exit (the
    /// shutdown escalation handles that).
    fn quit(&mut self) -> Vec<Effect> {
        self.state = PlayerState::Stopped;
        vec![Effect::Player(PlayerAction::Quit)]
    }
}
