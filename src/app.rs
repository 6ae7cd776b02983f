use anyhow::{bail, Result};

use crate::config;
use crate::core::{Controller, ScaleFactor, WindowGeometry};
use crate::effect::Effect;
use crate::event::WaitOutcome;
use crate::platform::{EventSource, ProcessOps};
use crate::player::supervisor::{self, ShutdownOutcome};
use crate::player::PlayerCommands;

/// The top-level driver: waits on the event source with the debounce
/// timeout, feeds drained events to the controller, executes the resulting
/// effects, and hands the player to the shutdown escalation when the run
/// ends.
pub struct App<S: EventSource, P: ProcessOps> {
    source: S,
    procs: P,
    commands: PlayerCommands,
    controller: Controller,
}

impl<S: EventSource, P: ProcessOps> App<S, P> {
    pub fn new(source: S, procs: P, commands: PlayerCommands, scale: ScaleFactor) -> Self {
        Self {
            source,
            procs,
            commands,
            controller: Controller::new(scale),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        while self.controller.is_active() {
            match self.source.wait(config::DEBOUNCE_WINDOW) {
                Ok(WaitOutcome::Ready) => {}
                Ok(WaitOutcome::TimedOut) => self.on_quiet_tick(),
                Ok(WaitOutcome::Interrupted) => {
                    tracing::info!("wait interrupted by signal");
                    let effects = self.controller.on_interrupt();
                    self.execute(effects);
                }
                Err(err) => {
                    tracing::error!("event source failed: {err:#}");
                    let effects = self.controller.on_interrupt();
                    self.execute(effects);
                    break;
                }
            }

            if let Err(err) = self.drain_events() {
                tracing::error!("event source failed: {err:#}");
                let effects = self.controller.on_interrupt();
                self.execute(effects);
                break;
            }
        }

        self.shutdown()
    }

    /// The quiet window elapsed: let the controller consolidate, then sweep
    /// exited children. Only the supervised pid can change state; the rest
    /// are one-shot command children being collected.
    fn on_quiet_tick(&mut self) {
        let effects = self.controller.on_quiet();
        self.execute(effects);

        while let Some(reaped) = self.procs.reap_any() {
            tracing::debug!("child {} finished: {:?}", reaped.pid, reaped.exit);
            self.controller.on_reaped(&reaped);
        }
    }

    /// Consume every pending event in source order, including any that
    /// arrived after the wait returned.
    fn drain_events(&mut self) -> Result<()> {
        while let Some(event) = self.source.next_event()? {
            let effects = self.controller.on_event(&event);
            self.execute(effects);
        }
        Ok(())
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SpawnPlayer { geometry } => self.spawn_player(&geometry),
                Effect::Player(action) => {
                    let spec = self.commands.for_action(&action);
                    // Fire-and-forget: a missing dbus-send shows up as an
                    // immediately reapable child, not as a loop error.
                    if let Err(err) = self.procs.dispatch(&spec) {
                        tracing::warn!("dispatch failed: {err:#}");
                    }
                }
                Effect::ToggleFullscreen => {
                    if let Err(err) = self.source.toggle_fullscreen() {
                        tracing::warn!("fullscreen toggle failed: {err:#}");
                    }
                }
            }
        }
    }

    fn spawn_player(&mut self, geometry: &WindowGeometry) {
        let spec = self.commands.launch(geometry);
        match self.procs.dispatch(&spec) {
            Ok(pid) => {
                tracing::info!("player started (pid {pid})");
                self.controller.record_spawn(Some(pid));
            }
            Err(err) => {
                tracing::error!("failed to start player: {err:#}");
                self.controller.record_spawn(None);
            }
        }
    }

    fn shutdown(&mut self) -> Result<()> {
        match self.controller.player_pid() {
            Some(pid) => match supervisor::await_exit(&self.procs, pid) {
                ShutdownOutcome::Exited => Ok(()),
                ShutdownOutcome::Leaked => bail!("player process {pid} could not be stopped"),
            },
            None => {
                tracing::warn!("no player to supervise at shutdown");
                Ok(())
            }
        }
    }
}
