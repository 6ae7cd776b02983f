use std::ffi::CString;
use std::os::unix::io::RawFd;
use std::time::Duration;

use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::signal::{kill, sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{self, fork, setsid, ForkResult, Pid};

use crate::event::{Event, WaitOutcome};
use crate::player::CommandSpec;

/// How a reaped child ended. Signal-terminated children count the same as
/// clean exits for lifecycle purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Code(i32),
    Signal(Signal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reaped {
    pub pid: Pid,
    pub exit: ExitKind,
}

/// A waitable source of typed windowing events.
/// This abstraction allows mocking in tests.
pub trait EventSource {
    /// Block for at most `timeout` until events are ready.
    fn wait(&self, timeout: Duration) -> Result<WaitOutcome>;
    /// Pull the next already-pending event, without blocking.
    fn next_event(&self) -> Result<Option<Event>>;
    /// Ask the window manager to toggle fullscreen on our window.
    fn toggle_fullscreen(&self) -> Result<()>;
}

/// Process fan-out: spawning one-shot commands and the player, reaping, and
/// signalling. This abstraction allows mocking in tests.
pub trait ProcessOps {
    /// Spawn `spec` as a detached process image and return its pid.
    fn dispatch(&self, spec: &CommandSpec) -> Result<Pid>;
    /// Non-blocking reap of any exited child.
    fn reap_any(&self) -> Option<Reaped>;
    /// Non-blocking reap of one specific child.
    fn reap(&self, pid: Pid) -> Option<Reaped>;
    fn send_signal(&self, pid: Pid, signal: Signal) -> Result<()>;
    fn sleep(&self, duration: Duration);
}

impl<S: EventSource + ?Sized> EventSource for &S {
    fn wait(&self, timeout: Duration) -> Result<WaitOutcome> {
        (**self).wait(timeout)
    }

    fn next_event(&self) -> Result<Option<Event>> {
        (**self).next_event()
    }

    fn toggle_fullscreen(&self) -> Result<()> {
        (**self).toggle_fullscreen()
    }
}

impl<P: ProcessOps + ?Sized> ProcessOps for &P {
    fn dispatch(&self, spec: &CommandSpec) -> Result<Pid> {
        (**self).dispatch(spec)
    }

    fn reap_any(&self) -> Option<Reaped> {
        (**self).reap_any()
    }

    fn reap(&self, pid: Pid) -> Option<Reaped> {
        (**self).reap(pid)
    }

    fn send_signal(&self, pid: Pid, signal: Signal) -> Result<()> {
        (**self).send_signal(pid, signal)
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

extern "C" fn handle_sigint(_: libc::c_int) {
    // Nothing to do here: the point is that poll() comes back with EINTR,
    // which the loop turns into a graceful quit.
}

/// Install a no-op SIGINT handler (without SA_RESTART) so Ctrl-C surfaces
/// as an interrupted wait instead of killing the controller outright.
pub fn install_signal_handlers() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(handle_sigint),
        SaFlags::empty(),
        SigSet::empty(),
    );
    unsafe { sigaction(Signal::SIGINT, &action) }
        .context("failed to install SIGINT handler")?;
    Ok(())
}

/// Real process operations via fork/exec and waitpid.
pub struct UnixProcessOps {
    /// The X connection fd, closed in children so they hold no reference to
    /// the display.
    event_fd: Option<RawFd>,
}

impl UnixProcessOps {
    pub fn new(event_fd: Option<RawFd>) -> Self {
        Self { event_fd }
    }
}

impl ProcessOps for UnixProcessOps {
    fn dispatch(&self, spec: &CommandSpec) -> Result<Pid> {
        tracing::debug!("exec {}", spec);

        let program =
            CString::new(spec.program.as_str()).context("NUL byte in program name")?;
        let mut argv = Vec::with_capacity(spec.args.len() + 1);
        argv.push(program.clone());
        for arg in &spec.args {
            argv.push(
                CString::new(arg.as_str())
                    .with_context(|| format!("NUL byte in argument {:?}", arg))?,
            );
        }
        // Pre-rendered so the child stub does not allocate after fork.
        let failure_note = format!("omxwin: exec {} failed\n", spec.program);

        match unsafe { fork() }.context("fork failed")? {
            ForkResult::Parent { child } => Ok(child),
            ForkResult::Child => {
                if let Some(fd) = self.event_fd {
                    unsafe { libc::close(fd) };
                }
                // New session: terminal signals aimed at the controller must
                // never reach the player or the command children.
                let _ = setsid();
                let _ = unistd::execvp(&program, &argv);
                // Exec failed. The parent still got a valid pid; it learns
                // about the failure only as an immediately reapable child.
                unsafe {
                    libc::write(
                        libc::STDERR_FILENO,
                        failure_note.as_ptr() as *const libc::c_void,
                        failure_note.len(),
                    );
                    libc::_exit(0)
                }
            }
        }
    }

    fn reap_any(&self) -> Option<Reaped> {
        reap_target(None)
    }

    fn reap(&self, pid: Pid) -> Option<Reaped> {
        reap_target(Some(pid))
    }

    fn send_signal(&self, pid: Pid, signal: Signal) -> Result<()> {
        kill(pid, signal).with_context(|| format!("failed to send {signal} to pid {pid}"))
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

fn reap_target(target: Option<Pid>) -> Option<Reaped> {
    match waitpid(target, Some(WaitPidFlag::WNOHANG)) {
        Ok(WaitStatus::Exited(pid, code)) => Some(Reaped {
            pid,
            exit: ExitKind::Code(code),
        }),
        Ok(WaitStatus::Signaled(pid, signal, _)) => Some(Reaped {
            pid,
            exit: ExitKind::Signal(signal),
        }),
        Ok(_) => None,
        Err(Errno::ECHILD) => None,
        Err(err) => {
            tracing::warn!("waitpid failed: {err}");
            None
        }
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use anyhow::anyhow;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    /// One scripted iteration of the control loop's wait.
    pub enum Step {
        TimedOut,
        Interrupted,
        Events(Vec<Event>),
        WaitError,
    }

    pub struct ScriptedEventSource {
        steps: RefCell<VecDeque<Step>>,
        queue: RefCell<VecDeque<Event>>,
        pub fullscreen_toggles: Cell<u32>,
    }

    impl ScriptedEventSource {
        pub fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: RefCell::new(steps.into()),
                queue: RefCell::new(VecDeque::new()),
                fullscreen_toggles: Cell::new(0),
            }
        }
    }

    impl EventSource for ScriptedEventSource {
        fn wait(&self, _timeout: Duration) -> Result<WaitOutcome> {
            match self.steps.borrow_mut().pop_front() {
                Some(Step::TimedOut) => Ok(WaitOutcome::TimedOut),
                Some(Step::Interrupted) => Ok(WaitOutcome::Interrupted),
                Some(Step::Events(events)) => {
                    self.queue.borrow_mut().extend(events);
                    Ok(WaitOutcome::Ready)
                }
                Some(Step::WaitError) => Err(anyhow!("scripted wait failure")),
                None => Err(anyhow!("event script exhausted")),
            }
        }

        fn next_event(&self) -> Result<Option<Event>> {
            Ok(self.queue.borrow_mut().pop_front())
        }

        fn toggle_fullscreen(&self) -> Result<()> {
            self.fullscreen_toggles.set(self.fullscreen_toggles.get() + 1);
            Ok(())
        }
    }

    /// Records every dispatch, signal and sleep; reaps come from scripts.
    pub struct RecordingProcessOps {
        pub dispatched: RefCell<Vec<CommandSpec>>,
        pub signals: RefCell<Vec<(Pid, Signal)>>,
        pub sleeps: RefCell<Vec<Duration>>,
        /// Per-call results for `reap_any`; `None` entries end one sweep.
        pub reap_any_script: RefCell<VecDeque<Option<Reaped>>>,
        /// Per-call results for targeted `reap`.
        pub reap_script: RefCell<VecDeque<Option<ExitKind>>>,
        pub fail_dispatch: Cell<bool>,
        next_pid: Cell<i32>,
    }

    impl RecordingProcessOps {
        pub fn new() -> Self {
            Self {
                dispatched: RefCell::new(Vec::new()),
                signals: RefCell::new(Vec::new()),
                sleeps: RefCell::new(Vec::new()),
                reap_any_script: RefCell::new(VecDeque::new()),
                reap_script: RefCell::new(VecDeque::new()),
                fail_dispatch: Cell::new(false),
                next_pid: Cell::new(1000),
            }
        }

        pub fn dispatched_programs(&self) -> Vec<String> {
            self.dispatched
                .borrow()
                .iter()
                .map(|spec| spec.program.clone())
                .collect()
        }

        /// Dispatches whose argument list contains `needle`.
        pub fn dispatches_containing(&self, needle: &str) -> usize {
            self.dispatched
                .borrow()
                .iter()
                .filter(|spec| spec.args.iter().any(|a| a.as_str() == needle))
                .count()
        }
    }

    impl ProcessOps for RecordingProcessOps {
        fn dispatch(&self, spec: &CommandSpec) -> Result<Pid> {
            if self.fail_dispatch.get() {
                return Err(anyhow!("scripted dispatch failure"));
            }
            self.dispatched.borrow_mut().push(spec.clone());
            let pid = self.next_pid.get();
            self.next_pid.set(pid + 1);
            Ok(Pid::from_raw(pid))
        }

        fn reap_any(&self) -> Option<Reaped> {
            self.reap_any_script.borrow_mut().pop_front().flatten()
        }

        fn reap(&self, pid: Pid) -> Option<Reaped> {
            self.reap_script
                .borrow_mut()
                .pop_front()
                .flatten()
                .map(|exit| Reaped { pid, exit })
        }

        fn send_signal(&self, pid: Pid, signal: Signal) -> Result<()> {
            self.signals.borrow_mut().push((pid, signal));
            Ok(())
        }

        fn sleep(&self, duration: Duration) {
            self.sleeps.borrow_mut().push(duration);
        }
    }
}
