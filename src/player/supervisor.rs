use nix::sys::signal::Signal;
use nix::unistd::Pid;

use crate::config;
use crate::platform::ProcessOps;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The player exited and was reaped.
    Exited,
    /// Not even SIGKILL got it reaped; the process is leaked.
    Leaked,
}

/// Wait out the player after a quit request, escalating if it hangs.
///
/// The player is known to stop honoring its control protocol while staying
/// alive (seen after seeking past end of media), so a polite quit cannot be
/// trusted: poll for up to 3 s, then SIGTERM, then SIGKILL, each followed by
/// one more second and one more poll. Runs to completion unconditionally;
/// this is the one place the controller sleeps synchronously, because it has
/// nothing else left to do.
pub fn await_exit<P: ProcessOps>(procs: &P, pid: Pid) -> ShutdownOutcome {
    for _ in 0..config::SHUTDOWN_POLLS {
        if procs.reap(pid).is_some() {
            return ShutdownOutcome::Exited;
        }
        procs.sleep(config::SHUTDOWN_POLL_INTERVAL);
    }

    tracing::error!("player (pid {pid}) not responding, sending SIGTERM");
    if let Err(err) = procs.send_signal(pid, Signal::SIGTERM) {
        tracing::warn!("SIGTERM delivery failed: {err:#}");
    }
    procs.sleep(config::SHUTDOWN_POLL_INTERVAL);
    if procs.reap(pid).is_some() {
        return ShutdownOutcome::Exited;
    }

    tracing::error!("player (pid {pid}) ignored SIGTERM, sending SIGKILL");
    if let Err(err) = procs.send_signal(pid, Signal::SIGKILL) {
        tracing::warn!("SIGKILL delivery failed: {err:#}");
    }
    procs.sleep(config::SHUTDOWN_POLL_INTERVAL);
    if procs.reap(pid).is_some() {
        return ShutdownOutcome::Exited;
    }

    tracing::error!("cannot stop player (pid {pid})");
    ShutdownOutcome::Leaked
}
