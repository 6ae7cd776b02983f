/// Typed events produced by the windowing event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The window was moved or resized. Origin may be negative for
    /// spurious off-screen reports; those are filtered by the controller.
    GeometryChanged { x: i32, y: i32, width: u32, height: u32 },
    KeyPressed { keysym: u32 },
    VisibilityChanged(Visibility),
    /// The window manager asked us to close (WM_DELETE_WINDOW).
    CloseRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Unobscured,
    FullyObscured,
}

/// Result of one bounded wait on the event source.
///
/// Interruption by a signal is a first-class outcome, distinct from both
/// timeout and a genuine wait error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// At least one event is ready to be drained.
    Ready,
    /// The quiet window elapsed with no events.
    TimedOut,
    /// The wait was interrupted by a signal (EINTR).
    Interrupted,
}
