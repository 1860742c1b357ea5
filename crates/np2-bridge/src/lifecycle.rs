//! Lifecycle state of one emulator instance.

use std::fmt;

/// Externally observable run state.
///
/// Transitions are confined to the state-machine operations on
/// [`Instance`](crate::Instance): `Loading → Ready → Running ⇄ Paused`,
/// `Running | Paused → Exited`, and `Exited → Running` only via `reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Module bootstrap has not completed yet.
    Loading,
    /// Boot finished; the module is paused and has not run yet.
    Ready,
    Running,
    Paused,
    /// The emulated machine exited; only `reset` leaves this state.
    Exited,
}

impl RunState {
    /// Stable lower-case name, used verbatim by the JS-facing surface.
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Loading => "loading",
            RunState::Ready => "ready",
            RunState::Running => "running",
            RunState::Paused => "paused",
            RunState::Exited => "exited",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reaction queued by a native callback, to be executed by
/// [`Instance::poll_deferred`](crate::Instance::poll_deferred) once the
/// triggering native call stack has unwound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeferredAction {
    Exit,
}
