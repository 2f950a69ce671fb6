// Types and enums for game automation
use serde::Serialize;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::str::FromStr;
use strum::Display as StrumDisplay;

/// A closed set of recognisable screens for one game variant.
///
/// Profiles name states as strings; `FromStr` is how those names are
/// validated at load time, so a typo fails before the run starts.
pub trait UiState:
    Copy + Eq + Hash + Debug + Display + FromStr + Send + Sync + 'static
{
    /// Resolved when no template clears its threshold.
    const UNKNOWN: Self;
}

/// Lifecycle of the control loop. Only the dispatcher's owner acts while `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, StrumDisplay)]
pub enum RunState {
    #[default]
    Stopped,
    Running,
    Paused,
}

impl RunState {
    /// Next state for `signal`, or `None` when the signal does not apply here.
    pub fn apply(self, signal: ControlSignal) -> Option<RunState> {
        use ControlSignal as S;
        use RunState::*;
        match (self, signal) {
            (Stopped, S::Start) => Some(Running),
            (Running, S::Pause) => Some(Paused),
            (Running, S::Stop) | (Paused, S::Stop) => Some(Stopped),
            (Paused, S::Resume) => Some(Running),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, StrumDisplay)]
pub enum ControlSignal {
    Start,
    Pause,
    Resume,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, StrumDisplay)]
pub enum StopReason {
    /// Operator sent Stop
    Signal,
    /// Pointer entered the forbidden region
    Failsafe,
    /// Process is exiting (Ctrl-C)
    Shutdown,
}

/// Observer-only notifications. Never required for the loop to progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AutomationEvent {
    RunStateChanged {
        from: RunState,
        to: RunState,
    },
    TickStarted {
        tick: u64,
    },
    StateResolved {
        tick: u64,
        state: String,
        template: Option<String>,
        confidence: f32,
    },
    ActionExecuted {
        tick: u64,
        state: String,
        action: String,
    },
    Error {
        tick: Option<u64>,
        message: String,
    },
    FailsafeTripped {
        tick: u64,
    },
    Stopped {
        reason: StopReason,
    },
}
