// Game automation module
// The perception-and-control loop: templates are matched against captured
// frames, the resolver picks one UI state, and the controller executes the
// action bound to it while the control channel can pause or stop it.

pub mod channels;
pub mod config;
pub mod control;
pub mod error;
pub mod fsm;
pub mod match_image;
pub mod types;
pub mod variants;

// Re-export the main types and functions for easy access
pub use channels::{EventSink, SignalSlot, create_event_channel};
pub use config::{Binding, BindingSpec, BotConfig, ProfileSpec, RunSettings};
pub use control::{ControlChannel, HotkeyBindings, ScreenRect};
pub use error::ConfigError;
pub use fsm::{BotController, RunSummary, TickOutcome};
pub use match_image::{MatchConfig, StateResolver, Template, TemplateMatcher};
pub use types::{AutomationEvent, ControlSignal, RunState, StopReason, UiState};
pub use variants::{BotVariant, QueueDungeonState, ToweringState};
