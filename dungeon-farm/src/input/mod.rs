// Input module - synthetic mouse and keyboard events
// Actions are pure configuration; the dispatcher turns them into OS input
// through an `InputDriver`, which is swapped for a recorder in tests.

pub mod action;
pub mod desktop;
pub mod dispatcher;
pub mod error;
pub mod types;

pub use action::{Action, ClickTarget};
pub use desktop::DesktopInput;
pub use dispatcher::ActionDispatcher;
pub use error::{InputDispatchError, InputResult};
pub use types::{InputDriver, KeyCode, MouseButton, NamedKey, PointerProbe};
