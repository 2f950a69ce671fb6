pub mod args;
pub mod capture;
pub mod error;
pub mod game_automation;
pub mod input;
pub mod runner;

#[cfg(test)]
mod testing;

pub use error::BotError;
