// Executes configured actions against an input driver
use super::action::{Action, ClickTarget};
use super::error::{InputDispatchError, InputResult};
use super::types::InputDriver;
use crate::capture::Frame;
use crate::game_automation::channels::SignalSlot;
use crate::game_automation::types::RunState;
use crate::game_automation::match_image::MatchRegion;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;

/// Turns an `Action` into OS input. Side effects are issued in full before
/// any settle delay; only the settle delay is cut short, by Pause, Stop, the
/// failsafe or shutdown. Nothing is retried here: the next tick re-observes
/// the screen.
pub struct ActionDispatcher<I> {
    driver: I,
    rng: StdRng,
    slot: Arc<SignalSlot>,
    executed: u64,
}

impl<I: InputDriver> ActionDispatcher<I> {
    pub fn new(driver: I, slot: Arc<SignalSlot>) -> Self {
        Self::with_rng(driver, slot, StdRng::from_entropy())
    }

    /// Deterministic jitter, for tests and reproducible dry runs
    pub fn with_seed(driver: I, slot: Arc<SignalSlot>, seed: u64) -> Self {
        Self::with_rng(driver, slot, StdRng::seed_from_u64(seed))
    }

    fn with_rng(driver: I, slot: Arc<SignalSlot>, rng: StdRng) -> Self {
        Self {
            driver,
            rng,
            slot,
            executed: 0,
        }
    }

    pub fn driver(&self) -> &I {
        &self.driver
    }

    /// Number of actions executed to completion
    pub fn executed(&self) -> u64 {
        self.executed
    }

    pub async fn execute(
        &mut self,
        action: &Action,
        frame: &Frame,
        hit: Option<&MatchRegion>,
    ) -> InputResult<()> {
        let interrupted = self.perform(action, frame, hit).await?;
        self.executed += 1;
        if interrupted {
            log::debug!("⏹️ Settle delay abandoned for pending control signal");
        }
        Ok(())
    }

    /// Returns true when a settle delay was cut short.
    async fn perform(
        &mut self,
        action: &Action,
        frame: &Frame,
        hit: Option<&MatchRegion>,
    ) -> InputResult<bool> {
        match action {
            Action::Click {
                target,
                jitter_px,
                button,
                settle_ms,
            } => {
                if let Some((x, y)) = Self::click_point(*target, frame, hit)? {
                    let (dx, dy) = self.jitter(*jitter_px);
                    self.driver.move_to(x + dx, y + dy)?;
                }
                self.driver.click(*button)?;
                Ok(self.settle(*settle_ms).await)
            }
            Action::Key {
                key,
                hold_ms,
                settle_ms,
            } => {
                self.driver.key_down(*key)?;
                if *hold_ms > 0 {
                    // A held key is always released, so the hold is not interruptible
                    tokio::time::sleep(Duration::from_millis(*hold_ms)).await;
                }
                self.driver.key_up(*key)?;
                Ok(self.settle(*settle_ms).await)
            }
            Action::Sequence { steps } => {
                for step in steps {
                    if Box::pin(self.perform(step, frame, hit)).await? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    fn click_point(
        target: ClickTarget,
        frame: &Frame,
        hit: Option<&MatchRegion>,
    ) -> InputResult<Option<(i32, i32)>> {
        match target {
            ClickTarget::MatchCenter => {
                let region = hit.ok_or(InputDispatchError::MissingMatchRegion)?;
                let (cx, cy) = region.center();
                Ok(Some(frame.to_desktop(cx, cy)))
            }
            ClickTarget::Point { x, y } => Ok(Some(frame.to_desktop(x, y))),
            ClickTarget::Pointer => Ok(None),
        }
    }

    fn jitter(&mut self, radius: u32) -> (i32, i32) {
        if radius == 0 {
            return (0, 0);
        }
        let r = radius as i32;
        (self.rng.gen_range(-r..=r), self.rng.gen_range(-r..=r))
    }

    async fn settle(&self, settle_ms: u64) -> bool {
        if settle_ms == 0 {
            return false;
        }
        self.slot
            .sleep_unless_signalled(Duration::from_millis(settle_ms), RunState::Running)
            .await
    }
}
