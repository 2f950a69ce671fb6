// Communication channels for game automation
use super::types::{AutomationEvent, ControlSignal, RunState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tokio::time::{Instant, sleep_until};

pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The only state shared between the control threads and the tick loop.
///
/// Holds at most one pending signal (a newer one replaces an older one), the
/// failsafe state, and a shutdown flag. The failsafe is two flags: `pointer_inside`
/// follows the pointer, `failsafe_latched` remembers a visit until a running
/// tick consumes it. Writers call `notify_one` so a loop parked in
/// `sleep_unless_signalled` wakes without waiting out its sleep.
#[derive(Debug, Default)]
pub struct SignalSlot {
    pending: Mutex<Option<ControlSignal>>,
    pointer_inside: AtomicBool,
    failsafe_latched: AtomicBool,
    shutdown: AtomicBool,
    notify: Notify,
}

impl SignalSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, signal: ControlSignal) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.replace(signal) {
            log::debug!("🔁 Signal {previous} replaced by {signal} before it was consumed");
        }
        drop(pending);
        self.notify.notify_one();
    }

    pub fn take(&self) -> Option<ControlSignal> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn peek(&self) -> Option<ControlSignal> {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record where the pointer is now. Entering the region also raises the latch.
    pub fn report_pointer(&self, inside: bool) {
        self.pointer_inside.store(inside, Ordering::SeqCst);
        if inside {
            self.trip_failsafe();
        }
    }

    /// Raise the latch for a visit too short to be seen as a level.
    pub fn trip_failsafe(&self) {
        if !self.failsafe_latched.swap(true, Ordering::SeqCst) {
            self.notify.notify_one();
        }
    }

    /// True while the pointer is inside or a visit is latched.
    pub fn failsafe_active(&self) -> bool {
        self.pointer_inside.load(Ordering::SeqCst) || self.failsafe_latched.load(Ordering::SeqCst)
    }

    /// Consume the latch; the live flag stays until the pointer leaves.
    pub fn take_failsafe(&self) -> bool {
        let latched = self.failsafe_latched.swap(false, Ordering::SeqCst);
        latched || self.pointer_inside.load(Ordering::SeqCst)
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Whether something would change what a controller in `state` does next.
    /// Signals that `state` ignores do not count, and the failsafe only
    /// counts while running.
    pub fn needs_attention(&self, state: RunState) -> bool {
        self.is_shutdown()
            || self.peek().is_some_and(|signal| state.apply(signal).is_some())
            || (state == RunState::Running && self.failsafe_active())
    }

    /// Sleep for `duration` unless something `state` must react to arrives
    /// first. Returns true if the sleep was cut short.
    pub async fn sleep_unless_signalled(&self, duration: Duration, state: RunState) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.needs_attention(state) {
                return true;
            }
            tokio::select! {
                _ = sleep_until(deadline) => return false,
                _ = self.notify.notified() => {}
            }
        }
    }
}

/// Sending half of the event stream. Never blocks: when the observer lags,
/// events are dropped.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Option<mpsc::Sender<AutomationEvent>>,
}

impl EventSink {
    /// A sink with no observer
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: AutomationEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        if let Err(e) = tx.try_send(event) {
            match e {
                mpsc::error::TrySendError::Full(event) => {
                    log::trace!("📭 Event channel full, dropping {event:?}")
                }
                mpsc::error::TrySendError::Closed(_) => {}
            }
        }
    }
}

/// Helper function to create the automation event channel
pub fn create_event_channel() -> (EventSink, mpsc::Receiver<AutomationEvent>) {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    (EventSink { tx: Some(tx) }, rx)
}
