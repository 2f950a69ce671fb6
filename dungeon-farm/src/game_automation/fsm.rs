// Finite State Machine implementation for game automation
use super::channels::{EventSink, SignalSlot};
use super::config::BotConfig;
use super::match_image::StateResolver;
use super::types::{AutomationEvent, RunState, StopReason, UiState};
use crate::capture::FrameSource;
use crate::input::{ActionDispatcher, InputDriver};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// How often a stopped or paused controller looks at the signal slot
pub const IDLE_POLL: Duration = Duration::from_millis(100);

/// What a single call to `BotController::tick` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome<S> {
    /// Not running; nothing was captured
    Idle,
    /// A state was resolved that has no action bound
    Observed { state: S },
    /// The bound action was executed
    Acted { state: S },
    /// Capture or input failed; the tick was a no-op
    Degraded,
    Stopped(StopReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub actions: u64,
    pub degraded_ticks: u64,
    pub reason: StopReason,
}

/// The perception-and-control loop for one bot.
///
/// Each tick while running: apply the pending signal, honour the failsafe,
/// capture, resolve, act, then sleep the tick interval. The sleep is cut
/// short only by a signal that changes the run state, the failsafe or shutdown.
pub struct BotController<S, F, I> {
    config: BotConfig<S>,
    frames: F,
    dispatcher: ActionDispatcher<I>,
    resolver: StateResolver,
    slot: Arc<SignalSlot>,
    events: EventSink,
    run_state: RunState,
    last_state: Option<S>,
    ticks: u64,
    degraded_ticks: u64,
    idle_poll: Duration,
}

impl<S, F, I> BotController<S, F, I>
where
    S: UiState,
    F: FrameSource,
    I: InputDriver,
{
    pub fn new(
        config: BotConfig<S>,
        frames: F,
        driver: I,
        slot: Arc<SignalSlot>,
        events: EventSink,
    ) -> Self {
        let dispatcher = ActionDispatcher::new(driver, slot.clone());
        Self::with_dispatcher(config, frames, dispatcher, slot, events)
    }

    pub fn with_dispatcher(
        config: BotConfig<S>,
        frames: F,
        dispatcher: ActionDispatcher<I>,
        slot: Arc<SignalSlot>,
        events: EventSink,
    ) -> Self {
        Self {
            config,
            frames,
            dispatcher,
            resolver: StateResolver::new(),
            slot,
            events,
            run_state: RunState::Stopped,
            last_state: None,
            ticks: 0,
            degraded_ticks: 0,
            idle_poll: IDLE_POLL,
        }
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn degraded_ticks(&self) -> u64 {
        self.degraded_ticks
    }

    pub fn dispatcher(&self) -> &ActionDispatcher<I> {
        &self.dispatcher
    }

    pub fn config(&self) -> &BotConfig<S> {
        &self.config
    }

    /// Wait in Stopped for Start, run until the bot is back in Stopped.
    pub async fn run(&mut self) -> RunSummary {
        let start_ticks = self.ticks;
        let start_actions = self.dispatcher.executed();
        let start_degraded = self.degraded_ticks;
        log::info!(
            "🎮 {} bot ready on monitor {} ({} bindings, {}ms interval)",
            self.config.variant(),
            self.config.monitor(),
            self.config.bindings().len(),
            self.config.tick_interval().as_millis()
        );

        loop {
            match self.tick().await {
                TickOutcome::Idle => {
                    self.slot
                        .sleep_unless_signalled(self.idle_poll, self.run_state)
                        .await;
                }
                TickOutcome::Stopped(reason) => {
                    let summary = RunSummary {
                        ticks: self.ticks - start_ticks,
                        actions: self.dispatcher.executed() - start_actions,
                        degraded_ticks: self.degraded_ticks - start_degraded,
                        reason,
                    };
                    log::info!(
                        "⏹️ Run ended ({}): {} ticks, {} actions, {} degraded",
                        summary.reason,
                        summary.ticks,
                        summary.actions,
                        summary.degraded_ticks
                    );
                    return summary;
                }
                TickOutcome::Observed { .. } | TickOutcome::Acted { .. } | TickOutcome::Degraded => {}
            }
        }
    }

    pub async fn tick(&mut self) -> TickOutcome<S> {
        if self.slot.is_shutdown() {
            self.transition(RunState::Stopped);
            return self.stopped(StopReason::Shutdown);
        }

        if let Some(signal) = self.slot.take() {
            match self.run_state.apply(signal) {
                Some(next) => {
                    self.transition(next);
                    if next == RunState::Stopped {
                        return self.stopped(StopReason::Signal);
                    }
                }
                None => log::debug!("Ignoring {} while {}", signal, self.run_state),
            }
        }

        if self.run_state != RunState::Running {
            return TickOutcome::Idle;
        }

        if self.slot.take_failsafe() {
            log::warn!("🛑 Failsafe tripped, stopping before tick {}", self.ticks + 1);
            self.events
                .emit(AutomationEvent::FailsafeTripped { tick: self.ticks });
            self.transition(RunState::Stopped);
            return self.stopped(StopReason::Failsafe);
        }

        self.ticks += 1;
        let tick = self.ticks;
        self.events.emit(AutomationEvent::TickStarted { tick });

        let frame = match self.frames.capture(self.config.monitor()) {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("❌ Tick {tick}: capture failed: {e}");
                self.degraded_ticks += 1;
                self.events.emit(AutomationEvent::Error {
                    tick: Some(tick),
                    message: e.to_string(),
                });
                self.sleep_interval().await;
                return TickOutcome::Degraded;
            }
        };
        log::trace!("📸 Tick {tick}: captured {:?}", frame.dimensions());

        let resolution = self.resolver.resolve(&frame, self.config.bindings());
        let state = resolution.state;
        if self.last_state != Some(state) {
            log::info!(
                "🎮 State: {} -> {} ({:.3})",
                self.last_state
                    .map_or_else(|| "-".to_string(), |s| s.to_string()),
                state,
                resolution.confidence
            );
            self.last_state = Some(state);
        }
        self.events.emit(AutomationEvent::StateResolved {
            tick,
            state: state.to_string(),
            template: resolution.template().map(str::to_string),
            confidence: resolution.confidence,
        });

        let Some(action) = resolution.binding.and_then(|b| b.action.as_ref()) else {
            self.sleep_interval().await;
            return TickOutcome::Observed { state };
        };

        let outcome = match self.dispatcher.execute(action, &frame, resolution.hit()).await {
            Ok(()) => {
                log::debug!("✅ Tick {tick}: {} in {}", action.describe(), state);
                self.events.emit(AutomationEvent::ActionExecuted {
                    tick,
                    state: state.to_string(),
                    action: action.describe(),
                });
                TickOutcome::Acted { state }
            }
            Err(e) => {
                log::error!("❌ Tick {tick}: {} failed: {e}", action.describe());
                self.degraded_ticks += 1;
                self.events.emit(AutomationEvent::Error {
                    tick: Some(tick),
                    message: e.to_string(),
                });
                TickOutcome::Degraded
            }
        };

        self.sleep_interval().await;
        outcome
    }

    async fn sleep_interval(&self) {
        self.slot
            .sleep_unless_signalled(self.config.tick_interval(), self.run_state)
            .await;
    }

    fn transition(&mut self, next: RunState) {
        if self.run_state == next {
            return;
        }
        log::info!("🎮 Bot {} -> {}", self.run_state, next);
        self.events.emit(AutomationEvent::RunStateChanged {
            from: self.run_state,
            to: next,
        });
        self.run_state = next;
        if next == RunState::Stopped {
            self.last_state = None;
        }
    }

    fn stopped(&self, reason: StopReason) -> TickOutcome<S> {
        self.events.emit(AutomationEvent::Stopped { reason });
        TickOutcome::Stopped(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_automation::channels::create_event_channel;
    use crate::game_automation::config::Binding;
    use crate::game_automation::types::ControlSignal;
    use crate::game_automation::match_image::Template;
    use crate::game_automation::variants::QueueDungeonState as Q;
    use crate::input::Action;
    use crate::testing::{InputEvent, RecordingInput, ScriptedFrames, pattern, stamp};
    use image::GrayImage;
    use tokio::time::Instant;

    const W: u32 = 160;
    const H: u32 = 120;
    const INTERVAL: Duration = Duration::from_millis(250);

    struct Scene {
        background: GrayImage,
        queue_button: GrayImage,
        confirm_dialog: GrayImage,
    }

    impl Scene {
        fn new() -> Self {
            Self {
                background: pattern(W, H, 900),
                queue_button: pattern(24, 12, 901),
                confirm_dialog: pattern(30, 20, 902),
            }
        }

        fn with_queue(&self) -> GrayImage {
            let mut frame = self.background.clone();
            stamp(&mut frame, &self.queue_button, 120, 100);
            frame
        }

        fn with_queue_and_confirm(&self) -> GrayImage {
            let mut frame = self.with_queue();
            stamp(&mut frame, &self.confirm_dialog, 60, 40);
            frame
        }

        fn bindings(&self) -> Vec<Binding<Q>> {
            vec![
                Binding::new(
                    Template::from_image("queue_background", self.queue_button.clone(), None, 0.9),
                    Q::Queueing,
                    2,
                    Some(Action::click_match(0)),
                ),
                Binding::new(
                    Template::from_image("confirm_dialog", self.confirm_dialog.clone(), None, 0.9),
                    Q::Confirming,
                    1,
                    Some(Action::click_match(0)),
                ),
            ]
        }
    }

    type TestController = BotController<Q, ScriptedFrames, RecordingInput>;

    fn controller(scene: &Scene, frames: ScriptedFrames, driver: RecordingInput) -> (TestController, Arc<SignalSlot>) {
        let slot = Arc::new(SignalSlot::new());
        let config = BotConfig::from_bindings("test", 1, INTERVAL, None, scene.bindings(), (W, H)).unwrap();
        let dispatcher = ActionDispatcher::with_seed(driver, slot.clone(), 3);
        let controller =
            BotController::with_dispatcher(config, frames, dispatcher, slot.clone(), EventSink::disabled());
        (controller, slot)
    }

    fn started(scene: &Scene, frames: ScriptedFrames) -> (TestController, Arc<SignalSlot>) {
        let (controller, slot) = controller(scene, frames, RecordingInput::default());
        slot.publish(ControlSignal::Start);
        (controller, slot)
    }

    #[tokio::test(start_paused = true)]
    async fn test_queueing_clicks_once_then_sleeps_interval() {
        let scene = Scene::new();
        let (mut bot, _slot) = started(&scene, ScriptedFrames::new(W, H).then_frame(scene.with_queue()));

        let before = Instant::now();
        assert_eq!(bot.tick().await, TickOutcome::Acted { state: Q::Queueing });
        assert!(before.elapsed() >= INTERVAL);

        let events = bot.dispatcher().driver().events();
        assert_eq!(bot.dispatcher().driver().clicks(), 1);
        assert_eq!(events.len(), 2);
        let InputEvent::Move(x, y) = events[0] else {
            panic!("expected a move before the click, got {events:?}");
        };
        // Button center (132, 106) with at most 3px jitter
        assert!((129..=135).contains(&x) && (103..=109).contains(&y), "({x}, {y})");
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_origin_offsets_clicks() {
        let scene = Scene::new();
        let frames = ScriptedFrames::new(W, H)
            .at_origin(1920, 80)
            .then_frame(scene.with_queue());
        let (mut bot, _slot) = started(&scene, frames);

        assert_eq!(bot.tick().await, TickOutcome::Acted { state: Q::Queueing });
        let InputEvent::Move(x, y) = bot.dispatcher().driver().events()[0] else {
            panic!("expected a move");
        };
        // Button center (132, 106) inside a window at (1920, 80)
        assert!((2049..=2055).contains(&x) && (183..=189).contains(&y), "({x}, {y})");
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_dialog_beats_queue_background() {
        let scene = Scene::new();
        let (mut bot, _slot) =
            started(&scene, ScriptedFrames::new(W, H).then_frame(scene.with_queue_and_confirm()));

        assert_eq!(bot.tick().await, TickOutcome::Acted { state: Q::Confirming });
        let InputEvent::Move(x, y) = bot.dispatcher().driver().events()[0] else {
            panic!("expected a move");
        };
        // Dialog center (75, 50)
        assert!((72..=78).contains(&x) && (47..=53).contains(&y), "({x}, {y})");
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_failure_only_degrades_that_tick() {
        let scene = Scene::new();
        let frames = ScriptedFrames::new(W, H)
            .then_error()
            .then_frame(scene.with_queue());
        let (mut bot, _slot) = started(&scene, frames);

        let before = Instant::now();
        assert_eq!(bot.tick().await, TickOutcome::Degraded);
        assert!(before.elapsed() >= INTERVAL);
        assert!(bot.dispatcher().driver().events().is_empty());

        assert_eq!(bot.tick().await, TickOutcome::Acted { state: Q::Queueing });
        assert_eq!(bot.dispatcher().driver().clicks(), 1);
        assert_eq!(bot.degraded_ticks(), 1);
        assert_eq!(bot.run_state(), RunState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_state_takes_no_action() {
        let scene = Scene::new();
        let (mut bot, _slot) =
            started(&scene, ScriptedFrames::new(W, H).then_frame(GrayImage::new(W, H)));

        assert_eq!(bot.tick().await, TickOutcome::Observed { state: Q::Unknown });
        assert!(bot.dispatcher().driver().events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_input_degrades_without_retry() {
        let scene = Scene::new();
        let (mut bot, slot) = controller(
            &scene,
            ScriptedFrames::new(W, H).then_frame(scene.with_queue()),
            RecordingInput::failing(),
        );
        slot.publish(ControlSignal::Start);

        assert_eq!(bot.tick().await, TickOutcome::Degraded);
        assert_eq!(bot.dispatcher().driver().attempts(), 1);
        assert_eq!(bot.run_state(), RunState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failsafe_takes_precedence_over_capture() {
        let scene = Scene::new();
        let frames = ScriptedFrames::new(W, H).then_frame(scene.with_queue());
        let (mut bot, slot) = started(&scene, frames.clone());

        assert_eq!(bot.tick().await, TickOutcome::Acted { state: Q::Queueing });
        slot.trip_failsafe();
        let captures = frames.captures();
        assert_eq!(bot.tick().await, TickOutcome::Stopped(StopReason::Failsafe));
        assert_eq!(frames.captures(), captures);
        assert_eq!(bot.dispatcher().driver().clicks(), 1);
        assert_eq!(bot.run_state(), RunState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failsafe_beats_pending_resume() {
        let scene = Scene::new();
        let frames = ScriptedFrames::new(W, H).then_frame(scene.with_queue());
        let (mut bot, slot) = controller(&scene, frames.clone(), RecordingInput::default());

        slot.publish(ControlSignal::Start);
        assert_eq!(bot.tick().await, TickOutcome::Acted { state: Q::Queueing });
        slot.publish(ControlSignal::Pause);
        assert_eq!(bot.tick().await, TickOutcome::Idle);
        slot.publish(ControlSignal::Resume);
        slot.trip_failsafe();
        assert_eq!(bot.tick().await, TickOutcome::Stopped(StopReason::Failsafe));
        assert_eq!(frames.captures(), 1);
        assert_eq!(bot.dispatcher().executed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_with_pointer_in_failsafe_region_acts_never() {
        let scene = Scene::new();
        let frames = ScriptedFrames::new(W, H).then_frame(scene.with_queue());
        let (mut bot, slot) = controller(&scene, frames.clone(), RecordingInput::default());

        slot.report_pointer(true);
        slot.publish(ControlSignal::Start);
        assert_eq!(bot.tick().await, TickOutcome::Stopped(StopReason::Failsafe));
        assert_eq!(frames.captures(), 0);
        assert!(bot.dispatcher().driver().events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failsafe_visit_while_paused_stops_on_resume() {
        let scene = Scene::new();
        let frames = ScriptedFrames::new(W, H).then_frame(scene.with_queue());
        let (mut bot, slot) = started(&scene, frames.clone());

        assert_eq!(bot.tick().await, TickOutcome::Acted { state: Q::Queueing });
        slot.publish(ControlSignal::Pause);
        assert_eq!(bot.tick().await, TickOutcome::Idle);
        slot.report_pointer(true);
        slot.report_pointer(false);
        assert_eq!(bot.tick().await, TickOutcome::Idle);
        assert_eq!(bot.tick().await, TickOutcome::Idle);

        slot.publish(ControlSignal::Resume);
        assert_eq!(bot.tick().await, TickOutcome::Stopped(StopReason::Failsafe));
        assert_eq!(frames.captures(), 1);
        assert_eq!(bot.dispatcher().driver().clicks(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ignored_signal_keeps_tick_interval() {
        let scene = Scene::new();
        let frames = ScriptedFrames::new(W, H).then_frame(scene.with_queue());
        let (mut bot, slot) = started(&scene, frames.clone());

        let operator = slot.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            operator.publish(ControlSignal::Start);
        });

        let before = Instant::now();
        assert_eq!(bot.tick().await, TickOutcome::Acted { state: Q::Queueing });
        assert!(before.elapsed() >= INTERVAL, "{:?}", before.elapsed());
        assert_eq!(frames.captures(), 1);

        assert_eq!(bot.tick().await, TickOutcome::Acted { state: Q::Queueing });
        assert!(before.elapsed() >= INTERVAL * 2);
        assert_eq!(bot.run_state(), RunState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_and_resume() {
        let scene = Scene::new();
        let frames = ScriptedFrames::new(W, H).then_frame(scene.with_queue());
        let (mut bot, slot) = started(&scene, frames.clone());

        assert!(matches!(bot.tick().await, TickOutcome::Acted { .. }));
        slot.publish(ControlSignal::Pause);
        assert_eq!(bot.tick().await, TickOutcome::Idle);
        assert_eq!(bot.tick().await, TickOutcome::Idle);
        assert_eq!(frames.captures(), 1);
        assert_eq!(bot.run_state(), RunState::Paused);

        // Start is not valid while paused
        slot.publish(ControlSignal::Start);
        assert_eq!(bot.tick().await, TickOutcome::Idle);

        slot.publish(ControlSignal::Resume);
        assert!(matches!(bot.tick().await, TickOutcome::Acted { .. }));
        assert_eq!(bot.dispatcher().driver().clicks(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_from_paused_ends_tick() {
        let scene = Scene::new();
        let (mut bot, slot) = started(&scene, ScriptedFrames::new(W, H).then_frame(scene.with_queue()));
        bot.tick().await;
        slot.publish(ControlSignal::Pause);
        bot.tick().await;
        slot.publish(ControlSignal::Stop);
        assert_eq!(bot.tick().await, TickOutcome::Stopped(StopReason::Signal));
        assert_eq!(bot.run_state(), RunState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_controller_ignores_everything_but_start() {
        let scene = Scene::new();
        let frames = ScriptedFrames::new(W, H).then_frame(scene.with_queue());
        let (mut bot, slot) = controller(&scene, frames.clone(), RecordingInput::default());

        for signal in [ControlSignal::Pause, ControlSignal::Resume, ControlSignal::Stop] {
            slot.publish(signal);
            assert_eq!(bot.tick().await, TickOutcome::Idle);
            assert_eq!(bot.run_state(), RunState::Stopped);
        }
        slot.trip_failsafe();
        assert_eq!(bot.tick().await, TickOutcome::Idle);
        assert_eq!(frames.captures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_returns_summary_on_stop() {
        let scene = Scene::new();
        let (mut bot, slot) = controller(
            &scene,
            ScriptedFrames::new(W, H).then_frame(scene.with_queue()),
            RecordingInput::default(),
        );

        let operator = slot.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            operator.publish(ControlSignal::Start);
            tokio::time::sleep(Duration::from_millis(1_000)).await;
            operator.publish(ControlSignal::Stop);
        });

        let summary = bot.run().await;
        assert_eq!(summary.reason, StopReason::Signal);
        assert!(summary.ticks >= 3, "{summary:?}");
        assert_eq!(summary.actions, summary.ticks);
        assert_eq!(summary.degraded_ticks, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_ends_run() {
        let scene = Scene::new();
        let (mut bot, slot) = controller(&scene, ScriptedFrames::new(W, H), RecordingInput::default());
        slot.request_shutdown();
        let summary = bot.run().await;
        assert_eq!(summary.reason, StopReason::Shutdown);
        assert_eq!(summary.ticks, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_emits_events_in_order() {
        let scene = Scene::new();
        let slot = Arc::new(SignalSlot::new());
        let (sink, mut rx) = create_event_channel();
        let config = BotConfig::from_bindings("test", 1, INTERVAL, None, scene.bindings(), (W, H)).unwrap();
        let mut bot = BotController::with_dispatcher(
            config,
            ScriptedFrames::new(W, H).then_frame(scene.with_queue()),
            ActionDispatcher::with_seed(RecordingInput::default(), slot.clone(), 1),
            slot.clone(),
            sink,
        );

        slot.publish(ControlSignal::Start);
        bot.tick().await;

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(
            events[0],
            AutomationEvent::RunStateChanged {
                from: RunState::Stopped,
                to: RunState::Running
            }
        );
        assert_eq!(events[1], AutomationEvent::TickStarted { tick: 1 });
        assert!(matches!(
            &events[2],
            AutomationEvent::StateResolved { state, template: Some(t), .. }
                if state == "queueing" && t == "queue_background"
        ));
        assert!(matches!(&events[3], AutomationEvent::ActionExecuted { tick: 1, .. }));
        assert_eq!(events.len(), 4);
    }
}
