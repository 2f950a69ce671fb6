// Wires the real display, input and hotkeys to the controller for each CLI mode
use crate::args::Args;
use crate::capture::{FrameSource, ScreenCapture};
use crate::error::BotError;
use crate::game_automation::{
    AutomationEvent, BotConfig, BotController, BotVariant, ControlChannel, ControlSignal,
    MatchConfig, ProfileSpec, QueueDungeonState, RunSummary, SignalSlot, ToweringState, UiState,
    create_event_channel,
};
use crate::input::DesktopInput;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Run the selected variant until Stop, the failsafe, or Ctrl-C.
pub async fn run_bot(args: &Args) -> Result<RunSummary, BotError> {
    match args.variant {
        BotVariant::Kanamia | BotVariant::Tina => run_variant::<QueueDungeonState>(args).await,
        BotVariant::Towering => run_variant::<ToweringState>(args).await,
    }
}

/// Load and validate the configuration without starting anything.
pub fn check_config(args: &Args) -> Result<(), BotError> {
    match args.variant {
        BotVariant::Kanamia | BotVariant::Tina => print_config(&load_config::<QueueDungeonState>(args)?),
        BotVariant::Towering => print_config(&load_config::<ToweringState>(args)?),
    }
    if let Some(title) = &args.window_title {
        println!("   capturing window '{title}'");
    }
    Ok(())
}

pub fn list_monitors() -> Result<(), BotError> {
    let monitors = ScreenCapture::new().monitors()?;
    if monitors.is_empty() {
        println!("❌ No monitors found");
    }
    for m in monitors {
        println!(
            "🖥️ {}: {} {}x{} at ({}, {}){}",
            m.index,
            m.name,
            m.width,
            m.height,
            m.x,
            m.y,
            if m.is_primary { " [primary]" } else { "" }
        );
    }
    Ok(())
}

/// Save a full-colour capture, the raw material for cutting new templates.
pub fn save_screenshot(args: &Args, path: &Path) -> Result<(), BotError> {
    let image = screen(args).capture_rgba(args.monitor)?;
    image.save(path)?;
    let source = args
        .window_title
        .as_ref()
        .map_or_else(|| format!("Monitor {}", args.monitor), |t| format!("Window '{t}'"));
    println!(
        "✅ {} ({}x{}) saved to {}",
        source,
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}

fn screen(args: &Args) -> ScreenCapture {
    ScreenCapture::bound_to(args.window_title.clone())
}

fn load_config<S: UiState>(args: &Args) -> Result<BotConfig<S>, BotError> {
    let profile = match &args.profile {
        Some(path) => {
            log::info!("📄 Using profile {}", path.display());
            ProfileSpec::from_file(path)?
        }
        None => args.variant.builtin_profile(),
    };
    let config = BotConfig::load_from(
        &screen(args),
        &args.variant.to_string(),
        &profile,
        &args.run_settings(),
        &MatchConfig::default(),
    )?;
    Ok(config)
}

fn print_config<S: UiState>(config: &BotConfig<S>) {
    println!(
        "✅ {} on monitor {}: {} bindings, {}ms interval",
        config.variant(),
        config.monitor(),
        config.bindings().len(),
        config.tick_interval().as_millis()
    );
    for binding in config.bindings() {
        let (w, h) = binding.template.dimensions();
        println!(
            "   p{:<3} {:<18} {:<28} {}x{} >= {:.2} {}",
            binding.priority,
            binding.state.to_string(),
            binding.template.name,
            w,
            h,
            binding.template.threshold,
            binding
                .action
                .as_ref()
                .map_or_else(|| "(observe)".to_string(), |a| a.describe())
        );
    }
    match config.failsafe() {
        Some(rect) => println!("   failsafe {rect}"),
        None => println!("   failsafe disabled"),
    }
}

async fn run_variant<S: UiState>(args: &Args) -> Result<RunSummary, BotError> {
    let config = load_config::<S>(args)?;
    let slot = Arc::new(SignalSlot::new());
    let control = ControlChannel::spawn(slot.clone(), args.hotkeys(), config.failsafe())?;
    let driver = DesktopInput::new()?;

    let (events, rx) = create_event_channel();
    tokio::spawn(log_events(rx));

    let ctrl_c_slot = slot.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("🛑 Ctrl-C received, shutting down");
            ctrl_c_slot.request_shutdown();
        }
    });

    if args.start {
        slot.publish(ControlSignal::Start);
    } else {
        println!(
            "⌨️ Press {} to start, {} to pause/resume, {} to stop",
            args.start_key, args.pause_key, args.stop_key
        );
    }

    let mut controller = BotController::new(config, screen(args), driver, slot.clone(), events);
    let summary = controller.run().await;

    slot.request_shutdown();
    control.join();
    Ok(summary)
}

async fn log_events(mut rx: mpsc::Receiver<AutomationEvent>) {
    while let Some(event) = rx.recv().await {
        match serde_json::to_string(&event) {
            Ok(json) => log::debug!(target: "dungeon_farm::events", "{json}"),
            Err(e) => log::warn!("⚠️ Unserializable event {event:?}: {e}"),
        }
    }
}
