use crate::capture::MonitorIndex;
use crate::game_automation::control::DEFAULT_FAILSAFE_RECT;
use crate::game_automation::{BotVariant, HotkeyBindings, RunSettings, ScreenRect};
use crate::input::KeyCode;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Run,
    Check,
    ListMonitors,
    Screenshot(PathBuf),
}

/// Screen-driven dungeon farming bot.
///
/// Hotkeys work regardless of window focus. Moving the pointer into the
/// failsafe corner stops the bot.
#[derive(Debug, Parser)]
#[command(
    name = "dungeon-farm",
    version = env!("APP_VERSION_DISPLAY"),
    after_help = concat!("© ", env!("APP_BUILD_YEAR"), " Vigor Solutions")
)]
pub struct Args {
    /// Which bot to run
    #[arg(short, long, value_enum, default_value_t = BotVariant::Kanamia)]
    pub variant: BotVariant,

    /// Monitor to watch, 1 is the first display
    #[arg(short, long, default_value_t = 1)]
    pub monitor: MonitorIndex,

    /// Capture only the window whose title contains this text (any case)
    #[arg(short, long, value_name = "TITLE")]
    pub window_title: Option<String>,

    /// Tick interval in milliseconds (defaults to the variant's)
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Template root; templates are read from <ASSETS>/<variant>/
    #[arg(long, value_name = "DIR", default_value = "assets")]
    pub assets: PathBuf,

    /// JSON profile replacing the built-in state table
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    /// Forbidden pointer region in desktop coordinates: x,y,width,height
    #[arg(long, value_name = "RECT", default_value_t = DEFAULT_FAILSAFE_RECT)]
    pub failsafe: ScreenRect,

    /// Disable the pointer failsafe
    #[arg(long)]
    pub no_failsafe: bool,

    #[arg(long, value_name = "KEY", default_value = "f8")]
    pub start_key: KeyCode,

    /// Toggles pause and resume
    #[arg(long, value_name = "KEY", default_value = "f9")]
    pub pause_key: KeyCode,

    #[arg(long, value_name = "KEY", default_value = "f10")]
    pub stop_key: KeyCode,

    /// Start immediately instead of waiting for the start hotkey
    #[arg(long)]
    pub start: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Save a screenshot of the monitor and exit
    #[arg(
        short,
        long,
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = "cli-screenshot.png"
    )]
    pub screenshot: Option<PathBuf>,

    /// List attached monitors and exit
    #[arg(long)]
    pub list_monitors: bool,

    /// Load and validate the configuration, then exit
    #[arg(long)]
    pub check: bool,
}

impl Args {
    pub fn mode(&self) -> Mode {
        if self.list_monitors {
            Mode::ListMonitors
        } else if let Some(path) = &self.screenshot {
            Mode::Screenshot(path.clone())
        } else if self.check {
            Mode::Check
        } else {
            Mode::Run
        }
    }

    pub fn hotkeys(&self) -> HotkeyBindings {
        HotkeyBindings {
            start: self.start_key,
            pause: self.pause_key,
            stop: self.stop_key,
        }
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            monitor: self.monitor,
            tick_interval: self.interval_ms.map(Duration::from_millis),
            asset_dir: self.assets.join(self.variant.asset_subdir()),
            failsafe: (!self.no_failsafe).then_some(self.failsafe),
        }
    }
}
