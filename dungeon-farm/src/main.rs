use clap::Parser;
use dungeon_farm::args::{Args, Mode};
use dungeon_farm::runner;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();

    let result = match args.mode() {
        Mode::ListMonitors => runner::list_monitors(),
        Mode::Screenshot(path) => {
            println!("📸 Capturing monitor {}...", args.monitor);
            runner::save_screenshot(&args, &path)
        }
        Mode::Check => runner::check_config(&args),
        Mode::Run => {
            println!(
                "🚀 dungeon-farm v{} ({} on monitor {})",
                env!("APP_VERSION_DISPLAY"),
                args.variant,
                args.monitor
            );
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(e) => {
                    eprintln!("❌ Failed to start async runtime: {e}");
                    return ExitCode::FAILURE;
                }
            };
            runtime.block_on(runner::run_bot(&args)).map(|summary| {
                println!(
                    "⏹️ Stopped ({}) after {} ticks, {} actions, {} degraded",
                    summary.reason, summary.ticks, summary.actions, summary.degraded_ticks
                );
            })
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}
