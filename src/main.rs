use clap::Parser;

use touch_guard::config::{Cli, Command, Config};
use touch_guard::launch::{should_terminate, LaunchIntent};
use touch_guard::replay::{replay, Trace};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load(&cli);

    if let Err(e) = config.validate() {
        log::error!("{}", e);
        std::process::exit(1);
    }

    match cli.command {
        Some(Command::Replay { trace }) => {
            let loaded = Trace::load(&trace)?;
            log::info!(
                "Replaying {} (block {}ms, warning throttle {}ms)",
                trace.display(),
                config.block_duration_ms,
                config.warning_throttle_ms
            );
            let reports = replay(&loaded, config.guard_settings());
            for report in &reports {
                println!("{}", report);
            }
        }
        Some(Command::Launch {
            task_root,
            action,
            categories,
        }) => {
            let intent = LaunchIntent::from_parts(action, categories);
            log::debug!("Evaluating launch (task_root={}, intent={:?})", task_root, intent);
            if should_terminate(task_root, intent.as_ref()) {
                println!("terminate");
            } else {
                println!("continue");
            }
        }
        Some(Command::ShowConfig) | None => {
            println!("{}", config);
        }
    }

    Ok(())
}
