use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cogbot::config::DEFAULT_CONFIG_PATH;
use cogbot::{Daemon, Outcome, PluginRegistry};

/// Cogbot - Discord bot shell with compiled-in plugins
#[derive(Parser)]
#[command(name = "cogbot", version, about)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, env = "COGBOT_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn,cogbot=info",
        1 => "info,cogbot=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(Outcome::MissingToken) => {
            tracing::warn!("no token found in config, please check your config.json file");
            ExitCode::SUCCESS
        }
        Ok(Outcome::Stopped) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<Outcome> {
    tracing::info!(config = %cli.config.display(), "starting cogbot");

    let daemon = Daemon::new(cli.config, PluginRegistry::builtin())?;
    Ok(daemon.run().await?)
}
