use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lift_sync_runtime::config::RuntimeConfig;

/// Drivetrain and paired-lift control runtime
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON config file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init(); // installs the subscriber globally

    let args = Args::parse();

    // Bad config is fatal before any motor moves
    let config = match &args.config {
        Some(path) => {
            info!("Loading config from {}", path.display());
            RuntimeConfig::load(path)
        }
        None => {
            let config = RuntimeConfig::default();
            config.validate().map(|()| config)
        }
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = lift_sync_runtime::runtime::run(config).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
