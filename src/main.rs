//! Config Packager
//!
//! Compiles layered configuration trees into one output tree.

use anyhow::{Context, Result};
use clap::Parser;
use config_packager::cli::{Cli, Command};
use config_packager::commands;
use config_packager::config::ConfigLoader;
use config_packager::context::BuildContext;
use config_packager::logging::{LogTarget, init_logging};
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LogTarget::parse(&cli.log), cli.verbose)?;

    let project_dir = match &cli.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("unable to read the current directory")?,
    };
    let loader = ConfigLoader::new(&project_dir).with_config_file(cli.config.clone());
    let config = loader.load(cli.overrides())?;
    debug!("Resolved configuration: {:?}", config);

    let ctx = BuildContext::new(project_dir, config);
    let command = cli.command();

    if let Command::Watch { .. } = command {
        return watch_until_interrupted(ctx).await;
    }
    commands::run(command.name(), &ctx)
}

/// Run the watch loop on a blocking thread until Ctrl-C.
async fn watch_until_interrupted(ctx: BuildContext) -> Result<()> {
    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    let mut task = tokio::task::spawn_blocking(move || commands::watch(&ctx, stop_rx));

    let summary = tokio::select! {
        joined = &mut task => joined??,
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => {
                    info!("Interrupted, stopping watcher");
                    let _ = stop_tx.send(true);
                }
                Err(e) => warn!("Unable to listen for Ctrl-C: {}", e),
            }
            task.await??
        }
    };
    debug!("Watch summary: {:?}", summary);
    Ok(())
}
