use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

mod controller;
mod events;
mod io;
mod profile;
mod state;
mod status;
mod ui;

#[cfg(test)]
mod tests;

use self::controller::{AppController, ChannelSet, log_task_exit};
use self::io::InputMode;
use self::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "tessel")]
#[command(about = "Recognize text in images with a live progress view")]
#[command(version)]
struct Cli {
    /// Images to recognize in order; paths are read from stdin when none are given
    images: Vec<PathBuf>,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Recognition language, e.g. "eng" or "eng+deu"
    #[arg(short, long)]
    lang: Option<String>,

    /// Accept any image format, not only PNG and JPEG
    #[arg(long)]
    any_type: bool,

    /// Print results as JSON lines
    #[arg(long)]
    json: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

/// Filter used when `RUST_LOG` is unset; stderr shares the terminal with the view
fn default_log_level(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "warn" }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_level(cli.verbose))),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = profile::load_config(cli.config.as_deref())?;
    profile::apply_overrides(&mut config, cli.lang, cli.any_type);
    tracing::info!(
        language = %config.ocr.language,
        strict = config.ocr.strict_media_types,
        "Config loaded"
    );

    let channels = ChannelSet::new(config.event_capacity);
    let state = Arc::new(AppState::with_tesseract(
        config,
        channels.app_to_ui.0.clone(),
    ));
    let controller = AppController::new(state.clone(), channels);

    let batch = !cli.images.is_empty();
    let input = if batch {
        InputMode::Batch(cli.images)
    } else {
        InputMode::Interactive
    };

    let mut tasks = controller.spawn_tasks(input, cli.json);

    tokio::select! {
        result = signal::ctrl_c() => {
            result?;
            tracing::info!("Shutdown requested");
        }
        Some(result) = tasks.join_next() => {
            log_task_exit(result);
        }
    }

    controller.shutdown(tasks).await;

    let summary = state.status.snapshot().await;
    tracing::info!(
        passes = summary.passes,
        completed = summary.completed,
        failed = summary.failed,
        rejected = summary.rejected,
        "Finished"
    );

    if batch && summary.unsuccessful() > 0 {
        anyhow::bail!("{} image(s) could not be recognized", summary.unsuccessful());
    }

    Ok(())
}
