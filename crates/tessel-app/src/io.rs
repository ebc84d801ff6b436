use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use kanal::AsyncSender;
use tessel_types::AppEvent;
use tokio_util::sync::CancellationToken;

use crate::events::select_image::handle_select_image;
use crate::state::AppState;

/// Where image selections come from
#[derive(Debug, Clone)]
pub enum InputMode {
    /// One path per stdin line; a new line supersedes the pass in flight
    Interactive,
    /// Recognize each image in turn, waiting for every pass to settle
    Batch(Vec<PathBuf>),
}

pub async fn watcher_io(
    state: Arc<AppState>,
    input: InputMode,
    cancel: CancellationToken,
    ui_to_app_tx: AsyncSender<AppEvent>,
    app_to_ui_tx: AsyncSender<AppEvent>,
) -> anyhow::Result<()> {
    match input {
        InputMode::Batch(paths) => {
            tracing::info!("Recognizing {} image(s)", paths.len());
            for path in paths {
                if cancel.is_cancelled() {
                    break;
                }
                if handle_select_image(&state, &path, &app_to_ui_tx)
                    .await?
                    .is_some()
                {
                    tokio::select! {
                        _ = state.orchestrator.settle() => {}
                        _ = cancel.cancelled() => break,
                    }
                }
            }
        }
        InputMode::Interactive => {
            tracing::info!("Reading image paths from stdin");
            spawn_stdin_reader(ui_to_app_tx);
            cancel.cancelled().await;
            tracing::info!("Stdin watcher stopping");
        }
    }

    Ok(())
}

/// Blocking stdin reads live on their own thread so they never hold up runtime shutdown
fn spawn_stdin_reader(tx: AsyncSender<AppEvent>) {
    let tx = tx.to_sync();

    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::error!("Failed to read stdin: {}", e);
                    break;
                }
            };

            let path = line.trim();
            if path.is_empty() {
                continue;
            }

            if tx.send(AppEvent::SelectImage(PathBuf::from(path))).is_err() {
                return;
            }
        }

        tracing::debug!("Stdin closed");
        let _ = tx.send(AppEvent::Shutdown);
    });
}
