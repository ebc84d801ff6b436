use std::sync::Arc;

use kanal::{AsyncReceiver, AsyncSender};
use tessel_types::AppEvent;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

pub mod select_image;

use select_image::handle_select_image;

/// App's main loop
pub async fn event_loop(
    state: Arc<AppState>,
    ui_to_app_rx: AsyncReceiver<AppEvent>,
    app_to_ui_tx: AsyncSender<AppEvent>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    tracing::info!("[EVENT_LOOP] Waiting for image selections");
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = ui_to_app_rx.recv() => match event {
                Ok(event) => event,
                Err(_) => break,
            },
        };

        if !handle_events(&state, &app_to_ui_tx, event).await? {
            break;
        }
    }

    tracing::info!("[EVENT_LOOP] Stopped");
    Ok(())
}

/// Returns false when the loop should stop
async fn handle_events(
    state: &AppState,
    app_to_ui_tx: &AsyncSender<AppEvent>,
    event: AppEvent,
) -> anyhow::Result<bool> {
    match event {
        AppEvent::SelectImage(path) => {
            tracing::debug!(">>> [OCR] Image selected: {}", path.display());
            handle_select_image(state, &path, app_to_ui_tx).await?;
        }
        AppEvent::Shutdown => {
            // End of input: let the last pass finish before stopping
            tracing::info!("[EVENT_LOOP] Input closed, waiting for pass in flight");
            state.orchestrator.settle().await;
            return Ok(false);
        }
        _ => {
            // Orchestrator output goes straight to the view
        }
    }

    Ok(true)
}
