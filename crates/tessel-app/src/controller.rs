use std::sync::Arc;
use std::time::Duration;

use kanal::{AsyncReceiver, AsyncSender};
use tessel_types::AppEvent;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::events::event_loop;
use crate::io::{InputMode, watcher_io};
use crate::state::AppState;
use crate::ui::{ViewOptions, ui_loop};

/// Centralized channel management
pub struct ChannelSet {
    pub app_to_ui: (AsyncSender<AppEvent>, AsyncReceiver<AppEvent>),
    pub ui_to_app: (AsyncSender<AppEvent>, AsyncReceiver<AppEvent>),
}

impl ChannelSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            app_to_ui: kanal::bounded_async(capacity), // progress bursts
            ui_to_app: kanal::bounded_async(64),       // user selections
        }
    }
}

/// Application controller for task spawning and lifecycle
pub struct AppController {
    channels: ChannelSet,
    state: Arc<AppState>,
    cancel_token: CancellationToken,
}

impl AppController {
    pub fn new(state: Arc<AppState>, channels: ChannelSet) -> Self {
        Self {
            channels,
            state,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn spawn_tasks(&self, input: InputMode, json: bool) -> JoinSet<anyhow::Result<()>> {
        let mut tasks = JoinSet::new();
        let options = ViewOptions {
            json,
            interactive: matches!(input, InputMode::Interactive),
        };

        // Event loop
        tasks.spawn(event_loop(
            self.state.clone(),
            self.channels.ui_to_app.1.clone(),
            self.channels.app_to_ui.0.clone(),
            self.cancel_token.child_token(),
        ));

        // View loop
        tasks.spawn(ui_loop(
            self.state.clone(),
            self.channels.app_to_ui.1.clone(),
            options,
        ));

        // Input watcher
        tasks.spawn(watcher_io(
            self.state.clone(),
            input,
            self.cancel_token.child_token(),
            self.channels.ui_to_app.0.clone(),
            self.channels.app_to_ui.0.clone(),
        ));

        tasks
    }

    /// Stop input, release the engine, flush the view and wait for the tasks
    pub async fn shutdown(&self, mut tasks: JoinSet<anyhow::Result<()>>) {
        self.cancel_token.cancel();
        let timeout_ms = self.state.config.read().await.shutdown_timeout_ms;
        let limit = Duration::from_millis(timeout_ms);

        if tokio::time::timeout(limit, self.state.orchestrator.shutdown())
            .await
            .is_err()
        {
            tracing::warn!("Orchestrator did not release its engine within {timeout_ms}ms");
        }

        // Queued behind everything the orchestrator already emitted
        if tokio::time::timeout(limit, self.channels.app_to_ui.0.send(AppEvent::Shutdown))
            .await
            .is_err()
        {
            tracing::warn!("View is not draining events, shutdown notice dropped");
        }

        let drained = tokio::time::timeout(limit, async {
            while let Some(result) = tasks.join_next().await {
                log_task_exit(result);
            }
        })
        .await;

        if drained.is_err() {
            tracing::warn!("Tasks did not stop within {timeout_ms}ms, aborting");
            tasks.abort_all();
        }
    }
}

pub fn log_task_exit(result: Result<anyhow::Result<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => tracing::debug!("task exited"),
        Ok(Err(e)) => tracing::error!("task failed: {e:#}"),
        Err(e) => tracing::error!("task panicked: {e}"),
    }
}
