use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use kanal::{AsyncReceiver, AsyncSender};
use tessel_config::Config;
use tessel_ocr::{EngineFactory, EngineLogger, MediaPolicy, OcrEngine, OcrError};
use tessel_types::{AppEvent, EngineLog, PassId, RecognitionResult, SelectedImage, Status};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{OrchestratorError, Progress, RecognitionState};

/// Bridges image selection to an OCR engine and relays its progress and result.
///
/// At most one pass is in flight. Submitting a new image cancels the previous
/// pass and waits for it to release its engine before the new one starts.
pub struct Orchestrator {
    factory: Arc<dyn EngineFactory>,
    policy: MediaPolicy,
    language: String,
    progress_status: String,
    progress_capacity: usize,
    state: Arc<RwLock<RecognitionState>>,
    events: AsyncSender<AppEvent>,
    next_pass: AtomicU64,
    current: Mutex<Option<PassHandle>>,
    shutdown: CancellationToken,
}

struct PassHandle {
    id: PassId,
    cancel: CancellationToken,
    finished: CancellationToken,
    task: JoinHandle<()>,
}

impl Orchestrator {
    pub fn new(
        factory: Arc<dyn EngineFactory>,
        config: &Config,
        events: AsyncSender<AppEvent>,
    ) -> Self {
        Self {
            factory,
            policy: MediaPolicy::from_config(&config.ocr),
            language: config.ocr.language.clone(),
            progress_status: config.ocr.progress_status.clone(),
            progress_capacity: config.progress_capacity.max(1),
            state: Arc::new(RwLock::new(RecognitionState::default())),
            events,
            next_pass: AtomicU64::new(0),
            current: Mutex::new(None),
            shutdown: CancellationToken::new(),
        }
    }

    pub async fn snapshot(&self) -> RecognitionState {
        self.state.read().await.clone()
    }

    pub async fn current_pass(&self) -> Option<PassId> {
        self.current.lock().await.as_ref().map(|handle| handle.id)
    }

    /// Validate `image` and start a pass for it.
    ///
    /// Rejected images leave the current state untouched and emit
    /// [`AppEvent::Rejected`].
    pub async fn submit(&self, image: SelectedImage) -> Result<PassId, OrchestratorError> {
        if self.shutdown.is_cancelled() {
            return Err(OrchestratorError::Closed);
        }

        if let Err(e) = self.policy.validate(&image) {
            tracing::warn!(image = ?image.name, media_type = %image.media_type, "rejected: {e}");
            self.emit(AppEvent::Rejected {
                reason: e.to_string(),
            })
            .await;
            return Err(OrchestratorError::Rejected(e));
        }

        let mut current = self.current.lock().await;
        if self.shutdown.is_cancelled() {
            return Err(OrchestratorError::Closed);
        }

        if let Some(previous) = current.take() {
            tracing::info!(pass = %previous.id, "superseding pass");
            release(previous).await;
        }

        let pass = PassId(self.next_pass.fetch_add(1, Ordering::SeqCst) + 1);
        self.state.write().await.begin(pass, image.name.clone());

        tracing::info!(
            %pass,
            image = ?image.name,
            media_type = %image.media_type,
            bytes = image.bytes.len(),
            "starting pass"
        );
        self.emit(AppEvent::PassStarted {
            pass,
            name: image.name.clone(),
        })
        .await;
        self.emit(AppEvent::StatusChanged {
            pass,
            status: Status::Setup,
        })
        .await;

        let cancel = self.shutdown.child_token();
        let finished = CancellationToken::new();
        let ctx = PassContext {
            pass,
            language: self.language.clone(),
            progress_status: self.progress_status.clone(),
            state: self.state.clone(),
            events: self.events.clone(),
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(run_pass(
            ctx,
            self.factory.clone(),
            self.progress_capacity,
            image,
            finished.clone(),
        ));

        *current = Some(PassHandle {
            id: pass,
            cancel,
            finished,
            task,
        });

        Ok(pass)
    }

    /// Wait for the in-flight pass, if any, to finish on its own
    pub async fn settle(&self) {
        let finished = {
            let current = self.current.lock().await;
            current.as_ref().map(|handle| handle.finished.clone())
        };

        if let Some(finished) = finished {
            finished.cancelled().await;
        }
    }

    /// Cancel the in-flight pass, release its engine and stop accepting work.
    ///
    /// Nothing is written to the state and no event is emitted once this returns.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        let previous = self.current.lock().await.take();
        if let Some(previous) = previous {
            tracing::info!(pass = %previous.id, "cancelling pass for shutdown");
            release(previous).await;
        }

        self.state.write().await.close();
        tracing::info!("orchestrator shut down");
    }

    /// Send to the view unless shutdown starts first; a full channel must
    /// not keep `shutdown` waiting on the `current` lock.
    async fn emit(&self, event: AppEvent) {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                tracing::debug!("shutting down, dropping event");
            }
            sent = self.events.send(event) => {
                if sent.is_err() {
                    tracing::debug!("event receiver closed, dropping event");
                }
            }
        }
    }
}

/// Cancel a pass and wait until its engine is released
async fn release(handle: PassHandle) {
    handle.cancel.cancel();
    if let Err(e) = handle.task.await {
        tracing::error!(pass = %handle.id, "pass task failed: {e}");
    }
}

/// What a running pass needs to commit its updates
#[derive(Clone)]
struct PassContext {
    pass: PassId,
    language: String,
    progress_status: String,
    state: Arc<RwLock<RecognitionState>>,
    events: AsyncSender<AppEvent>,
    cancel: CancellationToken,
}

impl PassContext {
    async fn on_progress(&self, log: EngineLog) {
        if log.status != self.progress_status {
            tracing::trace!(pass = %self.pass, status = %log.status, progress = log.progress, "engine log");
            return;
        }

        let (became_working, value) = {
            let mut state = self.state.write().await;
            if self.cancel.is_cancelled() {
                return;
            }
            let became_working = state.start_working(self.pass);
            (became_working, state.advance(self.pass, log.progress))
        };

        if became_working {
            self.emit_status(Status::Working).await;
        }
        if let Some(value) = value {
            tracing::debug!(pass = %self.pass, value, "progress");
            self.emit(AppEvent::Progress {
                pass: self.pass,
                value,
            })
            .await;
        }
    }

    async fn mark_working(&self) {
        let became_working = {
            let mut state = self.state.write().await;
            !self.cancel.is_cancelled() && state.start_working(self.pass)
        };

        if became_working {
            self.emit_status(Status::Working).await;
        }
    }

    async fn on_complete(&self, result: RecognitionResult) {
        let (committed, jumped) = {
            let mut state = self.state.write().await;
            let jumped = state.progress != Progress::COMPLETE;
            let committed =
                !self.cancel.is_cancelled() && state.complete(self.pass, result.clone());
            (committed, jumped)
        };

        if !committed {
            tracing::debug!(pass = %self.pass, "discarding result of stale pass");
            return;
        }

        tracing::info!(pass = %self.pass, chars = result.text.len(), "pass done");
        if jumped {
            self.emit(AppEvent::Progress {
                pass: self.pass,
                value: 1.0,
            })
            .await;
        }
        self.emit_status(Status::Done).await;
        self.emit(AppEvent::Completed {
            pass: self.pass,
            result,
        })
        .await;
    }

    async fn on_failure(&self, error: OcrError) {
        let message = error.to_string();
        let committed = {
            let mut state = self.state.write().await;
            !self.cancel.is_cancelled() && state.fail(self.pass, message.clone())
        };

        if !committed {
            tracing::debug!(pass = %self.pass, "discarding failure of stale pass: {message}");
            return;
        }

        tracing::error!(pass = %self.pass, "pass failed: {message}");
        self.emit_status(Status::Failed).await;
        self.emit(AppEvent::Failed {
            pass: self.pass,
            message,
        })
        .await;
    }

    async fn emit_status(&self, status: Status) {
        self.emit(AppEvent::StatusChanged {
            pass: self.pass,
            status,
        })
        .await;
    }

    /// Send to the view unless the pass is cancelled first
    async fn emit(&self, event: AppEvent) {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::debug!(pass = %self.pass, "pass cancelled, dropping event");
            }
            sent = self.events.send(event) => {
                if sent.is_err() {
                    tracing::debug!(pass = %self.pass, "event receiver closed, dropping event");
                }
            }
        }
    }
}

/// One pass: create the engine, drive it until done or cancelled, then release it
async fn run_pass(
    ctx: PassContext,
    factory: Arc<dyn EngineFactory>,
    progress_capacity: usize,
    image: SelectedImage,
    finished: CancellationToken,
) {
    let _finished = finished.drop_guard();

    let (logger, logs) = EngineLogger::channel(progress_capacity);
    let mut engine = factory.create(logger);
    let forwarder = tokio::spawn(forward_progress(ctx.clone(), logs));

    let outcome = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => None,
        result = drive(engine.as_mut(), &ctx, &image) => Some(result),
    };

    if let Err(e) = engine.terminate().await {
        tracing::warn!(pass = %ctx.pass, engine = engine.name(), "engine terminate failed: {e}");
    }
    tracing::debug!(pass = %ctx.pass, engine = engine.name(), "engine released");
    // Last sender of the log channel goes with the engine
    drop(engine);

    if let Err(e) = forwarder.await {
        tracing::error!(pass = %ctx.pass, "progress forwarder failed: {e}");
    }

    match outcome {
        None => tracing::info!(pass = %ctx.pass, "pass cancelled"),
        Some(Ok(result)) => ctx.on_complete(result).await,
        Some(Err(e)) => ctx.on_failure(e).await,
    }
}

async fn drive(
    engine: &mut dyn OcrEngine,
    ctx: &PassContext,
    image: &SelectedImage,
) -> Result<RecognitionResult, OcrError> {
    engine.load().await?;
    engine.load_language(&ctx.language).await?;
    engine.initialize(&ctx.language).await?;

    ctx.mark_working().await;
    engine.recognize(image).await
}

/// Single subscriber of a pass's engine logs
async fn forward_progress(ctx: PassContext, logs: AsyncReceiver<EngineLog>) {
    loop {
        tokio::select! {
            biased;
            log = logs.recv() => match log {
                Ok(log) => ctx.on_progress(log).await,
                Err(_) => break,
            },
            _ = ctx.cancel.cancelled() => break,
        }
    }
}
