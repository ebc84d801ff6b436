//! Orchestrator behaviour against scripted engines

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use kanal::AsyncReceiver;
use tessel_config::Config;
use tessel_ocr::{EngineFactory, EngineLogger, OcrEngine, OcrError};
use tessel_types::{AppEvent, MediaType, PassId, RecognitionResult, SelectedImage, Status};
use tokio::sync::Notify;
use tokio::time::timeout;

use crate::{Orchestrator, OrchestratorError, Progress};


const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01";
const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];
const GIF: &[u8] = b"GIF89a\x01\x00\x01\x00";

fn png(name: &str) -> SelectedImage {
    SelectedImage::new(PNG, MediaType::Png).with_name(name)
}

fn jpeg(name: &str) -> SelectedImage {
    SelectedImage::new(JPEG, MediaType::Jpeg).with_name(name)
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Stage {
    Load,
    Recognize,
}

/// What one engine instance does when driven
#[derive(Clone, Default)]
struct Script {
    logs: Vec<(&'static str, f32)>,
    text: &'static str,
    fail_at: Option<Stage>,
    /// Block inside recognize until notified
    gate: Option<Arc<Notify>>,
}

impl Script {
    fn text(text: &'static str) -> Self {
        Self {
            text,
            ..Default::default()
        }
    }

    fn logs(mut self, logs: &[(&'static str, f32)]) -> Self {
        self.logs = logs.to_vec();
        self
    }

    fn fail_at(mut self, stage: Stage) -> Self {
        self.fail_at = Some(stage);
        self
    }

    fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

struct ScriptedEngine {
    script: Script,
    logger: EngineLogger,
    terminated: Arc<AtomicUsize>,
    released: bool,
}

#[async_trait]
impl OcrEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn load(&mut self) -> Result<(), OcrError> {
        if self.script.fail_at == Some(Stage::Load) {
            return Err(OcrError::EngineUnavailable("scripted load failure".into()));
        }
        Ok(())
    }

    async fn load_language(&mut self, _language: &str) -> Result<(), OcrError> {
        Ok(())
    }

    async fn initialize(&mut self, _language: &str) -> Result<(), OcrError> {
        Ok(())
    }

    async fn recognize(&mut self, _image: &SelectedImage) -> Result<RecognitionResult, OcrError> {
        for (status, progress) in &self.script.logs {
            self.logger.log(status, *progress).await;
        }

        if let Some(gate) = &self.script.gate {
            gate.notified().await;
        }

        if self.script.fail_at == Some(Stage::Recognize) {
            return Err(OcrError::Engine("boom".into()));
        }

        Ok(RecognitionResult::new(self.script.text))
    }

    async fn terminate(&mut self) -> Result<(), OcrError> {
        if !self.released {
            self.released = true;
            self.terminated.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Hands out one script per created engine, in order
#[derive(Default)]
struct ScriptedFactory {
    scripts: Mutex<VecDeque<Script>>,
    created: AtomicUsize,
    terminated: Arc<AtomicUsize>,
}

impl ScriptedFactory {
    fn new(scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            ..Default::default()
        })
    }

    fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    fn terminated(&self) -> usize {
        self.terminated.load(Ordering::SeqCst)
    }
}

impl EngineFactory for ScriptedFactory {
    fn create(&self, logger: EngineLogger) -> Box<dyn OcrEngine> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();

        Box::new(ScriptedEngine {
            script,
            logger,
            terminated: self.terminated.clone(),
            released: false,
        })
    }
}

fn orchestrator(factory: Arc<ScriptedFactory>) -> (Orchestrator, AsyncReceiver<AppEvent>) {
    let (tx, rx) = kanal::unbounded_async();
    let orchestrator = Orchestrator::new(factory, &Config::new(), tx);
    (orchestrator, rx)
}

/// Like [`orchestrator`], but the view holds at most `capacity` undrained events
fn orchestrator_with_capacity(
    factory: Arc<ScriptedFactory>,
    capacity: usize,
) -> (Orchestrator, AsyncReceiver<AppEvent>) {
    let (tx, rx) = kanal::bounded_async(capacity);
    let orchestrator = Orchestrator::new(factory, &Config::new(), tx);
    (orchestrator, rx)
}

/// Poll the snapshot until the current pass reaches `status`
async fn wait_for_status(orchestrator: &Orchestrator, status: Status) {
    timeout(Duration::from_secs(2), async {
        loop {
            if orchestrator.snapshot().await.status == status {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("status never reached");
}

fn drain(rx: &AsyncReceiver<AppEvent>) -> Vec<AppEvent> {
    let mut events = Vec::new();
    while let Ok(Some(event)) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn progress_values(events: &[AppEvent], pass: PassId) -> Vec<f32> {
    events
        .iter()
        .filter_map(|event| match event {
            AppEvent::Progress { pass: p, value } if *p == pass => Some(*value),
            _ => None,
        })
        .collect()
}
