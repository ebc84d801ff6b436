use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use kanal::{AsyncReceiver, AsyncSender};
use tessel_config::Config;
use tessel_ocr::{EngineFactory, EngineLogger, OcrEngine, OcrError};
use tessel_types::{AppEvent, RecognitionResult, SelectedImage};

use crate::state::AppState;


const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01";

/// Engine that reports 0 -> 0.5 -> 1 and answers with a numbered text
struct CountingEngine {
    logger: EngineLogger,
    index: usize,
}

#[async_trait]
impl OcrEngine for CountingEngine {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn load(&mut self) -> Result<(), OcrError> {
        self.logger.log("loading tesseract core", 1.0).await;
        Ok(())
    }

    async fn load_language(&mut self, _language: &str) -> Result<(), OcrError> {
        Ok(())
    }

    async fn initialize(&mut self, _language: &str) -> Result<(), OcrError> {
        Ok(())
    }

    async fn recognize(&mut self, _image: &SelectedImage) -> Result<RecognitionResult, OcrError> {
        for progress in [0.0, 0.5, 1.0] {
            self.logger.log("recognizing text", progress).await;
        }
        Ok(RecognitionResult::new(format!("TEXT {}", self.index)))
    }

    async fn terminate(&mut self) -> Result<(), OcrError> {
        Ok(())
    }
}

#[derive(Default)]
struct CountingFactory {
    created: AtomicUsize,
}

impl EngineFactory for CountingFactory {
    fn create(&self, logger: EngineLogger) -> Box<dyn OcrEngine> {
        let index = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        Box::new(CountingEngine { logger, index })
    }
}

fn app_state() -> (Arc<AppState>, AsyncSender<AppEvent>, AsyncReceiver<AppEvent>) {
    let (tx, rx) = kanal::unbounded_async();
    let state = AppState::new(
        Config::new(),
        Arc::new(CountingFactory::default()),
        tx.clone(),
    );
    (Arc::new(state), tx, rx)
}

/// Write `bytes` to a fresh file in the temp dir
fn temp_file(name: &str, bytes: &[u8]) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let dir = std::env::temp_dir().join(format!(
        "tessel-app-{}-{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::SeqCst)
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn drain(rx: &AsyncReceiver<AppEvent>) -> Vec<AppEvent> {
    let mut events = Vec::new();
    while let Ok(Some(event)) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn completed_texts(events: &[AppEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            AppEvent::Completed { result, .. } => Some(result.text.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn log_level_is_quiet_unless_verbose() {
    assert_eq!(crate::default_log_level(false), "warn");
    assert_eq!(crate::default_log_level(true), "debug");
}
