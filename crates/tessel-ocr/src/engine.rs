use async_trait::async_trait;
use kanal::{AsyncReceiver, AsyncSender};
use tessel_types::{EngineLog, RecognitionResult, SelectedImage};

use crate::OcrError;

/// Lifecycle of one OCR engine instance.
///
/// An instance serves a single pass: `load`, `load_language`, `initialize`,
/// `recognize`, then `terminate`. `terminate` may be called at any point,
/// including after a failed step, and more than once.
#[async_trait]
pub trait OcrEngine: Send {
    /// Engine identifier (e.g. "tesseract")
    fn name(&self) -> &'static str;

    async fn load(&mut self) -> Result<(), OcrError>;

    async fn load_language(&mut self, language: &str) -> Result<(), OcrError>;

    async fn initialize(&mut self, language: &str) -> Result<(), OcrError>;

    async fn recognize(&mut self, image: &SelectedImage) -> Result<RecognitionResult, OcrError>;

    /// Release everything the engine holds
    async fn terminate(&mut self) -> Result<(), OcrError>;
}

/// Creates one engine per pass, wired to that pass's logger
pub trait EngineFactory: Send + Sync {
    fn create(&self, logger: EngineLogger) -> Box<dyn OcrEngine>;
}

/// Sending half of a pass's progress channel.
///
/// There is exactly one subscriber per pass. Once it is gone, logging is a no-op.
#[derive(Clone)]
pub struct EngineLogger {
    tx: AsyncSender<EngineLog>,
}

impl EngineLogger {
    pub fn new(tx: AsyncSender<EngineLog>) -> Self {
        Self { tx }
    }

    pub fn channel(capacity: usize) -> (Self, AsyncReceiver<EngineLog>) {
        let (tx, rx) = kanal::bounded_async(capacity);
        (Self::new(tx), rx)
    }

    pub async fn log(&self, status: &str, progress: f32) {
        if self.tx.send(EngineLog::new(status, progress)).await.is_err() {
            tracing::trace!(status, progress, "engine log dropped, subscriber closed");
        }
    }
}
