mod engine;
mod error;
mod media;
mod tesseract;

pub use engine::{EngineFactory, EngineLogger, OcrEngine};
pub use error::OcrError;
pub use media::{MediaPolicy, detect_media_type};
pub use tesseract::{TesseractEngine, TesseractFactory};
