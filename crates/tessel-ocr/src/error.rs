#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("Image is empty")]
    EmptyImage,

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Unrecognized image format")]
    Unrecognized,

    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Language not available: {0}")]
    LanguageUnavailable(String),

    #[error("Engine not initialized")]
    NotInitialized,

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OcrError {
    /// Errors raised while validating input, before any engine is involved
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            OcrError::EmptyImage | OcrError::UnsupportedMediaType(_) | OcrError::Unrecognized
        )
    }
}
