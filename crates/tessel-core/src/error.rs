use tessel_ocr::OcrError;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("Image rejected: {0}")]
    Rejected(#[from] OcrError),

    #[error("Orchestrator is shut down")]
    Closed,
}
