use std::sync::Arc;
use std::time::SystemTime;

use tessel_types::AppEvent;
use tokio::sync::RwLock;

/// OCR status information
#[derive(Clone, Debug, Default)]
pub struct OcrStatus {
    pub passes: u64,
    pub completed: u64,
    pub failed: u64,
    pub rejected: u64,
    pub last_completion_time: Option<SystemTime>,
    pub current_message: String,
}

impl OcrStatus {
    /// Images that did not produce a result
    pub fn unsuccessful(&self) -> u64 {
        self.failed + self.rejected
    }
}

/// Application status
pub struct AppStatus {
    pub ocr: Arc<RwLock<OcrStatus>>,
}

impl AppStatus {
    pub fn new() -> Self {
        Self {
            ocr: Arc::new(RwLock::new(OcrStatus::default())),
        }
    }

    pub async fn record(&self, event: &AppEvent) {
        let mut ocr = self.ocr.write().await;
        match event {
            AppEvent::PassStarted { pass, name } => {
                ocr.passes += 1;
                ocr.current_message = match name {
                    Some(name) => format!("Pass {pass}: {name}"),
                    None => format!("Pass {pass}"),
                };
            }
            AppEvent::StatusChanged { pass, status } => {
                ocr.current_message = format!("Pass {pass}: {status}");
            }
            AppEvent::Completed { pass, .. } => {
                ocr.completed += 1;
                ocr.last_completion_time = Some(SystemTime::now());
                ocr.current_message = format!("Pass {pass}: done");
            }
            AppEvent::Failed { pass, message } => {
                ocr.failed += 1;
                ocr.current_message = format!("Pass {pass} failed: {message}");
            }
            AppEvent::Rejected { reason } => {
                ocr.rejected += 1;
                ocr.current_message = reason.clone();
            }
            _ => {}
        }
    }

    pub async fn snapshot(&self) -> OcrStatus {
        self.ocr.read().await.clone()
    }
}

impl Default for AppStatus {
    fn default() -> Self {
        Self::new()
    }
}
