use std::sync::Arc;

use kanal::AsyncSender;
use tessel_config::Config;
use tessel_core::Orchestrator;
use tessel_ocr::{EngineFactory, TesseractFactory};
use tessel_types::AppEvent;
use tokio::sync::RwLock;

use crate::status::AppStatus;

pub struct AppState {
    pub config: Arc<RwLock<Config>>,
    pub orchestrator: Orchestrator,
    pub status: AppStatus,
}

impl AppState {
    pub fn new(
        config: Config,
        factory: Arc<dyn EngineFactory>,
        app_to_ui_tx: AsyncSender<AppEvent>,
    ) -> Self {
        let orchestrator = Orchestrator::new(factory, &config, app_to_ui_tx);

        Self {
            config: Arc::new(RwLock::new(config)),
            orchestrator,
            status: AppStatus::new(),
        }
    }

    /// State backed by the `tesseract` binary named in the config
    pub fn with_tesseract(config: Config, app_to_ui_tx: AsyncSender<AppEvent>) -> Self {
        let factory = Arc::new(TesseractFactory::new(config.ocr.tesseract.clone()));
        Self::new(config, factory, app_to_ui_tx)
    }
}
