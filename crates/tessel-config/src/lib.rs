use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use self::ocr::OcrConfig;
use self::ui::UiConfig;

pub mod ocr;
pub mod ui;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ocr: OcrConfig,
    pub ui: UiConfig,

    /// Capacity of the app <-> view channels
    pub event_capacity: usize,
    /// Capacity of the per-pass engine log channel
    pub progress_capacity: usize,
    pub shutdown_timeout_ms: u64,
}

impl Config {
    pub fn new() -> Self {
        let event_capacity = env::var("TESSEL_EVENT_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(256);

        let progress_capacity = env::var("TESSEL_PROGRESS_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(64);

        let shutdown_timeout_ms = env::var("TESSEL_SHUTDOWN_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000); // 5 seconds default

        Config {
            ocr: OcrConfig::new(),
            ui: UiConfig::default(),

            event_capacity,
            progress_capacity,
            shutdown_timeout_ms,
        }
    }

    /// Load a JSON config file; fields it leaves out keep their defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open config {}", path.display()))?;
        let reader = BufReader::new(file);
        let config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
