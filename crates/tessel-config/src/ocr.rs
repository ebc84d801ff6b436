use std::env;

use serde::{Deserialize, Serialize};
use tessel_types::MediaType;

fn default_language() -> String {
    env::var("TESSEL_LANGUAGE").unwrap_or_else(|_| "eng".to_string())
}

fn default_strict() -> bool {
    true
}

fn default_accepted() -> Vec<MediaType> {
    vec![MediaType::Png, MediaType::Jpeg]
}

fn default_progress_status() -> String {
    "recognizing text".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct OcrConfig {
    #[serde(default = "default_language")]
    pub language: String,
    /// When false, any image format the sniffer recognizes is accepted
    #[serde(default = "default_strict")]
    pub strict_media_types: bool,
    #[serde(default = "default_accepted")]
    pub accepted_media_types: Vec<MediaType>,
    /// Engine log status whose progress is relayed to the view
    #[serde(default = "default_progress_status")]
    pub progress_status: String,
    pub tesseract: TesseractConfig,
}

impl OcrConfig {
    pub fn new() -> Self {
        Self {
            language: default_language(),
            strict_media_types: default_strict(),
            accepted_media_types: default_accepted(),
            progress_status: default_progress_status(),
            tesseract: TesseractConfig::new(),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_binary() -> String {
    env::var("TESSEL_TESSERACT").unwrap_or_else(|_| "tesseract".to_string())
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TesseractConfig {
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Passed as `--psm`
    pub page_segmentation_mode: Option<u8>,
    pub extra_args: Vec<String>,
}

impl TesseractConfig {
    pub fn new() -> Self {
        Self {
            binary: default_binary(),
            page_segmentation_mode: None,
            extra_args: Vec::new(),
        }
    }
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self::new()
    }
}
