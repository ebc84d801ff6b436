use serde::{Deserialize, Serialize};

fn default_show_progress() -> bool {
    true
}

fn default_progress_width() -> u16 {
    30
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct UiConfig {
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
    /// Width of the progress bar in terminal cells
    #[serde(default = "default_progress_width")]
    pub progress_width: u16,
    pub show_confidence: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_progress: default_show_progress(),
            progress_width: default_progress_width(),
            show_confidence: false,
        }
    }
}
