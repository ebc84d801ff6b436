use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub enum AppEvent {
    /// User picked a file, either on the command line or at the prompt
    SelectImage(PathBuf),
    PassStarted {
        pass: PassId,
        name: Option<String>,
    },
    StatusChanged {
        pass: PassId,
        status: Status,
    },
    Progress {
        pass: PassId,
        value: f32,
    },
    Completed {
        pass: PassId,
        result: RecognitionResult,
    },
    Failed {
        pass: PassId,
        message: String,
    },
    /// Input refused before submission; nothing about the current pass changed
    Rejected {
        reason: String,
    },
    Shutdown,
}

/// Sequence number tagging each submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PassId(pub u64);

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Idle,
    Setup,
    Working,
    Done,
    Failed,
}

impl Status {
    /// Whether a pass in this status still expects engine output
    pub fn is_in_flight(self) -> bool {
        matches!(self, Status::Setup | Status::Working)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Done | Status::Failed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Idle => "idle",
            Status::Setup => "setup",
            Status::Working => "working",
            Status::Done => "done",
            Status::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Declared media type of a selected image.
///
/// Serialized as its mime string so config files can list `"image/png"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MediaType {
    Png,
    Jpeg,
    Other(String),
}

impl MediaType {
    pub fn mime(&self) -> &str {
        match self {
            MediaType::Png => "image/png",
            MediaType::Jpeg => "image/jpeg",
            MediaType::Other(mime) => mime,
        }
    }
}

impl From<String> for MediaType {
    fn from(value: String) -> Self {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "image/png" | "png" => MediaType::Png,
            "image/jpeg" | "image/jpg" | "jpeg" | "jpg" => MediaType::Jpeg,
            _ => MediaType::Other(normalized),
        }
    }
}

impl From<MediaType> for String {
    fn from(value: MediaType) -> Self {
        value.mime().to_string()
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Image content held for the duration of one pass
#[derive(Debug, Clone)]
pub struct SelectedImage {
    pub bytes: Arc<[u8]>,
    pub media_type: MediaType,
    pub name: Option<String>,
}

impl SelectedImage {
    pub fn new(bytes: impl Into<Arc<[u8]>>, media_type: MediaType) -> Self {
        Self {
            bytes: bytes.into(),
            media_type,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl RecognitionResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: None,
        }
    }
}

/// One push event from an engine's logger
#[derive(Debug, Clone, PartialEq)]
pub struct EngineLog {
    pub status: String,
    pub progress: f32,
}

impl EngineLog {
    pub fn new(status: impl Into<String>, progress: f32) -> Self {
        Self {
            status: status.into(),
            progress,
        }
    }
}
