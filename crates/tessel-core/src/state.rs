use tessel_types::{PassId, RecognitionResult, Status};

use crate::Progress;

/// Everything the view needs to render the current pass
#[derive(Debug, Clone, Default)]
pub struct RecognitionState {
    pub status: Status,
    pub progress: Progress,
    pub result: Option<RecognitionResult>,
    pub error: Option<String>,
    pub pass: Option<PassId>,
    pub image_name: Option<String>,
    closed: bool,
}

impl RecognitionState {
    /// Whether updates tagged with `pass` may still land
    pub fn is_current(&self, pass: PassId) -> bool {
        !self.closed && self.pass == Some(pass)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Start a new pass, dropping the previous result, error and progress
    pub(crate) fn begin(&mut self, pass: PassId, image_name: Option<String>) {
        self.pass = Some(pass);
        self.image_name = image_name;
        self.status = Status::Setup;
        self.progress = Progress::ZERO;
        self.result = None;
        self.error = None;
    }

    /// Setup -> Working. Returns true on the transition.
    pub(crate) fn start_working(&mut self, pass: PassId) -> bool {
        if self.is_current(pass) && self.status == Status::Setup {
            self.status = Status::Working;
            true
        } else {
            false
        }
    }

    /// Returns the new value when progress moved
    pub(crate) fn advance(&mut self, pass: PassId, reported: f32) -> Option<f32> {
        if !self.is_current(pass) || !self.status.is_in_flight() {
            return None;
        }

        self.progress
            .advance(reported)
            .then(|| self.progress.value())
    }

    pub(crate) fn complete(&mut self, pass: PassId, result: RecognitionResult) -> bool {
        if !self.is_current(pass) || !self.status.is_in_flight() {
            return false;
        }

        self.result = Some(result);
        self.progress = Progress::COMPLETE;
        self.status = Status::Done;
        true
    }

    pub(crate) fn fail(&mut self, pass: PassId, message: String) -> bool {
        if !self.is_current(pass) || !self.status.is_in_flight() {
            return false;
        }

        self.error = Some(message);
        self.status = Status::Failed;
        true
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
    }
}
