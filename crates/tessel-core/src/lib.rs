pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod state;

pub use error::OrchestratorError;
pub use orchestrator::Orchestrator;
pub use progress::Progress;
pub use state::RecognitionState;

#[cfg(test)]
mod tests;
