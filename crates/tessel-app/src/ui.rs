use std::io::{self, Write};
use std::sync::Arc;

use kanal::AsyncReceiver;
use serde::Serialize;
use tessel_config::ui::UiConfig;
use tessel_core::Progress;
use tessel_types::{AppEvent, PassId, RecognitionResult};

use crate::state::AppState;

/// How results are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    pub json: bool,
    pub interactive: bool,
}

pub async fn ui_loop(
    state: Arc<AppState>,
    app_to_ui_rx: AsyncReceiver<AppEvent>,
    options: ViewOptions,
) -> anyhow::Result<()> {
    let config = state.config.read().await.ui.clone();
    let tty = atty::is(atty::Stream::Stdout);
    let mut view = View::new(io::stdout(), io::stderr(), config, options.json, tty);

    if options.interactive {
        view.intro()?;
    }

    while let Ok(event) = app_to_ui_rx.recv().await {
        state.status.record(&event).await;
        if !view.render(&event)? {
            break;
        }
    }

    view.finish()?;
    tracing::debug!("view loop stopped");
    Ok(())
}

#[derive(Serialize)]
struct JsonResult<'a> {
    pass: u64,
    name: Option<&'a str>,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<f32>,
}

/// Terminal rendering of the orchestrator's events
pub struct View<O: Write, E: Write> {
    out: O,
    err: E,
    config: UiConfig,
    json: bool,
    tty: bool,
    pass: Option<PassId>,
    name: Option<String>,
    progress: Progress,
    /// A progress line without trailing newline is on screen
    line_open: bool,
}

impl<O: Write, E: Write> View<O, E> {
    pub fn new(out: O, err: E, config: UiConfig, json: bool, tty: bool) -> Self {
        Self {
            out,
            err,
            config,
            json,
            tty,
            pass: None,
            name: None,
            progress: Progress::ZERO,
            line_open: false,
        }
    }

    pub fn intro(&mut self) -> io::Result<()> {
        if !self.json {
            writeln!(self.out, "Select an image to view the OCR text")?;
            self.out.flush()?;
        }
        Ok(())
    }

    /// Returns false once the view should stop
    pub fn render(&mut self, event: &AppEvent) -> io::Result<bool> {
        match event {
            AppEvent::PassStarted { pass, name } => {
                self.close_line()?;
                self.pass = Some(*pass);
                self.name = name.clone();
                self.progress = Progress::ZERO;
            }
            AppEvent::Progress { pass, value } if self.is_current(*pass) => {
                if self.progress.advance(*value) && self.progress.is_partial() {
                    self.draw_progress()?;
                }
            }
            AppEvent::Completed { pass, result } if self.is_current(*pass) => {
                self.close_line()?;
                self.draw_result(*pass, result)?;
            }
            AppEvent::Failed { pass, message } if self.is_current(*pass) => {
                self.close_line()?;
                writeln!(self.err, "Recognition failed: {message}")?;
                self.err.flush()?;
            }
            AppEvent::Rejected { reason } => {
                self.close_line()?;
                writeln!(self.err, "Unsupported file: {reason}")?;
                self.err.flush()?;
            }
            AppEvent::Shutdown => return Ok(false),
            _ => {}
        }
        Ok(true)
    }

    pub fn finish(&mut self) -> io::Result<()> {
        self.close_line()?;
        self.out.flush()
    }

    fn is_current(&self, pass: PassId) -> bool {
        self.pass == Some(pass)
    }

    fn draw_progress(&mut self) -> io::Result<()> {
        if !self.config.show_progress || self.json {
            return Ok(());
        }

        let width = usize::from(self.config.progress_width);
        let filled = ((self.progress.value() * width as f32).round() as usize).min(width);
        let bar = format!("{}{}", "#".repeat(filled), "-".repeat(width - filled));
        let line = format!(
            "Processing image progress: [{bar}] {}%",
            self.progress.percent()
        );

        if self.tty {
            write!(self.out, "\r{line}")?;
            self.line_open = true;
        } else {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()
    }

    fn draw_result(&mut self, pass: PassId, result: &RecognitionResult) -> io::Result<()> {
        if self.json {
            let line = JsonResult {
                pass: pass.0,
                name: self.name.as_deref(),
                text: &result.text,
                confidence: result.confidence,
            };
            let json = serde_json::to_string(&line).map_err(io::Error::other)?;
            writeln!(self.out, "{json}")?;
            return self.out.flush();
        }

        match &self.name {
            Some(name) => writeln!(self.out, "Recognized Text ({name})")?,
            None => writeln!(self.out, "Recognized Text")?,
        }
        if result.text.trim().is_empty() {
            writeln!(self.out, "(no text found)")?;
        } else {
            writeln!(self.out, "{}", result.text)?;
        }
        if self.config.show_confidence
            && let Some(confidence) = result.confidence
        {
            writeln!(self.out, "confidence: {confidence:.1}")?;
        }
        writeln!(self.out)?;
        self.out.flush()
    }

    fn close_line(&mut self) -> io::Result<()> {
        if self.line_open {
            writeln!(self.out)?;
            self.line_open = false;
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn into_parts(self) -> (O, E) {
        (self.out, self.err)
    }
}
