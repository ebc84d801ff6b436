use std::io::ErrorKind;
use std::process::Stdio;

use async_trait::async_trait;
use tessel_config::ocr::TesseractConfig;
use tessel_types::{RecognitionResult, SelectedImage};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};

use crate::{EngineFactory, EngineLogger, OcrEngine, OcrError};

const STATUS_LOADING_CORE: &str = "loading tesseract core";
const STATUS_LOADING_LANGUAGE: &str = "loading language traineddata";
const STATUS_INITIALIZING: &str = "initializing api";
const STATUS_RECOGNIZING: &str = "recognizing text";

/// Drives the `tesseract` command line program
pub struct TesseractEngine {
    config: TesseractConfig,
    logger: EngineLogger,
    loaded: bool,
    language: Option<String>,
    child: Option<Child>,
}

impl TesseractEngine {
    pub fn new(config: TesseractConfig, logger: EngineLogger) -> Self {
        Self {
            config,
            logger,
            loaded: false,
            language: None,
            child: None,
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.config.binary);
        command.kill_on_drop(true);
        command
    }

    /// Run a short informational invocation and return stdout + stderr
    async fn query(&self, arg: &str) -> Result<String, OcrError> {
        let output = self.command().arg(arg).output().await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                OcrError::EngineUnavailable(format!("{} not found", self.config.binary))
            } else {
                OcrError::Io(e)
            }
        })?;

        if !output.status.success() {
            return Err(OcrError::EngineUnavailable(format!(
                "{} {arg} exited with {}",
                self.config.binary, output.status
            )));
        }

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        // Older builds print the language list to stderr
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(text)
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    async fn load(&mut self) -> Result<(), OcrError> {
        self.logger.log(STATUS_LOADING_CORE, 0.0).await;
        let version = self.query("--version").await?;
        tracing::debug!(
            version = version.lines().next().unwrap_or_default(),
            "tesseract loaded"
        );
        self.loaded = true;
        self.logger.log(STATUS_LOADING_CORE, 1.0).await;
        Ok(())
    }

    async fn load_language(&mut self, language: &str) -> Result<(), OcrError> {
        if !self.loaded {
            return Err(OcrError::NotInitialized);
        }

        self.logger.log(STATUS_LOADING_LANGUAGE, 0.0).await;
        let listing = self.query("--list-langs").await?;
        let available: Vec<&str> = listing.lines().map(str::trim).collect();

        // "eng+deu" asks for several traineddata files at once
        for wanted in language.split('+') {
            if !available.contains(&wanted) {
                return Err(OcrError::LanguageUnavailable(wanted.to_string()));
            }
        }

        self.logger.log(STATUS_LOADING_LANGUAGE, 1.0).await;
        Ok(())
    }

    async fn initialize(&mut self, language: &str) -> Result<(), OcrError> {
        if !self.loaded {
            return Err(OcrError::NotInitialized);
        }

        self.logger.log(STATUS_INITIALIZING, 0.0).await;
        self.language = Some(language.to_string());
        self.logger.log(STATUS_INITIALIZING, 1.0).await;
        Ok(())
    }

    async fn recognize(&mut self, image: &SelectedImage) -> Result<RecognitionResult, OcrError> {
        let language = self.language.clone().ok_or(OcrError::NotInitialized)?;

        let mut command = self.command();
        command.args(["stdin", "stdout", "-l", language.as_str()]);
        if let Some(psm) = self.config.page_segmentation_mode {
            command.arg("--psm").arg(psm.to_string());
        }
        command
            .args(&self.config.extra_args)
            // Word boxes with confidences; the text is rebuilt from them
            .arg("tsv")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        self.logger.log(STATUS_RECOGNIZING, 0.0).await;
        let mut child = command.spawn()?;
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        // Parked on self so terminate() can kill it if this future is dropped
        let child = self.child.insert(child);

        let written = match stdin {
            Some(mut stdin) => {
                let result = stdin.write_all(&image.bytes).await;
                drop(stdin);
                result
            }
            None => Ok(()),
        };
        self.logger.log(STATUS_RECOGNIZING, 0.5).await;

        let read_out = async move {
            let mut buf = Vec::new();
            if let Some(mut s) = stdout {
                s.read_to_end(&mut buf).await?;
            }
            Ok::<_, std::io::Error>(buf)
        };
        let read_err = async move {
            let mut buf = Vec::new();
            if let Some(mut s) = stderr {
                s.read_to_end(&mut buf).await?;
            }
            Ok::<_, std::io::Error>(buf)
        };
        let (out, err) = tokio::join!(read_out, read_err);
        let status = child.wait().await?;
        self.child = None;

        if !status.success() {
            let err = err.unwrap_or_default();
            let message = String::from_utf8_lossy(&err).trim().to_string();
            return Err(OcrError::Engine(if message.is_empty() {
                format!("tesseract exited with {status}")
            } else {
                message
            }));
        }
        written?;
        let out = out?;

        self.logger.log(STATUS_RECOGNIZING, 1.0).await;

        let result = parse_tsv(&String::from_utf8_lossy(&out));
        tracing::debug!(
            chars = result.text.len(),
            confidence = ?result.confidence,
            "tesseract finished"
        );
        Ok(result)
    }

    async fn terminate(&mut self) -> Result<(), OcrError> {
        self.language = None;
        self.loaded = false;

        if let Some(mut child) = self.child.take() {
            tracing::debug!("killing running tesseract process");
            match child.kill().await {
                Ok(()) => {}
                // Already exited
                Err(e) if e.kind() == ErrorKind::InvalidInput => {}
                Err(e) => return Err(OcrError::Io(e)),
            }
        }

        Ok(())
    }
}

/// Rebuild the page text from `tsv` word rows and average their confidence.
///
/// Words on one line are joined by a space, lines by a newline and
/// paragraphs or blocks by a blank line. Rows with a negative confidence
/// (layout rows, empty words) do not count towards the mean.
fn parse_tsv(tsv: &str) -> RecognitionResult {
    const WORD_LEVEL: &str = "5";

    let mut text = String::new();
    let mut last_line: Option<(&str, &str, &str)> = None;
    let mut confidence_sum = 0.0f32;
    let mut scored = 0u32;

    for row in tsv.lines() {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 || fields[0] != WORD_LEVEL {
            continue;
        }

        let word = fields[11].trim();
        if word.is_empty() {
            continue;
        }

        // block, paragraph, line
        let line = (fields[2], fields[3], fields[4]);
        match last_line {
            None => {}
            Some((block, par, _)) if (block, par) != (line.0, line.1) => text.push_str("\n\n"),
            Some(previous) if previous != line => text.push('\n'),
            Some(_) => text.push(' '),
        }
        text.push_str(word);
        last_line = Some(line);

        if let Ok(confidence) = fields[10].trim().parse::<f32>()
            && confidence >= 0.0
        {
            confidence_sum += confidence;
            scored += 1;
        }
    }

    RecognitionResult {
        text,
        confidence: (scored > 0).then(|| confidence_sum / scored as f32),
    }
}

/// Builds a fresh [`TesseractEngine`] for every pass
#[derive(Clone)]
pub struct TesseractFactory {
    config: TesseractConfig,
}

impl TesseractFactory {
    pub fn new(config: TesseractConfig) -> Self {
        Self { config }
    }
}

impl EngineFactory for TesseractFactory {
    fn create(&self, logger: EngineLogger) -> Box<dyn OcrEngine> {
        Box::new(TesseractEngine::new(self.config.clone(), logger))
    }
}
