// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR text source for scanned document images. Only compiled with the `ocr`
// feature.
//
// Recognition runs in three stages (word detection, line grouping, line
// recognition) and each finished stage is reported as OCR progress.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams};
use rten::Model;
use rwax_core::events::{PipelineEvent, PipelineObserver};
use rwax_core::{AttestError, CancelToken, error::Result};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use crate::text::{TextSource, display_name};

/// Directory holding both model files. Overrides the `ocrs` download cache.
pub const MODEL_DIR_ENV: &str = "RWAX_OCR_MODELS";

const DETECTION_MODEL: &str = "text-detection.rten";
const RECOGNITION_MODEL: &str = "text-recognition.rten";

/// Where the OCR models live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrConfig {
    pub model_dir: PathBuf,
}

impl OcrConfig {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }

    /// `$RWAX_OCR_MODELS`, else the cache `ocrs-cli` downloads into.
    pub fn locate() -> Self {
        let dir = std::env::var_os(MODEL_DIR_ENV)
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("XDG_CACHE_HOME").map(|d| PathBuf::from(d).join("ocrs")))
            .or_else(|| {
                std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".cache").join("ocrs"))
            })
            .unwrap_or_else(|| PathBuf::from("ocrs"));
        Self::new(dir)
    }

    pub fn detection_model(&self) -> PathBuf {
        self.model_dir.join(DETECTION_MODEL)
    }

    pub fn recognition_model(&self) -> PathBuf {
        self.model_dir.join(RECOGNITION_MODEL)
    }

    /// Fails naming every model file that is absent.
    pub fn check(&self) -> Result<()> {
        let missing: Vec<String> = [self.detection_model(), self.recognition_model()]
            .into_iter()
            .filter(|path| !path.exists())
            .map(|path| path.display().to_string())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        Err(AttestError::OcrError(format!(
            "missing OCR model(s): {}; set {MODEL_DIR_ENV} or run `ocrs-cli` once",
            missing.join(", ")
        )))
    }
}

/// Loaded OCR models. Expensive to build; share one behind an `Arc`.
pub struct OcrEngine {
    engine: OcrsEngine,
}

impl OcrEngine {
    #[instrument(skip_all, fields(models = %config.model_dir.display()))]
    pub fn new(config: &OcrConfig) -> Result<Self> {
        config.check()?;
        let load = |path: PathBuf| {
            Model::load_file(&path).map_err(|err| {
                AttestError::OcrError(format!("cannot load {}: {err}", path.display()))
            })
        };
        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(load(config.detection_model())?),
            recognition_model: Some(load(config.recognition_model())?),
            ..Default::default()
        })
        .map_err(|err| AttestError::OcrError(format!("engine init: {err}")))?;

        info!("OCR engine ready");
        Ok(Self { engine })
    }

    /// Read all text lines of `image`, calling `progress` after each stage.
    /// Blocking.
    pub fn read(&self, image: &DynamicImage, mut progress: impl FnMut(u8)) -> Result<String> {
        let rgb = image.to_rgb8();
        let source = ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions())
            .map_err(|err| AttestError::OcrError(format!("image: {err}")))?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| AttestError::OcrError(format!("preprocess: {err}")))?;

        let words = self
            .engine
            .detect_words(&input)
            .map_err(|err| AttestError::OcrError(format!("detect: {err}")))?;
        progress(33);
        let lines = self.engine.find_text_lines(&input, &words);
        progress(66);
        let recognized = self
            .engine
            .recognize_text(&input, &lines)
            .map_err(|err| AttestError::OcrError(format!("recognize: {err}")))?;
        progress(100);

        let text = join_lines(recognized.iter().flatten().map(|line| line.to_string()));
        debug!(words = words.len(), lines = lines.len(), chars = text.len(), "OCR done");
        Ok(text)
    }
}

/// Trimmed, non-empty lines joined with newlines.
fn join_lines(lines: impl Iterator<Item = String>) -> String {
    lines
        .map(|line| line.trim().to_owned())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// A scanned image read through OCR.
pub struct OcrTextSource {
    name: String,
    image: Arc<DynamicImage>,
    engine: Arc<OcrEngine>,
    byte_len: usize,
}

impl OcrTextSource {
    pub fn open(path: impl AsRef<Path>, engine: Arc<OcrEngine>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let image = image::load_from_memory(&data)
            .map_err(|err| AttestError::OcrError(format!("cannot decode image: {err}")))?;
        Ok(Self {
            name: display_name(path),
            image: Arc::new(image),
            engine,
            byte_len: data.len(),
        })
    }
}

#[async_trait]
impl TextSource for OcrTextSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn byte_len(&self) -> usize {
        self.byte_len
    }

    async fn extract_text(
        &self,
        observer: &dyn PipelineObserver,
        cancel: &CancelToken,
    ) -> Result<String> {
        observer.on_event(&PipelineEvent::OcrScanStarted);
        observer.on_event(&PipelineEvent::OcrProgress { percent: 0 });

        let (tx, mut rx) = mpsc::unbounded_channel();
        let engine = Arc::clone(&self.engine);
        let image = Arc::clone(&self.image);
        let mut task = tokio::task::spawn_blocking(move || {
            engine.read(&image, |percent| {
                let _ = tx.send(percent);
            })
        });

        let joined = loop {
            tokio::select! {
                Some(percent) = rx.recv() => {
                    observer.on_event(&PipelineEvent::OcrProgress { percent });
                }
                joined = &mut task => break joined,
                _ = cancel.cancelled() => return Err(AttestError::Cancelled),
            }
        };
        while let Ok(percent) = rx.try_recv() {
            observer.on_event(&PipelineEvent::OcrProgress { percent });
        }
        let text = joined.map_err(|err| AttestError::OcrError(format!("OCR task failed: {err}")))??;

        observer.on_event(&PipelineEvent::OcrScanComplete {
            text_length: text.len(),
        });
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_paths_share_one_dir() {
        let config = OcrConfig::new("/opt/models");
        assert_eq!(config.detection_model(), PathBuf::from("/opt/models/text-detection.rten"));
        assert_eq!(config.recognition_model(), PathBuf::from("/opt/models/text-recognition.rten"));
    }

    #[test]
    fn check_names_every_missing_model() {
        let err = OcrConfig::new("/nonexistent/rwax-models").check().unwrap_err();
        let AttestError::OcrError(message) = err else {
            panic!("expected an OCR error");
        };
        assert!(message.contains("text-detection.rten"));
        assert!(message.contains("text-recognition.rten"));
        assert!(message.contains(MODEL_DIR_ENV));
    }

    #[test]
    fn blank_lines_are_dropped() {
        let lines = ["  NRIC S1234567A ", "", "   ", "Name: Jane Tan"].map(String::from);
        assert_eq!(join_lines(lines.into_iter()), "NRIC S1234567A\nName: Jane Tan");
    }
}
