// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Observer port for pipeline progress.
//
// The pipeline never writes to global log or UI state. Callers inject a
// `PipelineObserver`; the same event stream drives terminal logging, test
// assertions and live progress in a front end.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::classify::ClassifiedError;
use crate::types::{AttemptId, DocumentCategory, SubmissionStatus};

/// Something observable happened inside the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    DocumentReceived { name: String, bytes: usize },
    PdfExtractionStarted { pages: usize },
    PdfPageProcessed { page: usize, total_pages: usize },
    PdfExtractionComplete { pages: usize, text_length: usize },
    OcrScanStarted,
    /// Advisory only; percent in `0..=100`.
    OcrProgress { percent: u8 },
    OcrScanComplete { text_length: usize },
    DocumentParsingStarted { rules: usize },
    DocumentClassified {
        category: DocumentCategory,
        is_valid: bool,
        content_hash: String,
    },
    CredentialCheck { holder: String, present: bool },
    StatusChanged {
        attempt: AttemptId,
        from: SubmissionStatus,
        to: SubmissionStatus,
    },
    PollTick { attempt: u32, max_attempts: u32, confirmed: bool },
    PollError { attempt: u32, message: String },
    CredentialConfirmed { holder: String, tx_hash: String },
    VerificationError { error: ClassifiedError },
}

/// Receives pipeline events. Implementations must not block.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl PipelineObserver for NullObserver {
    fn on_event(&self, _event: &PipelineEvent) {}
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::PdfPageProcessed { page, total_pages } => {
                debug!(page, total_pages, "processing page");
            }
            PipelineEvent::OcrProgress { percent } => debug!(percent, "OCR progress"),
            PipelineEvent::PollTick {
                attempt,
                max_attempts,
                confirmed,
            } => debug!(attempt, max_attempts, confirmed, "status check"),
            PipelineEvent::PollError { attempt, message } => {
                warn!(attempt, error = %message, "status check failed");
            }
            PipelineEvent::VerificationError { error } => {
                warn!(kind = ?error.kind, error = %error, "verification error");
            }
            PipelineEvent::StatusChanged { attempt, from, to } => {
                info!(%attempt, ?from, ?to, "submission state changed");
            }
            PipelineEvent::DocumentClassified {
                category,
                is_valid,
                content_hash,
            } => info!(%category, is_valid, %content_hash, "document classified"),
            PipelineEvent::CredentialConfirmed { holder, tx_hash } => {
                info!(%holder, %tx_hash, "credential confirmed on ledger");
            }
            other => info!(event = ?other, "pipeline event"),
        }
    }
}

/// Keeps every event in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .map(|e| e.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Number of recorded events matching `pred`.
    pub fn count(&self, pred: impl Fn(&PipelineEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        events.push(event.clone());
    }
}

/// Turns events into an async stream.
///
/// Dropping the receiver is harmless: sends to a closed channel are ignored,
/// so a front end can stop listening at any time.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<PipelineEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PipelineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl PipelineObserver for ChannelObserver {
    fn on_event(&self, event: &PipelineEvent) {
        let _ = self.tx.send(event.clone());
    }
}

/// Fan out to several observers.
#[derive(Default, Clone)]
pub struct Observers(Vec<Arc<dyn PipelineObserver>>);

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.0.push(observer);
        self
    }
}

impl PipelineObserver for Observers {
    fn on_event(&self, event: &PipelineEvent) {
        for observer in &self.0 {
            observer.on_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_observer_keeps_order() {
        let rec = RecordingObserver::new();
        rec.on_event(&PipelineEvent::OcrScanStarted);
        rec.on_event(&PipelineEvent::OcrProgress { percent: 50 });
        rec.on_event(&PipelineEvent::OcrScanComplete { text_length: 12 });

        let events = rec.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], PipelineEvent::OcrScanStarted);
        assert_eq!(events[2], PipelineEvent::OcrScanComplete { text_length: 12 });
    }

    #[tokio::test]
    async fn channel_observer_streams_events() {
        let (observer, mut rx) = ChannelObserver::new();
        observer.on_event(&PipelineEvent::PdfExtractionStarted { pages: 2 });
        drop(observer);

        assert_eq!(
            rx.recv().await,
            Some(PipelineEvent::PdfExtractionStarted { pages: 2 })
        );
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn channel_observer_survives_dropped_receiver() {
        let (observer, rx) = ChannelObserver::new();
        drop(rx);
        observer.on_event(&PipelineEvent::OcrScanStarted);
    }

    #[test]
    fn fan_out_reaches_every_observer() {
        let a = Arc::new(RecordingObserver::new());
        let b = Arc::new(RecordingObserver::new());
        let all = Observers::new().with(a.clone()).with(b.clone());
        all.on_event(&PipelineEvent::OcrScanStarted);
        assert_eq!(a.events().len(), 1);
        assert_eq!(b.events().len(), 1);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(PipelineEvent::OcrProgress { percent: 40 }).unwrap();
        assert_eq!(json["type"], "ocr_progress");
        assert_eq!(json["percent"], 40);
    }
}
