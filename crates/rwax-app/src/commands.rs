// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand implementations. Each returns a JSON value for `main` to print.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rwax_core::config::PipelineConfig;
use rwax_core::events::TracingObserver;
use rwax_core::{AttestError, CancelToken, error::Result};
use rwax_credential::{
    AttestationPipeline, InMemoryLedger, InMemoryWallet, PayloadEncoder, WalletBehavior,
};
use rwax_document::{DocumentAnalyzer, open_source};
use serde_json::{Value, json};
use tracing::info;

/// Load `explicit`, else the default config file if it exists, else defaults.
pub fn load_config(explicit: Option<&Path>, default_path: &Path) -> Result<PipelineConfig> {
    match explicit {
        Some(path) => PipelineConfig::load(path),
        None if default_path.exists() => PipelineConfig::load(default_path),
        None => Ok(PipelineConfig::default()),
    }
}

/// Extract and classify a document.
pub async fn analyze(path: &Path, cancel: &CancelToken) -> Result<Value> {
    let source = open_source(path)?;
    let document = DocumentAnalyzer::new()
        .analyze(source.as_ref(), &TracingObserver, cancel)
        .await?;
    Ok(serde_json::to_value(&document)?)
}

/// Build the credential for `holder` and run it as a dry run against an
/// offline ledger. Nothing is signed.
pub async fn preview(
    path: &Path,
    holder: &str,
    config: PipelineConfig,
    cancel: &CancelToken,
) -> Result<Value> {
    let ledger = InMemoryLedger::new();
    let wallet = InMemoryWallet::new(WalletBehavior::NoHash);
    let pipeline = AttestationPipeline::new(config, Arc::new(ledger), Arc::new(wallet))?;

    let source = open_source(path)?;
    let report = pipeline.attest(source.as_ref(), holder, true, cancel).await?;

    let payload = &report.credential.payload;
    let dropped: Vec<&str> = payload.dropped.iter().map(|f| f.key()).collect();
    let (transaction, fee) = match &report.submission.preview {
        Some(preview) => (
            serde_json::to_value(&preview.transaction)?,
            preview.estimated_fee.clone(),
        ),
        None => (Value::Null, None),
    };
    info!(status = ?report.submission.status(), "preview finished");

    Ok(json!({
        "document": {
            "category": report.document.category,
            "is_valid": report.document.is_valid,
            "content_hash": report.document.content_hash,
            "fields": report.document.fields,
        },
        "payload": {
            "json": payload.as_str(),
            "bytes": payload.len(),
            "dropped": dropped,
        },
        "transaction": transaction,
        "estimated_fee": fee,
        "status": report.submission.status(),
        "error": report.submission.error(),
    }))
}

/// Decode the hex `Data` slot of a credential transaction.
pub fn decode(data: &str, config: &PipelineConfig) -> Result<Value> {
    let bytes = hex::decode(data.trim())
        .map_err(|err| AttestError::MalformedPayload(format!("data slot is not hex: {err}")))?;
    let payload = PayloadEncoder::new(config.payload.clone()).decode(&bytes)?;
    Ok(serde_json::to_value(&payload)?)
}

/// Write the default config to `path`. Refuses to overwrite unless `force`.
pub fn config_init(path: &Path, force: bool) -> Result<PathBuf> {
    if path.exists() && !force {
        return Err(AttestError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    PipelineConfig::default().persist(path)?;
    info!(path = %path.display(), "default config written");
    Ok(path.to_path_buf())
}
