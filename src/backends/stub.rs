// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::config::FormatTable;
use crate::context::protocol::Blob;
use crate::errors::BackendError;
use crate::traits::{BackendRequest, ConversionBackend, ProgressReporter};

/// Reports a fixed progress script, then returns a fixed outcome.
pub struct ScriptedBackend {
    pub conversions: FormatTable,
    pub steps: Vec<f64>,
    pub outcome: Result<Blob, BackendError>,
}

impl ScriptedBackend {
    pub fn succeeding(conversions: FormatTable) -> Self {
        Self {
            conversions,
            steps: vec![25.0, 75.0],
            outcome: Ok(Blob::new(b"converted".to_vec(), "application/octet-stream")),
        }
    }

    pub fn failing(conversions: FormatTable, error: BackendError) -> Self {
        Self {
            conversions,
            steps: vec![10.0],
            outcome: Err(error),
        }
    }
}

#[async_trait::async_trait]
impl ConversionBackend for ScriptedBackend {
    fn backend_type(&self) -> &'static str {
        "scripted"
    }

    fn supported_conversions(&self) -> &FormatTable {
        &self.conversions
    }

    async fn convert(
        &self,
        _request: BackendRequest,
        progress: &ProgressReporter,
    ) -> Result<Blob, BackendError> {
        for step in &self.steps {
            progress.report(*step);
        }
        self.outcome.clone()
    }
}

/// Panics inside `convert`, faulting the context that hosts it.
pub struct PanickingBackend {
    pub conversions: FormatTable,
}

#[async_trait::async_trait]
impl ConversionBackend for PanickingBackend {
    fn backend_type(&self) -> &'static str {
        "panicking"
    }

    fn supported_conversions(&self) -> &FormatTable {
        &self.conversions
    }

    async fn convert(
        &self,
        _request: BackendRequest,
        _progress: &ProgressReporter,
    ) -> Result<Blob, BackendError> {
        panic!("simulated backend crash");
    }
}

/// Waits for one permit per conversion before finishing.
///
/// Tests release conversions one at a time with `gate.add_permits(1)` and can
/// read how many conversions have entered `convert` from `entered`.
pub struct GatedBackend {
    pub conversions: FormatTable,
    pub gate: Arc<Semaphore>,
    pub entered: Arc<AtomicUsize>,
}

impl GatedBackend {
    pub fn new(conversions: FormatTable) -> Self {
        Self {
            conversions,
            gate: Arc::new(Semaphore::new(0)),
            entered: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait::async_trait]
impl ConversionBackend for GatedBackend {
    fn backend_type(&self) -> &'static str {
        "gated"
    }

    fn supported_conversions(&self) -> &FormatTable {
        &self.conversions
    }

    async fn convert(
        &self,
        request: BackendRequest,
        progress: &ProgressReporter,
    ) -> Result<Blob, BackendError> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        progress.report(1.0);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| BackendError::Internal(e.to_string()))?;
        permit.forget();
        Ok(Blob::new(request.file.name.into_bytes(), "text/plain"))
    }
}
