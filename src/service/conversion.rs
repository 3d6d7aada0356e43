// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::config::consts::BYTES_PER_MB;
use crate::config::{normalize_format, BackendRegistry, Config, FormatTable};
use crate::context::protocol::{Blob, InboundMessage, InputFile, WorkerMessage};
use crate::context::{ContextFactory, ContextHandle};
use crate::errors::ConversionError;
use crate::observability::messages::conversion::{
    ConversionCompleted, ConversionFailed, ConversionRejected, ConversionRequested,
};
use crate::observability::messages::StructuredLog;

const UNKNOWN_CONVERSION_ERROR: &str = "Unknown error during conversion";

/// Phase of a conversion as seen by a progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStatus {
    Converting,
    Completed,
    Error,
}

impl ConversionStatus {
    /// Human-readable heading for the phase.
    pub fn label(&self) -> &'static str {
        match self {
            ConversionStatus::Converting => "Converting...",
            ConversionStatus::Completed => "Conversion Complete!",
            ConversionStatus::Error => "Conversion Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ConversionStatus::Converting)
    }
}

/// One progress event.
///
/// `progress` is `None` on error events. `result` is only set on the
/// `Completed` event and `error` only on the `Error` event.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionProgress {
    pub status: ConversionStatus,
    pub progress: Option<f64>,
    pub result: Option<Blob>,
    pub error: Option<String>,
}

pub type ProgressCallback = Arc<dyn Fn(ConversionProgress) + Send + Sync>;

/// Formats for one `convert_file` call plus an optional progress callback.
#[derive(Clone)]
pub struct ConversionOptions {
    pub source_format: String,
    pub target_format: String,
    pub on_progress: Option<ProgressCallback>,
}

impl ConversionOptions {
    pub fn new(source_format: impl Into<String>, target_format: impl Into<String>) -> Self {
        Self {
            source_format: source_format.into(),
            target_format: target_format.into(),
            on_progress: None,
        }
    }

    /// Options whose source format is taken from the file name.
    pub fn for_file(file: &InputFile, target_format: impl Into<String>) -> Self {
        Self::new(file.extension(), target_format)
    }

    pub fn on_progress(mut self, callback: impl Fn(ConversionProgress) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for ConversionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionOptions")
            .field("source_format", &self.source_format)
            .field("target_format", &self.target_format)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// Forwards events for a single call. Progress never goes backwards and at
/// most one terminal event is delivered.
struct ProgressForwarder {
    callback: Option<ProgressCallback>,
    last_progress: f64,
    finished: bool,
}

impl ProgressForwarder {
    fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            last_progress: 0.0,
            finished: false,
        }
    }

    fn converting(&mut self, progress: f64) {
        let progress = if progress.is_nan() {
            self.last_progress
        } else {
            progress.clamp(self.last_progress, 100.0)
        };
        self.last_progress = progress;
        self.emit(ConversionProgress {
            status: ConversionStatus::Converting,
            progress: Some(progress),
            result: None,
            error: None,
        });
    }

    fn completed(&mut self, result: &Blob) {
        self.emit(ConversionProgress {
            status: ConversionStatus::Completed,
            progress: Some(100.0),
            result: Some(result.clone()),
            error: None,
        });
    }

    fn failed(&mut self, error: &ConversionError) {
        // Progress events carry the bare transport message; the returned
        // error adds the "Worker error" framing.
        let message = match error {
            ConversionError::Transport(message) => message.clone(),
            other => other.to_string(),
        };
        self.emit(ConversionProgress {
            status: ConversionStatus::Error,
            progress: None,
            result: None,
            error: Some(message),
        });
    }

    fn emit(&mut self, event: ConversionProgress) {
        if self.finished {
            return;
        }
        self.finished = event.status.is_terminal();
        if let Some(callback) = &self.callback {
            callback(event);
        }
    }
}

/// Client-facing entry point: routes each file to the context for its
/// backend and turns the context's messages into progress events and a
/// single result.
pub struct ConversionService {
    factory: ContextFactory,
    max_file_size_mb: u64,
}

impl ConversionService {
    /// Service over the built-in registry with default limits.
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self {
            factory: ContextFactory::with_event_buffer(
                Arc::new(BackendRegistry::from_config(cfg)),
                cfg.event_buffer,
            ),
            max_file_size_mb: cfg.max_file_size_mb,
        }
    }

    pub fn with_registry(registry: BackendRegistry) -> Self {
        let defaults = Config::default();
        Self {
            factory: ContextFactory::with_event_buffer(Arc::new(registry), defaults.event_buffer),
            max_file_size_mb: defaults.max_file_size_mb,
        }
    }

    /// Convert `file` and return the converted blob.
    ///
    /// Events delivered to `options.on_progress`, in order:
    /// `Converting(0)`, zero or more `Converting(p)` with non-decreasing `p`,
    /// then exactly one `Completed(100)` or `Error`. Requests rejected before
    /// reaching a context (unsupported pair, oversized file, no runtime) only
    /// produce the `Error` event.
    pub async fn convert_file(
        &self,
        file: InputFile,
        options: ConversionOptions,
    ) -> Result<Blob, ConversionError> {
        let started = Instant::now();
        let source_format = normalize_format(&options.source_format);
        let target_format = normalize_format(&options.target_format);
        let file_name = file.name.clone();
        let mut forwarder = ProgressForwarder::new(options.on_progress);

        ConversionRequested {
            file_name: &file_name,
            source_format: &source_format,
            target_format: &target_format,
            size: file.size(),
        }
        .log();

        let context = match self.admit(&file, &source_format, &target_format) {
            Ok(context) => context,
            Err(error) => {
                ConversionRejected {
                    file_name: &file_name,
                    reason: &error,
                }
                .log();
                forwarder.failed(&error);
                return Err(error);
            }
        };

        forwarder.converting(0.0);
        let outcome = run_request(&context, file, &target_format, &mut forwarder).await;

        match outcome {
            Ok(result) => {
                forwarder.completed(&result);
                ConversionCompleted {
                    file_name: &file_name,
                    target_format: &target_format,
                    output_size: result.len(),
                    duration: started.elapsed(),
                }
                .log();
                Ok(result)
            }
            Err(error) => {
                forwarder.failed(&error);
                ConversionFailed {
                    file_name: &file_name,
                    error: &error,
                }
                .log();
                Err(error)
            }
        }
    }

    /// Checks made before any message is sent.
    fn admit(
        &self,
        file: &InputFile,
        source_format: &str,
        target_format: &str,
    ) -> Result<Arc<ContextHandle>, ConversionError> {
        let max_bytes = self.max_file_size_mb.saturating_mul(BYTES_PER_MB);
        if file.size() > max_bytes {
            return Err(ConversionError::FileTooLarge {
                size: file.size(),
                max_mb: self.max_file_size_mb,
            });
        }

        self.factory
            .context_for(source_format, target_format)?
            .ok_or_else(|| ConversionError::Unsupported {
                source_format: source_format.to_string(),
                target_format: target_format.to_string(),
            })
    }

    /// Every supported pair across the registry.
    pub fn get_supported_conversions(&self) -> FormatTable {
        self.factory.registry().all_conversions()
    }

    /// Targets offered for one source format, in registry order.
    pub fn targets_for(&self, source_format: &str) -> Vec<String> {
        self.get_supported_conversions()
            .targets_for(source_format)
            .to_vec()
    }

    /// Tear down every context. Later conversions spawn fresh ones.
    pub fn dispose(&self) {
        self.factory.teardown_all();
    }

    /// Backend ids that currently have a live context.
    pub fn active_contexts(&self) -> Vec<String> {
        self.factory.active_backends()
    }
}

impl Default for ConversionService {
    fn default() -> Self {
        Self::new()
    }
}

/// Post one request and follow its replies until the terminal message. A
/// reply channel that closes first means the context stopped.
async fn run_request(
    context: &ContextHandle,
    file: InputFile,
    target_format: &str,
    forwarder: &mut ProgressForwarder,
) -> Result<Blob, ConversionError> {
    let mut request = context.post(InboundMessage::start_conversion(file, target_format))?;

    while let Some(message) = request.replies.recv().await {
        if let Some(outcome) = interpret(message, forwarder) {
            return outcome;
        }
    }
    Err(context.termination_error())
}

/// `Some` once the request has settled.
fn interpret(
    message: WorkerMessage,
    forwarder: &mut ProgressForwarder,
) -> Option<Result<Blob, ConversionError>> {
    match message {
        WorkerMessage::ProgressUpdate { progress } => {
            forwarder.converting(progress);
            None
        }
        WorkerMessage::ConversionComplete { result, .. } => Some(Ok(result)),
        WorkerMessage::ConversionError { error } => Some(Err(ConversionError::Backend {
            message: error
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| UNKNOWN_CONVERSION_ERROR.to_string()),
            name: error.name,
        })),
        WorkerMessage::Ready { .. } | WorkerMessage::ConversionStarted { .. } => None,
    }
}
