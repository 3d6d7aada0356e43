// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message protocol spoken across the isolation boundary.
//!
//! Every message is a tagged record with a `type` field. Only these
//! serializable values cross between the owner and a context:
//!
//! | Direction | type | Fields |
//! |---|---|---|
//! | → context | `START_CONVERSION` | `payload{file, targetFormat}` |
//! | context → | `READY` | `payload{workerType}` |
//! | context → | `CONVERSION_STARTED` | `payload{fileName, sourceFormat, targetFormat}` |
//! | context → | `PROGRESS_UPDATE` | `progress` |
//! | context → | `CONVERSION_COMPLETE` | `result`, `payload{fileName, targetFormat}` |
//! | context → | `CONVERSION_ERROR` | `error{message, name}` |
//!
//! Outbound messages are wrapped in an [`Envelope`] carrying the request id
//! they answer, so several callers can share one context.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Format of a file derived from its name: the text after the last `.`,
/// lower-cased, or empty when the name has no `.`.
pub fn format_from_file_name(name: &str) -> String {
    match name.rfind('.') {
        Some(index) => name[index + 1..].to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Name for a converted file: the original name without its last extension,
/// followed by `.target_format`.
pub fn download_name(file_name: &str, target_format: &str) -> String {
    let stem = match file_name.rfind('.') {
        Some(index) => &file_name[..index],
        None => file_name,
    };
    format!("{}.{}", stem, target_format.to_ascii_lowercase())
}

/// A named input payload.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFile {
    pub name: String,
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk, keeping only its final path component as name.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, bytes })
    }

    pub fn extension(&self) -> String {
        format_from_file_name(&self.name)
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl fmt::Debug for InputFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputFile")
            .field("name", &self.name)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Converted output with its content type. Cloning shares the bytes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub content_type: String,
    #[serde(with = "base64_bytes")]
    data: Arc<[u8]>,
}

impl Blob {
    pub fn new(data: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Messages sent into a context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboundMessage {
    StartConversion { payload: StartConversionPayload },
}

impl InboundMessage {
    pub fn start_conversion(file: InputFile, target_format: impl Into<String>) -> Self {
        InboundMessage::StartConversion {
            payload: StartConversionPayload {
                file,
                target_format: target_format.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartConversionPayload {
    pub file: InputFile,
    pub target_format: String,
}

/// Messages emitted by a context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    Ready {
        payload: ReadyPayload,
    },
    ConversionStarted {
        payload: ConversionStartedPayload,
    },
    ProgressUpdate {
        progress: f64,
    },
    ConversionComplete {
        result: Blob,
        payload: ConversionCompletePayload,
    },
    ConversionError {
        error: ErrorDetail,
    },
}

impl WorkerMessage {
    /// Wire name of the message type.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerMessage::Ready { .. } => "READY",
            WorkerMessage::ConversionStarted { .. } => "CONVERSION_STARTED",
            WorkerMessage::ProgressUpdate { .. } => "PROGRESS_UPDATE",
            WorkerMessage::ConversionComplete { .. } => "CONVERSION_COMPLETE",
            WorkerMessage::ConversionError { .. } => "CONVERSION_ERROR",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkerMessage::ConversionComplete { .. } | WorkerMessage::ConversionError { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyPayload {
    pub worker_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionStartedPayload {
    pub file_name: String,
    pub source_format: String,
    pub target_format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionCompletePayload {
    pub file_name: String,
    pub target_format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
    pub name: String,
}

/// An outbound message tagged with the request it answers.
///
/// `READY` is not tied to a request and carries no id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u64>,
    #[serde(flatten)]
    pub message: WorkerMessage,
}

impl Envelope {
    pub fn for_request(request_id: u64, message: WorkerMessage) -> Self {
        Self {
            request_id: Some(request_id),
            message,
        }
    }

    pub fn broadcast(message: WorkerMessage) -> Self {
        Self {
            request_id: None,
            message,
        }
    }
}

/// Binary fields travel as standard base64 strings.
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<T, S>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: AsRef<[u8]> + ?Sized,
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes.as_ref()))
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: From<Vec<u8>>,
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded)
            .map(T::from)
            .map_err(serde::de::Error::custom)
    }
}
