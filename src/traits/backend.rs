use async_trait::async_trait;

use crate::config::FormatTable;
use crate::context::protocol::{Blob, InputFile};
use crate::errors::BackendError;
use crate::traits::progress::ProgressReporter;

/// Request handed to a backend by its context.
///
/// Backends derive the source format from `file.name` themselves.
#[derive(Debug, Clone)]
pub struct BackendRequest {
    pub file: InputFile,
    pub target_format: String,
}

#[async_trait]
pub trait ConversionBackend: Send + Sync {
    /// Identifier reported in the context's `READY` notification.
    fn backend_type(&self) -> &'static str;

    /// Pairs this backend actually implements.
    fn supported_conversions(&self) -> &FormatTable;

    /// Convert the payload, reporting progress through `progress`.
    async fn convert(
        &self,
        request: BackendRequest,
        progress: &ProgressReporter,
    ) -> Result<Blob, BackendError>;

    fn supports(&self, source_format: &str, target_format: &str) -> bool {
        self.supported_conversions().supports(source_format, target_format)
    }
}
