pub mod backend;
pub mod progress;

pub use backend::{BackendRequest, ConversionBackend};
pub use progress::ProgressReporter;
