/// Default upper bound on input size in megabytes
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 100;
/// Bytes per megabyte when applying the size limit
pub const BYTES_PER_MB: u64 = 1024 * 1024;
/// Default capacity of each context's outbound event channel
pub const DEFAULT_EVENT_BUFFER: usize = 256;
/// Quality used for lossy (JPEG) encodings, i.e. a 0.9 quality factor
pub const LOSSY_ENCODING_QUALITY: u8 = 90;
/// Largest raster surface edge, in pixels
pub const MAX_SURFACE_DIMENSION: u32 = 16_384;
/// Progress reported once the source is decoded
pub const DECODED_PROGRESS: f64 = 50.0;
/// Progress reported once the target is encoded
pub const ENCODED_PROGRESS: f64 = 100.0;
