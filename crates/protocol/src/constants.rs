/// Size of one chunk before transport encoding (2 MiB).
///
/// Base64 inflates this to ~2.7 MiB per record, which keeps a single
/// channel message well below the practical posting limit.
pub const DEFAULT_CHUNK_SIZE: usize = 2 * 1024 * 1024;

/// Filename used when the requested name is empty or unusable.
pub const DEFAULT_FILENAME: &str = "download";

/// Channel action names.
pub const ACTION_START: &str = "start";
pub const ACTION_CHUNK: &str = "chunk";
pub const ACTION_FINISH: &str = "finish";
pub const ACTION_ERROR: &str = "error";
