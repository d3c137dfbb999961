//! Constants for the download module (timeouts, content types).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout: longest wait for any single read, not for the whole body.
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Content type recorded when the server does not send one.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
