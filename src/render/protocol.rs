//! Wire protocol between the server and the page-worker sandbox
//!
//! The parent writes one JSON job line followed by the raw PDF bytes to the
//! worker's stdin, then closes it. On success the worker writes PNG bytes to
//! stdout and exits 0. On failure it writes one JSON [`WorkerFailure`] line
//! to stderr and exits non-zero.

use serde::{Deserialize, Serialize};

/// A single-page rasterization task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterJob {
    /// 1-based page number, already clamped by the orchestrator.
    pub page: i64,
    /// Effective raster scale (logical scale x device scale).
    pub scale: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Invalid document bytes or the page does not exist.
    Decode,
    /// Anything else that went wrong inside the worker.
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl WorkerFailure {
    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Decode,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Internal,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_lines_parse_back() {
        let line = serde_json::to_string(&WorkerFailure::decode("no such page")).unwrap();
        let parsed: WorkerFailure = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed.kind, FailureKind::Decode);
        assert_eq!(parsed.message, "no such page");
    }
}
