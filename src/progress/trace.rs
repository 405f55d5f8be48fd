//! BuildKit trace batches
//!
//! The daemon forwards BuildKit solve status as a `moby.buildkit.v1.StatusResponse`
//! protobuf message, base64-encoded into the `aux` field of a JSON item whose
//! `id` is `moby.buildkit.trace`. Only the fields the display uses are declared;
//! everything else (timestamps, progress groups, source ranges) is skipped by
//! the decoder.

use base64::Engine;
use prost::Message;

use crate::error::ProgressError;

// === Wire schema ===

/// `moby.buildkit.v1.StatusResponse`
#[derive(Clone, PartialEq, Message)]
pub struct StatusResponse {
    #[prost(message, repeated, tag = "1")]
    pub vertexes: Vec<Vertex>,
    #[prost(message, repeated, tag = "2")]
    pub statuses: Vec<VertexStatus>,
    #[prost(message, repeated, tag = "3")]
    pub logs: Vec<VertexLog>,
    #[prost(message, repeated, tag = "4")]
    pub warnings: Vec<VertexWarning>,
}

/// `moby.buildkit.v1.Vertex`
#[derive(Clone, PartialEq, Message)]
pub struct Vertex {
    #[prost(string, tag = "1")]
    pub digest: String,
    #[prost(string, repeated, tag = "2")]
    pub inputs: Vec<String>,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(bool, tag = "4")]
    pub cached: bool,
    #[prost(string, tag = "7")]
    pub error: String,
}

/// `moby.buildkit.v1.VertexStatus`
#[derive(Clone, PartialEq, Message)]
pub struct VertexStatus {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub vertex: String,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(int64, tag = "4")]
    pub current: i64,
    #[prost(int64, tag = "5")]
    pub total: i64,
}

/// `moby.buildkit.v1.VertexLog`
#[derive(Clone, PartialEq, Message)]
pub struct VertexLog {
    #[prost(string, tag = "1")]
    pub vertex: String,
    #[prost(int64, tag = "3")]
    pub stream: i64,
    #[prost(bytes = "vec", tag = "4")]
    pub msg: Vec<u8>,
}

/// `moby.buildkit.v1.VertexWarning`
#[derive(Clone, PartialEq, Message)]
pub struct VertexWarning {
    #[prost(string, tag = "1")]
    pub vertex: String,
    #[prost(int64, tag = "2")]
    pub level: i64,
    #[prost(bytes = "vec", tag = "3")]
    pub short: Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "4")]
    pub detail: Vec<Vec<u8>>,
    #[prost(string, tag = "5")]
    pub url: String,
}

// === Projection ===

/// A build step announced by the solver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceVertex {
    pub digest: String,
    pub name: String,
}

/// Progress of one unit of work inside a build step.
///
/// Counts are kept as the decimal strings the projection produces; use
/// [`TraceStatus::current_count`] and [`TraceStatus::total_count`] to read them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceStatus {
    pub id: String,
    pub name: String,
    pub current: String,
    pub total: String,
}

impl TraceStatus {
    pub fn current_count(&self) -> Option<u64> {
        parse_count(&self.current)
    }

    pub fn total_count(&self) -> Option<u64> {
        parse_count(&self.total)
    }
}

/// Raw output of a build step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceLog {
    pub message: Vec<u8>,
}

impl TraceLog {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.message).into_owned()
    }
}

/// Decoded contents of one `moby.buildkit.trace` item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TraceBatch {
    pub vertexes: Vec<TraceVertex>,
    pub statuses: Vec<TraceStatus>,
    pub logs: Vec<TraceLog>,
    /// Short text of each warning the solver emitted
    pub warnings: Vec<String>,
}

impl TraceBatch {
    /// Decode the base64 `aux` payload of a trace item.
    pub fn decode_base64(payload: &str) -> Result<Self, ProgressError> {
        let bytes = base64::engine::general_purpose::STANDARD.decode(payload.trim())?;
        Self::decode(&bytes)
    }

    /// Decode a raw `StatusResponse` message.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProgressError> {
        let response = StatusResponse::decode(bytes)?;
        Ok(Self::from(response))
    }
}

impl From<StatusResponse> for TraceBatch {
    fn from(response: StatusResponse) -> Self {
        Self {
            vertexes: response
                .vertexes
                .into_iter()
                .map(|v| TraceVertex {
                    digest: v.digest,
                    name: v.name,
                })
                .collect(),
            statuses: response
                .statuses
                .into_iter()
                .map(|s| TraceStatus {
                    id: s.id,
                    name: s.name,
                    current: s.current.to_string(),
                    total: s.total.to_string(),
                })
                .collect(),
            logs: response
                .logs
                .into_iter()
                .map(|l| TraceLog { message: l.msg })
                .collect(),
            warnings: response
                .warnings
                .into_iter()
                .map(|w| String::from_utf8_lossy(&w.short).into_owned())
                .collect(),
        }
    }
}

/// Parse a non-negative decimal count; anything else is "unknown".
pub fn parse_count(value: &str) -> Option<u64> {
    value.trim().parse().ok()
}
