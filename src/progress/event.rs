//! Progress event classification
//!
//! Each JSON item from the daemon is classified exactly once into a
//! [`ProgressEvent`]. The rules are checked in order and the first match wins:
//!
//! 1. `id == "moby.buildkit.trace"`: embedded BuildKit trace batch
//! 2. `id == "moby.image.id"`: final image id of a build
//! 3. non-empty `stream`: raw log text
//! 4. non-empty `id`: status of a tracked work item
//! 5. object `aux`: other auxiliary payload
//! 6. non-empty `status`: untracked status line
//! 7. non-empty `error`: failure reported by the daemon
//! 8. anything else is unrecognized

use serde_json::Value;

use super::trace::TraceBatch;
use crate::error::ProgressError;

/// Discriminator of items carrying a BuildKit trace batch
pub const TRACE_ID: &str = "moby.buildkit.trace";

/// Discriminator of items carrying the id of a built image
pub const IMAGE_ID: &str = "moby.image.id";

/// Status of a work item that owns a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub id: String,
    pub status: String,
    pub current: Option<u64>,
    pub total: Option<u64>,
}

/// One decoded unit of the progress stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Trace(TraceBatch),
    ImageId(String),
    StreamText(String),
    Status(StatusUpdate),
    Aux { id: Option<String> },
    StatusText(String),
    BackendError(String),
    Unrecognized(Value),
}

impl ProgressEvent {
    /// Classify one JSON item.
    ///
    /// Only trace batches can fail: their payload must decode.
    pub fn classify(item: Value) -> Result<Self, ProgressError> {
        match str_field(&item, "id") {
            Some(TRACE_ID) => {
                let payload = item
                    .get("aux")
                    .and_then(Value::as_str)
                    .ok_or(ProgressError::MissingTracePayload)?;
                return Ok(ProgressEvent::Trace(TraceBatch::decode_base64(payload)?));
            }
            Some(IMAGE_ID) => {
                return Ok(ProgressEvent::ImageId(aux_id(&item).unwrap_or_default()));
            }
            _ => {}
        }

        if let Some(text) = non_empty(&item, "stream") {
            return Ok(ProgressEvent::StreamText(text.to_string()));
        }

        if let Some(id) = non_empty(&item, "id") {
            let detail = item
                .get("progressDetail")
                .or_else(|| item.get("processDetail"));
            let count = |key: &str| detail.and_then(|d| d.get(key)).and_then(Value::as_u64);

            return Ok(ProgressEvent::Status(StatusUpdate {
                id: id.to_string(),
                status: str_field(&item, "status").unwrap_or_default().to_string(),
                current: count("current"),
                total: count("total"),
            }));
        }

        if item.get("aux").is_some_and(Value::is_object) {
            return Ok(ProgressEvent::Aux { id: aux_id(&item) });
        }

        if let Some(status) = non_empty(&item, "status") {
            return Ok(ProgressEvent::StatusText(status.to_string()));
        }

        if let Some(message) = non_empty(&item, "error") {
            return Ok(ProgressEvent::BackendError(message.to_string()));
        }

        Ok(ProgressEvent::Unrecognized(item))
    }
}

fn str_field<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key).and_then(Value::as_str)
}

fn non_empty<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    str_field(item, key).filter(|s| !s.is_empty())
}

fn aux_id(item: &Value) -> Option<String> {
    match item.get("aux")?.get("ID")? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classify(item: Value) -> ProgressEvent {
        ProgressEvent::classify(item).unwrap()
    }

    #[test]
    fn test_stream_text() {
        assert_eq!(
            classify(json!({"stream": "Step 1/3 : FROM alpine\n"})),
            ProgressEvent::StreamText("Step 1/3 : FROM alpine\n".to_string())
        );
    }

    #[test]
    fn test_status_with_progress_detail() {
        let event = classify(json!({
            "status": "Downloading",
            "progressDetail": {"current": 512, "total": 2048},
            "id": "a3ed95caeb02"
        }));
        assert_eq!(
            event,
            ProgressEvent::Status(StatusUpdate {
                id: "a3ed95caeb02".to_string(),
                status: "Downloading".to_string(),
                current: Some(512),
                total: Some(2048),
            })
        );
    }

    #[test]
    fn test_status_with_empty_detail() {
        let event = classify(json!({"status": "Pull complete", "progressDetail": {}, "id": "a3ed"}));
        match event {
            ProgressEvent::Status(update) => {
                assert_eq!(update.current, None);
                assert_eq!(update.total, None);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_process_detail_alias() {
        let event = classify(json!({"id": "l1", "status": "x", "processDetail": {"current": 1, "total": 2}}));
        match event {
            ProgressEvent::Status(update) => assert_eq!((update.current, update.total), (Some(1), Some(2))),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_image_id() {
        assert_eq!(
            classify(json!({"id": "moby.image.id", "aux": {"ID": "sha256:beef"}})),
            ProgressEvent::ImageId("sha256:beef".to_string())
        );
    }

    #[test]
    fn test_stream_takes_priority_over_id() {
        let event = classify(json!({"id": "abc", "stream": "text"}));
        assert_eq!(event, ProgressEvent::StreamText("text".to_string()));
    }

    #[test]
    fn test_empty_stream_falls_through() {
        let event = classify(json!({"stream": "", "status": "Waiting"}));
        assert_eq!(event, ProgressEvent::StatusText("Waiting".to_string()));
    }

    #[test]
    fn test_generic_aux() {
        assert_eq!(
            classify(json!({"aux": {"ID": "sha256:cafe"}})),
            ProgressEvent::Aux { id: Some("sha256:cafe".to_string()) }
        );
        assert_eq!(classify(json!({"aux": {}})), ProgressEvent::Aux { id: None });
    }

    #[test]
    fn test_bare_status() {
        assert_eq!(
            classify(json!({"status": "Digest: sha256:1234"})),
            ProgressEvent::StatusText("Digest: sha256:1234".to_string())
        );
    }

    #[test]
    fn test_backend_error() {
        let event = classify(json!({"errorDetail": {"message": "boom"}, "error": "boom"}));
        assert_eq!(event, ProgressEvent::BackendError("boom".to_string()));
    }

    #[test]
    fn test_unrecognized() {
        let item = json!({"something": "else"});
        assert_eq!(classify(item.clone()), ProgressEvent::Unrecognized(item));
    }

    #[test]
    fn test_trace_without_payload_fails() {
        let err = ProgressEvent::classify(json!({"id": "moby.buildkit.trace"})).unwrap_err();
        assert!(matches!(err, ProgressError::MissingTracePayload));
    }

    #[test]
    fn test_trace_with_bad_payload_fails() {
        let err = ProgressEvent::classify(json!({"id": "moby.buildkit.trace", "aux": "%%%"})).unwrap_err();
        assert!(matches!(err, ProgressError::Base64(_)));
    }
}
