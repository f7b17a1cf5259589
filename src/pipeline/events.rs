//! Events emitted over a recommendation stream.

use serde::{Deserialize, Serialize};

/// A single event in a recommendation stream.
///
/// Serialized untagged: the wire shape is `{"content": ...}` for status,
/// `{"trackIds": [...]}` for results and `{"error": ...}` for errors, each
/// carried in one SSE `data:` frame. Exactly one terminal event (result or
/// error) is emitted per request; any number of status events may precede it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PipelineEvent {
    Status {
        content: String,
    },
    Result {
        #[serde(rename = "trackIds")]
        track_ids: Vec<String>,
    },
    Error {
        error: String,
    },
}

impl PipelineEvent {
    pub fn status(content: impl Into<String>) -> Self {
        PipelineEvent::Status {
            content: content.into(),
        }
    }

    pub fn result(track_ids: Vec<String>) -> Self {
        PipelineEvent::Result { track_ids }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        PipelineEvent::Error {
            error: reason.into(),
        }
    }

    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PipelineEvent::Status { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_to_content_object() {
        let json = serde_json::to_value(PipelineEvent::status("Generating recommendations...")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"content": "Generating recommendations..."})
        );
    }

    #[test]
    fn result_serializes_to_camel_case_track_ids() {
        let json =
            serde_json::to_value(PipelineEvent::result(vec!["a".into(), "b".into()])).unwrap();
        assert_eq!(json, serde_json::json!({"trackIds": ["a", "b"]}));
    }

    #[test]
    fn error_serializes_to_error_object() {
        let json = serde_json::to_value(PipelineEvent::error("No tracks found")).unwrap();
        assert_eq!(json, serde_json::json!({"error": "No tracks found"}));
    }

    #[test]
    fn terminal_classification() {
        assert!(!PipelineEvent::status("working").is_terminal());
        assert!(PipelineEvent::result(vec![]).is_terminal());
        assert!(PipelineEvent::error("nope").is_terminal());
    }
}
