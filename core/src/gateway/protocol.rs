//! Classify Wire Protocol
//!
//! Message types exchanged between the gateway and a remote classifier
//! process. Tagged unions keyed by `type`, so the wire form reads as
//! `{"type":"classify","input":{...},"id":"req_..."}`.
//!
//! Requests flow gateway → classifier; responses flow back. Responses may
//! arrive out of order: the correlation id, not arrival order, determines
//! which pending request a `result` or `error` settles.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{ClassificationInput, ClassificationResult, ModelConfig};

/// Opaque correlation token for one classify request
///
/// Random 128-bit value; never reused while the request it tags is pending.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new unique request ID
    #[must_use]
    pub fn new() -> Self {
        use rand::Rng;
        let bytes: [u8; 16] = rand::thread_rng().gen();
        Self(format!("req_{}", hex::encode(bytes)))
    }

    /// The id as a string slice, e.g. for log fields
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Messages from the gateway to the remote classifier
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifyRequest {
    /// Load the model and prepare for classification
    Init {
        /// Model configuration, opaque to the gateway
        config: ModelConfig,
    },

    /// Classify one piece of content
    Classify {
        /// The classification input
        input: ClassificationInput,
        /// Correlation id echoed back in the response
        id: RequestId,
    },

    /// Release the model and shut down (best-effort, no response expected)
    Dispose,
}

/// Messages from the remote classifier to the gateway
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifyResponse {
    /// Initialization completed
    Ready,

    /// A classification finished
    Result {
        /// The classification result
        result: ClassificationResult,
        /// Correlation id of the originating request
        id: RequestId,
    },

    /// The classifier reported a failure
    Error {
        /// Human-readable error description
        error: String,
        /// Correlation id, absent for initialization failures
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<RequestId>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;

    #[test]
    fn test_request_id_unique() {
        let id1 = RequestId::new();
        let id2 = RequestId::new();
        assert_ne!(id1, id2);
        assert!(id1.as_str().starts_with("req_"));
    }

    #[test]
    fn test_request_wire_shape() {
        let msg = ClassifyRequest::Classify {
            input: ClassificationInput::new("hello"),
            id: RequestId("req_abc".to_string()),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "classify");
        assert_eq!(json["id"], "req_abc");
        assert_eq!(json["input"]["content"], "hello");
    }

    #[test]
    fn test_response_error_id_optional() {
        let json = r#"{"type":"error","error":"model load failed"}"#;
        let msg: ClassifyResponse = serde_json::from_str(json).unwrap();
        match msg {
            ClassifyResponse::Error { error, id } => {
                assert_eq!(error, "model load failed");
                assert!(id.is_none());
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_result_roundtrip() {
        let json = r#"{"type":"result","id":"req_1","result":{"category":"chart","confidence":0.7}}"#;
        let msg: ClassifyResponse = serde_json::from_str(json).unwrap();
        match msg {
            ClassifyResponse::Result { result, id } => {
                assert_eq!(id.as_str(), "req_1");
                assert_eq!(result.category, Category::Chart);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
