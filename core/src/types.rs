//! Classification Types
//!
//! Input and output contracts shared by every classifier implementation and
//! by the classify wire protocol. These types are pure data: the heuristic
//! classifier, the gateway, and any future model-backed classifier all speak
//! in terms of them.

use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Input to a classification request
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClassificationInput {
    /// The content to classify (non-empty for meaningful results)
    pub content: String,

    /// Free-form hints about where the content came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ClassificationContext>,

    /// User preferences for category selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
}

impl ClassificationInput {
    /// Create an input from bare content
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            context: None,
            preferences: None,
        }
    }

    /// Attach context hints
    #[must_use]
    pub fn with_context(mut self, context: ClassificationContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Attach user preferences
    #[must_use]
    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = Some(preferences);
        self
    }
}

/// Hints about the source of the content being classified
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationContext {
    /// Type of model that produced the content
    pub model_type: Option<String>,
    /// The user query that generated this content
    pub user_query: Option<String>,
    /// Prior conversation turns, oldest first
    pub conversation_history: Vec<String>,
}

/// User preferences influencing category selection
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Preferred categories, most preferred first
    pub preferred_types: Vec<Category>,
    /// Accessibility requirements apply
    pub accessibility: bool,
    /// Mobile-first design preference
    pub mobile_first: bool,
}

/// Result of a classification request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Suggested category
    pub category: Category,

    /// Confidence in the suggestion, in [0, 1]
    ///
    /// Not calibrated for the reference heuristic; it only signals that the
    /// heuristic succeeded.
    pub confidence: f64,

    /// Alternative suggestions, best first
    #[serde(default)]
    pub alternatives: Vec<Alternative>,

    /// Category-dependent structured data payload
    ///
    /// Shape depends on `category` (e.g. table carries `columns` + `rows`,
    /// chart carries a series). Open by design.
    #[serde(default)]
    pub data: serde_json::Value,

    /// Timing metrics for this classification
    #[serde(default)]
    pub metrics: ClassificationMetrics,
}

/// An alternative category suggestion with its confidence
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Alternative {
    /// The alternative category
    pub category: Category,
    /// Confidence in this alternative, in [0, 1]
    pub confidence: f64,
}

/// Timing metrics reported with a classification result
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationMetrics {
    /// Total processing time in milliseconds (>= 0)
    pub processing_time_ms: f64,
    /// Model inference time in milliseconds (>= 0)
    pub inference_time_ms: f64,
}

/// Model configuration passed to classifier initialization
///
/// Opaque to the gateway; the remote classifier interprets it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model name/identifier
    pub model_name: String,
    /// Model size variant (e.g. "100M", "1B", "7B")
    pub variant: Option<String>,
    /// Quantization setting (e.g. "4bit", "8bit", "fp16")
    pub quantization: Option<String>,
    /// Maximum sequence length
    pub max_length: Option<u32>,
    /// Preferred power profile for GPU-backed classifiers
    pub power_preference: Option<PowerPreference>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_name: "pivot-model".to_string(),
            variant: Some("100M".to_string()),
            quantization: Some("4bit".to_string()),
            max_length: None,
            power_preference: None,
        }
    }
}

/// GPU power profile hint for model-backed classifiers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowerPreference {
    /// Prefer battery life over throughput
    LowPower,
    /// Prefer throughput over battery life
    HighPerformance,
}
