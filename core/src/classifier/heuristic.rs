//! Heuristic Reference Classifier
//!
//! Keyword-based classifier that scans lowercased content for
//! category-indicative terms, first match wins in a fixed priority order.
//! Deliberately approximate: it exists to exercise the selection pipeline
//! deterministically in tests (when seeded) and to provide a fallback when
//! the remote classifier is unavailable.
//!
//! Confidence values are drawn uniformly and carry no meaning beyond
//! "the heuristic succeeded".

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use crate::category::Category;
use crate::types::{
    Alternative, ClassificationInput, ClassificationMetrics, ClassificationResult, ModelConfig,
};

use super::{Classifier, ClassifyError};

/// Keyword sets in priority order; the first matching entry wins
const KEYWORD_RULES: &[(Category, [&str; 3])] = &[
    (Category::Table, ["table", "row", "column"]),
    (Category::Chart, ["chart", "graph", "plot"]),
    (Category::List, ["list", "item", "bullet"]),
    (Category::Form, ["form", "input", "field"]),
    (Category::Map, ["map", "location", "address"]),
    (Category::Card, ["card", "summary", "overview"]),
    (Category::Timeline, ["timeline", "history", "chronolog"]),
    (Category::Stepper, ["step", "process", "workflow"]),
    (Category::Gallery, ["gallery", "images", "photos"]),
];

/// Default alternatives offered alongside any primary suggestion
const DEFAULT_ALTERNATIVES: [Category; 3] = [Category::Text, Category::Card, Category::List];

/// Maximum number of lines included in synthesized list data
const MAX_LIST_ITEMS: usize = 5;

/// Maximum characters included in synthesized card data
const MAX_CARD_CONTENT: usize = 200;

/// In-process keyword heuristic classifier
///
/// Requires [`initialize`](Classifier::initialize) before use, mirroring the
/// lifecycle of a real model-backed classifier. Seed via
/// [`with_seed`](HeuristicClassifier::with_seed) for deterministic confidence
/// values in tests.
pub struct HeuristicClassifier {
    ready: AtomicBool,
    rng: Mutex<StdRng>,
}

impl HeuristicClassifier {
    /// Create an uninitialized classifier with an entropy-seeded rng
    #[must_use]
    pub fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Create an uninitialized classifier with a fixed rng seed
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            ready: AtomicBool::new(false),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Whether `initialize` has completed
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Pick the category whose keyword set matches first
    fn analyze_content(content: &str) -> Category {
        let lower = content.to_lowercase();
        for (category, keywords) in KEYWORD_RULES {
            if keywords.iter().any(|kw| lower.contains(kw)) {
                return *category;
            }
        }
        Category::Text
    }

    /// Two highest-priority default categories, excluding the primary
    fn generate_alternatives(&self, primary: Category) -> Vec<Alternative> {
        let mut rng = self.rng.lock();
        DEFAULT_ALTERNATIVES
            .iter()
            .filter(|c| **c != primary)
            .take(2)
            .map(|c| Alternative {
                category: *c,
                confidence: rng.gen_range(0.2..0.5),
            })
            .collect()
    }

    /// Synthesize a category-shaped data payload from the content
    fn extract_data(content: &str, category: Category) -> serde_json::Value {
        match category {
            Category::Table => json!({
                "columns": ["Column 1", "Column 2", "Column 3"],
                "rows": [["Sample Data 1", "Sample Data 2", "Sample Data 3"]],
            }),
            Category::Chart => json!({
                "type": "bar",
                "data": [
                    { "x": "Category A", "y": 10 },
                    { "x": "Category B", "y": 20 },
                    { "x": "Category C", "y": 15 },
                ],
            }),
            Category::List => {
                let items: Vec<&str> = content
                    .lines()
                    .filter(|line| !line.trim().is_empty())
                    .take(MAX_LIST_ITEMS)
                    .collect();
                json!({ "items": items })
            }
            Category::Card => {
                let truncated: String = content.chars().take(MAX_CARD_CONTENT).collect();
                json!({ "title": "Summary", "content": truncated })
            }
            _ => json!({ "content": content }),
        }
    }
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Classifier for HeuristicClassifier {
    async fn initialize(&self, _config: ModelConfig) -> Result<(), ClassifyError> {
        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn classify(
        &self,
        input: ClassificationInput,
    ) -> Result<ClassificationResult, ClassifyError> {
        if !self.ready.load(Ordering::SeqCst) {
            return Err(ClassifyError::NotReady);
        }

        let start = Instant::now();

        let category = Self::analyze_content(&input.content);
        let confidence = self.rng.lock().gen_range(0.6..1.0);
        let alternatives = self.generate_alternatives(category);
        let data = Self::extract_data(&input.content, category);

        let processing_time_ms = start.elapsed().as_secs_f64() * 1000.0;

        Ok(ClassificationResult {
            category,
            confidence,
            alternatives,
            data,
            metrics: ClassificationMetrics {
                processing_time_ms,
                inference_time_ms: processing_time_ms * 0.8,
            },
        })
    }

    async fn dispose(&self) {
        self.ready.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn ready_classifier() -> HeuristicClassifier {
        let classifier = HeuristicClassifier::with_seed(42);
        classifier.initialize(ModelConfig::default()).await.unwrap();
        classifier
    }

    #[tokio::test]
    async fn test_not_ready_before_initialize() {
        let classifier = HeuristicClassifier::with_seed(1);
        let result = classifier
            .classify(ClassificationInput::new("anything"))
            .await;
        assert_eq!(result.unwrap_err(), ClassifyError::NotReady);
    }

    #[tokio::test]
    async fn test_table_content_yields_table() {
        let classifier = ready_classifier().await;
        let result = classifier
            .classify(ClassificationInput::new(
                "Here is a table with columns and rows of data",
            ))
            .await
            .unwrap();

        assert_eq!(result.category, Category::Table);
        assert!(result.confidence >= 0.5 && result.confidence < 1.0);
        let columns = result.data["columns"].as_array().unwrap();
        assert!(!columns.is_empty());
    }

    #[tokio::test]
    async fn test_non_matching_content_falls_back_to_text() {
        let classifier = ready_classifier().await;
        let result = classifier
            .classify(ClassificationInput::new("xyz qux"))
            .await
            .unwrap();

        assert_eq!(result.category, Category::Text);
        assert_eq!(result.data["content"], "xyz qux");
    }

    #[tokio::test]
    async fn test_priority_order_first_match_wins() {
        // "table" outranks "chart" even when both keywords appear.
        let classifier = ready_classifier().await;
        let result = classifier
            .classify(ClassificationInput::new("a chart next to a table"))
            .await
            .unwrap();
        assert_eq!(result.category, Category::Table);
    }

    #[tokio::test]
    async fn test_list_data_drops_blank_lines() {
        let classifier = ready_classifier().await;
        let result = classifier
            .classify(ClassificationInput::new("item one\n\nitem two\n   \nitem three"))
            .await
            .unwrap();

        assert_eq!(result.category, Category::List);
        let items = result.data["items"].as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], "item one");
    }

    #[tokio::test]
    async fn test_card_data_truncates_content() {
        let classifier = ready_classifier().await;
        let long = format!("summary {}", "x".repeat(400));
        let result = classifier
            .classify(ClassificationInput::new(long))
            .await
            .unwrap();

        assert_eq!(result.category, Category::Card);
        assert_eq!(result.data["title"], "Summary");
        assert_eq!(
            result.data["content"].as_str().unwrap().chars().count(),
            MAX_CARD_CONTENT
        );
    }

    #[tokio::test]
    async fn test_alternatives_exclude_primary() {
        let classifier = ready_classifier().await;
        let result = classifier
            .classify(ClassificationInput::new("a list of items"))
            .await
            .unwrap();

        assert_eq!(result.category, Category::List);
        assert_eq!(result.alternatives.len(), 2);
        for alt in &result.alternatives {
            assert_ne!(alt.category, Category::List);
            assert!(alt.confidence >= 0.2 && alt.confidence < 0.5);
        }
    }

    #[tokio::test]
    async fn test_metrics_are_non_negative() {
        let classifier = ready_classifier().await;
        let result = classifier
            .classify(ClassificationInput::new("hello"))
            .await
            .unwrap();
        assert!(result.metrics.processing_time_ms >= 0.0);
        assert!(result.metrics.inference_time_ms <= result.metrics.processing_time_ms);
    }

    #[tokio::test]
    async fn test_dispose_returns_to_not_ready() {
        let classifier = ready_classifier().await;
        assert!(classifier.is_ready());
        classifier.dispose().await;
        classifier.dispose().await; // idempotent
        let result = classifier.classify(ClassificationInput::new("hi")).await;
        assert_eq!(result.unwrap_err(), ClassifyError::NotReady);
    }
}
