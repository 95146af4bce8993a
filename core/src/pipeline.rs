//! Selection Pipeline
//!
//! Orchestrates one adaptive-render request: classify the content, let the
//! bandit confirm or override the suggestion, and package the final category
//! with the classifier's data. Classifier failures degrade to a configured
//! fallback category instead of surfacing to the caller — a failed
//! classification must never break rendering.
//!
//! Analytics is an external collaborator: the pipeline emits events with a
//! fixed shape through [`AnalyticsSink`] and never stores them itself.

use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::bandit::{BanditState, ThompsonSampler};
use crate::category::Category;
use crate::classifier::Classifier;
use crate::types::ClassificationInput;

/// Kind of analytics event emitted by the pipeline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A category was selected for rendering
    Render,
    /// Timing and confidence for a completed classification
    Performance,
    /// Classification failed and the fallback was used
    Error,
    /// User feedback reached the bandit
    Feedback,
}

/// The fixed event shape handed to the analytics collaborator
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    /// What happened
    pub kind: EventKind,
    /// Category the event concerns
    pub category: Category,
    /// When it happened
    pub timestamp: DateTime<Utc>,
    /// Event-specific payload
    pub data: serde_json::Value,
}

impl AnalyticsEvent {
    fn now(kind: EventKind, category: Category, data: serde_json::Value) -> Self {
        Self {
            kind,
            category,
            timestamp: Utc::now(),
            data,
        }
    }
}

/// Receiver for pipeline analytics events
///
/// The event log itself (storage, batching, export) lives outside this
/// crate; the pipeline only calls `record`.
pub trait AnalyticsSink: Send + Sync {
    /// Record one event
    fn record(&self, event: AnalyticsEvent);
}

/// Sink that discards every event
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl AnalyticsSink for NullSink {
    fn record(&self, _event: AnalyticsEvent) {}
}

/// The final outcome of one selection request
#[derive(Clone, Debug)]
pub struct Selection {
    /// Category actually chosen for rendering
    pub category: Category,
    /// Structured data payload for the presentation layer
    pub data: serde_json::Value,
    /// Classifier confidence (0.0 when the fallback was used)
    pub confidence: f64,
    /// The classifier's original suggestion, if classification succeeded
    pub suggested: Option<Category>,
    /// Whether the fallback category was used
    pub fallback: bool,
}

/// Per-request orchestration of classifier and bandit
///
/// Generic over the classifier so the remote gateway and the local heuristic
/// are interchangeable. Owns the bandit behind a mutex; feedback and
/// selection may arrive from different tasks.
pub struct SelectionPipeline<C> {
    classifier: C,
    sampler: Mutex<ThompsonSampler>,
    fallback: Category,
    analytics: Box<dyn AnalyticsSink>,
}

impl<C: Classifier> SelectionPipeline<C> {
    /// Create a pipeline with an entropy-seeded bandit and no analytics
    pub fn new(classifier: C, fallback: Category) -> Self {
        Self {
            classifier,
            sampler: Mutex::new(ThompsonSampler::new()),
            fallback,
            analytics: Box::new(NullSink),
        }
    }

    /// Replace the bandit, e.g. with a seeded one for deterministic tests
    #[must_use]
    pub fn with_sampler(mut self, sampler: ThompsonSampler) -> Self {
        self.sampler = Mutex::new(sampler);
        self
    }

    /// Attach an analytics sink
    #[must_use]
    pub fn with_analytics(mut self, sink: Box<dyn AnalyticsSink>) -> Self {
        self.analytics = sink;
        self
    }

    /// Access the wrapped classifier
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Run one selection: classify, sample, package
    ///
    /// Never fails: a classifier error degrades to the fallback category and
    /// an `Error` analytics event.
    pub async fn select(&self, input: ClassificationInput) -> Selection {
        let content = input.content.clone();
        let start = Instant::now();

        match self.classifier.classify(input).await {
            Ok(result) => {
                let selected = self.sampler.lock().select(result.category);

                self.analytics.record(AnalyticsEvent::now(
                    EventKind::Performance,
                    result.category,
                    json!({
                        "processing_time_ms": start.elapsed().as_secs_f64() * 1000.0,
                        "confidence": result.confidence,
                    }),
                ));
                self.analytics.record(AnalyticsEvent::now(
                    EventKind::Render,
                    selected,
                    json!({
                        "original_classification": result.category,
                        "confidence": result.confidence,
                    }),
                ));

                let data = if result.data.is_null() {
                    json!({ "content": content })
                } else {
                    result.data
                };

                Selection {
                    category: selected,
                    data,
                    confidence: result.confidence,
                    suggested: Some(result.category),
                    fallback: false,
                }
            }
            Err(err) => {
                warn!(error = %err, "classification failed, using fallback category");
                self.analytics.record(AnalyticsEvent::now(
                    EventKind::Error,
                    self.fallback,
                    json!({ "error": err.to_string() }),
                ));

                Selection {
                    category: self.fallback,
                    data: json!({ "content": content }),
                    confidence: 0.0,
                    suggested: None,
                    fallback: true,
                }
            }
        }
    }

    /// Report whether a previously selected category performed well
    pub fn record_feedback(&self, category: Category, success: bool) {
        self.sampler.lock().update(category, success);
        self.analytics.record(AnalyticsEvent::now(
            EventKind::Feedback,
            category,
            json!({ "success": success }),
        ));
    }

    /// Read-only snapshot of all bandit states
    #[must_use]
    pub fn bandit_states(&self) -> Vec<BanditState> {
        self.sampler.lock().states()
    }
}
