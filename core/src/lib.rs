//! Pivot Core - Adaptive UI Classification and Selection
//!
//! This crate classifies a piece of text content into one of a fixed set of
//! UI presentation categories and learns, from user feedback, which category
//! actually performs best for similar content — correcting for a classifier
//! that is approximate or wrong. It is completely independent of any
//! rendering technology: the output is always a [`Category`] plus structured
//! data, never a renderable object.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     SelectionPipeline                        │
//! │                                                              │
//! │  content ──> Classifier ──> suggestion ──> ThompsonSampler   │
//! │                  │                              │            │
//! │                  │                              v            │
//! │                  │                     final Category + data │
//! │                  │                                           │
//! │        ┌────────┴─────────┐           feedback (async)      │
//! │        │                  │                 │                │
//! │  HeuristicClassifier  ClassifierGateway <───┘                │
//! │   (in-process)         (remote, correlated async RPC)        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Data flows one way per request: content → classifier → suggested category
//! → bandit → final category. Feedback flows the opposite direction,
//! asynchronously, whenever the caller later reports success or failure for
//! a previously selected category.
//!
//! # Key Types
//!
//! - [`Category`]: the fixed, closed catalog of presentation categories
//! - [`Classifier`]: the pluggable classification contract
//! - [`HeuristicClassifier`]: in-process keyword reference classifier
//! - [`ClassifierGateway`]: async gateway to an out-of-process classifier
//! - [`ThompsonSampler`]: the multi-armed-bandit component selector
//! - [`SelectionPipeline`]: orchestrates one selection end to end
//!
//! # Quick Start
//!
//! ```ignore
//! use pivot_core::{
//!     Category, ClassificationInput, HeuristicClassifier, ModelConfig,
//!     SelectionPipeline,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let classifier = HeuristicClassifier::new();
//!     classifier.initialize(ModelConfig::default()).await.unwrap();
//!
//!     let pipeline = SelectionPipeline::new(classifier, Category::Text);
//!
//!     let selection = pipeline
//!         .select(ClassificationInput::new("a table with rows and columns"))
//!         .await;
//!
//!     // Render selection.category with selection.data, then report back:
//!     pipeline.record_feedback(selection.category, true);
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`category`]: the category catalog and similarity relation
//! - [`types`]: classification input/output contracts
//! - [`classifier`]: the classifier trait, error taxonomy, and heuristic
//! - [`bandit`]: Thompson-sampling selector and belief state
//! - [`gateway`]: correlated async RPC to a remote classifier
//! - [`pipeline`]: per-request orchestration and the analytics boundary
//! - [`config`]: TOML + environment configuration loading
//!
//! # No Rendering Dependencies
//!
//! This crate has **zero** dependencies on any UI framework. Presentation
//! widgets, the analytics event log, and host application wiring are
//! external collaborators that consume this crate's outputs.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bandit;
pub mod category;
pub mod classifier;
pub mod config;
pub mod gateway;
pub mod pipeline;
pub mod types;

// Re-exports for convenience
pub use bandit::{BanditState, ThompsonSampler};
pub use category::Category;
pub use classifier::{Classifier, ClassifyError, HeuristicClassifier};
pub use config::{default_config_path, load_config, load_config_from_path, ConfigError, PivotConfig};
pub use gateway::{
    ChannelTransport, ClassifierGateway, ClassifierTransport, ClassifyRequest, ClassifyResponse,
    FramedTransport, GatewayConfig, GatewayState, RequestId, TransportError,
};
pub use pipeline::{
    AnalyticsEvent, AnalyticsSink, EventKind, NullSink, Selection, SelectionPipeline,
};
pub use types::{
    Alternative, ClassificationContext, ClassificationInput, ClassificationMetrics,
    ClassificationResult, ModelConfig, Preferences,
};
