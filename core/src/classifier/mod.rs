//! Classifier Boundary
//!
//! The pluggable classifier contract and its error taxonomy. Two
//! implementations ship with the crate:
//!
//! - [`HeuristicClassifier`](heuristic::HeuristicClassifier): in-process
//!   keyword heuristic, used as a deterministic test vehicle and as the
//!   fallback when no remote classifier is available
//! - [`ClassifierGateway`](crate::gateway::ClassifierGateway): bridges to an
//!   out-of-process classifier over the classify wire protocol
//!
//! The selection pipeline only ever sees this trait, so the two are
//! interchangeable.

pub mod heuristic;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{ClassificationInput, ClassificationResult, ModelConfig};

pub use heuristic::HeuristicClassifier;

/// Errors produced by classifiers and the classify gateway
///
/// Cloneable so a single teardown can fan the same error out to every
/// pending request.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    /// Classifier used before initialization completed
    #[error("classifier not ready; call initialize() first")]
    NotReady,

    /// Initialization did not complete within the deadline
    #[error("classifier initialization timed out")]
    InitTimeout,

    /// Initialization failed
    #[error("classifier initialization failed: {0}")]
    Init(String),

    /// No response arrived within the per-request deadline
    #[error("classification request timed out")]
    Timeout,

    /// The remote classifier reported a failure
    #[error("remote classifier error: {0}")]
    Remote(String),

    /// The request was outstanding when the gateway was disposed
    #[error("classifier disposed")]
    Disposed,

    /// The underlying transport failed
    #[error("classifier transport failure: {0}")]
    Transport(String),

    /// The local classifier could not produce a result
    ///
    /// Reserved for pluggable model-backed classifiers; the reference
    /// heuristic never emits it.
    #[error("inference failed: {0}")]
    Inference(String),
}

/// A pluggable content classifier
///
/// Implementations must be safe to share across tasks; interior mutability
/// is the implementation's concern.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Prepare the classifier for use
    ///
    /// Must complete before [`classify`](Classifier::classify) is called.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::InitTimeout`] or [`ClassifyError::Init`] when
    /// initialization cannot complete.
    async fn initialize(&self, config: ModelConfig) -> Result<(), ClassifyError>;

    /// Classify a piece of content
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::NotReady`] before initialization, or any of
    /// the taxonomy's request-level failures.
    async fn classify(
        &self,
        input: ClassificationInput,
    ) -> Result<ClassificationResult, ClassifyError>;

    /// Release resources held by the classifier
    ///
    /// Idempotent. After disposal the classifier rejects further
    /// classification with [`ClassifyError::NotReady`] (heuristic) or
    /// [`ClassifyError::Disposed`] (gateway).
    async fn dispose(&self);
}
