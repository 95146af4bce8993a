//! Thompson-Sampling Component Selector
//!
//! Multi-armed bandit that learns, from binary user feedback, which category
//! actually performs best for similar content — correcting for a classifier
//! that is approximate or wrong.
//!
//! # Selection Flow
//!
//! ```text
//! 1. Candidate set = suggested category + its similarity neighbors
//! 2. Draw one Beta(successes, failures) sample per candidate
//! 3. Pick the candidate with the strictly greatest sample
//! ```
//!
//! Selection is stochastic by design: repeated calls with identical state may
//! return different categories. Construct with [`ThompsonSampler::with_seed`]
//! for deterministic tests.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Belief state for one category arm
///
/// Both counts start at 1 (optimistic symmetric prior) and only ever grow.
/// One state exists per catalog entry for the process lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanditState {
    /// The category this arm tracks
    pub category: Category,
    /// Positive feedback count (>= 1)
    pub successes: u64,
    /// Negative feedback count (>= 1)
    pub failures: u64,
    /// When feedback last touched this arm
    pub last_updated: DateTime<Utc>,
}

impl BanditState {
    fn prior(category: Category) -> Self {
        Self {
            category,
            successes: 1,
            failures: 1,
            last_updated: Utc::now(),
        }
    }
}

/// Thompson-sampling selector over the category catalog
///
/// Owns its state map and rng exclusively; callers needing shared access
/// wrap it in a mutex (see [`SelectionPipeline`](crate::pipeline::SelectionPipeline)).
pub struct ThompsonSampler {
    states: HashMap<Category, BanditState>,
    rng: StdRng,
}

impl ThompsonSampler {
    /// Create a sampler with an entropy-seeded rng
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create a sampler with a fixed rng seed, for deterministic tests
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let states = Category::ALL
            .iter()
            .map(|c| (*c, BanditState::prior(*c)))
            .collect();
        Self { states, rng }
    }

    /// Select the category to actually show for a suggestion
    ///
    /// The candidate set is the suggested category plus its similarity
    /// neighbors, evaluated in that order. Ties keep the first-seen
    /// candidate, so the suggestion wins any tie for the maximum. A
    /// candidate missing from the state map is skipped silently.
    pub fn select(&mut self, suggested: Category) -> Category {
        let mut best = suggested;
        let mut best_sample = f64::NEG_INFINITY;

        let candidates = std::iter::once(suggested).chain(suggested.related().iter().copied());
        for candidate in candidates {
            let Some((successes, failures)) = self
                .states
                .get(&candidate)
                .map(|s| (s.successes, s.failures))
            else {
                continue;
            };

            let sample = self.sample_beta(successes as f64, failures as f64);
            if sample > best_sample {
                best_sample = sample;
                best = candidate;
            }
        }

        best
    }

    /// Incorporate binary feedback for a category
    ///
    /// Increments the matching counter and refreshes the timestamp. The
    /// catalog is closed, so every category has an arm.
    pub fn update(&mut self, category: Category, success: bool) {
        if let Some(state) = self.states.get_mut(&category) {
            if success {
                state.successes += 1;
            } else {
                state.failures += 1;
            }
            state.last_updated = Utc::now();
        }
    }

    /// Snapshot of all arm states, in catalog order
    ///
    /// The snapshot is a copy: later feedback is not observable through it.
    #[must_use]
    pub fn states(&self) -> Vec<BanditState> {
        Category::ALL
            .iter()
            .filter_map(|c| self.states.get(c).copied())
            .collect()
    }

    /// Current state of a single arm
    #[must_use]
    pub fn state(&self, category: Category) -> Option<BanditState> {
        self.states.get(&category).copied()
    }

    /// Draw one sample from Beta(alpha, beta) via two Gamma draws
    fn sample_beta(&mut self, alpha: f64, beta: f64) -> f64 {
        let x = self.sample_gamma(alpha);
        let y = self.sample_gamma(beta);
        x / (x + y)
    }

    /// Draw one sample from Gamma(shape)
    ///
    /// For shape >= 1: sum of floor(shape) exponential draws plus a
    /// fractional-weighted extra draw. For shape < 1: Gamma(shape) =
    /// Gamma(shape + 1) * U^(1/shape).
    fn sample_gamma(&mut self, shape: f64) -> f64 {
        if shape < 1.0 {
            let u = self.uniform_open();
            return self.sample_gamma(shape + 1.0) * u.powf(1.0 / shape);
        }

        let whole = shape.floor() as u64;
        let mut sum = 0.0;
        for _ in 0..whole {
            sum += -self.uniform_open().ln();
        }

        let fractional = shape - shape.floor();
        if fractional > 0.0 {
            sum += -self.uniform_open().ln() * fractional;
        }

        sum
    }

    /// Uniform draw in (0, 1]; never 0, so ln() stays finite
    fn uniform_open(&mut self) -> f64 {
        1.0 - self.rng.gen::<f64>()
    }
}

impl Default for ThompsonSampler {
    fn default() -> Self {
        Self::new()
    }
}
