//! Engine configuration.

use crate::engine::SizePreferences;
use crate::types::{PlacementError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do with a partition part that has no `width x height` factorization
/// within the grid bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorizationFallback {
    /// Discard the whole partition.
    #[default]
    Reject,
    /// Substitute a 1x1 placeholder. The resulting layout covers fewer cells
    /// than the partition asked for and the difference shows up as waste.
    UnitPlaceholder,
}

/// Limits on the reorganization search. `None` / `0` mean unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchBudget {
    /// Maximum number of integer partitions generated.
    pub max_partitions: Option<usize>,

    /// Maximum number of candidate layouts recorded.
    pub max_candidates: Option<usize>,

    /// Wall-clock limit in milliseconds (0 = unlimited).
    pub time_limit_ms: u64,
}

impl SearchBudget {
    /// Exhaustive search, as in the reference algorithm.
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_max_partitions(mut self, max: usize) -> Self {
        self.max_partitions = Some(max);
        self
    }

    pub fn with_max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = Some(max);
        self
    }

    pub fn with_time_limit(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    pub fn time_limit(&self) -> Option<Duration> {
        (self.time_limit_ms > 0).then(|| Duration::from_millis(self.time_limit_ms))
    }
}

/// Largest grid side accepted unless configured otherwise.
pub const DEFAULT_MAX_GRID_SIZE: usize = 16;

/// Common configuration for the placement engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub budget: SearchBudget,
    pub factorization_fallback: FactorizationFallback,
    pub preferences: SizePreferences,
    /// Grids with a larger side are rejected as invalid input.
    pub max_grid_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            budget: SearchBudget::default(),
            factorization_fallback: FactorizationFallback::default(),
            preferences: SizePreferences::default(),
            max_grid_size: DEFAULT_MAX_GRID_SIZE,
        }
    }
}

impl EngineConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reorganization search budget.
    pub fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Sets how unfactorizable partition parts are handled.
    pub fn with_fallback(mut self, fallback: FactorizationFallback) -> Self {
        self.factorization_fallback = fallback;
        self
    }

    /// Replaces the content-type preference table.
    pub fn with_preferences(mut self, preferences: SizePreferences) -> Self {
        self.preferences = preferences;
        self
    }

    /// Sets the largest accepted grid side.
    pub fn with_max_grid_size(mut self, max: usize) -> Self {
        self.max_grid_size = max;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_grid_size == 0 {
            return Err(PlacementError::InvalidConfig(
                "maxGridSize must be at least 1".to_string(),
            ));
        }
        if self.budget.max_candidates == Some(0) {
            return Err(PlacementError::InvalidConfig(
                "maxCandidates must be at least 1".to_string(),
            ));
        }
        if self.budget.max_partitions == Some(0) {
            return Err(PlacementError::InvalidConfig(
                "maxPartitions must be at least 1".to_string(),
            ));
        }
        self.preferences.validate()
    }
}
