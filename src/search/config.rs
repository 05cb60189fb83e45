//! Search configuration.
//!
//! A [`SearchConfig`] is a plain value threaded into every search entry
//! point. Two configs with equal parameters hash to the same
//! [`SearchConfig::params_hash`], so batch results can record exactly
//! which settings produced them.

use serde::{Deserialize, Serialize};

use crate::canonical::content_hash_hex;
use crate::moves::{MoveOptions, MoveSet};
use crate::DEFAULT_SEARCH_VERSION;

/// How a strategy picks among several applicable moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveChoice {
    /// Always the first location in locator order (deterministic).
    #[default]
    First,
    /// Uniformly at random from a seeded generator.
    Random {
        /// Generator seed.
        seed: u64,
    },
}

/// Parameters of the move-space search.
///
/// ## Budgets
///
/// - `max_depth`: BFS levels explored per non-increasing pass
/// - `max_diagrams`: canonical forms computed over the whole search
/// - `max_moves`: moves applied over the whole search
/// - `max_detours`: poke-and-flip detours tried by the smart strategy
/// - `max_extra_crossings`: how far above the best crossing count a
///   detour may climb
/// - `time_budget_ms`: wall-clock limit, `None` for unlimited
///
/// Running out of a budget is reported in the search status, never as an
/// error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Configuration version identifier.
    pub version: String,
    /// Move kinds the search may use.
    pub moves: MoveSet,
    /// Keep the framing through moves; when off, inputs are unframed first.
    pub track_framing: bool,
    /// Only accept diagrams whose vertices have degree at most 3.
    pub trivalent_only: bool,
    /// Run the sanity check after every move.
    pub sanity_check: bool,
    /// Maximum BFS depth per non-increasing pass.
    pub max_depth: usize,
    /// Maximum number of diagrams canonicalized.
    pub max_diagrams: usize,
    /// Maximum number of moves applied.
    pub max_moves: usize,
    /// Maximum number of detours.
    pub max_detours: usize,
    /// Crossings a detour may add above the current best.
    pub max_extra_crossings: usize,
    /// Wall-clock budget in milliseconds.
    pub time_budget_ms: Option<u64>,
    /// Move choice for the crossing-reducing pass.
    pub choice: MoveChoice,
}

impl SearchConfig {
    /// Compute a hash of the search parameters.
    pub fn params_hash(&self) -> String {
        content_hash_hex(self)
    }

    /// Move-level options derived from this config.
    pub fn move_options(&self) -> MoveOptions {
        MoveOptions {
            sanity_check: self.sanity_check,
        }
    }

    /// Config with a different move choice.
    pub fn with_choice(mut self, choice: MoveChoice) -> Self {
        self.choice = choice;
        self
    }

    /// Create a small config for testing.
    #[cfg(test)]
    pub fn minimal() -> Self {
        Self {
            version: DEFAULT_SEARCH_VERSION.to_string(),
            moves: MoveSet::all(),
            track_framing: true,
            trivalent_only: false,
            sanity_check: true,
            max_depth: 3,
            max_diagrams: 500,
            max_moves: 2_000,
            max_detours: 20,
            max_extra_crossings: 2,
            time_budget_ms: None,
            choice: MoveChoice::First,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_SEARCH_VERSION.to_string(),
            moves: MoveSet::all(),
            track_framing: true,
            trivalent_only: false,
            sanity_check: false,
            max_depth: 8,
            max_diagrams: 20_000,
            max_moves: 200_000,
            max_detours: 200,
            max_extra_crossings: 2,
            time_budget_ms: Some(10_000),
            choice: MoveChoice::First,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_hash_determinism() {
        let config1 = SearchConfig::default();
        let config2 = SearchConfig::default();

        assert_eq!(config1.params_hash(), config2.params_hash());
    }

    #[test]
    fn test_params_hash_changes() {
        let config1 = SearchConfig::default();
        let mut config2 = SearchConfig::default();
        config2.max_depth = 3;

        assert_ne!(config1.params_hash(), config2.params_hash());

        let config3 = SearchConfig::default().with_choice(MoveChoice::Random { seed: 1 });
        assert_ne!(config1.params_hash(), config3.params_hash());
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = SearchConfig::minimal();
        let json = serde_json::to_string(&config).unwrap();
        let back: SearchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert!(back.move_options().sanity_check);
    }
}
