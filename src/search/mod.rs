//! Move-space search: simplification strategies, equivalence reduction
//! and parallel batches.
//!
//! ```text
//!   input ──prepare──▶ crossing-reducing pass ──canonical──▶ level 0
//!                                                              │
//!        ┌──────────── R3 on every diagram of the last level ◀─┘
//!        ▼
//!   crossing-reducing pass ──canonical──▶ new level (unseen only)
//!        │
//!        └─▶ repeat until a level is empty or a budget runs out
//! ```
//!
//! Every search works on its own copies and returns canonical forms.
//! Running out of a budget is not an error: reports carry
//! [`SearchStatus::BudgetExhausted`] together with the best diagram found.

pub mod batch;
pub mod cache;
pub mod config;
pub mod equivalence;
pub mod leveled;
pub mod strategy;

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::canonical::CanonicalError;
use crate::moves::MoveError;
use crate::types::{DiagramError, PlanarDiagram};

pub use batch::{canonical_batch, simplify_batch, BatchEntry, BatchResult};
pub use cache::{CacheConfig, CacheStats, CanonicalCache};
pub use config::{MoveChoice, SearchConfig};
pub use equivalence::{are_equivalent, are_equivalent_strict, reduce_equivalent, Reduction};
pub use leveled::LeveledSet;
pub use strategy::{
    simplify, CrossingReducing, NonIncreasing, SimplificationStrategy, Smart, Strategy,
};

/// Error type for search operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// A budget ran out where a definite answer was required.
    #[error("Search budget exhausted: {budget}")]
    ResourceExhausted {
        /// The budget that ran out.
        budget: BudgetKind,
    },
    /// The diagram cannot be searched under this configuration.
    #[error("Unsupported diagram: {0}")]
    UnsupportedDiagram(String),
    /// A configuration value could not be understood.
    #[error("Invalid search configuration: {0}")]
    InvalidConfig(String),
    /// Move failure.
    #[error(transparent)]
    Move(#[from] MoveError),
    /// Canonicalization failure.
    #[error(transparent)]
    Canonical(#[from] CanonicalError),
    /// Structural failure.
    #[error(transparent)]
    Diagram(#[from] DiagramError),
}

/// Which budget ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetKind {
    /// BFS depth.
    Depth,
    /// Canonical forms computed.
    Diagrams,
    /// Moves applied.
    Moves,
    /// Smart-strategy detours.
    Detours,
    /// Wall-clock time.
    Time,
}

impl std::fmt::Display for BudgetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Depth => "max_depth",
            Self::Diagrams => "max_diagrams",
            Self::Moves => "max_moves",
            Self::Detours => "max_detours",
            Self::Time => "time_budget_ms",
        };
        write!(f, "{s}")
    }
}

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchStatus {
    /// Every reachable diagram within the move set was explored.
    Complete,
    /// A budget ran out; the result is the best found so far.
    BudgetExhausted {
        /// The first budget that ran out.
        budget: BudgetKind,
    },
}

impl SearchStatus {
    /// Whether the search ran to completion.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Outcome of a simplification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReport {
    /// Schema version of this report ([`crate::PD_KERNEL_SCHEMA_VERSION`]).
    pub schema_version: String,
    /// Strategy name.
    pub strategy: String,
    /// Best diagram found, in canonical form.
    pub best: PlanarDiagram,
    /// Crossings of the input.
    pub initial_crossings: usize,
    /// Crossings of `best`.
    pub final_crossings: usize,
    /// How the search ended.
    pub status: SearchStatus,
    /// Canonical forms computed.
    pub explored: usize,
    /// Moves applied.
    pub moves: usize,
    /// Detours tried.
    pub detours: usize,
    /// Wall-clock time in milliseconds.
    pub elapsed_ms: u64,
}

/// Budget accounting shared by the passes of one search.
#[derive(Debug)]
pub(crate) struct Meter<'a> {
    config: &'a SearchConfig,
    started: Instant,
    pub(crate) diagrams: usize,
    pub(crate) moves: usize,
    pub(crate) detours: usize,
    exhausted: Option<BudgetKind>,
}

impl<'a> Meter<'a> {
    pub(crate) fn new(config: &'a SearchConfig) -> Self {
        Self {
            config,
            started: Instant::now(),
            diagrams: 0,
            moves: 0,
            detours: 0,
            exhausted: None,
        }
    }

    /// The first hard budget that has run out, recording it.
    pub(crate) fn check(&mut self) -> Option<BudgetKind> {
        let hit = if self.diagrams >= self.config.max_diagrams {
            Some(BudgetKind::Diagrams)
        } else if self.moves >= self.config.max_moves {
            Some(BudgetKind::Moves)
        } else if self
            .config
            .time_budget_ms
            .is_some_and(|ms| self.started.elapsed() >= Duration::from_millis(ms))
        {
            Some(BudgetKind::Time)
        } else {
            None
        };
        if let Some(budget) = hit {
            self.record(budget);
        }
        hit
    }

    /// Record a soft budget (depth, detours) without stopping.
    pub(crate) fn record(&mut self, budget: BudgetKind) {
        if self.exhausted.is_none() {
            warn!(%budget, diagrams = self.diagrams, moves = self.moves, "search budget exhausted");
            self.exhausted = Some(budget);
        }
    }

    pub(crate) fn exhausted(&self) -> Option<BudgetKind> {
        self.exhausted
    }

    pub(crate) fn status(&self) -> SearchStatus {
        match self.exhausted {
            Some(budget) => SearchStatus::BudgetExhausted { budget },
            None => SearchStatus::Complete,
        }
    }

    pub(crate) fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Copy of `k` ready for searching under `config`.
pub(crate) fn prepare(k: &PlanarDiagram, config: &SearchConfig) -> Result<PlanarDiagram, SearchError> {
    if k.is_oriented() {
        return Err(SearchError::UnsupportedDiagram(
            "oriented diagrams".to_string(),
        ));
    }
    if config.trivalent_only {
        if let Some((id, node)) = k
            .node_entries()
            .find(|(_, n)| !n.is_crossing() && n.degree() > 3)
        {
            return Err(SearchError::UnsupportedDiagram(format!(
                "vertex {id} has degree {} in a trivalent-only search",
                node.degree()
            )));
        }
    }
    let mut prepared = k.clone();
    if !config.track_framing {
        prepared.set_framing(None);
    }
    Ok(prepared)
}
