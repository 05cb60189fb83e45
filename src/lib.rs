//! # planar-diagram-kernel
//!
//! Planar diagrams of knots, links and spatial graphs.
//!
//! The kernel answers one question:
//!
//! > Given two diagrams, are they the **same diagram**, and can one be
//! > **moved into** the other?
//!
//! ## Core Contract
//!
//! 1. Model a diagram as nodes with cyclically ordered endpoint slots,
//!    paired into arcs, and check its invariants on demand
//! 2. Produce a **canonical form** that serves as the equality and hash key
//!    of a diagram up to relabeling and allowed rotations
//! 3. Rewrite diagrams with Reidemeister moves and search the move space
//!    for simpler or common representatives
//!
//! ## Architecture
//!
//! ```text
//! notation ──parse──▶ PlanarDiagram ──canonical──▶ canonical form ──▶ hash / fingerprint
//!                          │                             ▲
//!                          ▼                             │
//!                    moves (R1, R2, R3) ──▶ search (strategies, equivalence, batches)
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Nodes are stored in label order; every derived view iterates in it
//! - Same diagram up to relabeling → identical canonical form and hashes
//! - Searches with `MoveChoice::First` are fully reproducible

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod disjoint_set;
pub mod canonical;
pub mod notation;
pub mod moves;
pub mod search;

// Re-exports
pub use types::{
    Attributes, DiagramError, Endpoint, EndpointKind, Face, Node, NodeId, NodeKind,
    PlanarDiagram, SanityViolation, Slot, CROSSING_DEGREE,
};
pub use disjoint_set::DisjointSet;
pub use canonical::{
    canonical, canonical_hash, canonical_hash_hex, fingerprint, is_canonical,
    verify_fingerprint, CanonicalError, FINGERPRINT_VERSION,
};
pub use notation::{parse_native, to_native, NotationError};
pub use moves::{
    apply_move, apply_move_in_place, find_moves, MoveError, MoveKind, MoveLocation,
    MoveOptions, MoveSet,
};

// Search re-exports
pub use search::{
    are_equivalent, are_equivalent_strict, canonical_batch, reduce_equivalent, simplify,
    simplify_batch, BatchEntry, BatchResult, BudgetKind, CacheConfig, CacheStats,
    CanonicalCache, LeveledSet, MoveChoice, Reduction, SearchConfig, SearchError,
    SearchReport, SearchStatus, SimplificationStrategy, Strategy,
};

/// Schema version of serialized reports and batch results.
/// Increment on breaking changes to any serialized type.
pub const PD_KERNEL_SCHEMA_VERSION: &str = "1.0.0";

/// Default search configuration version identifier.
pub const DEFAULT_SEARCH_VERSION: &str = "search_config_v1";
