//! Reidemeister moves on planar diagrams.
//!
//! Every move is located by face data, so locators only need the face
//! list. Conventions (shared with [`crate::types`]):
//!
//! - crossing positions run counter-clockwise; 0 and 2 carry the
//!   under-strand, 1 and 3 the over-strand, and a strand passes from
//!   `p` to `p + 2`;
//! - the face successor of `(v, i)` is `twin((v, i + 1))`, so a face
//!   element `e` names the arc `{e, twin(e)}` and the face lies to its
//!   left when walking from `e.node` to `twin(e).node`.
//!
//! | Move      | Location                          | Δ crossings | Δ framing |
//! |-----------|-----------------------------------|-------------|-----------|
//! | R1 remove | 1-face at a crossing              | −1          | ∓1        |
//! | R1 add    | any endpoint + sign               | +1          | +sign     |
//! | R2 unpoke | bigon, two crossings, mixed parity| −2          | 0         |
//! | R2 poke   | two arcs on one face              | +2          | 0         |
//! | R3        | non-alternating triangle          | 0           | 0         |
//!
//! Each move has a lazy locator (`find_*`), a first-match chooser
//! (`choose_*`), a uniform random chooser (`choose_random_*`) and an
//! in-place rewrite (`*_in_place`); [`apply_move`] and
//! [`apply_move_in_place`] dispatch on [`MoveLocation`].

pub mod r1;
pub mod r2;
pub mod r3;
mod splice;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::types::{DiagramError, Endpoint, PlanarDiagram};

pub use r1::{
    choose_r1_add, choose_r1_remove, choose_random_r1_add, choose_random_r1_remove, find_r1_add,
    find_r1_remove, r1_add_in_place, r1_remove_in_place,
};
pub use r2::{
    choose_r2_poke, choose_r2_unpoke, choose_random_r2_poke, choose_random_r2_unpoke,
    find_r2_poke, find_r2_unpoke, r2_poke_in_place, r2_unpoke_in_place,
};
pub use r3::{choose_r3, choose_random_r3, find_r3, r3_in_place};

/// Error type for move application.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    /// The location does not describe a valid move on this diagram.
    #[error("Invalid move location {location}: {reason}")]
    InvalidLocation {
        /// The rejected location.
        location: MoveLocation,
        /// Why it was rejected.
        reason: String,
    },
    /// The diagram is of a kind the moves do not handle.
    #[error("Unsupported diagram: {0}")]
    Unsupported(String),
    /// Structural error while rewriting.
    #[error(transparent)]
    Diagram(#[from] DiagramError),
}

impl MoveError {
    pub(crate) fn invalid(location: &MoveLocation, reason: impl Into<String>) -> Self {
        Self::InvalidLocation {
            location: location.clone(),
            reason: reason.into(),
        }
    }
}

/// Kind of Reidemeister move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MoveKind {
    /// Remove a kink.
    R1Remove,
    /// Add a kink.
    R1Add,
    /// Pull apart a bigon.
    R2Unpoke,
    /// Push one arc across another.
    R2Poke,
    /// Slide a strand across a crossing.
    R3,
}

impl MoveKind {
    /// Change in crossing count.
    pub fn crossing_delta(&self) -> i64 {
        match self {
            Self::R1Remove => -1,
            Self::R1Add => 1,
            Self::R2Unpoke => -2,
            Self::R2Poke => 2,
            Self::R3 => 0,
        }
    }
}

/// A set of allowed move kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveSet(BTreeSet<MoveKind>);

impl MoveSet {
    /// Set of the given kinds.
    pub fn of(kinds: &[MoveKind]) -> Self {
        Self(kinds.iter().copied().collect())
    }

    /// Every move kind.
    pub fn all() -> Self {
        Self::of(&[
            MoveKind::R1Remove,
            MoveKind::R1Add,
            MoveKind::R2Unpoke,
            MoveKind::R2Poke,
            MoveKind::R3,
        ])
    }

    /// Moves that never increase the crossing count.
    pub fn non_increasing() -> Self {
        Self::of(&[MoveKind::R1Remove, MoveKind::R2Unpoke, MoveKind::R3])
    }

    /// Moves that strictly reduce the crossing count.
    pub fn reducing() -> Self {
        Self::of(&[MoveKind::R1Remove, MoveKind::R2Unpoke])
    }

    /// Whether `kind` is allowed.
    pub fn contains(&self, kind: MoveKind) -> bool {
        self.0.contains(&kind)
    }

    /// Allowed kinds in order.
    pub fn iter(&self) -> impl Iterator<Item = MoveKind> + '_ {
        self.0.iter().copied()
    }
}

impl Default for MoveSet {
    fn default() -> Self {
        Self::non_increasing()
    }
}

/// Where a move applies.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MoveLocation {
    /// Remove the kink whose loop bounds the 1-face `[endpoint]`.
    R1Remove {
        /// The single endpoint of the 1-face.
        endpoint: Endpoint,
    },
    /// Insert a kink on the arc of `endpoint`, on the face to its left.
    R1Add {
        /// Endpoint naming the arc.
        endpoint: Endpoint,
        /// +1 or −1.
        sign: i8,
    },
    /// Remove the two crossings of the bigon `face`.
    R2Unpoke {
        /// The bigon's two endpoints.
        face: [Endpoint; 2],
    },
    /// Push the arc of `over` over the arc of `under` inside their common face.
    R2Poke {
        /// Face element naming the arc that passes over.
        over: Endpoint,
        /// Face element naming the arc that passes under.
        under: Endpoint,
    },
    /// Flip the triangle `face`.
    R3 {
        /// The triangle's three endpoints.
        face: [Endpoint; 3],
    },
}

impl MoveLocation {
    /// Kind of the move.
    pub fn kind(&self) -> MoveKind {
        match self {
            Self::R1Remove { .. } => MoveKind::R1Remove,
            Self::R1Add { .. } => MoveKind::R1Add,
            Self::R2Unpoke { .. } => MoveKind::R2Unpoke,
            Self::R2Poke { .. } => MoveKind::R2Poke,
            Self::R3 { .. } => MoveKind::R3,
        }
    }
}

impl fmt::Display for MoveLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::R1Remove { endpoint } => write!(f, "R1-({endpoint})"),
            Self::R1Add { endpoint, sign } => write!(f, "R1+({endpoint}, {sign:+})"),
            Self::R2Unpoke { face } => write!(f, "R2-({} {})", face[0], face[1]),
            Self::R2Poke { over, under } => write!(f, "R2+({over} over {under})"),
            Self::R3 { face } => write!(f, "R3({} {} {})", face[0], face[1], face[2]),
        }
    }
}

/// Options for move application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOptions {
    /// Run [`PlanarDiagram::sanity_check`] after every move.
    pub sanity_check: bool,
}

impl MoveOptions {
    /// Options with post-move sanity checks enabled.
    pub fn checked() -> Self {
        Self { sanity_check: true }
    }
}

fn ensure_supported(k: &PlanarDiagram) -> Result<(), MoveError> {
    if k.is_oriented() {
        return Err(MoveError::Unsupported(
            "moves on oriented diagrams".to_string(),
        ));
    }
    Ok(())
}

/// Apply a move to `k` in place.
pub fn apply_move_in_place(
    k: &mut PlanarDiagram,
    location: &MoveLocation,
    options: &MoveOptions,
) -> Result<(), MoveError> {
    ensure_supported(k)?;
    match location {
        MoveLocation::R1Remove { endpoint } => r1_remove_in_place(k, endpoint)?,
        MoveLocation::R1Add { endpoint, sign } => r1_add_in_place(k, endpoint, *sign)?,
        MoveLocation::R2Unpoke { face } => r2_unpoke_in_place(k, face)?,
        MoveLocation::R2Poke { over, under } => r2_poke_in_place(k, over, under)?,
        MoveLocation::R3 { face } => r3_in_place(k, face)?,
    }
    trace!(%location, crossings = k.crossing_count(), "applied move");
    if options.sanity_check {
        k.sanity_check()?;
    }
    Ok(())
}

/// Copy of `k` with a move applied.
pub fn apply_move(
    k: &PlanarDiagram,
    location: &MoveLocation,
    options: &MoveOptions,
) -> Result<PlanarDiagram, MoveError> {
    let mut result = k.clone();
    apply_move_in_place(&mut result, location, options)?;
    Ok(result)
}

/// Every location of every allowed move kind, grouped by kind.
pub fn find_moves(k: &PlanarDiagram, moves: &MoveSet) -> Result<Vec<MoveLocation>, MoveError> {
    let mut found = Vec::new();
    for kind in moves.iter() {
        match kind {
            MoveKind::R1Remove => found.extend(find_r1_remove(k)?),
            MoveKind::R1Add => found.extend(find_r1_add(k)),
            MoveKind::R2Unpoke => found.extend(find_r2_unpoke(k)?),
            MoveKind::R2Poke => found.extend(find_r2_poke(k)?),
            MoveKind::R3 => found.extend(find_r3(k)?),
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::parse_native;

    #[test]
    fn test_move_set_contents() {
        let set = MoveSet::reducing();
        assert!(set.contains(MoveKind::R1Remove));
        assert!(!set.contains(MoveKind::R3));
        assert_eq!(MoveSet::all().iter().count(), 5);
    }

    #[test]
    fn test_trefoil_has_no_reducing_moves() {
        let k = parse_native("a=X(b3 c0 c3 b0) b=X(a3 c2 c1 a0) c=X(a1 b2 b1 a2)").unwrap();
        assert!(find_moves(&k, &MoveSet::non_increasing()).unwrap().is_empty());
    }

    #[test]
    fn test_oriented_diagrams_unsupported() {
        let k = parse_native("a=V(a1:out a0:in)").unwrap();
        let location = MoveLocation::R1Add {
            endpoint: Endpoint::new("a", 0),
            sign: 1,
        };
        assert!(matches!(
            apply_move(&k, &location, &MoveOptions::default()),
            Err(MoveError::Unsupported(_))
        ));
    }

    #[test]
    fn test_location_display() {
        let location = MoveLocation::R1Add {
            endpoint: Endpoint::new("a", 2),
            sign: -1,
        };
        assert_eq!(location.to_string(), "R1+(a2, -1)");
        assert_eq!(location.kind().crossing_delta(), 1);
    }
}
