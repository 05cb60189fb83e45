//! Node types for planar diagrams.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::endpoint::Slot;

/// Identifier of a node in a planar diagram.
///
/// Ordered shortlex: shorter labels sort first, equal lengths compare
/// bytewise. Generated labels (`a`, ..., `z`, `aa`, `ab`, ...) therefore
/// sort in generation order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node id from any string-like token.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The `index`-th generated label: `a`, ..., `z`, `aa`, `ab`, ...
    pub fn from_index(index: usize) -> Self {
        let mut n = index + 1;
        let mut bytes = Vec::new();
        while n > 0 {
            n -= 1;
            bytes.push(b'a' + (n % 26) as u8);
            n /= 26;
        }
        bytes.reverse();
        Self(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Get the label as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is empty (the "no node" id).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the id can name a node.
    ///
    /// Valid ids match `[A-Za-z_][A-Za-z0-9_]*` and do not end in a digit,
    /// so an id followed by a position always reads back unambiguously.
    pub fn is_valid(&self) -> bool {
        let bytes = self.0.as_bytes();
        match (bytes.first(), bytes.last()) {
            (Some(first), Some(last)) => {
                (first.is_ascii_alphabetic() || *first == b'_')
                    && !last.is_ascii_digit()
                    && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'_')
            }
            _ => false,
        }
    }
}

impl Ord for NodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.as_bytes().cmp(other.0.as_bytes()))
    }
}

impl PartialOrd for NodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Kind of node.
///
/// Vertices have arbitrary degree and may be rotated freely. Crossings have
/// degree 4; positions 0 and 2 carry the under-strand, 1 and 3 the
/// over-strand, so a crossing only rotates by 0 or 2 positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Graph vertex of any degree.
    Vertex,
    /// Knot crossing of degree 4.
    Crossing,
}

/// Degree of every crossing.
pub const CROSSING_DEGREE: usize = 4;

impl NodeKind {
    /// Parse a node kind from its notation letter.
    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'V' => Some(Self::Vertex),
            'X' => Some(Self::Crossing),
            _ => None,
        }
    }

    /// Notation letter of the kind.
    pub fn letter(&self) -> char {
        match self {
            Self::Vertex => 'V',
            Self::Crossing => 'X',
        }
    }

    /// Whether this is a crossing.
    pub fn is_crossing(&self) -> bool {
        matches!(self, Self::Crossing)
    }

    /// Whether rotating a node of this kind by `by` positions is allowed.
    pub fn allows_rotation(&self, by: usize, degree: usize) -> bool {
        match self {
            Self::Vertex => true,
            Self::Crossing => degree == 0 || (by % degree) % 2 == 0,
        }
    }

    /// Rotation that brings `first_position` as close to position 0 as the
    /// kind allows.
    ///
    /// Vertices rotate `first_position` onto 0. Crossings rotate by 0 or 2,
    /// so an odd entry lands on position 1.
    pub fn canonical_rotation(&self, first_position: usize) -> usize {
        match self {
            Self::Vertex => first_position,
            Self::Crossing => first_position - first_position % 2,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Crossing => write!(f, "crossing"),
        }
    }
}

/// A node: its kind plus a cyclically ordered (counter-clockwise) list of
/// endpoint slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) slots: Vec<Option<Slot>>,
}

impl Node {
    /// Create a node with `degree` unset slots.
    pub fn new(kind: NodeKind, degree: usize) -> Self {
        Self {
            kind,
            slots: vec![None; degree],
        }
    }

    /// Kind of the node.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Number of slots.
    pub fn degree(&self) -> usize {
        self.slots.len()
    }

    /// Whether this node is a crossing.
    pub fn is_crossing(&self) -> bool {
        self.kind.is_crossing()
    }

    /// Slot at `position`, if set.
    pub fn slot(&self, position: usize) -> Option<&Slot> {
        self.slots.get(position).and_then(|s| s.as_ref())
    }

    /// All slots in counter-clockwise order.
    pub fn slots(&self) -> &[Option<Slot>] {
        &self.slots
    }

    /// Rotated copy of the slot list: new position `j` holds old position
    /// `(j + by) mod degree`. Twins are not rewritten.
    pub(crate) fn rotated_slots(&self, by: usize) -> Vec<Option<Slot>> {
        let degree = self.degree();
        (0..degree)
            .map(|j| self.slots[(j + by) % degree].clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_labels() {
        assert_eq!(NodeId::from_index(0).as_str(), "a");
        assert_eq!(NodeId::from_index(25).as_str(), "z");
        assert_eq!(NodeId::from_index(26).as_str(), "aa");
        assert_eq!(NodeId::from_index(27).as_str(), "ab");
        assert_eq!(NodeId::from_index(26 + 26 * 26).as_str(), "aaa");
    }

    #[test]
    fn test_valid_ids() {
        for ok in ["a", "hub", "_", "a1b", "x_", "Node_B"] {
            assert!(NodeId::from(ok).is_valid(), "{ok}");
        }
        for bad in ["", "a1", "1a", "a-b", "a b", "é", "a{"] {
            assert!(!NodeId::from(bad).is_valid(), "{bad}");
        }
        assert!((0..800).map(NodeId::from_index).all(|id| id.is_valid()));
    }

    #[test]
    fn test_shortlex_order_follows_generation() {
        let labels: Vec<NodeId> = (0..800).map(NodeId::from_index).collect();
        for pair in labels.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_crossing_rotation_rules() {
        assert!(NodeKind::Crossing.allows_rotation(2, 4));
        assert!(!NodeKind::Crossing.allows_rotation(1, 4));
        assert!(NodeKind::Vertex.allows_rotation(1, 3));

        assert_eq!(NodeKind::Crossing.canonical_rotation(3), 2);
        assert_eq!(NodeKind::Crossing.canonical_rotation(1), 0);
        assert_eq!(NodeKind::Vertex.canonical_rotation(3), 3);
    }
}
