//! Endpoint types for planar diagrams.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::node::NodeId;

/// Attribute map attached to a half-edge (e.g. `color`).
pub type Attributes = BTreeMap<String, String>;

/// A half-edge reference: a position on a node.
///
/// Endpoints are plain values resolved through the diagram's adjacency
/// table. Ordering is (node, position).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// Node holding the endpoint.
    pub node: NodeId,
    /// Counter-clockwise position on the node.
    pub position: usize,
}

impl Endpoint {
    /// Create a new endpoint.
    pub fn new(node: impl Into<NodeId>, position: usize) -> Self {
        Self {
            node: node.into(),
            position,
        }
    }

    /// Endpoint `offset` positions further counter-clockwise on the same node.
    ///
    /// A degree of 0 leaves the endpoint unchanged.
    pub fn rotate(&self, offset: usize, degree: usize) -> Self {
        Self {
            node: self.node.clone(),
            position: (self.position + offset)
                .checked_rem(degree)
                .unwrap_or(self.position),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.node, self.position)
    }
}

/// Orientation of a half-edge in oriented diagrams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EndpointKind {
    /// No orientation.
    Undirected,
    /// The strand enters the node here.
    Ingoing,
    /// The strand leaves the node here.
    Outgoing,
}

impl EndpointKind {
    /// The kind a twin of this half-edge must have.
    pub fn twin_kind(&self) -> Self {
        match self {
            Self::Undirected => Self::Undirected,
            Self::Ingoing => Self::Outgoing,
            Self::Outgoing => Self::Ingoing,
        }
    }

    /// Parse from notation suffix.
    pub fn from_suffix(s: &str) -> Option<Self> {
        match s {
            "" => Some(Self::Undirected),
            "in" => Some(Self::Ingoing),
            "out" => Some(Self::Outgoing),
            _ => None,
        }
    }

    /// Notation suffix (empty for undirected).
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Undirected => "",
            Self::Ingoing => "in",
            Self::Outgoing => "out",
        }
    }
}

impl Default for EndpointKind {
    fn default() -> Self {
        Self::Undirected
    }
}

/// Content of a node position: the twin endpoint plus this half-edge's
/// orientation and attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slot {
    /// The endpoint at the other end of the arc.
    pub twin: Endpoint,
    /// Orientation of this half-edge.
    pub kind: EndpointKind,
    /// Attributes of this half-edge.
    pub attrs: Attributes,
}

impl Slot {
    /// Undirected slot without attributes.
    pub fn plain(twin: Endpoint) -> Self {
        Self {
            twin,
            kind: EndpointKind::Undirected,
            attrs: Attributes::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_ordering() {
        let a0 = Endpoint::new("a", 0);
        let a1 = Endpoint::new("a", 1);
        let b0 = Endpoint::new("b", 0);

        assert!(a0 < a1);
        assert!(a1 < b0);
    }

    #[test]
    fn test_rotate_wraps() {
        let e = Endpoint::new("a", 3);
        assert_eq!(e.rotate(1, 4), Endpoint::new("a", 0));
        assert_eq!(e.rotate(2, 4), Endpoint::new("a", 1));
    }

    #[test]
    fn test_rotate_on_degree_zero_is_identity() {
        let e = Endpoint::new("a", 0);
        assert_eq!(e.rotate(3, 0), e);
    }

    #[test]
    fn test_twin_kind() {
        assert_eq!(EndpointKind::Ingoing.twin_kind(), EndpointKind::Outgoing);
        assert_eq!(EndpointKind::Undirected.twin_kind(), EndpointKind::Undirected);
    }
}
