//! The planar diagram: an adjacency table of nodes and endpoint slots.
//!
//! ## Representation
//!
//! Endpoints are `(node, position)` values resolved through the diagram's
//! own table (arena + index). The table is the single source of truth for
//! arcs: `set_arc` writes both halves at once, `set_endpoint` writes one
//! half and leaves symmetry to the caller.
//!
//! Structural invariants are not re-checked on every mutation; call
//! [`PlanarDiagram::sanity_check`] once construction is finished.

use std::collections::{BTreeMap, BTreeSet};

use super::endpoint::{Attributes, Endpoint, EndpointKind, Slot};
use super::node::{Node, NodeId, NodeKind, CROSSING_DEGREE};
use super::sanity::SanityViolation;

/// Error type for diagram operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiagramError {
    /// Node does not exist.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
    /// Node id is empty or not a valid label (see [`NodeId::is_valid`]).
    #[error("Invalid node id: {0:?}")]
    InvalidNodeId(String),
    /// Node already exists.
    #[error("Duplicate node: {0}")]
    DuplicateNode(NodeId),
    /// Position is beyond the node's degree.
    #[error("Position {position} out of range for node {node} of degree {degree}")]
    PositionOutOfRange {
        /// Node addressed.
        node: NodeId,
        /// Requested position.
        position: usize,
        /// Current degree.
        degree: usize,
    },
    /// Re-adding a node with fewer slots than it already has.
    #[error("Node {node} cannot shrink from degree {current} to {requested}")]
    DegreeShrink {
        /// Node addressed.
        node: NodeId,
        /// Allocated slots.
        current: usize,
        /// Requested degree.
        requested: usize,
    },
    /// Crossings must have degree 4.
    #[error("Crossing {node} must have degree 4, got {degree}")]
    CrossingDegree {
        /// Node addressed.
        node: NodeId,
        /// Requested degree.
        degree: usize,
    },
    /// Existing node has a different kind.
    #[error("Node {node} is a {existing}, not a {requested}")]
    KindMismatch {
        /// Node addressed.
        node: NodeId,
        /// Kind already stored.
        existing: NodeKind,
        /// Kind requested.
        requested: NodeKind,
    },
    /// Slot has no twin.
    #[error("Endpoint {0} is unset")]
    UnsetEndpoint(Endpoint),
    /// An endpoint cannot be its own twin.
    #[error("Endpoint {0} cannot be joined to itself")]
    SelfTwin(Endpoint),
    /// Rotation not allowed for the node kind.
    #[error("Rotating {kind} {node} by {by} positions is not allowed")]
    ForbiddenRotation {
        /// Node addressed.
        node: NodeId,
        /// Kind of the node.
        kind: NodeKind,
        /// Requested rotation.
        by: usize,
    },
    /// Structural invariant violated.
    #[error("Sanity check failed: {0}")]
    Sanity(#[from] SanityViolation),
}

/// A planar diagram of a knot, link or spatial graph.
///
/// Nodes are kept in a `BTreeMap` so every derived view iterates in label
/// order. Equality, ordering and hashing are structural (see `order`);
/// the diagram attribute map is metadata and does not take part in them.
#[derive(Debug, Clone, Default)]
pub struct PlanarDiagram {
    pub(crate) nodes: BTreeMap<NodeId, Node>,
    pub(crate) framing: Option<i64>,
    pub(crate) attrs: Attributes,
}

impl PlanarDiagram {
    /// Create an empty, unframed diagram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty diagram with blackboard framing `framing`.
    pub fn with_framing(framing: i64) -> Self {
        Self {
            framing: Some(framing),
            ..Self::default()
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Diagram-level data
    // ─────────────────────────────────────────────────────────────────────

    /// Framing, `None` when the diagram is unframed.
    pub fn framing(&self) -> Option<i64> {
        self.framing
    }

    /// Set or clear the framing.
    pub fn set_framing(&mut self, framing: Option<i64>) {
        self.framing = framing;
    }

    /// Add `delta` to the framing if the diagram is framed.
    pub fn shift_framing(&mut self, delta: i64) {
        if let Some(f) = self.framing.as_mut() {
            *f += delta;
        }
    }

    /// Diagram attributes (metadata such as `name`).
    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    /// Mutable diagram attributes.
    pub fn attrs_mut(&mut self) -> &mut Attributes {
        &mut self.attrs
    }

    /// The `name` attribute, if any.
    pub fn name(&self) -> Option<&str> {
        self.attrs.get("name").map(String::as_str)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Nodes
    // ─────────────────────────────────────────────────────────────────────

    /// Add a node, or grow an existing node of the same kind.
    pub fn add_node(
        &mut self,
        id: impl Into<NodeId>,
        kind: NodeKind,
        degree: usize,
    ) -> Result<(), DiagramError> {
        let id = id.into();
        if !id.is_valid() {
            return Err(DiagramError::InvalidNodeId(id.as_str().to_string()));
        }
        if kind.is_crossing() && degree != CROSSING_DEGREE {
            return Err(DiagramError::CrossingDegree { node: id, degree });
        }
        match self.nodes.get_mut(&id) {
            Some(node) => {
                if node.kind != kind {
                    return Err(DiagramError::KindMismatch {
                        existing: node.kind,
                        requested: kind,
                        node: id,
                    });
                }
                if degree < node.degree() {
                    return Err(DiagramError::DegreeShrink {
                        current: node.degree(),
                        requested: degree,
                        node: id,
                    });
                }
                node.slots.resize(degree, None);
            }
            None => {
                self.nodes.insert(id, Node::new(kind, degree));
            }
        }
        Ok(())
    }

    /// Add a vertex of the given degree.
    pub fn add_vertex(&mut self, id: impl Into<NodeId>, degree: usize) -> Result<(), DiagramError> {
        self.add_node(id, NodeKind::Vertex, degree)
    }

    /// Add a crossing.
    pub fn add_crossing(&mut self, id: impl Into<NodeId>) -> Result<(), DiagramError> {
        self.add_node(id, NodeKind::Crossing, CROSSING_DEGREE)
    }

    /// Add a crossing-free unknot component: a degree-2 vertex joined to
    /// itself. Returns the new node's id.
    pub fn add_unknot(&mut self) -> Result<NodeId, DiagramError> {
        let id = self.fresh_node_id();
        self.add_vertex(id.clone(), 2)?;
        self.set_arc(Endpoint::new(id.clone(), 0), Endpoint::new(id.clone(), 1))?;
        Ok(id)
    }

    /// Smallest generated label not used by any node.
    pub fn fresh_node_id(&self) -> NodeId {
        (0..)
            .map(NodeId::from_index)
            .find(|id| !self.nodes.contains_key(id))
            .unwrap_or_else(|| NodeId::new("_"))
    }

    /// Remove a node.
    ///
    /// With `remove_incident_endpoints`, slots on other nodes that point at
    /// the removed node are cleared; otherwise they are left dangling and
    /// the caller must reconnect them before any other operation.
    pub fn remove_node(
        &mut self,
        id: &NodeId,
        remove_incident_endpoints: bool,
    ) -> Result<Node, DiagramError> {
        let node = self
            .nodes
            .remove(id)
            .ok_or_else(|| DiagramError::NodeNotFound(id.clone()))?;
        if remove_incident_endpoints {
            for slot in node.slots.iter().flatten() {
                if let Some(other) = self.nodes.get_mut(&slot.twin.node) {
                    if let Some(target) = other.slots.get_mut(slot.twin.position) {
                        if target.as_ref().is_some_and(|t| &t.twin.node == id) {
                            *target = None;
                        }
                    }
                }
            }
        }
        Ok(node)
    }

    /// Whether the node exists.
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Get a node.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    fn node_or_err(&self, id: &NodeId) -> Result<&Node, DiagramError> {
        self.nodes
            .get(id)
            .ok_or_else(|| DiagramError::NodeNotFound(id.clone()))
    }

    /// Degree of a node.
    pub fn degree(&self, id: &NodeId) -> Result<usize, DiagramError> {
        Ok(self.node_or_err(id)?.degree())
    }

    /// Kind of a node.
    pub fn kind(&self, id: &NodeId) -> Result<NodeKind, DiagramError> {
        Ok(self.node_or_err(id)?.kind)
    }

    /// Whether the node exists and is a crossing.
    pub fn is_crossing(&self, id: &NodeId) -> bool {
        self.nodes.get(id).is_some_and(Node::is_crossing)
    }

    /// Node ids in label order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> + '_ {
        self.nodes.keys()
    }

    /// Node ids and nodes in label order.
    pub fn node_entries(&self) -> impl Iterator<Item = (&NodeId, &Node)> + '_ {
        self.nodes.iter()
    }

    /// Crossing ids in label order.
    pub fn crossings(&self) -> impl Iterator<Item = &NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|(_, n)| n.is_crossing())
            .map(|(id, _)| id)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the diagram has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of crossings.
    pub fn crossing_count(&self) -> usize {
        self.nodes.values().filter(|n| n.is_crossing()).count()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.nodes.len() - self.crossing_count()
    }

    /// Minimal degree over all nodes.
    pub fn min_degree(&self) -> Option<usize> {
        self.nodes.values().map(Node::degree).min()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Endpoints and arcs
    // ─────────────────────────────────────────────────────────────────────

    /// Set one half of an arc: the slot `from` now points at `to`.
    ///
    /// Vertices grow to accommodate `from.position` (sparse construction);
    /// crossings reject positions outside 0..4.
    pub fn set_endpoint(
        &mut self,
        from: Endpoint,
        to: Endpoint,
        kind: EndpointKind,
        attrs: Attributes,
    ) -> Result<(), DiagramError> {
        if from == to {
            return Err(DiagramError::SelfTwin(from));
        }
        let node = self
            .nodes
            .get_mut(&from.node)
            .ok_or_else(|| DiagramError::NodeNotFound(from.node.clone()))?;
        if from.position >= node.degree() {
            if node.is_crossing() {
                return Err(DiagramError::PositionOutOfRange {
                    degree: node.degree(),
                    node: from.node,
                    position: from.position,
                });
            }
            node.slots.resize(from.position + 1, None);
        }
        node.slots[from.position] = Some(Slot {
            twin: to,
            kind,
            attrs,
        });
        Ok(())
    }

    /// Join `a` and `b` into an undirected arc.
    ///
    /// Attributes already stored on either slot are kept.
    pub fn set_arc(&mut self, a: Endpoint, b: Endpoint) -> Result<(), DiagramError> {
        let attrs_a = self.existing_attrs(&a);
        let attrs_b = self.existing_attrs(&b);
        self.set_endpoint(a.clone(), b.clone(), EndpointKind::Undirected, attrs_a)?;
        self.set_endpoint(b, a, EndpointKind::Undirected, attrs_b)
    }

    /// Join `tail` (outgoing) to `head` (ingoing) into an oriented arc.
    pub fn set_oriented_arc(&mut self, tail: Endpoint, head: Endpoint) -> Result<(), DiagramError> {
        let attrs_tail = self.existing_attrs(&tail);
        let attrs_head = self.existing_attrs(&head);
        self.set_endpoint(tail.clone(), head.clone(), EndpointKind::Outgoing, attrs_tail)?;
        self.set_endpoint(head, tail, EndpointKind::Ingoing, attrs_head)
    }

    fn existing_attrs(&self, e: &Endpoint) -> Attributes {
        self.slot(e).map(|s| s.attrs.clone()).unwrap_or_default()
    }

    /// Slot stored at an endpoint.
    pub fn slot(&self, e: &Endpoint) -> Result<&Slot, DiagramError> {
        let node = self.node_or_err(&e.node)?;
        match node.slots.get(e.position) {
            None => Err(DiagramError::PositionOutOfRange {
                node: e.node.clone(),
                position: e.position,
                degree: node.degree(),
            }),
            Some(None) => Err(DiagramError::UnsetEndpoint(e.clone())),
            Some(Some(slot)) => Ok(slot),
        }
    }

    /// The endpoint at the other end of `e`'s arc.
    pub fn twin(&self, e: &Endpoint) -> Result<Endpoint, DiagramError> {
        Ok(self.slot(e)?.twin.clone())
    }

    /// Attributes of the half-edge `e`.
    pub fn endpoint_attrs(&self, e: &Endpoint) -> Result<&Attributes, DiagramError> {
        Ok(&self.slot(e)?.attrs)
    }

    /// Set one attribute on the half-edge `e`.
    pub fn set_endpoint_attr(
        &mut self,
        e: &Endpoint,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), DiagramError> {
        self.slot(e)?;
        if let Some(Some(slot)) = self
            .nodes
            .get_mut(&e.node)
            .and_then(|n| n.slots.get_mut(e.position))
        {
            slot.attrs.insert(key.into(), value.into());
        }
        Ok(())
    }

    /// Orientation of the half-edge `e`.
    pub fn endpoint_kind(&self, e: &Endpoint) -> Result<EndpointKind, DiagramError> {
        Ok(self.slot(e)?.kind)
    }

    /// Whether any half-edge carries an orientation.
    pub fn is_oriented(&self) -> bool {
        self.nodes
            .values()
            .flat_map(|n| n.slots.iter().flatten())
            .any(|s| s.kind != EndpointKind::Undirected)
    }

    /// All endpoints in (node, position) order.
    pub fn endpoints(&self) -> impl Iterator<Item = Endpoint> + '_ {
        self.nodes.iter().flat_map(|(id, node)| {
            (0..node.degree()).map(move |p| Endpoint::new(id.clone(), p))
        })
    }

    /// Endpoints of one node in counter-clockwise order.
    pub fn node_endpoints(&self, id: &NodeId) -> Result<Vec<Endpoint>, DiagramError> {
        let degree = self.degree(id)?;
        Ok((0..degree).map(|p| Endpoint::new(id.clone(), p)).collect())
    }

    /// Number of endpoints.
    pub fn endpoint_count(&self) -> usize {
        self.nodes.values().map(Node::degree).sum()
    }

    /// All arcs, each once as `(smaller, larger)`, sorted.
    pub fn arcs(&self) -> Vec<(Endpoint, Endpoint)> {
        let mut arcs: Vec<(Endpoint, Endpoint)> = self
            .nodes
            .iter()
            .flat_map(|(id, node)| {
                node.slots.iter().enumerate().filter_map(move |(p, s)| {
                    let here = Endpoint::new(id.clone(), p);
                    s.as_ref()
                        .filter(|s| here < s.twin)
                        .map(|s| (here, s.twin.clone()))
                })
            })
            .collect();
        arcs.sort();
        arcs
    }

    /// Number of arcs.
    pub fn arc_count(&self) -> usize {
        self.arcs().len()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Whole-diagram transformations
    // ─────────────────────────────────────────────────────────────────────

    /// Rotate a node so that old position `p` becomes `p - by`.
    ///
    /// Twins on other nodes are rewritten. Crossings only accept even
    /// rotations.
    pub fn rotate_node(&mut self, id: &NodeId, by: usize) -> Result<(), DiagramError> {
        let node = self.node_or_err(id)?;
        let degree = node.degree();
        if !node.kind.allows_rotation(by, degree) {
            return Err(DiagramError::ForbiddenRotation {
                node: id.clone(),
                kind: node.kind,
                by,
            });
        }
        self.rotate_node_unchecked(id, by);
        Ok(())
    }

    pub(crate) fn rotate_node_unchecked(&mut self, id: &NodeId, by: usize) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let degree = node.degree();
        if degree == 0 || by % degree == 0 {
            return;
        }
        let new_position = |p: usize| (p + degree - by % degree) % degree;

        let mut slots = node.rotated_slots(by % degree);
        for slot in slots.iter_mut().flatten() {
            if &slot.twin.node == id {
                slot.twin.position = new_position(slot.twin.position);
            }
        }
        let outside: Vec<(usize, Endpoint)> = node
            .slots
            .iter()
            .enumerate()
            .filter_map(|(p, s)| s.as_ref().map(|s| (p, s.twin.clone())))
            .filter(|(_, twin)| &twin.node != id)
            .collect();
        for (p, twin) in outside {
            if let Some(Some(slot)) = self
                .nodes
                .get_mut(&twin.node)
                .and_then(|n| n.slots.get_mut(twin.position))
            {
                slot.twin.position = new_position(p);
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.slots = slots;
        }
    }

    /// Copy with nodes renamed through `mapping`; unmapped nodes keep
    /// their id.
    pub fn relabel(&self, mapping: &BTreeMap<NodeId, NodeId>) -> Result<Self, DiagramError> {
        let rename = |id: &NodeId| mapping.get(id).cloned().unwrap_or_else(|| id.clone());
        let mut nodes = BTreeMap::new();
        for (id, node) in &self.nodes {
            let new_id = rename(id);
            if !new_id.is_valid() {
                return Err(DiagramError::InvalidNodeId(new_id.as_str().to_string()));
            }
            let mut node = node.clone();
            for slot in node.slots.iter_mut().flatten() {
                slot.twin.node = rename(&slot.twin.node);
            }
            if nodes.insert(new_id.clone(), node).is_some() {
                return Err(DiagramError::DuplicateNode(new_id));
            }
        }
        Ok(Self {
            nodes,
            framing: self.framing,
            attrs: self.attrs.clone(),
        })
    }

    /// Disjoint union with `other`. Colliding ids of `other` are renamed to
    /// fresh labels. Framings add up.
    pub fn disjoint_sum(&self, other: &Self) -> Result<Self, DiagramError> {
        let mut result = self.clone();
        let mut mapping = BTreeMap::new();
        let mut taken: BTreeSet<NodeId> = self.nodes.keys().cloned().collect();
        taken.extend(other.nodes.keys().cloned());
        let mut next = 0;
        for id in other.nodes.keys() {
            if self.nodes.contains_key(id) {
                let fresh = loop {
                    let candidate = NodeId::from_index(next);
                    next += 1;
                    if !taken.contains(&candidate) {
                        break candidate;
                    }
                };
                taken.insert(fresh.clone());
                mapping.insert(id.clone(), fresh);
            }
        }
        let other = other.relabel(&mapping)?;
        result.nodes.extend(other.nodes);
        result.framing = match (self.framing, other.framing) {
            (Some(a), Some(b)) => Some(a + b),
            (a, b) => a.or(b),
        };
        Ok(result)
    }

    /// Mirror image: over- and under-strands swap at every crossing and the
    /// framing changes sign.
    pub fn mirror(&self) -> Self {
        let mut result = self.clone();
        let crossings: Vec<NodeId> = self.crossings().cloned().collect();
        for c in &crossings {
            result.rotate_node_unchecked(c, 1);
        }
        result.framing = self.framing.map(|f| -f);
        result
    }
}
