//! Canonical forms of planar diagrams.
//!
//! Two diagrams are isomorphic (same embedding up to node renaming and
//! the rotations each node kind allows) iff their canonical forms are
//! equal. The canonical form is therefore the equality and hash key used
//! throughout the search layer.
//!
//! ## Algorithm
//!
//! ```text
//! diagram ──► components ──► (≥ 2) canonicalize each, sort, concatenate
//!                 │
//!                 └─► (1) candidate start nodes:
//!                         minimal degree, then minimal BFS layer sizes
//!                         │
//!                         ▼
//!                     for each start endpoint (crossings: 0, 2;
//!                     vertices: every position):
//!                         CCW BFS ──► relabel a, b, c, ... + rotate
//!                         │
//!                         ▼
//!                     minimum under the diagram order
//! ```
//!
//! Degree-2 vertices are treated as genuine nodes, so a diagram and the
//! same diagram with an extra degree-2 vertex inserted on an arc have
//! different canonical forms.

pub mod hash;
mod traversal;

use std::collections::BTreeMap;

use tracing::trace;

use crate::types::{DiagramError, Endpoint, NodeId, PlanarDiagram};

pub use hash::{
    canonical_hash, canonical_hash_hex, content_hash, content_hash_hex, fingerprint,
    fingerprint_of_canonical, is_canonical, verify_fingerprint, FINGERPRINT_VERSION,
};

/// Error type for canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CanonicalError {
    /// The traversal did not reach every node of a component.
    #[error("Traversal covered {covered} of {total} nodes")]
    Disconnected {
        /// Nodes reached.
        covered: usize,
        /// Nodes in the component.
        total: usize,
    },
    /// The diagram is structurally broken.
    #[error(transparent)]
    Diagram(#[from] DiagramError),
}

/// Canonical form of `k`.
///
/// Framing and diagram attributes are carried over unchanged.
pub fn canonical(k: &PlanarDiagram) -> Result<PlanarDiagram, CanonicalError> {
    let components = k.connected_components();
    if components.len() >= 2 {
        let mut forms = components
            .iter()
            .map(|c| canonical_connected(&k.component_subdiagram(c)))
            .collect::<Result<Vec<_>, _>>()?;
        forms.sort();
        let mut result = concatenate(&forms);
        result.framing = k.framing;
        result.attrs = k.attrs.clone();
        return Ok(result);
    }
    canonical_connected(k)
}

fn canonical_connected(k: &PlanarDiagram) -> Result<PlanarDiagram, CanonicalError> {
    if k.node_count() == 0 {
        return Ok(k.clone());
    }
    let starts = start_endpoints(k);
    if starts.is_empty() {
        // A single isolated node.
        let mapping: BTreeMap<NodeId, NodeId> = k
            .nodes()
            .map(|id| (id.clone(), NodeId::from_index(0)))
            .collect();
        return Ok(k.relabel(&mapping)?);
    }

    let mut best: Option<PlanarDiagram> = None;
    for start in &starts {
        let t = traversal::traverse(k, start)?;
        if t.len() != k.node_count() {
            return Err(CanonicalError::Disconnected {
                covered: t.len(),
                total: k.node_count(),
            });
        }
        let candidate = traversal::relabel_by_traversal(k, &t)?;
        if best.as_ref().map_or(true, |b| candidate < *b) {
            best = Some(candidate);
        }
    }
    trace!(starts = starts.len(), nodes = k.node_count(), "canonicalized component");
    best.ok_or(CanonicalError::Disconnected {
        covered: 0,
        total: k.node_count(),
    })
}

/// Start endpoints on the candidate nodes: minimal degree, then minimal
/// breadth-first layer sizes.
fn start_endpoints(k: &PlanarDiagram) -> Vec<Endpoint> {
    let Some(min_degree) = k.min_degree() else {
        return Vec::new();
    };
    let by_degree: Vec<&NodeId> = k
        .node_entries()
        .filter(|(_, n)| n.degree() == min_degree)
        .map(|(id, _)| id)
        .collect();
    let layers: Vec<(Vec<usize>, &NodeId)> = by_degree
        .into_iter()
        .map(|id| (k.layer_sizes(id), id))
        .collect();
    let Some(min_layers) = layers.iter().map(|(l, _)| l).min().cloned() else {
        return Vec::new();
    };

    let mut starts = Vec::new();
    for (l, id) in &layers {
        if *l != min_layers {
            continue;
        }
        let Some(node) = k.node(id) else { continue };
        let step = if node.is_crossing() { 2 } else { 1 };
        for p in (0..node.degree()).step_by(step) {
            starts.push(Endpoint::new((*id).clone(), p));
        }
    }
    starts
}

/// Concatenate canonical components, relabeling them `a..` in order.
fn concatenate(forms: &[PlanarDiagram]) -> PlanarDiagram {
    let mut result = PlanarDiagram::new();
    let mut offset = 0;
    for form in forms {
        // Canonical labels are exactly from_index(0..n), in order.
        let index: BTreeMap<&NodeId, usize> =
            form.nodes().enumerate().map(|(i, id)| (id, i)).collect();
        let shift = |id: &NodeId| NodeId::from_index(offset + index.get(id).copied().unwrap_or(0));
        for (id, node) in form.node_entries() {
            let mut node = node.clone();
            for slot in node.slots.iter_mut().flatten() {
                slot.twin.node = shift(&slot.twin.node);
            }
            result.nodes.insert(shift(id), node);
        }
        offset += form.node_count();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::parse_native;

    const TREFOIL: &str = "a=X(b3 c0 c3 b0) b=X(a3 c2 c1 a0) c=X(a1 b2 b1 a2)";

    #[test]
    fn test_canonical_is_idempotent() {
        let k = parse_native(TREFOIL).unwrap();
        let c = canonical(&k).unwrap();
        assert_eq!(canonical(&c).unwrap(), c);
        assert!(c.sanity_check().is_ok());
    }

    #[test]
    fn test_relabeling_does_not_change_canonical_form() {
        let k = parse_native(TREFOIL).unwrap();
        let mapping = BTreeMap::from([
            (NodeId::from("a"), NodeId::from("q")),
            (NodeId::from("b"), NodeId::from("zz")),
            (NodeId::from("c"), NodeId::from("b")),
        ]);
        let renamed = k.relabel(&mapping).unwrap();
        assert_eq!(canonical(&k).unwrap(), canonical(&renamed).unwrap());
    }

    #[test]
    fn test_rotating_a_crossing_by_two_is_invisible() {
        let k = parse_native(TREFOIL).unwrap();
        let mut rotated = k.clone();
        rotated.rotate_node(&"b".into(), 2).unwrap();
        assert_ne!(k, rotated);
        assert_eq!(canonical(&k).unwrap(), canonical(&rotated).unwrap());
    }

    #[test]
    fn test_mirror_trefoil_differs() {
        let k = parse_native(TREFOIL).unwrap();
        assert_ne!(canonical(&k).unwrap(), canonical(&k.mirror()).unwrap());
    }

    #[test]
    fn test_theta_curve_encodings_agree() {
        let first = parse_native("a=V(b0 c0 d3) b=V(a0 d2 c1) c=X(a1 b2 d1 d0) d=X(c3 c2 b1 a2)")
            .unwrap();
        let second = parse_native("x=X(y1 m0 w1 w0) y=V(m1 x0 w3) w=X(x3 x2 m2 y2) m=V(x1 y0 w2)")
            .unwrap();
        assert_eq!(canonical(&first).unwrap(), canonical(&second).unwrap());
    }

    #[test]
    fn test_components_sorted() {
        let trefoil = parse_native(TREFOIL).unwrap();
        let mut with_unknot = PlanarDiagram::new();
        with_unknot.add_unknot().unwrap();
        let sum_a = trefoil.disjoint_sum(&with_unknot).unwrap();
        let sum_b = with_unknot.disjoint_sum(&trefoil).unwrap();

        let ca = canonical(&sum_a).unwrap();
        assert_eq!(ca, canonical(&sum_b).unwrap());
        // The unknot (one node) sorts before the trefoil.
        assert_eq!(ca.degree(&"a".into()).unwrap(), 2);
        assert_eq!(ca.node_count(), 4);
        assert!(ca.sanity_check().is_ok());
    }

    #[test]
    fn test_framing_is_kept() {
        let mut k = parse_native(TREFOIL).unwrap();
        k.set_framing(Some(3));
        assert_eq!(canonical(&k).unwrap().framing(), Some(3));
    }

    #[test]
    fn test_isolated_vertex() {
        let mut k = PlanarDiagram::new();
        k.add_vertex("v", 0).unwrap();
        let c = canonical(&k).unwrap();
        assert!(c.contains_node(&"a".into()));
        assert_eq!(canonical(&PlanarDiagram::new()).unwrap(), PlanarDiagram::new());
    }
}
