//! Structural invariant checks.
//!
//! `sanity_check` is the single place that verifies a diagram is a valid
//! planar map. It is deliberately not run on every mutation.

use std::collections::BTreeSet;

use super::diagram::{DiagramError, PlanarDiagram};
use super::endpoint::Endpoint;
use super::node::{NodeId, CROSSING_DEGREE};

/// A violated structural invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SanityViolation {
    /// Node id is empty.
    #[error("node with empty id")]
    EmptyNodeId,
    /// Slot left unset after construction.
    #[error("endpoint {0} is unset")]
    UnsetEndpoint(Endpoint),
    /// Slot points at a missing node or a position beyond its degree.
    #[error("endpoint {from} points at missing endpoint {to}")]
    DanglingEndpoint {
        /// Endpoint holding the reference.
        from: Endpoint,
        /// Referenced endpoint.
        to: Endpoint,
    },
    /// `twin(twin(e)) != e`.
    #[error("twin mismatch: {endpoint} -> {twin} -> {back}")]
    TwinMismatch {
        /// Starting endpoint.
        endpoint: Endpoint,
        /// Its twin.
        twin: Endpoint,
        /// The twin's twin.
        back: Endpoint,
    },
    /// Crossing whose degree is not 4.
    #[error("crossing {node} has degree {degree}")]
    CrossingDegree {
        /// Offending crossing.
        node: NodeId,
        /// Its degree.
        degree: usize,
    },
    /// Twin orientations do not pair up (in with out, undirected with undirected).
    #[error("orientation mismatch between {endpoint} and {twin}")]
    OrientationMismatch {
        /// Endpoint checked.
        endpoint: Endpoint,
        /// Its twin.
        twin: Endpoint,
    },
    /// Endpoint count differs from twice the arc count.
    #[error("{endpoints} endpoints but {arcs} arcs")]
    ArcCount {
        /// Number of endpoints.
        endpoints: usize,
        /// Number of arcs.
        arcs: usize,
    },
    /// `|V| - |E| + |F| != 2 * components`.
    #[error("Euler characteristic {nodes} - {arcs} + {faces} != 2 * {components}")]
    EulerCharacteristic {
        /// Node count.
        nodes: usize,
        /// Arc count.
        arcs: usize,
        /// Face count (isolated nodes count as one face).
        faces: usize,
        /// Component count.
        components: usize,
    },
    /// A non-cut node occurs more than once on a face.
    #[error("node {0} repeats on a face but is not a cut node")]
    RepeatedNonCutNode(NodeId),
    /// A cut node never repeats on any face.
    #[error("cut node {0} does not repeat on any face")]
    UnrepeatedCutNode(NodeId),
}

impl PlanarDiagram {
    /// Verify every structural invariant.
    ///
    /// Checks, in order: ids, crossing degrees, unset and dangling slots,
    /// twin symmetry, orientation pairing, endpoint/arc count, Euler
    /// characteristic, and the cut-node/face correspondence.
    pub fn sanity_check(&self) -> Result<(), DiagramError> {
        for (id, node) in &self.nodes {
            if id.is_empty() {
                return Err(SanityViolation::EmptyNodeId.into());
            }
            if node.is_crossing() && node.degree() != CROSSING_DEGREE {
                return Err(SanityViolation::CrossingDegree {
                    node: id.clone(),
                    degree: node.degree(),
                }
                .into());
            }
        }

        for e in self.endpoints() {
            let slot = match self.slot(&e) {
                Ok(slot) => slot,
                Err(_) => return Err(SanityViolation::UnsetEndpoint(e).into()),
            };
            let twin = &slot.twin;
            let back = match self.slot(twin) {
                Ok(back) => back,
                Err(_) => {
                    return Err(SanityViolation::DanglingEndpoint {
                        from: e.clone(),
                        to: twin.clone(),
                    }
                    .into())
                }
            };
            if back.twin != e {
                return Err(SanityViolation::TwinMismatch {
                    endpoint: e.clone(),
                    twin: twin.clone(),
                    back: back.twin.clone(),
                }
                .into());
            }
            if back.kind != slot.kind.twin_kind() {
                return Err(SanityViolation::OrientationMismatch {
                    endpoint: e.clone(),
                    twin: twin.clone(),
                }
                .into());
            }
        }

        let endpoints = self.endpoint_count();
        let arcs = self.arc_count();
        if endpoints != 2 * arcs {
            return Err(SanityViolation::ArcCount { endpoints, arcs }.into());
        }

        let faces = self.faces()?;
        let isolated = self.nodes.values().filter(|n| n.degree() == 0).count();
        let components = self.component_count();
        let nodes = self.node_count();
        if nodes + faces.len() + isolated != 2 * components + arcs {
            return Err(SanityViolation::EulerCharacteristic {
                nodes,
                arcs,
                faces: faces.len() + isolated,
                components,
            }
            .into());
        }

        let cut = self.cut_nodes();
        let mut repeated: BTreeSet<NodeId> = BTreeSet::new();
        for face in &faces {
            for (node, count) in face.node_multiplicities() {
                if count > 1 {
                    repeated.insert(node.clone());
                }
            }
        }
        if let Some(node) = repeated.difference(&cut).next() {
            return Err(SanityViolation::RepeatedNonCutNode(node.clone()).into());
        }
        if let Some(node) = cut.difference(&repeated).next() {
            return Err(SanityViolation::UnrepeatedCutNode(node.clone()).into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(node: &str, position: usize) -> Endpoint {
        Endpoint::new(node, position)
    }

    #[test]
    fn test_empty_diagram_is_sane() {
        assert!(PlanarDiagram::new().sanity_check().is_ok());
    }

    #[test]
    fn test_unset_endpoint_detected() {
        let mut k = PlanarDiagram::new();
        k.add_vertex("a", 3).unwrap();
        k.add_vertex("b", 3).unwrap();
        k.set_arc(e("a", 0), e("b", 0)).unwrap();
        let err = k.sanity_check().unwrap_err();
        assert!(matches!(
            err,
            DiagramError::Sanity(SanityViolation::UnsetEndpoint(_))
        ));
    }

    #[test]
    fn test_twin_mismatch_detected() {
        let mut k = PlanarDiagram::new();
        k.add_vertex("a", 2).unwrap();
        k.add_vertex("b", 2).unwrap();
        k.set_arc(e("a", 0), e("b", 0)).unwrap();
        k.set_arc(e("a", 1), e("b", 1)).unwrap();
        k.set_endpoint(e("a", 1), e("b", 0), Default::default(), Default::default())
            .unwrap();
        assert!(matches!(
            k.sanity_check(),
            Err(DiagramError::Sanity(SanityViolation::TwinMismatch { .. }))
        ));
    }

    #[test]
    fn test_dangling_endpoint_detected() {
        let mut k = PlanarDiagram::new();
        k.add_vertex("a", 1).unwrap();
        k.add_vertex("b", 1).unwrap();
        k.set_arc(e("a", 0), e("b", 0)).unwrap();
        k.remove_node(&"b".into(), false).unwrap();
        assert!(matches!(
            k.sanity_check(),
            Err(DiagramError::Sanity(SanityViolation::DanglingEndpoint { .. }))
        ));
    }

    #[test]
    fn test_non_planar_rotation_fails_euler() {
        // Two interleaved loops on one vertex embed on the torus, not the plane.
        let mut k = PlanarDiagram::new();
        k.add_vertex("a", 4).unwrap();
        k.set_arc(e("a", 0), e("a", 2)).unwrap();
        k.set_arc(e("a", 1), e("a", 3)).unwrap();
        assert!(matches!(
            k.sanity_check(),
            Err(DiagramError::Sanity(SanityViolation::EulerCharacteristic { .. }))
        ));
    }

    #[test]
    fn test_orientation_mismatch_detected() {
        let mut k = PlanarDiagram::new();
        k.add_vertex("a", 2).unwrap();
        k.set_oriented_arc(e("a", 0), e("a", 1)).unwrap();
        assert!(k.sanity_check().is_ok());

        k.set_endpoint(
            e("a", 1),
            e("a", 0),
            crate::types::EndpointKind::Outgoing,
            Default::default(),
        )
        .unwrap();
        assert!(matches!(
            k.sanity_check(),
            Err(DiagramError::Sanity(SanityViolation::OrientationMismatch { .. }))
        ));
    }

    #[test]
    fn test_theta_curve_is_sane() {
        let mut k = PlanarDiagram::new();
        k.add_vertex("a", 3).unwrap();
        k.add_vertex("b", 3).unwrap();
        for i in 0..3 {
            k.set_arc(e("a", i), e("b", 2 - i)).unwrap();
        }
        assert!(k.sanity_check().is_ok());
        assert_eq!(k.faces().unwrap().len(), 3);
    }
}
