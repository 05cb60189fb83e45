//! Structural equality, total order and hashing of diagrams.
//!
//! Two diagrams are equal when they have the same labels, kinds, degrees,
//! adjacency, endpoint orientations and attributes, and framing. Diagram
//! attributes (such as `name`) are ignored.
//!
//! The order compares, lexicographically:
//! 1. node count
//! 2. the `(label, kind, degree)` sequence
//! 3. the twin table, in endpoint order
//! 4. endpoint orientations and attributes
//! 5. framing (unframed sorts first)
//!
//! Canonical forms rely on this order to pick a minimum.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use super::diagram::PlanarDiagram;
use super::endpoint::{Attributes, Endpoint, EndpointKind};

fn twins(k: &PlanarDiagram) -> impl Iterator<Item = Option<&Endpoint>> + '_ {
    k.nodes
        .values()
        .flat_map(|n| n.slots.iter().map(|s| s.as_ref().map(|s| &s.twin)))
}

fn decorations(
    k: &PlanarDiagram,
) -> impl Iterator<Item = Option<(EndpointKind, &Attributes)>> + '_ {
    k.nodes
        .values()
        .flat_map(|n| n.slots.iter().map(|s| s.as_ref().map(|s| (s.kind, &s.attrs))))
}

impl Ord for PlanarDiagram {
    fn cmp(&self, other: &Self) -> Ordering {
        self.nodes
            .len()
            .cmp(&other.nodes.len())
            .then_with(|| {
                let ours = self.nodes.iter().map(|(id, n)| (id, n.kind, n.degree()));
                let theirs = other.nodes.iter().map(|(id, n)| (id, n.kind, n.degree()));
                ours.cmp(theirs)
            })
            .then_with(|| twins(self).cmp(twins(other)))
            .then_with(|| decorations(self).cmp(decorations(other)))
            .then_with(|| self.framing.cmp(&other.framing))
    }
}

impl PartialOrd for PlanarDiagram {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PlanarDiagram {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.framing == other.framing
    }
}

impl Eq for PlanarDiagram {}

impl Hash for PlanarDiagram {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.nodes.hash(state);
        self.framing.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(k: &PlanarDiagram) -> u64 {
        let mut h = DefaultHasher::new();
        k.hash(&mut h);
        h.finish()
    }

    fn loop_on(id: &str) -> PlanarDiagram {
        let mut k = PlanarDiagram::new();
        k.add_vertex(id, 2).unwrap();
        k.set_arc(Endpoint::new(id, 0), Endpoint::new(id, 1)).unwrap();
        k
    }

    #[test]
    fn test_name_does_not_affect_identity() {
        let a = loop_on("a");
        let mut b = loop_on("a");
        b.attrs_mut().insert("name".into(), "unknot".into());

        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_framing_affects_identity() {
        let a = loop_on("a");
        let mut b = loop_on("a");
        b.set_framing(Some(0));
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn test_fewer_nodes_sort_first() {
        let small = loop_on("z");
        let big = small.disjoint_sum(&loop_on("a")).unwrap();
        assert!(small < big);
    }

    #[test]
    fn test_labels_compared_before_adjacency() {
        assert!(loop_on("a") < loop_on("b"));
    }

    #[test]
    fn test_endpoint_attrs_affect_identity() {
        let a = loop_on("a");
        let mut b = loop_on("a");
        b.set_endpoint_attr(&Endpoint::new("a", 0), "color", "red")
            .unwrap();
        assert_ne!(a, b);
        assert_ne!(a.cmp(&b), Ordering::Equal);
    }
}
