//! Counter-clockwise breadth-first traversal and relabeling.

use std::collections::{BTreeMap, VecDeque};

use crate::types::{DiagramError, Endpoint, Node, NodeId, PlanarDiagram, Slot};

/// Nodes in the order they were first reached, with the position through
/// which each was entered.
#[derive(Debug, Clone, Default)]
pub(crate) struct Traversal {
    pub order: Vec<NodeId>,
    pub entered_at: BTreeMap<NodeId, usize>,
}

impl Traversal {
    pub fn len(&self) -> usize {
        self.order.len()
    }
}

/// Breadth-first traversal from `start`.
///
/// Popping `(v, p)` for an unlabeled `v` labels it, records `p` as its
/// entry position and queues the twins of `(v, p)`, `(v, p + 1)`, ...
/// in counter-clockwise order.
pub(crate) fn traverse(k: &PlanarDiagram, start: &Endpoint) -> Result<Traversal, DiagramError> {
    let mut t = Traversal::default();
    let mut queue = VecDeque::from([start.clone()]);
    while let Some(e) = queue.pop_front() {
        if t.entered_at.contains_key(&e.node) {
            continue;
        }
        let degree = k.degree(&e.node)?;
        t.order.push(e.node.clone());
        t.entered_at.insert(e.node.clone(), e.position);
        for i in 0..degree {
            queue.push_back(k.twin(&e.rotate(i, degree))?);
        }
    }
    Ok(t)
}

/// Diagram relabeled in traversal order (`a`, `b`, ...) with every node
/// rotated so its entry position lands as close to 0 as its kind allows.
///
/// Framing and diagram attributes are copied from `k`.
pub(crate) fn relabel_by_traversal(
    k: &PlanarDiagram,
    t: &Traversal,
) -> Result<PlanarDiagram, DiagramError> {
    let mut labels: BTreeMap<&NodeId, (NodeId, usize, usize)> = BTreeMap::new();
    for (i, id) in t.order.iter().enumerate() {
        let node = k
            .node(id)
            .ok_or_else(|| DiagramError::NodeNotFound(id.clone()))?;
        let entered = t.entered_at.get(id).copied().unwrap_or(0);
        let rotation = node.kind().canonical_rotation(entered);
        labels.insert(id, (NodeId::from_index(i), rotation, node.degree()));
    }
    let map = |e: &Endpoint| -> Result<Endpoint, DiagramError> {
        let (label, rotation, degree) = labels
            .get(&e.node)
            .ok_or_else(|| DiagramError::NodeNotFound(e.node.clone()))?;
        Ok(Endpoint::new(
            label.clone(),
            (e.position + degree - rotation) % degree,
        ))
    };

    let mut result = PlanarDiagram {
        nodes: BTreeMap::new(),
        framing: k.framing(),
        attrs: k.attrs().clone(),
    };
    for id in &t.order {
        let Some(node) = k.node(id) else { continue };
        let Some((label, rotation, degree)) = labels.get(id) else {
            continue;
        };
        let mut slots = Vec::with_capacity(*degree);
        for j in 0..*degree {
            let old = Endpoint::new(id.clone(), (j + rotation) % degree);
            let slot = k.slot(&old)?;
            slots.push(Some(Slot {
                twin: map(&slot.twin)?,
                kind: slot.kind,
                attrs: slot.attrs.clone(),
            }));
        }
        result.nodes.insert(
            label.clone(),
            Node {
                kind: node.kind(),
                slots,
            },
        );
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traversal_visits_in_ccw_order() {
        // Star: centre `m` of degree 3, leaves `x`, `y`, `z`.
        let mut k = PlanarDiagram::new();
        k.add_vertex("m", 3).unwrap();
        for (i, leaf) in ["x", "y", "z"].into_iter().enumerate() {
            k.add_vertex(leaf, 1).unwrap();
            k.set_arc(Endpoint::new("m", i), Endpoint::new(leaf, 0))
                .unwrap();
        }

        let t = traverse(&k, &Endpoint::new("m", 1)).unwrap();
        let order: Vec<&str> = t.order.iter().map(NodeId::as_str).collect();
        assert_eq!(order, vec!["m", "y", "z", "x"]);

        let r = relabel_by_traversal(&k, &t).unwrap();
        // `m` entered at 1 is rotated so that position 1 becomes 0.
        assert_eq!(
            r.twin(&Endpoint::new("a", 0)).unwrap(),
            Endpoint::new("b", 0)
        );
        assert!(r.sanity_check().is_ok());
    }
}
