//! Derived topological views: faces, components, cut nodes, strands.
//!
//! Every view is recomputed from the adjacency table on each call; none
//! is cached, so results always reflect the latest mutation.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::diagram::{DiagramError, PlanarDiagram};
use super::endpoint::Endpoint;
use super::node::NodeId;

/// A face (region) of the diagram: a cyclic sequence of endpoints.
///
/// The successor of `(v, i)` is the twin of `(v, i + 1)`: step to the next
/// position around the node, then cross the arc. Each endpoint `e` of a face
/// also names the boundary arc `{e, twin(e)}`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Face(Vec<Endpoint>);

impl Face {
    /// Endpoints in traversal order, starting from the smallest.
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.0
    }

    /// Number of endpoints on the boundary.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the face is empty (never true for faces of a valid diagram).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// How often each node occurs on the boundary.
    pub fn node_multiplicities(&self) -> BTreeMap<&NodeId, usize> {
        let mut counts = BTreeMap::new();
        for e in &self.0 {
            *counts.entry(&e.node).or_insert(0) += 1;
        }
        counts
    }

    /// Whether `e` lies on this face.
    pub fn contains(&self, e: &Endpoint) -> bool {
        self.0.contains(e)
    }
}

impl PlanarDiagram {
    /// Successor of `e` along its face.
    pub fn face_successor(&self, e: &Endpoint) -> Result<Endpoint, DiagramError> {
        let degree = self.degree(&e.node)?;
        self.twin(&e.rotate(1, degree))
    }

    /// The face containing `e`, starting at `e`.
    pub fn face_of(&self, e: &Endpoint) -> Result<Vec<Endpoint>, DiagramError> {
        let mut face = vec![e.clone()];
        let mut current = self.face_successor(e)?;
        while &current != e {
            if face.len() > self.endpoint_count() {
                // Only reachable when twins are not symmetric.
                return Err(DiagramError::UnsetEndpoint(current));
            }
            face.push(current.clone());
            current = self.face_successor(&current)?;
        }
        Ok(face)
    }

    /// All faces. Faces partition the endpoint set; each face starts at its
    /// smallest endpoint and faces are listed in order of that endpoint.
    pub fn faces(&self) -> Result<Vec<Face>, DiagramError> {
        let mut seen: BTreeSet<Endpoint> = BTreeSet::new();
        let mut faces = Vec::new();
        for e in self.endpoints() {
            if seen.contains(&e) {
                continue;
            }
            let face = self.face_of(&e)?;
            seen.extend(face.iter().cloned());
            faces.push(Face(face));
        }
        Ok(faces)
    }

    /// Faces with exactly `len` endpoints.
    pub fn faces_of_len(&self, len: usize) -> Result<Vec<Face>, DiagramError> {
        Ok(self.faces()?.into_iter().filter(|f| f.len() == len).collect())
    }

    /// Nodes adjacent to `id`, in position order (with repetitions).
    pub fn neighbours(&self, id: &NodeId) -> Result<Vec<NodeId>, DiagramError> {
        let node = self
            .node(id)
            .ok_or_else(|| DiagramError::NodeNotFound(id.clone()))?;
        Ok(node
            .slots
            .iter()
            .flatten()
            .map(|s| s.twin.node.clone())
            .collect())
    }

    /// Connected components as node sets, ordered by smallest node.
    pub fn connected_components(&self) -> Vec<BTreeSet<NodeId>> {
        self.components_avoiding(None)
    }

    fn components_avoiding(&self, avoid: Option<&NodeId>) -> Vec<BTreeSet<NodeId>> {
        let mut seen: BTreeSet<&NodeId> = BTreeSet::new();
        let mut components = Vec::new();
        for start in self.nodes.keys() {
            if Some(start) == avoid || seen.contains(start) {
                continue;
            }
            let mut component = BTreeSet::new();
            let mut queue = VecDeque::from([start]);
            seen.insert(start);
            while let Some(id) = queue.pop_front() {
                component.insert(id.clone());
                let Some(node) = self.nodes.get(id) else {
                    continue;
                };
                for slot in node.slots.iter().flatten() {
                    let Some((next, _)) = self.nodes.get_key_value(&slot.twin.node) else {
                        continue;
                    };
                    if Some(next) != avoid && seen.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
            components.push(component);
        }
        components
    }

    /// Number of connected components.
    pub fn component_count(&self) -> usize {
        self.connected_components().len()
    }

    /// Whether the diagram has at most one component.
    pub fn is_connected(&self) -> bool {
        self.component_count() <= 1
    }

    /// Copy of the nodes in `nodes`, unframed and without diagram
    /// attributes. `nodes` should be closed under adjacency.
    pub fn component_subdiagram(&self, nodes: &BTreeSet<NodeId>) -> PlanarDiagram {
        PlanarDiagram {
            nodes: self
                .nodes
                .iter()
                .filter(|(id, _)| nodes.contains(*id))
                .map(|(id, n)| (id.clone(), n.clone()))
                .collect(),
            framing: None,
            attrs: Default::default(),
        }
    }

    /// Split into one subdiagram per connected component.
    pub fn disjoint_components(&self) -> Vec<PlanarDiagram> {
        self.connected_components()
            .iter()
            .map(|c| self.component_subdiagram(c))
            .collect()
    }

    /// Cut nodes: nodes whose removal separates their incident arcs.
    ///
    /// A self-loop forms its own block, so a node carrying a loop and any
    /// other arc is a cut node.
    pub fn cut_nodes(&self) -> BTreeSet<NodeId> {
        let mut cut = BTreeSet::new();
        for (id, node) in &self.nodes {
            if node.degree() < 2 {
                continue;
            }
            let mut membership: BTreeMap<&NodeId, usize> = BTreeMap::new();
            for (i, component) in self.components_avoiding(Some(id)).iter().enumerate() {
                for member in component {
                    if let Some((key, _)) = self.nodes.get_key_value(member) {
                        membership.insert(key, i);
                    }
                }
            }
            let mut blocks: BTreeSet<(bool, usize)> = BTreeSet::new();
            for (p, slot) in node.slots.iter().enumerate() {
                let Some(slot) = slot else { continue };
                if &slot.twin.node == id {
                    blocks.insert((true, p.min(slot.twin.position)));
                } else if let Some(c) = membership.get(&slot.twin.node) {
                    blocks.insert((false, *c));
                }
            }
            if blocks.len() > 1 {
                cut.insert(id.clone());
            }
        }
        cut
    }

    /// Sizes of the breadth-first layers around `id` (distance 1, 2, ...).
    pub fn layer_sizes(&self, id: &NodeId) -> Vec<usize> {
        let mut seen: BTreeSet<&NodeId> = BTreeSet::new();
        let Some((start, _)) = self.nodes.get_key_value(id) else {
            return Vec::new();
        };
        seen.insert(start);
        let mut layer = vec![start];
        let mut sizes = Vec::new();
        loop {
            let mut next = Vec::new();
            for current in &layer {
                let Some(node) = self.nodes.get(*current) else {
                    continue;
                };
                for slot in node.slots.iter().flatten() {
                    if let Some((key, _)) = self.nodes.get_key_value(&slot.twin.node) {
                        if seen.insert(key) {
                            next.push(key);
                        }
                    }
                }
            }
            if next.is_empty() {
                return sizes;
            }
            sizes.push(next.len());
            layer = next;
        }
    }

    /// Number of closed strands when every node is a crossing or a
    /// degree-2 vertex; `None` for genuine graph diagrams.
    ///
    /// A strand passes straight through a crossing (`p` to `p + 2`) and
    /// through a degree-2 vertex (`0` to `1`).
    pub fn link_components(&self) -> Result<Option<usize>, DiagramError> {
        if self
            .nodes
            .values()
            .any(|n| !n.is_crossing() && n.degree() != 2)
        {
            return Ok(None);
        }
        let mut visited: BTreeSet<Endpoint> = BTreeSet::new();
        let mut count = 0;
        for start in self.endpoints() {
            if visited.contains(&start) {
                continue;
            }
            count += 1;
            let mut e = start;
            while visited.insert(e.clone()) {
                let degree = self.degree(&e.node)?;
                let across = e.rotate(degree / 2, degree);
                visited.insert(across.clone());
                e = self.twin(&across)?;
            }
        }
        Ok(Some(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(node: &str, position: usize) -> Endpoint {
        Endpoint::new(node, position)
    }

    /// Standard trefoil: a=X(b3 c0 c3 b0) b=X(a3 c2 c1 a0) c=X(a1 b2 b1 a2)
    fn trefoil() -> PlanarDiagram {
        let mut k = PlanarDiagram::new();
        for c in ["a", "b", "c"] {
            k.add_crossing(c).unwrap();
        }
        k.set_arc(e("a", 0), e("b", 3)).unwrap();
        k.set_arc(e("a", 1), e("c", 0)).unwrap();
        k.set_arc(e("a", 2), e("c", 3)).unwrap();
        k.set_arc(e("a", 3), e("b", 0)).unwrap();
        k.set_arc(e("b", 1), e("c", 2)).unwrap();
        k.set_arc(e("b", 2), e("c", 1)).unwrap();
        k
    }

    #[test]
    fn test_trefoil_faces() {
        let k = trefoil();
        let faces = k.faces().unwrap();
        // 3 crossings, 6 arcs: 5 faces (two triangles, three bigons)
        assert_eq!(faces.len(), 5);
        let mut sizes: Vec<usize> = faces.iter().map(Face::len).collect();
        sizes.sort();
        assert_eq!(sizes, vec![2, 2, 2, 3, 3]);

        let total: usize = faces.iter().map(Face::len).sum();
        assert_eq!(total, k.endpoint_count());
    }

    #[test]
    fn test_unknot_loop_faces() {
        let mut k = PlanarDiagram::new();
        k.add_unknot().unwrap();
        let faces = k.faces().unwrap();
        assert_eq!(faces.len(), 2);
        assert!(k.cut_nodes().is_empty());
        assert_eq!(k.link_components().unwrap(), Some(1));
    }

    #[test]
    fn test_kink_crossing_is_cut_node() {
        // Figure-eight curve: one crossing with two kinks.
        let mut k = PlanarDiagram::new();
        k.add_crossing("a").unwrap();
        k.set_arc(e("a", 0), e("a", 1)).unwrap();
        k.set_arc(e("a", 2), e("a", 3)).unwrap();

        assert_eq!(k.cut_nodes(), BTreeSet::from([NodeId::from("a")]));
        let faces = k.faces().unwrap();
        assert_eq!(faces.len(), 3);
        assert!(faces
            .iter()
            .any(|f| f.node_multiplicities().values().any(|&m| m > 1)));
    }

    #[test]
    fn test_components_and_subdiagrams() {
        let mut k = trefoil();
        k.add_unknot().unwrap();
        assert_eq!(k.component_count(), 2);
        let parts = k.disjoint_components();
        assert_eq!(parts[0].crossing_count(), 3);
        assert_eq!(parts[1].node_count(), 1);
    }

    #[test]
    fn test_trefoil_is_a_knot() {
        assert_eq!(trefoil().link_components().unwrap(), Some(1));
    }

    #[test]
    fn test_layer_sizes() {
        let k = trefoil();
        assert_eq!(k.layer_sizes(&"a".into()), vec![2]);
    }
}
