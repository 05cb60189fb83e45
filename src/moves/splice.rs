//! Removing crossings and reconnecting the strands that ran through them.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{DiagramError, Endpoint, NodeId, PlanarDiagram};

/// The endpoint a strand leaves through after entering at `e`.
fn through(e: &Endpoint, degree: usize) -> Endpoint {
    e.rotate(degree / 2, degree)
}

/// Delete `removed` and reconnect every strand that passed through it.
///
/// Each external endpoint attached to a removed node is followed
/// straight through the removed region until the strand leaves it again;
/// the two ends are joined. Strands that never leave (closed loops inside
/// the region) each become a new unknot. Returns the number of unknots
/// created.
pub(crate) fn splice_out(
    k: &mut PlanarDiagram,
    removed: &BTreeSet<NodeId>,
) -> Result<usize, DiagramError> {
    let mut twin_of: BTreeMap<Endpoint, Endpoint> = BTreeMap::new();
    let mut degrees: BTreeMap<&NodeId, usize> = BTreeMap::new();
    for id in removed {
        let degree = k.degree(id)?;
        degrees.insert(id, degree);
        for e in k.node_endpoints(id)? {
            let twin = k.twin(&e)?;
            twin_of.insert(e, twin);
        }
    }
    let inside = |e: &Endpoint| removed.contains(&e.node);
    let limit = twin_of.len() + 1;

    let mut visited: BTreeSet<Endpoint> = BTreeSet::new();
    let mut joined: BTreeSet<Endpoint> = BTreeSet::new();
    let mut joins: Vec<(Endpoint, Endpoint)> = Vec::new();
    let externals: Vec<(Endpoint, Endpoint)> = twin_of
        .iter()
        .filter(|(_, twin)| !inside(twin))
        .map(|(leg, twin)| (twin.clone(), leg.clone()))
        .collect();

    for (start, leg) in externals {
        if joined.contains(&start) {
            continue;
        }
        let mut current = leg;
        let mut end = None;
        for _ in 0..limit {
            visited.insert(current.clone());
            let degree = degrees.get(&current.node).copied().unwrap_or(0);
            let exit = through(&current, degree);
            visited.insert(exit.clone());
            let next = twin_of
                .get(&exit)
                .cloned()
                .ok_or_else(|| DiagramError::UnsetEndpoint(exit.clone()))?;
            if inside(&next) {
                current = next;
            } else {
                end = Some(next);
                break;
            }
        }
        let end = end.ok_or_else(|| DiagramError::UnsetEndpoint(start.clone()))?;
        joined.insert(start.clone());
        joined.insert(end.clone());
        joins.push((start, end));
    }

    let mut loops = 0;
    let all: Vec<Endpoint> = twin_of.keys().cloned().collect();
    for e in all {
        if visited.contains(&e) {
            continue;
        }
        loops += 1;
        let mut current = e;
        for _ in 0..limit {
            if !visited.insert(current.clone()) {
                break;
            }
            let degree = degrees.get(&current.node).copied().unwrap_or(0);
            let exit = through(&current, degree);
            visited.insert(exit.clone());
            match twin_of.get(&exit) {
                Some(next) => current = next.clone(),
                None => break,
            }
        }
    }

    for id in removed {
        k.remove_node(id, false)?;
    }
    for (a, b) in joins {
        k.set_arc(a, b)?;
    }
    for _ in 0..loops {
        k.add_unknot()?;
    }
    Ok(loops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::parse_native;

    #[test]
    fn test_splice_single_crossing_with_kink() {
        // A kink on an unknot drawn through vertex `v`.
        let mut k = parse_native("v=V(x2 x3) x=X(x1 x0 v0 v1)").unwrap();
        let loops = splice_out(&mut k, &BTreeSet::from([NodeId::from("x")])).unwrap();
        assert_eq!(loops, 0);
        assert_eq!(k.twin(&Endpoint::new("v", 0)).unwrap(), Endpoint::new("v", 1));
        assert!(k.sanity_check().is_ok());
    }

    #[test]
    fn test_splice_closed_loop_becomes_unknot() {
        // Figure-eight curve: one crossing, two kinks, one strand.
        let mut k = parse_native("x=X(x1 x0 x3 x2)").unwrap();
        let loops = splice_out(&mut k, &BTreeSet::from([NodeId::from("x")])).unwrap();
        assert_eq!(loops, 1);
        assert_eq!(k.node_count(), 1);
        assert!(k.sanity_check().is_ok());
    }
}
