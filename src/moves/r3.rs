//! Reidemeister III: sliding a strand across a crossing.

use std::collections::{BTreeMap, BTreeSet};

use rand::seq::SliceRandom;
use rand::Rng;

use super::{MoveError, MoveLocation};
use crate::types::{Endpoint, PlanarDiagram, CROSSING_DEGREE};

fn is_flippable(k: &PlanarDiagram, face: &[Endpoint]) -> bool {
    let [a, b, c] = face else {
        return false;
    };
    let nodes: BTreeSet<_> = [&a.node, &b.node, &c.node].into_iter().collect();
    let parities: BTreeSet<usize> = face.iter().map(|e| e.position % 2).collect();
    nodes.len() == 3 && face.iter().all(|e| k.is_crossing(&e.node)) && parities.len() == 2
}

/// All non-alternating triangles on three distinct crossings.
pub fn find_r3(k: &PlanarDiagram) -> Result<impl Iterator<Item = MoveLocation> + '_, MoveError> {
    let faces = k.faces_of_len(3)?;
    Ok(faces.into_iter().filter_map(move |face| {
        let e = face.endpoints();
        is_flippable(k, e).then(|| MoveLocation::R3 {
            face: [e[0].clone(), e[1].clone(), e[2].clone()],
        })
    }))
}

/// First flippable triangle, if any.
pub fn choose_r3(k: &PlanarDiagram) -> Result<Option<MoveLocation>, MoveError> {
    Ok(find_r3(k)?.next())
}

/// Uniformly random flippable triangle, if any.
pub fn choose_random_r3<R: Rng>(
    k: &PlanarDiagram,
    rng: &mut R,
) -> Result<Option<MoveLocation>, MoveError> {
    let all: Vec<MoveLocation> = find_r3(k)?.collect();
    Ok(all.choose(rng).cloned())
}

/// Flip the triangle `face = [(v0, p0), (v1, p1), (v2, p2)]`.
///
/// Each crossing keeps its label and the pair of strands through it; the
/// six external legs move to the opposite side of the triangle:
///
/// ```text
/// old (v_k, p_k + 3)  ->  new (v_{k+1}, p_{k+1})
/// old (v_k, p_k + 2)  ->  new (v_{k-1}, p_{k-1} + 1)
/// ```
///
/// and the new triangle is `[(v_k, p_k + 2)]`, so flipping it again
/// restores the original diagram.
pub fn r3_in_place(k: &mut PlanarDiagram, face: &[Endpoint; 3]) -> Result<(), MoveError> {
    let location = MoveLocation::R3 { face: face.clone() };
    if !is_flippable(k, face) {
        return Err(MoveError::invalid(
            &location,
            "needs three distinct crossings not all of the same position parity",
        ));
    }
    if face.iter().any(|e| e.position >= CROSSING_DEGREE) {
        return Err(MoveError::invalid(&location, "position out of range"));
    }
    for i in 0..3 {
        if k.face_successor(&face[i])? != face[(i + 1) % 3] {
            return Err(MoveError::invalid(&location, "not a triangle"));
        }
    }

    let at = |i: usize, offset: usize| face[i % 3].rotate(offset, CROSSING_DEGREE);

    let mut moved: BTreeMap<Endpoint, Endpoint> = BTreeMap::new();
    for i in 0..3 {
        moved.insert(at(i, 3), at(i + 1, 0));
        moved.insert(at(i, 2), at(i + 2, 1));
    }
    // An arc between two legs is listed from both ends; writing it twice is harmless.
    let mut arcs: Vec<(Endpoint, Endpoint)> = Vec::new();
    for (leg, new) in &moved {
        let twin = k.twin(leg)?;
        let other = moved.get(&twin).cloned().unwrap_or(twin);
        arcs.push((new.clone(), other));
    }
    for i in 0..3 {
        arcs.push((at(i, 3), at(i + 1, 2)));
    }

    for (a, b) in arcs {
        k.set_arc(a, b)?;
    }
    Ok(())
}
