//! Reidemeister I: adding and removing kinks.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;

use super::splice::splice_out;
use super::{MoveError, MoveLocation};
use crate::types::{Endpoint, NodeKind, PlanarDiagram, Slot, CROSSING_DEGREE};

/// All kinks: 1-faces at crossings.
pub fn find_r1_remove(
    k: &PlanarDiagram,
) -> Result<impl Iterator<Item = MoveLocation> + '_, MoveError> {
    let faces = k.faces_of_len(1)?;
    Ok(faces.into_iter().filter_map(move |face| {
        let e = face.endpoints().first()?.clone();
        k.is_crossing(&e.node)
            .then_some(MoveLocation::R1Remove { endpoint: e })
    }))
}

/// First kink, if any.
pub fn choose_r1_remove(k: &PlanarDiagram) -> Result<Option<MoveLocation>, MoveError> {
    Ok(find_r1_remove(k)?.next())
}

/// Uniformly random kink, if any.
pub fn choose_random_r1_remove<R: Rng>(
    k: &PlanarDiagram,
    rng: &mut R,
) -> Result<Option<MoveLocation>, MoveError> {
    let all: Vec<MoveLocation> = find_r1_remove(k)?.collect();
    Ok(all.choose(rng).cloned())
}

/// Every endpoint with both signs.
pub fn find_r1_add(k: &PlanarDiagram) -> impl Iterator<Item = MoveLocation> + '_ {
    k.endpoints().flat_map(|endpoint| {
        [1, -1].map(|sign| MoveLocation::R1Add {
            endpoint: endpoint.clone(),
            sign,
        })
    })
}

/// First kink insertion, if the diagram has any arc.
pub fn choose_r1_add(k: &PlanarDiagram) -> Option<MoveLocation> {
    find_r1_add(k).next()
}

/// Uniformly random kink insertion.
pub fn choose_random_r1_add<R: Rng>(
    k: &PlanarDiagram,
    rng: &mut R,
) -> Option<MoveLocation> {
    let endpoints: Vec<Endpoint> = k.endpoints().collect();
    let endpoint = endpoints.choose(rng)?.clone();
    let sign = if rng.gen_bool(0.5) { 1 } else { -1 };
    Some(MoveLocation::R1Add { endpoint, sign })
}

/// Remove the kink whose loop bounds the 1-face `[endpoint]`.
///
/// The loop joins positions `p` and `p + 1`; the other two legs are
/// reconnected, or become an unknot if they were joined to each other.
/// Framing drops by one for a kink at an even position and rises by one
/// at an odd position.
pub fn r1_remove_in_place(k: &mut PlanarDiagram, endpoint: &Endpoint) -> Result<(), MoveError> {
    let location = MoveLocation::R1Remove {
        endpoint: endpoint.clone(),
    };
    if !k.is_crossing(&endpoint.node) {
        return Err(MoveError::invalid(&location, "not a crossing"));
    }
    if endpoint.position >= CROSSING_DEGREE {
        return Err(MoveError::invalid(&location, "position out of range"));
    }
    let loop_end = endpoint.rotate(1, CROSSING_DEGREE);
    if k.twin(&loop_end)? != *endpoint {
        return Err(MoveError::invalid(&location, "not a 1-face"));
    }

    splice_out(k, &BTreeSet::from([endpoint.node.clone()]))?;
    k.shift_framing(if endpoint.position % 2 == 0 { -1 } else { 1 });
    Ok(())
}

/// Insert a kink on the arc of `endpoint`. `sign` +1 puts the loop on
/// positions 0 and 1 of the new crossing, −1 on positions 1 and 2.
/// Framing changes by `sign`.
pub fn r1_add_in_place(k: &mut PlanarDiagram, endpoint: &Endpoint, sign: i8) -> Result<(), MoveError> {
    let location = MoveLocation::R1Add {
        endpoint: endpoint.clone(),
        sign,
    };
    let offset = match sign {
        1 => 0,
        -1 => 1,
        _ => return Err(MoveError::invalid(&location, "sign must be +1 or -1")),
    };
    let slot = k.slot(endpoint)?.clone();
    let twin = slot.twin.clone();

    let id = k.fresh_node_id();
    k.add_node(id.clone(), NodeKind::Crossing, CROSSING_DEGREE)?;
    let at = |i: usize| Endpoint::new(id.clone(), (offset + i) % CROSSING_DEGREE);

    k.set_arc(at(0), at(1))?;
    k.set_arc(endpoint.clone(), at(2))?;
    k.set_arc(twin, at(3))?;
    for i in 0..CROSSING_DEGREE {
        let new = at(i);
        if let Some(target) = k
            .nodes
            .get_mut(&new.node)
            .and_then(|n| n.slots.get_mut(new.position))
        {
            if let Some(Slot { attrs, .. }) = target.as_mut() {
                *attrs = slot.attrs.clone();
            }
        }
    }
    k.shift_framing(i64::from(sign));
    Ok(())
}
