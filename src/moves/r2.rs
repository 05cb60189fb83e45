//! Reidemeister II: pushing one arc across another and pulling it back.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;

use super::splice::splice_out;
use super::{MoveError, MoveLocation};
use crate::types::{Endpoint, NodeKind, PlanarDiagram, CROSSING_DEGREE};

fn is_unpokeable(k: &PlanarDiagram, a: &Endpoint, b: &Endpoint) -> bool {
    a.node != b.node
        && k.is_crossing(&a.node)
        && k.is_crossing(&b.node)
        && a.position % 2 != b.position % 2
}

/// All bigons between two distinct crossings where one strand passes over
/// both crossings.
pub fn find_r2_unpoke(
    k: &PlanarDiagram,
) -> Result<impl Iterator<Item = MoveLocation> + '_, MoveError> {
    let faces = k.faces_of_len(2)?;
    Ok(faces.into_iter().filter_map(move |face| {
        let [a, b] = face.endpoints() else {
            return None;
        };
        is_unpokeable(k, a, b).then(|| MoveLocation::R2Unpoke {
            face: [a.clone(), b.clone()],
        })
    }))
}

/// First removable bigon, if any.
pub fn choose_r2_unpoke(k: &PlanarDiagram) -> Result<Option<MoveLocation>, MoveError> {
    Ok(find_r2_unpoke(k)?.next())
}

/// Uniformly random removable bigon, if any.
pub fn choose_random_r2_unpoke<R: Rng>(
    k: &PlanarDiagram,
    rng: &mut R,
) -> Result<Option<MoveLocation>, MoveError> {
    let all: Vec<MoveLocation> = find_r2_unpoke(k)?.collect();
    Ok(all.choose(rng).cloned())
}

/// All ordered pairs of distinct arcs sharing a face, as `over`/`under`
/// face elements.
pub fn find_r2_poke(
    k: &PlanarDiagram,
) -> Result<impl Iterator<Item = MoveLocation> + '_, MoveError> {
    let faces = k.faces()?;
    Ok(faces.into_iter().flat_map(move |face| {
        let elements = face.endpoints().to_vec();
        let mut found = Vec::new();
        for over in &elements {
            let Ok(twin) = k.twin(over) else { continue };
            for under in &elements {
                if under != over && *under != twin {
                    found.push(MoveLocation::R2Poke {
                        over: over.clone(),
                        under: under.clone(),
                    });
                }
            }
        }
        found
    }))
}

/// First poke, if any.
pub fn choose_r2_poke(k: &PlanarDiagram) -> Result<Option<MoveLocation>, MoveError> {
    Ok(find_r2_poke(k)?.next())
}

/// Uniformly random poke, if any.
pub fn choose_random_r2_poke<R: Rng>(
    k: &PlanarDiagram,
    rng: &mut R,
) -> Result<Option<MoveLocation>, MoveError> {
    let all: Vec<MoveLocation> = find_r2_poke(k)?.collect();
    Ok(all.choose(rng).cloned())
}

/// Remove the two crossings of the bigon `face` and reconnect their
/// external legs. Kinks, short circuits and strands closing up into
/// unknots are all handled by following strands through the bigon.
pub fn r2_unpoke_in_place(k: &mut PlanarDiagram, face: &[Endpoint; 2]) -> Result<(), MoveError> {
    let location = MoveLocation::R2Unpoke { face: face.clone() };
    let [a, b] = face;
    if !is_unpokeable(k, a, b) {
        return Err(MoveError::invalid(
            &location,
            "needs two distinct crossings of mixed position parity",
        ));
    }
    if a.position >= CROSSING_DEGREE || b.position >= CROSSING_DEGREE {
        return Err(MoveError::invalid(&location, "position out of range"));
    }
    if k.face_successor(a)? != *b || k.face_successor(b)? != *a {
        return Err(MoveError::invalid(&location, "not a bigon"));
    }

    splice_out(k, &BTreeSet::from([a.node.clone(), b.node.clone()]))?;
    Ok(())
}

/// Push the arc of `over` across the arc of `under` inside their common
/// face, creating two crossings where the first arc passes over.
///
/// The new crossings `x`, `y` are wired as
///
/// ```text
/// x0-y2  x1-y1  x2-twin(under)  x3-over  y0-under  y3-twin(over)
/// ```
///
/// leaving the bigon `[x0, y1]`.
pub fn r2_poke_in_place(
    k: &mut PlanarDiagram,
    over: &Endpoint,
    under: &Endpoint,
) -> Result<(), MoveError> {
    let location = MoveLocation::R2Poke {
        over: over.clone(),
        under: under.clone(),
    };
    let over_twin = k.twin(over)?;
    let under_twin = k.twin(under)?;
    if under == over || *under == over_twin {
        return Err(MoveError::invalid(&location, "arcs must be distinct"));
    }
    if !k.face_of(over)?.contains(under) {
        return Err(MoveError::invalid(&location, "arcs do not share a face"));
    }

    let x = k.fresh_node_id();
    k.add_node(x.clone(), NodeKind::Crossing, CROSSING_DEGREE)?;
    let y = k.fresh_node_id();
    k.add_node(y.clone(), NodeKind::Crossing, CROSSING_DEGREE)?;
    let xe = |p: usize| Endpoint::new(x.clone(), p);
    let ye = |p: usize| Endpoint::new(y.clone(), p);

    k.set_arc(xe(0), ye(2))?;
    k.set_arc(xe(1), ye(1))?;
    k.set_arc(xe(2), under_twin)?;
    k.set_arc(xe(3), over.clone())?;
    k.set_arc(ye(0), under.clone())?;
    k.set_arc(ye(3), over_twin)?;
    Ok(())
}
