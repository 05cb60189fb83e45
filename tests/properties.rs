//! Property tests: canonical forms and moves on randomly moved diagrams.

use std::collections::BTreeMap;

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use pd_kernel::{
    apply_move, canonical, find_moves, parse_native, to_native, DiagramError, Endpoint,
    MoveOptions, MoveSet, NodeId, PlanarDiagram,
};

const BASES: &[&str] = &[
    "a=X(b3 c0 c3 b0) b=X(a3 c2 c1 a0) c=X(a1 b2 b1 a2)",
    "a=V(b0 c0 d3) b=V(a0 d2 c1) c=X(a1 b2 d1 d0) d=X(c3 c2 b1 a2)",
    "a=V(a1 a0) [framing=0]",
    "x=X(x1 x0 x3 x2)",
    "a=V(b1 b0) b=V(a1 a0)",
];

/// A base diagram after up to `steps` random moves of any kind.
fn moved_diagram(base: usize, seed: u64, steps: usize) -> PlanarDiagram {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut k = parse_native(BASES[base]).unwrap();
    for _ in 0..steps {
        let locations = find_moves(&k, &MoveSet::all()).unwrap();
        let Some(location) = locations.choose(&mut rng) else {
            break;
        };
        k = apply_move(&k, location, &MoveOptions::checked()).unwrap();
    }
    k
}

fn shuffled_labels(k: &PlanarDiagram, seed: u64) -> PlanarDiagram {
    let mut rng = StdRng::seed_from_u64(seed);
    let ids: Vec<NodeId> = k.nodes().cloned().collect();
    let mut targets: Vec<NodeId> = (0..ids.len()).map(|i| NodeId::from_index(i + 30)).collect();
    targets.shuffle(&mut rng);
    let mapping: BTreeMap<NodeId, NodeId> = ids.into_iter().zip(targets).collect();
    k.relabel(&mapping).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_random_moves_keep_diagram_valid(
        base in 0..BASES.len(),
        seed in any::<u64>(),
        steps in 0usize..6,
    ) {
        let k = moved_diagram(base, seed, steps);
        prop_assert!(k.sanity_check().is_ok());
        prop_assert_eq!(k.endpoint_count(), 2 * k.arc_count());
        for e in k.endpoints() {
            let twin = k.twin(&e).unwrap();
            prop_assert_eq!(k.twin(&twin).unwrap(), e);
        }
    }

    #[test]
    fn prop_moves_preserve_link_components(
        base in 0..BASES.len(),
        seed in any::<u64>(),
        steps in 0usize..6,
    ) {
        let original = parse_native(BASES[base]).unwrap();
        let k = moved_diagram(base, seed, steps);
        prop_assert_eq!(k.link_components().unwrap(), original.link_components().unwrap());
    }

    #[test]
    fn prop_canonical_is_idempotent(
        base in 0..BASES.len(),
        seed in any::<u64>(),
        steps in 0usize..5,
    ) {
        let c = canonical(&moved_diagram(base, seed, steps)).unwrap();
        prop_assert_eq!(canonical(&c).unwrap(), c.clone());
        prop_assert_eq!(parse_native(&to_native(&c)).unwrap(), c);
    }

    #[test]
    fn prop_canonical_ignores_labels_and_rotations(
        base in 0..BASES.len(),
        seed in any::<u64>(),
        steps in 0usize..5,
        relabel_seed in any::<u64>(),
    ) {
        let k = moved_diagram(base, seed, steps);
        let expected = canonical(&k).unwrap();

        let renamed = shuffled_labels(&k, relabel_seed);
        prop_assert_eq!(canonical(&renamed).unwrap(), expected.clone());

        let mut rotated = k.clone();
        let ids: Vec<NodeId> = k.nodes().cloned().collect();
        for id in &ids {
            let by = if k.is_crossing(id) { 2 } else { 1 };
            rotated.rotate_node(id, by).unwrap();
        }
        prop_assert_eq!(canonical(&rotated).unwrap(), expected);
    }

    #[test]
    fn prop_notation_round_trips_user_labels(
        id in "[A-Za-z0-9_ ,=:{}\\[\\]-]{0,6}",
        key in any::<String>(),
        value in any::<String>(),
        attr in any::<String>(),
        framing in proptest::option::of(-5i64..5),
    ) {
        let mut k = PlanarDiagram::new();
        match k.add_vertex(id.as_str(), 2) {
            Err(DiagramError::InvalidNodeId(rejected)) => {
                prop_assert_eq!(rejected, id.clone());
                prop_assert!(!NodeId::from(id.as_str()).is_valid());
                return Ok(());
            }
            other => prop_assert!(other.is_ok()),
        }
        let e0 = Endpoint::new(id.as_str(), 0);
        k.set_arc(e0.clone(), Endpoint::new(id.as_str(), 1)).unwrap();
        k.set_endpoint_attr(&e0, key.clone(), value.clone()).unwrap();
        k.attrs_mut().insert(key, attr);
        k.set_framing(framing);

        let back = parse_native(&to_native(&k));
        prop_assert!(back.is_ok(), "{:?} from {}", back, to_native(&k));
        let back = back.unwrap();
        prop_assert_eq!(back.attrs(), k.attrs());
        prop_assert_eq!(back, k);
    }
}
