//! Merging diagrams that are equivalent under the allowed moves.
//!
//! Each distinct canonical input grows its own leveled set of diagrams
//! reachable by crossing reduction and R3 flips. The sets of all classes
//! grow in parallel, one level per round; after every round, classes
//! whose reachable sets share a diagram are unioned in a
//! [`DisjointSet`]. The process stops when no set gains a new diagram,
//! when `max_depth` rounds have run, or when a budget runs out.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::SearchConfig;
use super::leveled::LeveledSet;
use super::strategy::Search;
use super::{prepare, BudgetKind, SearchError, SearchStatus};
use crate::canonical::canonical;
use crate::disjoint_set::DisjointSet;
use crate::types::PlanarDiagram;

/// Outcome of [`reduce_equivalent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reduction {
    /// One representative per class: the minimum diagram reached.
    pub representatives: Vec<PlanarDiagram>,
    /// Input indices per class, aligned with `representatives`.
    pub classes: Vec<Vec<usize>>,
    /// How the search ended.
    pub status: SearchStatus,
    /// Rounds run.
    pub rounds: usize,
}

impl Reduction {
    /// Number of classes found.
    pub fn class_count(&self) -> usize {
        self.representatives.len()
    }
}

fn grow(set: &mut LeveledSet<PlanarDiagram>, search: &mut Search<'_>) -> Result<(), SearchError> {
    if set.last_level().is_empty() {
        return Ok(());
    }
    let frontier: Vec<PlanarDiagram> = set.last_level().iter().cloned().collect();
    set.new_level();
    for d in &frontier {
        if search.meter.check().is_some() {
            break;
        }
        let settled = search.settle(d.clone())?;
        set.insert(settled);
        for next in search.r3_neighbours(d)? {
            set.insert(next);
        }
    }
    Ok(())
}

/// Group `inputs` into classes of diagrams shown equivalent by the moves
/// in `config`.
///
/// Diagrams in different classes were not shown equivalent; when the
/// status is a budget exhaustion, some of them may still be.
pub fn reduce_equivalent(
    inputs: &[PlanarDiagram],
    config: &SearchConfig,
) -> Result<Reduction, SearchError> {
    let input_forms: Vec<PlanarDiagram> = inputs
        .iter()
        .map(|k| -> Result<PlanarDiagram, SearchError> { Ok(canonical(&prepare(k, config)?)?) })
        .collect::<Result<_, _>>()?;
    let mut forms: Vec<PlanarDiagram> = Vec::with_capacity(inputs.len());
    let mut classes: DisjointSet<PlanarDiagram> = DisjointSet::new();
    for form in &input_forms {
        if classes.add(form.clone()) {
            forms.push(form.clone());
        }
    }

    let mut sets: Vec<LeveledSet<PlanarDiagram>> = forms
        .iter()
        .map(|form| LeveledSet::from_items([form.clone()]))
        .collect();
    let mut searches: Vec<Search<'_>> = forms.iter().map(|_| Search::new(config)).collect();

    let mut rounds = 0;
    let mut depth_reached = false;
    loop {
        if sets.iter().all(|set| set.last_level().is_empty()) {
            break;
        }
        if rounds >= config.max_depth {
            depth_reached = true;
            break;
        }
        if searches.iter().any(|s| s.meter.exhausted().is_some()) {
            break;
        }
        rounds += 1;

        sets.par_iter_mut()
            .zip(searches.par_iter_mut())
            .map(|(set, search)| grow(set, search))
            .collect::<Result<Vec<()>, SearchError>>()?;

        let mut owner: BTreeMap<&PlanarDiagram, usize> = BTreeMap::new();
        for (i, set) in sets.iter().enumerate() {
            for d in set.iter() {
                if let Some(&j) = owner.get(d) {
                    classes.union(&forms[i], &forms[j]);
                } else {
                    owner.insert(d, i);
                }
            }
        }
        debug!(
            round = rounds,
            classes = classes.class_count(),
            reached = owner.len(),
            "equivalence round"
        );
    }

    let status = match searches.iter().find_map(|s| s.meter.exhausted()) {
        Some(budget) => SearchStatus::BudgetExhausted { budget },
        None if depth_reached => SearchStatus::BudgetExhausted {
            budget: BudgetKind::Depth,
        },
        None => SearchStatus::Complete,
    };

    let index: BTreeMap<&PlanarDiagram, usize> =
        forms.iter().enumerate().map(|(i, f)| (f, i)).collect();
    let mut grouped: Vec<(PlanarDiagram, Vec<usize>)> = Vec::new();
    for members in classes.classes() {
        let best = members
            .iter()
            .filter_map(|form| index.get(form))
            .filter_map(|&i| sets[i].min())
            .min()
            .cloned();
        let Some(best) = best else { continue };
        let member_inputs: Vec<usize> = input_forms
            .iter()
            .enumerate()
            .filter(|(_, form)| members.contains(form))
            .map(|(n, _)| n)
            .collect();
        grouped.push((best, member_inputs));
    }
    grouped.sort();

    let (representatives, classes) = grouped.into_iter().unzip();
    Ok(Reduction {
        representatives,
        classes,
        status,
        rounds,
    })
}

/// Whether `a` and `b` were shown equivalent within the budgets.
///
/// `false` means no common diagram was found, which is not a proof of
/// inequivalence.
pub fn are_equivalent(
    a: &PlanarDiagram,
    b: &PlanarDiagram,
    config: &SearchConfig,
) -> Result<bool, SearchError> {
    let reduction = reduce_equivalent(&[a.clone(), b.clone()], config)?;
    Ok(reduction.class_count() == 1)
}

/// Like [`are_equivalent`], but fails with
/// [`SearchError::ResourceExhausted`] instead of answering `false` when a
/// budget ran out before both reachable sets were exhausted.
pub fn are_equivalent_strict(
    a: &PlanarDiagram,
    b: &PlanarDiagram,
    config: &SearchConfig,
) -> Result<bool, SearchError> {
    let reduction = reduce_equivalent(&[a.clone(), b.clone()], config)?;
    if reduction.class_count() == 1 {
        return Ok(true);
    }
    match reduction.status {
        SearchStatus::Complete => Ok(false),
        SearchStatus::BudgetExhausted { budget } => Err(SearchError::ResourceExhausted { budget }),
    }
}
