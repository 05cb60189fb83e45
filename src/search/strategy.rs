//! Simplification strategies.
//!
//! | Strategy           | Moves used                 | Result                          |
//! |--------------------|----------------------------|---------------------------------|
//! | `CrossingReducing` | R1 remove, R2 unpoke       | first fixed point reached       |
//! | `NonIncreasing`    | + R3 (leveled BFS)         | minimum over the explored space |
//! | `Smart`            | + R2 poke detours          | minimum, restarting on progress |
//!
//! Only kinds present in [`SearchConfig::moves`] are used.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::config::{MoveChoice, SearchConfig};
use super::leveled::LeveledSet;
use super::{prepare, BudgetKind, Meter, SearchError, SearchReport};
use crate::canonical::canonical;
use crate::moves::{
    apply_move, apply_move_in_place, choose_r1_remove, choose_r2_unpoke, find_r1_remove,
    find_r2_poke, find_r2_unpoke, find_r3, MoveKind, MoveLocation, MoveSet,
};
use crate::types::{NodeId, PlanarDiagram};
use crate::PD_KERNEL_SCHEMA_VERSION;

/// A way of simplifying a diagram within the move space.
pub trait SimplificationStrategy {
    /// Short identifier used in reports.
    fn name(&self) -> &'static str;

    /// Simplify a copy of `k`.
    fn simplify(&self, k: &PlanarDiagram, config: &SearchConfig) -> Result<SearchReport, SearchError>;
}

/// Apply reducing moves until none is left.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossingReducing;

/// Breadth-first search over R3 flips, reducing after every flip.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonIncreasing;

/// Non-increasing search plus bounded poke-and-flip detours.
#[derive(Debug, Clone, Copy, Default)]
pub struct Smart;

impl SimplificationStrategy for CrossingReducing {
    fn name(&self) -> &'static str {
        "crossing_reducing"
    }

    fn simplify(&self, k: &PlanarDiagram, config: &SearchConfig) -> Result<SearchReport, SearchError> {
        run(self.name(), k, config, |k, search| search.settle(k.clone()))
    }
}

impl SimplificationStrategy for NonIncreasing {
    fn name(&self) -> &'static str {
        "non_increasing"
    }

    fn simplify(&self, k: &PlanarDiagram, config: &SearchConfig) -> Result<SearchReport, SearchError> {
        run(self.name(), k, config, |k, search| search.non_increasing(k))
    }
}

impl SimplificationStrategy for Smart {
    fn name(&self) -> &'static str {
        "smart"
    }

    fn simplify(&self, k: &PlanarDiagram, config: &SearchConfig) -> Result<SearchReport, SearchError> {
        run(self.name(), k, config, |k, search| search.smart(k))
    }
}

/// Strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// See [`CrossingReducing`].
    CrossingReducing,
    /// See [`NonIncreasing`].
    NonIncreasing,
    /// See [`Smart`].
    #[default]
    Smart,
}

impl SimplificationStrategy for Strategy {
    fn name(&self) -> &'static str {
        match self {
            Self::CrossingReducing => CrossingReducing.name(),
            Self::NonIncreasing => NonIncreasing.name(),
            Self::Smart => Smart.name(),
        }
    }

    fn simplify(&self, k: &PlanarDiagram, config: &SearchConfig) -> Result<SearchReport, SearchError> {
        match self {
            Self::CrossingReducing => CrossingReducing.simplify(k, config),
            Self::NonIncreasing => NonIncreasing.simplify(k, config),
            Self::Smart => Smart.simplify(k, config),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Strategy {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "crossing_reducing" | "reduce" => Ok(Self::CrossingReducing),
            "non_increasing" => Ok(Self::NonIncreasing),
            "smart" => Ok(Self::Smart),
            other => Err(SearchError::InvalidConfig(format!(
                "unknown strategy {other:?}"
            ))),
        }
    }
}

/// Simplify `k` with `strategy`.
pub fn simplify(
    k: &PlanarDiagram,
    strategy: Strategy,
    config: &SearchConfig,
) -> Result<SearchReport, SearchError> {
    strategy.simplify(k, config)
}

fn run<F>(name: &str, k: &PlanarDiagram, config: &SearchConfig, body: F) -> Result<SearchReport, SearchError>
where
    F: FnOnce(&PlanarDiagram, &mut Search<'_>) -> Result<PlanarDiagram, SearchError>,
{
    let prepared = prepare(k, config)?;
    let mut search = Search::new(config);
    let best = body(&prepared, &mut search)?;
    let meter = &search.meter;
    debug!(
        strategy = name,
        initial = prepared.crossing_count(),
        best = best.crossing_count(),
        explored = meter.diagrams,
        moves = meter.moves,
        "simplification finished"
    );
    Ok(SearchReport {
        schema_version: PD_KERNEL_SCHEMA_VERSION.to_string(),
        strategy: name.to_string(),
        initial_crossings: prepared.crossing_count(),
        final_crossings: best.crossing_count(),
        best,
        status: meter.status(),
        explored: meter.diagrams,
        moves: meter.moves,
        detours: meter.detours,
        elapsed_ms: meter.elapsed_ms(),
    })
}

/// Picks among applicable moves according to [`MoveChoice`].
pub(crate) struct Picker {
    rng: Option<StdRng>,
}

impl Picker {
    pub(crate) fn new(choice: MoveChoice) -> Self {
        let rng = match choice {
            MoveChoice::First => None,
            MoveChoice::Random { seed } => Some(StdRng::seed_from_u64(seed)),
        };
        Self { rng }
    }

    fn reducing_move(
        &mut self,
        k: &PlanarDiagram,
        moves: &MoveSet,
    ) -> Result<Option<MoveLocation>, SearchError> {
        let kinks = moves.contains(MoveKind::R1Remove);
        let bigons = moves.contains(MoveKind::R2Unpoke);
        match self.rng.as_mut() {
            None => {
                if kinks {
                    if let Some(location) = choose_r1_remove(k)? {
                        return Ok(Some(location));
                    }
                }
                if bigons {
                    return Ok(choose_r2_unpoke(k)?);
                }
                Ok(None)
            }
            Some(rng) => {
                let mut found = Vec::new();
                if kinks {
                    found.extend(find_r1_remove(k)?);
                }
                if bigons {
                    found.extend(find_r2_unpoke(k)?);
                }
                Ok(found.choose(rng).cloned())
            }
        }
    }
}

/// State of one search: configuration, budgets and move choice.
pub(crate) struct Search<'a> {
    config: &'a SearchConfig,
    pub(crate) meter: Meter<'a>,
    picker: Picker,
}

impl<'a> Search<'a> {
    pub(crate) fn new(config: &'a SearchConfig) -> Self {
        Self {
            config,
            meter: Meter::new(config),
            picker: Picker::new(config.choice),
        }
    }

    /// Apply reducing moves to a fixed point or until a budget runs out.
    pub(crate) fn reduce(&mut self, mut k: PlanarDiagram) -> Result<PlanarDiagram, SearchError> {
        let options = self.config.move_options();
        while self.meter.check().is_none() {
            let Some(location) = self.picker.reducing_move(&k, &self.config.moves)? else {
                break;
            };
            apply_move_in_place(&mut k, &location, &options)?;
            self.meter.moves += 1;
        }
        Ok(k)
    }

    /// Reduce, then canonicalize.
    pub(crate) fn settle(&mut self, k: PlanarDiagram) -> Result<PlanarDiagram, SearchError> {
        let reduced = self.reduce(k)?;
        self.meter.diagrams += 1;
        Ok(canonical(&reduced)?)
    }

    /// Neighbours of `k` under one R3 flip, each settled.
    pub(crate) fn r3_neighbours(
        &mut self,
        k: &PlanarDiagram,
    ) -> Result<Vec<PlanarDiagram>, SearchError> {
        let mut found = Vec::new();
        if !self.config.moves.contains(MoveKind::R3) {
            return Ok(found);
        }
        let options = self.config.move_options();
        let flips: Vec<MoveLocation> = find_r3(k)?.collect();
        for location in flips {
            if self.meter.check().is_some() {
                break;
            }
            let flipped = apply_move(k, &location, &options)?;
            self.meter.moves += 1;
            found.push(self.settle(flipped)?);
        }
        Ok(found)
    }

    /// Leveled BFS over R3 flips; the minimum over everything reached.
    pub(crate) fn non_increasing(&mut self, k: &PlanarDiagram) -> Result<PlanarDiagram, SearchError> {
        let start = self.settle(k.clone())?;
        let mut best = start.clone();
        let mut levels = LeveledSet::from_items([start]);

        for depth in 0..self.config.max_depth {
            let frontier: Vec<PlanarDiagram> = levels.last_level().iter().cloned().collect();
            levels.new_level();
            for d in &frontier {
                for next in self.r3_neighbours(d)? {
                    if next < best {
                        best = next.clone();
                    }
                    levels.insert(next);
                }
                if self.meter.check().is_some() {
                    return Ok(best);
                }
            }
            debug!(
                depth = depth + 1,
                level = levels.last_level().len(),
                total = levels.len(),
                best = best.crossing_count(),
                "explored level"
            );
            if levels.last_level().is_empty() {
                return Ok(best);
            }
        }
        if !levels.last_level().is_empty() && self.config.moves.contains(MoveKind::R3) {
            self.meter.record(BudgetKind::Depth);
        }
        Ok(best)
    }

    /// Non-increasing search, then poke-and-flip detours from the best
    /// diagram, restarting whenever a detour improves it.
    pub(crate) fn smart(&mut self, k: &PlanarDiagram) -> Result<PlanarDiagram, SearchError> {
        let mut best = self.non_increasing(k)?;
        let detours_allowed = self.config.moves.contains(MoveKind::R2Poke)
            && self.config.moves.contains(MoveKind::R3)
            && self.config.max_extra_crossings >= 2;

        while detours_allowed && best.crossing_count() > 0 {
            let limit = best.crossing_count() + self.config.max_extra_crossings;
            let Some(candidate) = self.detour(&best, &best, limit)? else {
                break;
            };
            debug!(
                from = best.crossing_count(),
                to = candidate.crossing_count(),
                detours = self.meter.detours,
                "detour improved diagram"
            );
            best = candidate;
        }
        Ok(best)
    }

    /// Whether no further detour may be tried.
    fn detours_spent(&mut self) -> bool {
        if self.meter.detours >= self.config.max_detours {
            self.meter.record(BudgetKind::Detours);
            return true;
        }
        self.meter.check().is_some()
    }

    /// Poke `current`, flip a triangle through the new crossings and run a
    /// non-increasing pass on the result. Pokes stack, shallowest first,
    /// while the crossing count stays within `limit`. Returns the first
    /// result below `best`.
    fn detour(
        &mut self,
        best: &PlanarDiagram,
        current: &PlanarDiagram,
        limit: usize,
    ) -> Result<Option<PlanarDiagram>, SearchError> {
        let options = self.config.move_options();
        let pokes: Vec<MoveLocation> = find_r2_poke(current)?.collect();
        let mut deeper = Vec::new();

        for poke in pokes {
            if self.meter.check().is_some() {
                return Ok(None);
            }
            let poked = apply_move(current, &poke, &options)?;
            self.meter.moves += 1;
            if poked.crossing_count() > limit {
                continue;
            }
            let fresh: BTreeSet<NodeId> = poked
                .nodes()
                .filter(|id| !current.contains_node(id))
                .cloned()
                .collect();
            let flips: Vec<MoveLocation> = find_r3(&poked)?
                .filter(|location| match location {
                    MoveLocation::R3 { face } => face.iter().any(|e| fresh.contains(&e.node)),
                    _ => false,
                })
                .collect();

            for flip in flips {
                if self.detours_spent() {
                    return Ok(None);
                }
                self.meter.detours += 1;
                trace!(%poke, %flip, extra = poked.crossing_count() - best.crossing_count(), "detour");
                let flipped = apply_move(&poked, &flip, &options)?;
                self.meter.moves += 1;
                let candidate = self.non_increasing(&flipped)?;
                if candidate < *best {
                    return Ok(Some(candidate));
                }
            }
            if poked.crossing_count() + 2 <= limit {
                deeper.push(poked);
            }
        }

        for poked in deeper {
            if let Some(found) = self.detour(best, &poked, limit)? {
                return Ok(Some(found));
            }
            if self.detours_spent() {
                return Ok(None);
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::r1_add_in_place;
    use crate::notation::parse_native;
    use crate::search::SearchStatus;
    use crate::types::Endpoint;

    const TREFOIL: &str = "a=X(b3 c0 c3 b0) b=X(a3 c2 c1 a0) c=X(a1 b2 b1 a2)";

    fn kinked_trefoil() -> PlanarDiagram {
        let mut k = parse_native(TREFOIL).unwrap();
        r1_add_in_place(&mut k, &Endpoint::new("a", 0), 1).unwrap();
        r1_add_in_place(&mut k, &Endpoint::new("b", 2), -1).unwrap();
        assert_eq!(k.crossing_count(), 5);
        k
    }

    #[test]
    fn test_crossing_reducing_removes_kinks() {
        let expected = canonical(&parse_native(TREFOIL).unwrap()).unwrap();
        for choice in [
            MoveChoice::First,
            MoveChoice::Random { seed: 1 },
            MoveChoice::Random { seed: 99 },
        ] {
            let config = SearchConfig::minimal().with_choice(choice);
            let report = CrossingReducing.simplify(&kinked_trefoil(), &config).unwrap();
            assert_eq!(report.best, expected);
            assert_eq!(report.initial_crossings, 5);
            assert_eq!(report.final_crossings, 3);
            assert_eq!(report.moves, 2);
            assert!(report.status.is_complete());
        }
    }

    #[test]
    fn test_figure_eight_curve_simplifies_to_unknot() {
        let k = parse_native("x=X(x1 x0 x3 x2)").unwrap();
        for strategy in [Strategy::CrossingReducing, Strategy::NonIncreasing, Strategy::Smart] {
            let report = simplify(&k, strategy, &SearchConfig::minimal()).unwrap();
            assert_eq!(report.final_crossings, 0);
            assert_eq!(report.best.node_count(), 1);
            assert_eq!(report.strategy, strategy.name());
        }
    }

    #[test]
    fn test_non_increasing_keeps_minimal_trefoil() {
        let expected = canonical(&parse_native(TREFOIL).unwrap()).unwrap();
        let report = NonIncreasing
            .simplify(&kinked_trefoil(), &SearchConfig::minimal())
            .unwrap();
        assert_eq!(report.best, expected);
        assert!(report.status.is_complete());
    }

    #[test]
    fn test_smart_never_worsens() {
        let k = parse_native(TREFOIL).unwrap();
        let report = Smart.simplify(&k, &SearchConfig::minimal()).unwrap();
        assert_eq!(report.best, canonical(&k).unwrap());
        assert_eq!(report.final_crossings, 3);
    }

    #[test]
    fn test_extra_crossings_bound_detour_depth() {
        let k = parse_native(TREFOIL).unwrap();
        let run = |extra: usize| {
            let config = SearchConfig {
                max_depth: 1,
                max_diagrams: 100_000,
                max_moves: 1_000_000,
                max_detours: 40,
                max_extra_crossings: extra,
                ..SearchConfig::minimal()
            };
            Smart.simplify(&k, &config).unwrap()
        };

        let single = run(2);
        assert!(single.detours > 0);
        assert!(single.detours < 40);
        // One poke adds two crossings; three extra still allows only one.
        assert_eq!(run(3).detours, single.detours);

        let stacked = run(4);
        assert!(stacked.detours > single.detours);
        for report in [&single, &stacked] {
            assert_eq!(report.best, canonical(&k).unwrap());
        }
    }

    #[test]
    fn test_budget_exhaustion_is_reported() {
        let config = SearchConfig {
            max_diagrams: 0,
            ..SearchConfig::minimal()
        };
        let report = NonIncreasing.simplify(&kinked_trefoil(), &config).unwrap();
        assert_eq!(
            report.status,
            SearchStatus::BudgetExhausted {
                budget: BudgetKind::Diagrams
            }
        );
        assert_eq!(report.moves, 0);
        assert_eq!(report.final_crossings, 5);
    }

    #[test]
    fn test_move_set_restricts_strategy() {
        let config = SearchConfig {
            moves: MoveSet::of(&[MoveKind::R2Unpoke]),
            ..SearchConfig::minimal()
        };
        let report = CrossingReducing.simplify(&kinked_trefoil(), &config).unwrap();
        assert_eq!(report.final_crossings, 5);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("smart".parse::<Strategy>().unwrap(), Strategy::Smart);
        assert_eq!(
            "Non-Increasing".parse::<Strategy>().unwrap(),
            Strategy::NonIncreasing
        );
        assert_eq!("reduce".parse::<Strategy>().unwrap(), Strategy::CrossingReducing);
        assert!("bogus".parse::<Strategy>().is_err());
        assert_eq!(Strategy::default().to_string(), "smart");
    }
}
