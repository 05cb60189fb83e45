//! Parallel batches of independent diagrams.
//!
//! Each worker receives its own copy of a diagram; results are merged in
//! input order after all workers finish, so a batch is deterministic up
//! to timing fields. A diagram that fails is recorded in its entry and
//! does not abort the batch.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::cache::CanonicalCache;
use super::config::SearchConfig;
use super::strategy::{SimplificationStrategy, Strategy};
use super::SearchReport;
use crate::canonical::{content_hash_hex, fingerprint_of_canonical};
use crate::types::PlanarDiagram;
use crate::PD_KERNEL_SCHEMA_VERSION;

/// Result of one diagram in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// Position in the input.
    pub index: usize,
    /// Crossings of the input.
    pub crossings: usize,
    /// Canonical form of the input, or of the simplified diagram.
    pub canonical: Option<PlanarDiagram>,
    /// SHA-256 fingerprint of `canonical`.
    pub fingerprint: Option<String>,
    /// Simplification report, for simplify batches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<SearchReport>,
    /// Error message if the diagram failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchEntry {
    fn failed(index: usize, crossings: usize, error: impl ToString) -> Self {
        Self {
            index,
            crossings,
            canonical: None,
            fingerprint: None,
            report: None,
            error: Some(error.to_string()),
        }
    }

    fn succeeded(index: usize, crossings: usize, form: PlanarDiagram) -> Self {
        Self {
            index,
            crossings,
            fingerprint: Some(fingerprint_of_canonical(&form)),
            canonical: Some(form),
            report: None,
            error: None,
        }
    }
}

/// Result of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Schema version of this result ([`crate::PD_KERNEL_SCHEMA_VERSION`]).
    pub schema_version: String,
    /// Strategy used, `canonical` for canonicalization batches.
    pub strategy: String,
    /// Search parameters hash, empty for canonicalization batches.
    pub params_hash: String,
    /// One entry per input, in input order.
    pub entries: Vec<BatchEntry>,
    /// Hash over the fingerprints of all entries.
    pub registry_hash: String,
}

impl BatchResult {
    fn new(strategy: &str, params_hash: String, entries: Vec<BatchEntry>) -> Self {
        let fingerprints: Vec<Option<&str>> =
            entries.iter().map(|e| e.fingerprint.as_deref()).collect();
        let registry_hash = content_hash_hex(&fingerprints);
        let failed = entries.iter().filter(|e| e.error.is_some()).count();
        info!(
            strategy,
            diagrams = entries.len(),
            failed,
            registry_hash = %registry_hash,
            "batch finished"
        );
        Self {
            schema_version: PD_KERNEL_SCHEMA_VERSION.to_string(),
            strategy: strategy.to_string(),
            params_hash,
            entries,
            registry_hash,
        }
    }

    /// Entries that failed.
    pub fn failures(&self) -> impl Iterator<Item = &BatchEntry> + '_ {
        self.entries.iter().filter(|e| e.error.is_some())
    }

    /// Get entry by fingerprint.
    pub fn get_by_fingerprint(&self, fingerprint: &str) -> Option<&BatchEntry> {
        self.entries
            .iter()
            .find(|e| e.fingerprint.as_deref() == Some(fingerprint))
    }
}

/// Canonicalize every diagram in parallel.
pub fn canonical_batch(inputs: &[PlanarDiagram], cache: &CanonicalCache) -> BatchResult {
    let entries: Vec<BatchEntry> = inputs
        .par_iter()
        .enumerate()
        .map(|(index, k)| match cache.canonical(k) {
            Ok(form) => BatchEntry::succeeded(index, k.crossing_count(), form),
            Err(e) => BatchEntry::failed(index, k.crossing_count(), e),
        })
        .collect();
    BatchResult::new("canonical", String::new(), entries)
}

/// Simplify every diagram in parallel with `strategy`.
pub fn simplify_batch(
    inputs: &[PlanarDiagram],
    strategy: Strategy,
    config: &SearchConfig,
) -> BatchResult {
    let entries: Vec<BatchEntry> = inputs
        .par_iter()
        .enumerate()
        .map(|(index, k)| match strategy.simplify(k, config) {
            Ok(report) => {
                let mut entry = BatchEntry::succeeded(index, k.crossing_count(), report.best.clone());
                entry.report = Some(report);
                entry
            }
            Err(e) => BatchEntry::failed(index, k.crossing_count(), e),
        })
        .collect();
    BatchResult::new(strategy.name(), config.params_hash(), entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::{canonical, fingerprint};
    use crate::notation::parse_native;
    use crate::search::CacheConfig;

    const TREFOIL: &str = "a=X(b3 c0 c3 b0) b=X(a3 c2 c1 a0) c=X(a1 b2 b1 a2)";

    fn inputs() -> Vec<PlanarDiagram> {
        let trefoil = parse_native(TREFOIL).unwrap();
        let mut renamed = trefoil.clone();
        renamed.rotate_node(&"c".into(), 2).unwrap();
        let curve = parse_native("x=X(x1 x0 x3 x2)").unwrap();
        vec![trefoil, curve, renamed]
    }

    #[test]
    fn test_canonical_batch_in_input_order() {
        let cache = CanonicalCache::new(&CacheConfig::default());
        let result = canonical_batch(&inputs(), &cache);
        assert_eq!(result.entries.len(), 3);
        for (i, entry) in result.entries.iter().enumerate() {
            assert_eq!(entry.index, i);
            assert!(entry.error.is_none());
        }
        assert_eq!(result.entries[0].fingerprint, result.entries[2].fingerprint);
        assert_eq!(
            result.entries[0].fingerprint.as_deref(),
            Some(fingerprint(&inputs()[0]).unwrap().as_str())
        );
        assert!(result
            .get_by_fingerprint(result.entries[1].fingerprint.as_deref().unwrap())
            .is_some());
    }

    #[test]
    fn test_registry_hash_is_deterministic() {
        let cache = CanonicalCache::new(&CacheConfig::disabled());
        let a = canonical_batch(&inputs(), &cache);
        let b = canonical_batch(&inputs(), &cache);
        assert_eq!(a.registry_hash, b.registry_hash);
        assert_eq!(a, b);
        assert_eq!(a.schema_version, crate::PD_KERNEL_SCHEMA_VERSION);
    }

    #[test]
    fn test_simplify_batch_records_failures() {
        let mut batch = inputs();
        batch.push(parse_native("a=V(a1:out a0:in)").unwrap());
        let config = SearchConfig::minimal();
        let result = simplify_batch(&batch, Strategy::CrossingReducing, &config);

        assert_eq!(result.params_hash, config.params_hash());
        assert_eq!(result.failures().count(), 1);
        assert_eq!(result.entries[1].crossings, 1);
        let curve = result.entries[1].report.as_ref().unwrap();
        assert_eq!(curve.final_crossings, 0);
        assert_eq!(
            result.entries[0].canonical,
            Some(canonical(&inputs()[0]).unwrap())
        );
    }
}
