//! Planar Diagram Batch Binary
//!
//! Reads one diagram per line in native notation from stdin, canonicalizes
//! or simplifies all of them in parallel and prints one JSON object per
//! line to stdout, in input order. Logs go to stderr.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `PD_STRATEGY`: "canonical", "crossing_reducing", "non_increasing" or "smart" (default: canonical)
//! - `PD_MAX_DEPTH`: BFS depth per non-increasing pass (default: from `SearchConfig`)
//! - `PD_CACHE_SIZE`: canonical-form cache entries, 0 disables (default: 10000)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! echo 'a=X(b3 c0 c3 b0) b=X(a3 c2 c1 a0) c=X(a1 b2 b1 a2)' | PD_STRATEGY=smart cargo run --bin pd_batch
//! ```

use std::io::{self, BufRead, BufWriter, Write};
use std::time::Instant;

use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pd_kernel::{
    canonical_batch, parse_native, simplify_batch, BatchResult, CacheConfig, CanonicalCache,
    PlanarDiagram, SearchConfig, Strategy,
};

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pd_batch=info,pd_kernel=info".into());

    if log_format == "pretty" {
        // Pretty format for local development
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(io::stderr))
            .init();
    } else {
        // JSON format for log collectors
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .flatten_event(true)
                    .with_writer(io::stderr),
            )
            .init();
    }
}

/// A stdin line that did not parse.
struct Rejected {
    line: usize,
    error: String,
}

fn read_diagrams(input: impl BufRead) -> io::Result<(Vec<(usize, PlanarDiagram)>, Vec<Rejected>)> {
    let mut diagrams = Vec::new();
    let mut rejected = Vec::new();
    for (n, line) in input.lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        match parse_native(text) {
            Ok(k) => diagrams.push((n + 1, k)),
            Err(e) => {
                warn!(line = n + 1, error = %e, "Skipping unparseable diagram");
                rejected.push(Rejected {
                    line: n + 1,
                    error: e.to_string(),
                });
            }
        }
    }
    Ok((diagrams, rejected))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let version = env!("CARGO_PKG_VERSION");
    info!(version = version, "Starting planar diagram batch");

    // Load configuration from environment
    let strategy = std::env::var("PD_STRATEGY").unwrap_or_else(|_| "canonical".to_string());
    let mut config = SearchConfig::default();
    if let Some(depth) = std::env::var("PD_MAX_DEPTH")
        .ok()
        .and_then(|s| s.parse().ok())
    {
        config.max_depth = depth;
    }
    let cache_size: usize = std::env::var("PD_CACHE_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(10_000);

    let (diagrams, rejected) = read_diagrams(io::stdin().lock())?;
    let lines: Vec<usize> = diagrams.iter().map(|(line, _)| *line).collect();
    let inputs: Vec<PlanarDiagram> = diagrams.into_iter().map(|(_, k)| k).collect();

    let started = Instant::now();
    let result: BatchResult = if strategy.trim().eq_ignore_ascii_case("canonical") {
        let cache = CanonicalCache::new(&CacheConfig {
            max_entries: cache_size,
            enabled: cache_size > 0,
        });
        let result = canonical_batch(&inputs, &cache);
        if let Some(stats) = cache.stats() {
            info!(hits = stats.hits, misses = stats.misses, "Canonical cache");
        }
        result
    } else {
        let strategy: Strategy = strategy.parse()?;
        info!(
            strategy = %strategy,
            params_hash = %config.params_hash(),
            max_depth = config.max_depth,
            "Search configuration"
        );
        simplify_batch(&inputs, strategy, &config)
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for entry in &result.entries {
        let line = lines.get(entry.index).copied().unwrap_or_default();
        writeln!(out, "{}", json!({ "line": line, "result": entry }))?;
    }
    for r in &rejected {
        writeln!(out, "{}", json!({ "line": r.line, "error": r.error }))?;
    }
    out.flush()?;

    info!(
        diagrams = result.entries.len(),
        rejected = rejected.len(),
        failed = result.failures().count(),
        registry_hash = %result.registry_hash,
        latency_ms = started.elapsed().as_millis() as u64,
        "Batch complete"
    );
    Ok(())
}
