//! Metrics collection for the catalog
//!
//! Counters live in a private Prometheus registry and can be dumped in the
//! text exposition format with [`gather_text`].

use once_cell::sync::{Lazy, OnceCell};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Instant;
use tracing::warn;

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);
static METRICS: OnceCell<Metrics> = OnceCell::new();

/// Operation counters for catalog operations
pub struct Metrics {
    /// Entities created, by kind
    pub entities_created: IntCounterVec,
    /// Field updates applied, by kind
    pub entities_updated: IntCounterVec,
    /// Entities deleted, by kind
    pub entities_deleted: IntCounterVec,
    /// Tag mutations, by operation (add, remove, clear)
    pub tag_mutations: IntCounterVec,
    /// Target mutations, by operation (set, unset)
    pub target_mutations: IntCounterVec,
    /// Writes rejected because of a concurrent modification
    pub write_conflicts: IntCounter,
    /// Updates dropped because no whitelisted field remained
    pub nothing_to_apply: IntCounter,
    /// Relationship graphs built
    pub graphs_built: IntCounter,
    /// Graph build duration in seconds
    pub graph_build_duration: Histogram,
}

impl Metrics {
    /// Create and register every metric in the crate registry
    fn new() -> prometheus::Result<Self> {
        let metrics = Self {
            entities_created: IntCounterVec::new(
                Opts::new("haul_entities_created_total", "Total number of entities created"),
                &["kind"],
            )?,
            entities_updated: IntCounterVec::new(
                Opts::new("haul_entities_updated_total", "Total number of entity updates applied"),
                &["kind"],
            )?,
            entities_deleted: IntCounterVec::new(
                Opts::new("haul_entities_deleted_total", "Total number of entities deleted"),
                &["kind"],
            )?,
            tag_mutations: IntCounterVec::new(
                Opts::new("haul_tag_mutations_total", "Total number of tag mutations"),
                &["op"],
            )?,
            target_mutations: IntCounterVec::new(
                Opts::new("haul_target_mutations_total", "Total number of target mutations"),
                &["op"],
            )?,
            write_conflicts: IntCounter::new(
                "haul_write_conflicts_total",
                "Total number of writes rejected by a revision check",
            )?,
            nothing_to_apply: IntCounter::new(
                "haul_nothing_to_apply_total",
                "Total number of updates with no whitelisted field",
            )?,
            graphs_built: IntCounter::new(
                "haul_graphs_built_total",
                "Total number of relationship graphs built",
            )?,
            graph_build_duration: Histogram::with_opts(
                HistogramOpts::new(
                    "haul_graph_build_duration_seconds",
                    "Duration of graph builds in seconds",
                )
                .buckets(vec![0.0001, 0.001, 0.01, 0.1, 1.0]),
            )?,
        };

        REGISTRY.register(Box::new(metrics.entities_created.clone()))?;
        REGISTRY.register(Box::new(metrics.entities_updated.clone()))?;
        REGISTRY.register(Box::new(metrics.entities_deleted.clone()))?;
        REGISTRY.register(Box::new(metrics.tag_mutations.clone()))?;
        REGISTRY.register(Box::new(metrics.target_mutations.clone()))?;
        REGISTRY.register(Box::new(metrics.write_conflicts.clone()))?;
        REGISTRY.register(Box::new(metrics.nothing_to_apply.clone()))?;
        REGISTRY.register(Box::new(metrics.graphs_built.clone()))?;
        REGISTRY.register(Box::new(metrics.graph_build_duration.clone()))?;

        Ok(metrics)
    }

    /// Get the global metrics instance, `None` if registration failed
    pub fn global() -> Option<&'static Metrics> {
        METRICS
            .get_or_try_init(Metrics::new)
            .map_err(|e| warn!(error = %e, "Metrics registration failed"))
            .ok()
    }
}

/// Run `f` against the global metrics, if available
pub fn record<F: FnOnce(&Metrics)>(f: F) {
    if let Some(metrics) = Metrics::global() {
        f(metrics);
    }
}

/// Timer for measuring operation duration with automatic histogram recording
pub struct Timer {
    start: Instant,
    histogram: Histogram,
}

impl Timer {
    /// Start a new timer
    pub fn start(histogram: Histogram) -> Self {
        Self {
            start: Instant::now(),
            histogram,
        }
    }

    /// Record the elapsed time and consume the timer
    pub fn finish(self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Initialize the metrics registry by creating the global metrics instance
pub fn init_registry() {
    let _ = Metrics::global();
}

/// Get the registry holding all catalog metrics
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Collect and return all metrics as a Prometheus-formatted string
pub fn gather_text() -> String {
    init_registry();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry().gather(), &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
