//! Prometheus metrics for the module bridge
//!
//! Metrics are opt-in: nothing is registered until [`init_metrics`] runs, and
//! [`bridge_metrics`] returns `None` until then so hot paths can skip recording.

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::{LazyLock, OnceLock};

/// Registry holding every bridge metric.
pub static REGISTRY: LazyLock<Registry> =
    LazyLock::new(|| Registry::new_custom(Some("ferromod".to_string()), None).unwrap());

static METRICS: OnceLock<BridgeMetrics> = OnceLock::new();

/// Counters and gauges describing filter and module activity.
pub struct BridgeMetrics {
    pub filters_created: IntCounter,
    pub filters_destroyed: IntCounter,
    pub filters_active: IntGauge,
    /// Per-stream module objects instantiated, by module name
    pub module_instances: IntCounterVec,
    /// Continuation outcomes by direction: requested, delivered or suppressed
    pub continuations: IntCounterVec,
    /// Local replies by status code
    pub local_replies: IntCounterVec,
    /// Module log records that passed the threshold, by level
    pub module_logs: IntCounterVec,
}

impl BridgeMetrics {
    fn register(registry: &Registry) -> Self {
        let filters_created = IntCounter::new("filters_created_total", "Filters created").unwrap();
        let filters_destroyed =
            IntCounter::new("filters_destroyed_total", "Filters destroyed").unwrap();
        let filters_active = IntGauge::new("filters_active", "Filters currently alive").unwrap();
        let module_instances = IntCounterVec::new(
            Opts::new(
                "module_instances_total",
                "Per-stream module objects instantiated",
            ),
            &["module"],
        )
        .unwrap();
        let continuations = IntCounterVec::new(
            Opts::new("continuations_total", "Continuation requests by outcome"),
            &["direction", "outcome"],
        )
        .unwrap();
        let local_replies = IntCounterVec::new(
            Opts::new("local_replies_total", "Local replies sent by modules"),
            &["status"],
        )
        .unwrap();
        let module_logs = IntCounterVec::new(
            Opts::new("module_log_records_total", "Module log records forwarded"),
            &["level"],
        )
        .unwrap();

        registry.register(Box::new(filters_created.clone())).unwrap();
        registry
            .register(Box::new(filters_destroyed.clone()))
            .unwrap();
        registry.register(Box::new(filters_active.clone())).unwrap();
        registry.register(Box::new(module_instances.clone())).unwrap();
        registry.register(Box::new(continuations.clone())).unwrap();
        registry.register(Box::new(local_replies.clone())).unwrap();
        registry.register(Box::new(module_logs.clone())).unwrap();

        Self {
            filters_created,
            filters_destroyed,
            filters_active,
            module_instances,
            continuations,
            local_replies,
            module_logs,
        }
    }

    pub fn record_filter_created(&self) {
        self.filters_created.inc();
        self.filters_active.inc();
    }

    pub fn record_filter_destroyed(&self) {
        self.filters_destroyed.inc();
        self.filters_active.dec();
    }

    pub fn record_module_instance(&self, module: &str) {
        self.module_instances.with_label_values(&[module]).inc();
    }

    /// `outcome` is one of `requested`, `delivered` or `suppressed`.
    pub fn record_continuation(&self, direction: &str, outcome: &str) {
        self.continuations
            .with_label_values(&[direction, outcome])
            .inc();
    }

    pub fn record_local_reply(&self, status: u16) {
        self.local_replies
            .with_label_values(&[status.to_string().as_str()])
            .inc();
    }

    pub fn record_module_log(&self, level: &str) {
        self.module_logs.with_label_values(&[level]).inc();
    }
}

/// Register bridge metrics. Safe to call more than once.
pub fn init_metrics() -> &'static BridgeMetrics {
    METRICS.get_or_init(|| BridgeMetrics::register(&REGISTRY))
}

pub fn metrics_enabled() -> bool {
    METRICS.get().is_some()
}

/// The bridge metrics, if [`init_metrics`] has run.
pub fn bridge_metrics() -> Option<&'static BridgeMetrics> {
    METRICS.get()
}

/// Render every registered metric in the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
