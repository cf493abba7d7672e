//! Tracing and metrics for FerroMod hosts
//!
//! Both are process-wide. [`init_observability`] installs whatever the
//! [`ObservabilityConfig`] asks for; the bridge builder calls it before any
//! module is loaded so module-load logs and filter metrics are captured.

pub mod metrics;
pub mod tracing;

pub use metrics::{
    bridge_metrics, gather_metrics, init_metrics, metrics_enabled, BridgeMetrics, REGISTRY,
};
pub use tracing::{init_tracing, shutdown_tracing, TracingConfig};

/// What to install at startup.
#[derive(Debug, Clone, Default)]
pub struct ObservabilityConfig {
    /// Install a global subscriber built from this configuration.
    pub tracing: Option<TracingConfig>,
    /// Register the Prometheus bridge metrics.
    pub metrics: bool,
}

impl ObservabilityConfig {
    /// Text logs filtered by `RUST_LOG`, plus metrics.
    pub fn standard() -> Self {
        Self {
            tracing: Some(TracingConfig::default()),
            metrics: true,
        }
    }
}

/// Register metrics, then install tracing.
///
/// Metrics are registered even when tracing fails, so the error only reports
/// the subscriber.
pub fn init_observability(config: ObservabilityConfig) -> anyhow::Result<()> {
    if config.metrics {
        init_metrics();
    }
    match config.tracing {
        Some(tracing) => init_tracing(tracing),
        None => Ok(()),
    }
}
