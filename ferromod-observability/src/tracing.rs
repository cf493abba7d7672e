//! Subscriber setup for hosts embedding the bridge
//!
//! Host diagnostics carry `filter_id`, `module` and `direction` fields. Module
//! log records arrive as events under the `ferromod::module` target, so a
//! filter such as `warn,ferromod::module=debug` keeps the host quiet while
//! showing everything modules say.

use anyhow::Context;
use opentelemetry::global;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use std::sync::OnceLock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

const DEFAULT_FILTER: &str = "info";

/// How [`init_tracing`] builds the subscriber.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Reported as `service.name` on exported spans.
    pub service_name: String,
    /// Export spans over OTLP/gRPC when set.
    pub otlp_endpoint: Option<String>,
    /// Filter directives. When `None`, `RUST_LOG` is used, then `info`.
    pub filter: Option<String>,
    /// Emit one JSON object per event instead of text.
    pub json: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "ferromod".to_string(),
            otlp_endpoint: None,
            filter: None,
            json: false,
        }
    }
}

impl TracingConfig {
    /// Text output with the given filter directives.
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self {
            filter: Some(filter.into()),
            ..Self::default()
        }
    }

    fn env_filter(&self) -> anyhow::Result<EnvFilter> {
        match &self.filter {
            Some(directives) => EnvFilter::try_new(directives)
                .with_context(|| format!("invalid filter directives {directives:?}")),
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
        }
    }
}

static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

fn tracer_provider(service_name: &str, endpoint: &str) -> anyhow::Result<SdkTracerProvider> {
    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .with_context(|| format!("OTLP exporter for {endpoint}"))?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    Ok(SdkTracerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build())
}

/// Install the global subscriber.
///
/// Fails when the filter directives do not parse, the OTLP exporter cannot be
/// built, or a global subscriber is already installed.
pub fn init_tracing(config: TracingConfig) -> anyhow::Result<()> {
    let env_filter = config.env_filter()?;

    let provider = config
        .otlp_endpoint
        .as_deref()
        .map(|endpoint| tracer_provider(&config.service_name, endpoint))
        .transpose()?;
    let otel_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer("ferromod")));

    let text_layer = (!config.json).then(|| fmt::layer().with_thread_ids(true).with_target(true));
    let json_layer = config
        .json
        .then(|| fmt::layer().json().with_current_span(false).with_target(true));

    Registry::default()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .with(otel_layer)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    if let Some(provider) = provider {
        global::set_text_map_propagator(TraceContextPropagator::new());
        global::set_tracer_provider(provider.clone());
        let _ = TRACER_PROVIDER.set(provider);
    }

    tracing::info!(
        service = %config.service_name,
        json = config.json,
        "Tracing initialized"
    );
    Ok(())
}

/// Flush and stop span export, if OTLP was configured.
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            tracing::error!("Failed to shut down tracer provider: {}", e);
        }
    }
}
