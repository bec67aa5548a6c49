//! Log and trace output for the monitor process.
//!
//! Events always go to stdout through the fmt layer, filtered by `RUST_LOG`
//! or [`DEFAULT_FILTER`]. With an OTLP endpoint configured, spans are also
//! batched to that collector.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::trace::{BatchSpanProcessor, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{AppError, Result};

pub const DEFAULT_FILTER: &str = "cbm_backend=debug,tower_http=debug,sqlx::query=warn";

/// Keeps the span pipeline alive; dropping it flushes pending spans.
pub struct TracingGuard {
    provider: Option<SdkTracerProvider>,
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        let Some(provider) = self.provider.take() else {
            return;
        };
        if let Err(e) = provider.shutdown() {
            // The subscriber may already be gone at this point.
            eprintln!("span export shutdown failed: {e:?}");
        }
    }
}

/// Install the global subscriber. Call once, before the first event.
pub fn init_tracing(otel_endpoint: Option<&str>, service_name: &str) -> Result<TracingGuard> {
    let provider = otel_endpoint
        .map(|endpoint| span_provider(endpoint, service_name))
        .transpose()?;
    let otel_layer = provider.as_ref().map(|p| {
        tracing_opentelemetry::layer().with_tracer(p.tracer(service_name.to_owned()))
    });

    tracing_subscriber::registry()
        .with(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with(tracing_subscriber::fmt::layer())
        .with(otel_layer)
        .try_init()
        .map_err(|e| AppError::Config(format!("Tracing subscriber already set: {e}")))?;

    if let Some(endpoint) = otel_endpoint {
        tracing::info!(otel_endpoint = endpoint, service_name, "Exporting spans over OTLP");
    }
    Ok(TracingGuard { provider })
}

/// Directives from `RUST_LOG`, falling back to the defaults when unset or unparsable.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

fn service_resource(service_name: &str) -> Resource {
    Resource::builder()
        .with_attributes([
            KeyValue::new("service.name", service_name.to_owned()),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ])
        .build()
}

fn span_provider(endpoint: &str, service_name: &str) -> Result<SdkTracerProvider> {
    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| AppError::Config(format!("OTLP exporter for {endpoint}: {e}")))?;

    Ok(SdkTracerProvider::builder()
        .with_resource(service_resource(service_name))
        .with_span_processor(BatchSpanProcessor::builder(exporter).build())
        .build())
}
