use anyhow::Result;
use opentelemetry::sdk::trace::Tracer;
use opentelemetry_otlp::WithExportConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::configuration::HoneycombConfiguration;

fn get_honeycomb_tracer(config: &HoneycombConfiguration) -> Result<Tracer> {
    let mut map = tonic::metadata::MetadataMap::with_capacity(2);
    map.insert("x-honeycomb-team", config.api_key.parse()?);
    map.insert("x-honeycomb-dataset", config.dataset.parse()?);
    let otlp_exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint("https://api.honeycomb.io")
        .with_metadata(map);
    Ok(opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(otlp_exporter)
        .install_simple()?)
}

/// Log to stdout, filtered by `RUST_LOG` (default `info`), and ship spans to
/// Honeycomb when it is configured.
pub fn init(honeycomb: Option<&HoneycombConfiguration>) -> Result<()> {
    let otel_layer = match honeycomb {
        Some(config) => Some(tracing_opentelemetry::layer().with_tracer(get_honeycomb_tracer(config)?)),
        None => None,
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(otel_layer)
        .try_init()?;
    Ok(())
}

pub fn shutdown() {
    opentelemetry::global::shutdown_tracer_provider();
}
