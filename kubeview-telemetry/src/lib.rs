use opentelemetry_semantic_conventions::{
    resource::{SERVICE_NAME, SERVICE_VERSION},
    SCHEMA_URL,
};
use std::{
    fs::File,
    path::Path,
    sync::{mpsc, Mutex, OnceLock},
};

use opentelemetry::{trace::TracerProvider, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    trace::{Sampler, SdkTracerProvider},
    Resource,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const LOG_FILE: &str = "kubeview.log";

static SUBSCRIBER_SET: OnceLock<()> = OnceLock::new();
static LOG_GUARD: Mutex<Option<WorkerGuard>> = Mutex::new(None);
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();
static WORKER_HANDLE: OnceLock<std::thread::JoinHandle<()>> = OnceLock::new();

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

fn resource() -> Resource {
    Resource::builder()
        .with_schema_url(
            [
                KeyValue::new(SERVICE_NAME, "kubeview"),
                KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
            ],
            SCHEMA_URL,
        )
        .with_service_name("kubeview")
        .build()
}

fn init_tracer_provider(ep: &str) -> Result<SdkTracerProvider, BoxError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(ep)
        .build()?;

    Ok(SdkTracerProvider::builder()
        .with_sampler(Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(
            1.0,
        ))))
        .with_resource(resource())
        .with_batch_exporter(exporter)
        .build())
}

/// File logging plus an OTLP span exporter pointed at `endpoint`.
///
/// The exporter lives on its own runtime thread so it keeps flushing while
/// the UI runtime is busy.
pub fn setup_logger(log_dir: &Path, level: &str, endpoint: &str) -> Result<(), BoxError> {
    if SUBSCRIBER_SET.get().is_some() {
        return Ok(());
    }

    // ---- 1. background worker owning the provider ----
    let (tx, rx) = mpsc::sync_channel(1);
    let endpoint_owned = endpoint.to_owned();

    let handle = std::thread::Builder::new()
        .name("otel-worker".into())
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .worker_threads(2)
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    tx.send(Err(BoxError::from(e))).ok();
                    return;
                }
            };

            rt.block_on(async move {
                let provider = init_tracer_provider(&endpoint_owned);
                tx.send(provider).ok();
                std::future::pending::<()>().await;
            });
        })?;

    let provider = rx.recv()??;
    TRACER_PROVIDER.set(provider.clone()).ok();
    WORKER_HANDLE.set(handle).ok();

    // ---- 2. file layer ----
    let (file_layer, guard) = {
        let file = File::create(log_dir.join(LOG_FILE))?;
        let (writer, g) = tracing_appender::non_blocking(file);
        let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
        (
            tracing_subscriber::fmt::layer()
                .with_line_number(true)
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter),
            g,
        )
    };
    if let Ok(mut slot) = LOG_GUARD.lock() {
        *slot = Some(guard);
    }

    // ---- 3. OTLP layer ----
    let otel_layer = OpenTelemetryLayer::new(provider.tracer("kubeview"));

    // ---- 4. install once ----
    tracing_subscriber::registry()
        .with(file_layer)
        .with(otel_layer)
        .try_init()?;
    SUBSCRIBER_SET.set(()).ok();

    Ok(())
}

/// Flushes pending spans and log lines. Call before the process exits.
pub fn shutdown() {
    if let Ok(mut slot) = LOG_GUARD.lock() {
        slot.take();
    }
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("telemetry shutdown failed: {e}");
        }
    }
}
