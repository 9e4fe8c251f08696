use std::{fs::File, path::Path, sync::Mutex};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOG_GUARD: Mutex<Option<WorkerGuard>> = Mutex::new(None);

pub const LOG_FILE: &str = "kubeview.log";

/// Routes all tracing output to `<log_dir>/kubeview.log`. `RUST_LOG` wins
/// over `level`. Only the first call installs anything.
pub fn setup_logger(
    log_dir: &Path,
    level: &str,
    _endpoint: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let mut slot = LOG_GUARD.lock().map_err(|_| "log guard poisoned")?;
    if slot.is_some() {
        return Ok(());
    }

    let file = File::create(log_dir.join(LOG_FILE))?;
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let file_layer = fmt::layer()
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(non_blocking_writer)
        .with_filter(filter);

    tracing_subscriber::registry().with(file_layer).try_init()?;
    *slot = Some(guard);

    Ok(())
}

/// Flushes buffered lines and stops the writer thread.
pub fn shutdown() {
    if let Ok(mut slot) = LOG_GUARD.lock() {
        slot.take();
    }
}
