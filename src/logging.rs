use once_cell::sync::OnceCell;
use tempfile::Builder;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, Registry};

static TEMP_DIR: OnceCell<tempfile::TempDir> = OnceCell::new();
const LOG_DIR_PREFIX: &str = "adbeam-";
const RANDOM_BYTES_LENGTH: usize = 5;
const LOG_FILE_NAME: &str = "adbeam";

/// Sends tracing output to a daily-rolling file in a per-run temp
/// directory, keeping stdout free for progress reporting.
pub fn init() -> std::io::Result<()> {
    TEMP_DIR.get_or_try_init(|| {
        Builder::new()
            .prefix(LOG_DIR_PREFIX)
            .rand_bytes(RANDOM_BYTES_LENGTH)
            .tempdir_in(std::env::temp_dir())
    })?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir(), LOG_FILE_NAME);

    let subscriber = Registry::default().with(fmt::layer().with_writer(file_appender));

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    Ok(())
}

pub fn log_dir() -> &'static std::path::Path {
    TEMP_DIR
        .get()
        .expect("Log directory not initialized")
        .path()
}
