pub mod adb;
pub mod apk;
pub mod constants;
pub mod logging;
pub mod transport;
pub mod utils;

pub use adb::connections::session::AdbSession;
pub use adb::errors::adb_error::AdbError;
pub use adb::keys::key_store::AdbKeyStore;
pub use apk::icon::extract_icon;

/// Receives human-readable progress lines from long-running operations.
/// Messages are advisory; callers must not parse them.
pub trait ProgressSink: Send + Sync {
    fn update(&self, message: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn update(&self, message: &str) {
        self(message)
    }
}
