use std::path::Path;

use tracing::warn;

use crate::adb::connections::session::AdbSession;
use crate::adb::errors::adb_error::AdbError;
use crate::constants::{DEFAULT_FILE_MODE, REMOTE_TMP_DIR};
use crate::ProgressSink;

impl AdbSession {
    /// Upload, `pm install -r`, then best-effort cleanup of the staged
    /// file. Any failed step ends the workflow; cleanup failures are
    /// logged and swallowed. Returns the installer's output.
    pub async fn install_apk(
        &mut self,
        apk_path: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<String, AdbError> {
        let file_name = apk_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("payload.apk");
        let remote_path = format!("{}/{}", REMOTE_TMP_DIR, file_name);

        progress.update("Uploading APK...");
        self.push(apk_path, &remote_path, DEFAULT_FILE_MODE, progress)
            .await?;

        progress.update("Installing APK...");
        let output = self
            .run_shell(&format!("pm install -r {}", remote_path))
            .await?;
        let trimmed = output.trim();
        if !trimmed.is_empty() {
            progress.update(trimmed);
        }

        if let Err(err) = self.run_shell(&format!("rm {}", remote_path)).await {
            warn!("Failed to remove {}: {}", remote_path, err);
        }

        progress.update("Install complete.");
        Ok(output)
    }
}
