use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{error, info};

use crate::adb::connections::session::AdbSession;
use crate::adb::errors::adb_error::AdbError;
use crate::constants::{
    PROGRESS_MIN_STEP, SYNC_DATA, SYNC_DONE, SYNC_FAIL, SYNC_FRAME_OVERHEAD, SYNC_OKAY,
    SYNC_SEND, SYNC_SERVICE,
};
use crate::ProgressSink;

impl AdbSession {
    /// Uploads a local file through the `sync:` service. Every sync frame
    /// rides in one WRTE and is paced by the stream-level OKAY; the
    /// SYNC-level OKAY/FAIL arrives once after DONE.
    pub async fn push(
        &mut self,
        local_path: &Path,
        remote_path: &str,
        mode: u32,
        progress: &dyn ProgressSink,
    ) -> Result<(), AdbError> {
        let mut file = File::open(local_path)
            .await
            .map_err(|err| AdbError::SyncFailed(format!("cannot open {}: {}", local_path.display(), err)))?;
        let metadata = file
            .metadata()
            .await
            .map_err(|err| AdbError::SyncFailed(err.to_string()))?;
        let file_size = metadata.len();
        let mtime = metadata
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|elapsed| elapsed.as_secs() as u32)
            .unwrap_or_else(|| {
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|elapsed| elapsed.as_secs() as u32)
                    .unwrap_or(0)
            });

        info!(
            "Uploading {} ({} bytes) to {}",
            local_path.display(),
            file_size,
            remote_path
        );

        let chunk_size = (self.max_data() - SYNC_FRAME_OVERHEAD) as usize;
        let report_step = PROGRESS_MIN_STEP.max(file_size / 20);
        let mut stream = self.open_stream(SYNC_SERVICE).await?;

        let target = format!("{},{:04o}", remote_path, mode);
        stream
            .write(&sync_frame(SYNC_SEND, target.len() as u32, target.as_bytes()))
            .await?;

        let mut sent: u64 = 0;
        let mut last_report: u64 = 0;
        let mut chunk = vec![0u8; chunk_size];
        loop {
            let filled = fill_chunk(&mut file, &mut chunk).await?;
            if filled == 0 {
                break;
            }
            stream
                .write(&sync_frame(SYNC_DATA, filled as u32, &chunk[..filled]))
                .await?;
            sent += filled as u64;

            if sent - last_report >= report_step || sent == file_size {
                last_report = sent;
                let percent = if file_size > 0 { sent * 100 / file_size } else { 100 };
                progress.update(&format!("Uploading... {}%", percent));
            }
        }
        if sent == 0 {
            // Zero-length file: no DATA frames, but completion still reports.
            progress.update("Uploading... 100%");
        }

        stream.write(&sync_frame(SYNC_DONE, mtime, &[])).await?;

        // Terminal reply: OKAY with a zero length field, or FAIL<len><msg>.
        let reply = stream.read_exact(8).await?;
        let ident: [u8; 4] = reply[..4].try_into().unwrap();
        let length = u32::from_le_bytes(reply[4..8].try_into().unwrap());
        let result = if &ident == SYNC_OKAY {
            Ok(())
        } else if &ident == SYNC_FAIL {
            let message = stream.read_exact(length as usize).await?;
            let message = String::from_utf8_lossy(&message).into_owned();
            error!("Device rejected upload of {}: {}", remote_path, message);
            Err(AdbError::SyncFailed(message))
        } else {
            error!("Unexpected sync reply ident {:?}", ident);
            Err(AdbError::InvalidResponse)
        };

        stream.close().await?;
        result
    }
}

fn sync_frame(ident: &[u8; 4], length: u32, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(SYNC_FRAME_OVERHEAD as usize + payload.len());
    frame.extend_from_slice(ident);
    frame.extend_from_slice(&length.to_le_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Reads until the chunk is full or the file ends, so every DATA frame
/// except the last carries a full chunk.
async fn fill_chunk(file: &mut File, chunk: &mut [u8]) -> Result<usize, AdbError> {
    let mut filled = 0;
    while filled < chunk.len() {
        let read = file
            .read(&mut chunk[filled..])
            .await
            .map_err(|err| AdbError::SyncFailed(err.to_string()))?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    Ok(filled)
}
