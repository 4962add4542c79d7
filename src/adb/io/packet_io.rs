use tracing::{error, trace};

use crate::adb::errors::adb_error::AdbError;
use crate::adb::models::adb_packet::AdbPacket;
use crate::constants::ADB_HEADER_SIZE;
use crate::transport::transport::Transport;

/// Frames whole packets over the owned transport. Writes are strictly
/// sequential; a packet's header and payload are never interleaved with
/// another packet's bytes.
pub struct AdbPacketIo {
    transport: Box<dyn Transport>,
}

impl AdbPacketIo {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn send_packet(&mut self, packet: &AdbPacket) -> Result<(), AdbError> {
        trace!(
            "send {} arg0={} arg1={} len={}",
            packet.command(),
            packet.arg0(),
            packet.arg1(),
            packet.data().len()
        );
        self.transport.send(&packet.encode()).await.map_err(|err| {
            error!("Failed to send {} packet: {}", packet.command(), err);
            AdbError::from(err)
        })
    }

    pub async fn read_packet(&mut self) -> Result<AdbPacket, AdbError> {
        let header_bytes = self.transport.receive_exact(ADB_HEADER_SIZE).await?;
        let header = AdbPacket::decode_header(&header_bytes)?;

        let data = if header.data_length == 0 {
            Vec::new()
        } else {
            self.transport
                .receive_exact(header.data_length as usize)
                .await?
        };

        trace!(
            "recv {} arg0={} arg1={} len={}",
            header.command,
            header.arg0,
            header.arg1,
            data.len()
        );
        Ok(AdbPacket::new(header.command, header.arg0, header.arg1, data))
    }

    pub async fn shutdown(&mut self) {
        self.transport.shutdown().await;
    }
}
