use tracing::{trace, warn};

use crate::adb::connections::session::AdbSession;
use crate::adb::enums::adb_command::AdbCommand;
use crate::adb::errors::adb_error::AdbError;
use crate::adb::models::adb_packet::AdbPacket;
use crate::utils::utils::ensure_null_terminated;

/// A logical stream over the session. Reads are served from the local
/// buffer; every accepted peer WRTE is acknowledged with OKAY before the
/// next packet is consumed, which is the protocol's backpressure.
pub struct AdbStream<'a> {
    session: &'a mut AdbSession,
    local_id: u32,
    remote_id: u32,
    read_buffer: Vec<u8>,
    read_offset: usize,
    remote_closed: bool,
    local_closed: bool,
}

impl AdbSession {
    /// OPENs a service stream and waits for the peer to pick it up. A
    /// CLSE instead of OKAY means the device rejected the service.
    pub async fn open_stream(&mut self, service: &str) -> Result<AdbStream<'_>, AdbError> {
        let local_id = self.allocate_local_id();
        let payload = ensure_null_terminated(service.to_string()).into_bytes();
        self.send_packet(&AdbPacket::new(AdbCommand::Open, local_id, 0, payload))
            .await?;

        loop {
            let packet = self.read_packet().await?;
            match packet.command() {
                AdbCommand::Okay if packet.arg1() == local_id => {
                    trace!("Stream {} opened for {}", local_id, service);
                    return Ok(AdbStream {
                        remote_id: packet.arg0(),
                        session: self,
                        local_id,
                        read_buffer: Vec::new(),
                        read_offset: 0,
                        remote_closed: false,
                        local_closed: false,
                    });
                }
                AdbCommand::Clse if packet.arg1() == local_id => {
                    warn!("Device rejected service {}", service);
                    return Err(AdbError::StreamClosed);
                }
                _ => {
                    // Chatter for other stream ids; this core never has two
                    // live streams, so it is safe to drop.
                }
            }
        }
    }
}

impl AdbStream<'_> {
    fn matches(&self, packet: &AdbPacket) -> bool {
        packet.arg0() == self.remote_id && packet.arg1() == self.local_id
    }

    fn buffered_len(&self) -> usize {
        self.read_buffer.len() - self.read_offset
    }

    fn take(&mut self, length: usize) -> Vec<u8> {
        let end = self.read_offset + length;
        let taken = self.read_buffer[self.read_offset..end].to_vec();
        self.read_offset = end;
        if self.read_offset == self.read_buffer.len() {
            self.read_buffer.clear();
            self.read_offset = 0;
        }
        taken
    }

    async fn accept_write(&mut self, packet: AdbPacket) -> Result<(), AdbError> {
        let ack = AdbPacket::new(AdbCommand::Okay, self.local_id, self.remote_id, Vec::new());
        self.read_buffer.extend_from_slice(packet.data());
        self.session.send_packet(&ack).await
    }

    async fn accept_close(&mut self) -> Result<(), AdbError> {
        self.remote_closed = true;
        if !self.local_closed {
            self.local_closed = true;
            let reply =
                AdbPacket::new(AdbCommand::Clse, self.local_id, self.remote_id, Vec::new());
            self.session.send_packet(&reply).await?;
        }
        Ok(())
    }

    /// Pulls packets until one belongs to this stream. Returns false once
    /// the peer has closed.
    async fn pull(&mut self) -> Result<bool, AdbError> {
        if self.remote_closed {
            return Ok(false);
        }
        loop {
            let packet = self.session.read_packet().await?;
            match packet.command() {
                AdbCommand::Wrte if self.matches(&packet) => {
                    self.accept_write(packet).await?;
                    return Ok(true);
                }
                AdbCommand::Clse if self.matches(&packet) => {
                    self.accept_close().await?;
                    return Ok(false);
                }
                _ => {}
            }
        }
    }

    /// Exactly `length` bytes, or StreamClosed if the stream ends first.
    pub async fn read_exact(&mut self, length: usize) -> Result<Vec<u8>, AdbError> {
        while self.buffered_len() < length {
            if self.local_closed && !self.remote_closed {
                return Err(AdbError::StreamClosed);
            }
            if !self.pull().await? {
                return Err(AdbError::StreamClosed);
            }
        }
        Ok(self.take(length))
    }

    /// Everything up to the peer's CLSE.
    pub async fn read_to_end(&mut self) -> Result<Vec<u8>, AdbError> {
        while !self.local_closed && self.pull().await? {}
        let remaining = self.buffered_len();
        Ok(self.take(remaining))
    }

    /// One WRTE, bounded by the negotiated maximum, then waits for the
    /// matching OKAY. Peer WRTEs arriving in the meantime are buffered and
    /// acknowledged; a peer CLSE is fatal for the stream.
    pub async fn write(&mut self, data: &[u8]) -> Result<(), AdbError> {
        if self.local_closed || self.remote_closed {
            return Err(AdbError::StreamClosed);
        }
        if data.len() as u32 > self.session.max_data() {
            return Err(AdbError::ProtocolError(format!(
                "payload of {} bytes exceeds negotiated maximum of {}",
                data.len(),
                self.session.max_data()
            )));
        }

        let packet = AdbPacket::new(AdbCommand::Wrte, self.local_id, self.remote_id, data.to_vec());
        self.session.send_packet(&packet).await?;

        loop {
            let packet = self.session.read_packet().await?;
            match packet.command() {
                AdbCommand::Okay if self.matches(&packet) => return Ok(()),
                AdbCommand::Wrte if self.matches(&packet) => {
                    self.accept_write(packet).await?;
                }
                AdbCommand::Clse if self.matches(&packet) => {
                    self.accept_close().await?;
                    return Err(AdbError::StreamClosed);
                }
                _ => {}
            }
        }
    }

    /// Idempotent; any later read reports end-of-stream.
    pub async fn close(&mut self) -> Result<(), AdbError> {
        if self.local_closed {
            return Ok(());
        }
        self.local_closed = true;
        let packet = AdbPacket::new(AdbCommand::Clse, self.local_id, self.remote_id, Vec::new());
        self.session.send_packet(&packet).await
    }

    pub fn local_id(&self) -> u32 {
        self.local_id
    }

    pub fn remote_id(&self) -> u32 {
        self.remote_id
    }

    pub fn max_data(&self) -> u32 {
        self.session.max_data()
    }
}
