use std::path::Path;

use tracing::{error, info, trace};

use crate::adb::enums::adb_command::AdbCommand;
use crate::adb::errors::adb_error::AdbError;
use crate::adb::io::packet_io::AdbPacketIo;
use crate::adb::keys::key_store::AdbKeyStore;
use crate::adb::models::adb_packet::AdbPacket;
use crate::constants::{
    ADB_PROTOCOL_VERSION, AUTH_RSA_PUBLIC_KEY, AUTH_SIGNATURE, AUTH_TOKEN, CNXN_BANNER,
    DEFAULT_MAX_DATA, MIN_MAX_DATA, SHELL_SERVICE_PREFIX,
};
use crate::transport::tcp_transport::TcpTransport;
use crate::transport::transport::Transport;
use crate::utils::utils::ensure_null_terminated;

/// One authenticated connection to a device. The session owns the
/// transport and the negotiated maximum payload; streams borrow it
/// mutably, so only one can be live at a time.
pub struct AdbSession {
    io: AdbPacketIo,
    key_store: AdbKeyStore,
    max_data: u32,
    next_local_id: u32,
}

impl AdbSession {
    pub fn new(transport: Box<dyn Transport>, key_store: AdbKeyStore) -> Self {
        AdbSession {
            io: AdbPacketIo::new(transport),
            key_store,
            max_data: DEFAULT_MAX_DATA,
            next_local_id: 1,
        }
    }

    /// Dials the device, loading (or creating) the keypair at `key_path`,
    /// and runs the handshake.
    pub async fn connect(host: &str, port: u16, key_path: &Path) -> Result<Self, AdbError> {
        let key_store = AdbKeyStore::load_or_create(key_path)?;
        let transport = TcpTransport::connect(host, port, None).await?;
        let mut session = AdbSession::new(Box::new(transport), key_store);
        session.handshake().await?;
        Ok(session)
    }

    /// CNXN/AUTH exchange. On the first AUTH token the signature is
    /// offered; on a second token the public key is, which raises the
    /// authorization prompt on the device, so this can sit waiting on
    /// human action until the CNXN reply arrives.
    pub async fn handshake(&mut self) -> Result<(), AdbError> {
        info!("Initiating ADB connection");
        let banner = ensure_null_terminated(CNXN_BANNER.to_string()).into_bytes();
        self.io
            .send_packet(&AdbPacket::new(
                AdbCommand::Cnxn,
                ADB_PROTOCOL_VERSION,
                DEFAULT_MAX_DATA,
                banner,
            ))
            .await?;

        let mut signature_sent = false;
        let mut public_key_sent = false;

        loop {
            let packet = self.io.read_packet().await?;
            match packet.command() {
                AdbCommand::Cnxn => {
                    self.max_data = packet.arg1().max(MIN_MAX_DATA);
                    info!(
                        "Handshake complete: {} (max payload {})",
                        String::from_utf8_lossy(packet.data()).trim_end_matches('\0'),
                        self.max_data
                    );
                    return Ok(());
                }
                AdbCommand::Auth if packet.arg0() == AUTH_TOKEN => {
                    if !signature_sent {
                        info!("Authentication required, signing token");
                        let signature = self.key_store.sign(packet.data())?;
                        self.io
                            .send_packet(&AdbPacket::new(
                                AdbCommand::Auth,
                                AUTH_SIGNATURE,
                                0,
                                signature,
                            ))
                            .await?;
                        signature_sent = true;
                    } else if !public_key_sent {
                        info!("Signature rejected, offering public key; accept the prompt on the device");
                        let mut line = self.key_store.public_key_line().as_bytes().to_vec();
                        line.push(0);
                        self.io
                            .send_packet(&AdbPacket::new(
                                AdbCommand::Auth,
                                AUTH_RSA_PUBLIC_KEY,
                                0,
                                line,
                            ))
                            .await?;
                        public_key_sent = true;
                    } else {
                        error!("Device rejected both signature and public key");
                        return Err(AdbError::AuthenticationFailed);
                    }
                }
                other => {
                    trace!("Ignoring {} during handshake", other);
                }
            }
        }
    }

    /// Opens `shell:<command>`, drains the output until the peer closes,
    /// and returns it as text.
    pub async fn run_shell(&mut self, command: &str) -> Result<String, AdbError> {
        let service = format!("{}{}", SHELL_SERVICE_PREFIX, command);
        let mut stream = self.open_stream(&service).await?;
        let output = stream.read_to_end().await?;
        stream.close().await?;
        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    pub fn max_data(&self) -> u32 {
        self.max_data
    }

    pub async fn close(mut self) {
        self.io.shutdown().await;
    }

    pub(crate) fn allocate_local_id(&mut self) -> u32 {
        let id = self.next_local_id;
        self.next_local_id = if id == u32::MAX { 1 } else { id + 1 };
        id
    }

    pub(crate) async fn send_packet(&mut self, packet: &AdbPacket) -> Result<(), AdbError> {
        self.io.send_packet(packet).await
    }

    pub(crate) async fn read_packet(&mut self) -> Result<AdbPacket, AdbError> {
        self.io.read_packet().await
    }
}
