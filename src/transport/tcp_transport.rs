use std::io::ErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{error, info};

use crate::constants::DEFAULT_CONNECT_TIMEOUT_S;
use crate::transport::errors::transport_error::TransportError;
use crate::transport::transport::Transport;

pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Dials `host:port` under a wall-clock deadline. A host wrapped in
    /// brackets is accepted as a literal IPv6 address.
    pub async fn connect(
        host: &str,
        port: u16,
        connect_timeout_s: Option<f64>,
    ) -> Result<Self, TransportError> {
        let host = host
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(host);

        if host.is_empty() {
            return Err(TransportError::InvalidHost(String::from("empty host")));
        }

        let deadline =
            Duration::from_secs_f64(connect_timeout_s.unwrap_or(DEFAULT_CONNECT_TIMEOUT_S));

        let stream = match timeout(deadline, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(err)) => {
                error!("Failed to connect to {}:{}: {}", host, port, err);
                return Err(match err.kind() {
                    ErrorKind::InvalidInput | ErrorKind::NotFound => {
                        TransportError::InvalidHost(host.to_string())
                    }
                    _ => TransportError::IoError(err.to_string()),
                });
            }
            Err(_) => {
                error!("Connection attempt to {}:{} timed out", host, port);
                return Err(TransportError::Timeout);
            }
        };

        stream
            .set_nodelay(true)
            .map_err(|err| TransportError::IoError(err.to_string()))?;

        info!("Connected to {}:{}", host, port);
        Ok(TcpTransport { stream })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.stream.write_all(data).await.map_err(|err| {
            if err.kind() == ErrorKind::BrokenPipe || err.kind() == ErrorKind::ConnectionReset {
                TransportError::ConnectionClosed
            } else {
                TransportError::IoError(err.to_string())
            }
        })
    }

    async fn receive_exact(&mut self, length: usize) -> Result<Vec<u8>, TransportError> {
        let mut buffer = vec![0u8; length];
        match self.stream.read_exact(&mut buffer).await {
            Ok(_) => Ok(buffer),
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
                Err(TransportError::ConnectionClosed)
            }
            Err(err) if err.kind() == ErrorKind::ConnectionReset => {
                Err(TransportError::ConnectionClosed)
            }
            Err(err) => Err(TransportError::IoError(err.to_string())),
        }
    }

    async fn shutdown(&mut self) {
        let _ = self.stream.shutdown().await;
    }
}
