use crate::transport::errors::transport_error::TransportError;

#[derive(Debug)]
pub enum AdbError {
    InvalidHost,
    ConnectionClosed,
    ConnectionTimeout,
    ProtocolError(String),
    AuthenticationFailed,
    StreamClosed,
    SyncFailed(String),
    InvalidResponse,
    KeyGenerationFailed(String),
}

impl std::fmt::Display for AdbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdbError::InvalidHost => write!(f, "Invalid host address"),
            AdbError::ConnectionClosed => write!(f, "Connection closed by peer"),
            AdbError::ConnectionTimeout => write!(f, "Connection timed out"),
            AdbError::ProtocolError(msg) => write!(f, "Protocol error: {}", msg),
            AdbError::AuthenticationFailed => write!(f, "Device refused authentication"),
            AdbError::StreamClosed => write!(f, "Stream closed by peer"),
            AdbError::SyncFailed(msg) => write!(f, "Sync operation failed: {}", msg),
            AdbError::InvalidResponse => write!(f, "Unexpected response from device"),
            AdbError::KeyGenerationFailed(msg) => write!(f, "Key generation failed: {}", msg),
        }
    }
}

impl std::error::Error for AdbError {}

impl From<TransportError> for AdbError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::InvalidHost(_) => AdbError::InvalidHost,
            TransportError::Timeout => AdbError::ConnectionTimeout,
            TransportError::ConnectionClosed => AdbError::ConnectionClosed,
            TransportError::IoError(msg) => AdbError::ProtocolError(msg),
        }
    }
}
