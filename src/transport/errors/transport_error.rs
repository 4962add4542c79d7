#[derive(Debug)]
pub enum TransportError {
    InvalidHost(String),
    Timeout,
    ConnectionClosed,
    IoError(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::InvalidHost(host) => write!(f, "Invalid host: {}", host),
            TransportError::Timeout => write!(f, "Connection timed out"),
            TransportError::ConnectionClosed => write!(f, "Connection closed"),
            TransportError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}
