use async_trait::async_trait;

use crate::transport::errors::transport_error::TransportError;

/// Byte-level access to one device connection. `send` completes only when
/// the whole buffer is accepted; `receive_exact` returns exactly `length`
/// bytes or fails. There is no partial-read API.
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError>;
    async fn receive_exact(&mut self, length: usize) -> Result<Vec<u8>, TransportError>;
    async fn shutdown(&mut self);
}
