pub mod errors;
pub mod tcp_transport;
pub mod transport;
