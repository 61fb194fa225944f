//! Byte-stream transports feeding the session.
//!
//! The session never blocks on the network: a transport buffers inbound
//! bytes on its own and hands them over in `drain_received`, and accepts
//! whole outbound frames in `send`. Frame boundaries are the codec's
//! concern, not the transport's.

mod loopback;
mod tcp;

pub use loopback::{LoopbackServer, LoopbackTransport};
pub use tcp::TcpTransport;

/// Transport-level failures. Anything here is fatal to the connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("transport is closed")]
    Closed,
}

/// An ordered byte stream with asynchronous inbound buffering.
pub trait Transport: Send {
    /// Queue bytes for delivery to the peer.
    fn send(&mut self, bytes: Vec<u8>) -> Result<(), TransportError>;

    /// Take every byte received since the last call. Empty when idle.
    fn drain_received(&mut self) -> Vec<u8>;

    /// False once the peer is gone or the stream broke.
    fn is_connected(&self) -> bool;

    /// Drop the connection. Idempotent.
    fn shutdown(&mut self);
}
