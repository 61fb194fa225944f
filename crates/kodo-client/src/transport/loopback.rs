//! In-memory transport keeping both ends in one process.
//!
//! Useful anywhere a session should run against a scripted peer without
//! touching the network stack, which is how the integration tests drive
//! full handshakes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::{Transport, TransportError};

#[derive(Debug)]
struct SharedState {
    connected: AtomicBool,
    client_to_server: Mutex<Vec<u8>>,
    server_to_client: Mutex<Vec<u8>>,
}

impl SharedState {
    fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            client_to_server: Mutex::new(Vec::new()),
            server_to_client: Mutex::new(Vec::new()),
        }
    }
}

/// Client half. Implements [`Transport`] so a session can use it directly.
pub struct LoopbackTransport {
    state: Arc<SharedState>,
}

/// Server half, held by the driving side to script peer behavior.
pub struct LoopbackServer {
    state: Arc<SharedState>,
}

impl LoopbackTransport {
    /// Build a connected transport pair sharing one in-memory state.
    pub fn pair() -> (LoopbackTransport, LoopbackServer) {
        let state = Arc::new(SharedState::new());
        (
            LoopbackTransport {
                state: Arc::clone(&state),
            },
            LoopbackServer { state },
        )
    }
}

impl Transport for LoopbackTransport {
    fn send(&mut self, bytes: Vec<u8>) -> Result<(), TransportError> {
        if !self.state.connected.load(Ordering::Relaxed) {
            return Err(TransportError::Closed);
        }
        if let Ok(mut queue) = self.state.client_to_server.lock() {
            queue.extend_from_slice(&bytes);
        }
        Ok(())
    }

    fn drain_received(&mut self) -> Vec<u8> {
        if let Ok(mut queue) = self.state.server_to_client.lock() {
            return std::mem::take(&mut *queue);
        }
        Vec::new()
    }

    fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::Relaxed)
    }

    fn shutdown(&mut self) {
        self.state.connected.store(false, Ordering::Relaxed);
    }
}

impl LoopbackServer {
    /// Deliver bytes to the client side.
    pub fn push(&self, bytes: &[u8]) {
        if let Ok(mut queue) = self.state.server_to_client.lock() {
            queue.extend_from_slice(bytes);
        }
    }

    /// Take everything the client has sent since the last call.
    pub fn take_sent(&self) -> Vec<u8> {
        if let Ok(mut queue) = self.state.client_to_server.lock() {
            return std::mem::take(&mut *queue);
        }
        Vec::new()
    }

    /// Simulate the peer dropping the connection.
    pub fn close(&self) {
        self.state.connected.store(false, Ordering::Relaxed);
    }

    pub fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::Relaxed)
    }
}
