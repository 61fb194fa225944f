use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::warn;

use super::{Transport, TransportError};

/// TCP transport backed by a pair of background tasks.
///
/// The reader task forwards raw chunks into an unbounded channel that
/// `drain_received` empties without blocking; the writer task flushes
/// queued frames in order. Either task flips the shared connected flag
/// when its half of the stream dies.
pub struct TcpTransport {
    outbound_tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
    inbound_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    connected: Arc<AtomicBool>,
}

impl TcpTransport {
    /// Dial `host:port`. Returns after the TCP handshake; the stream is
    /// split and both pump tasks are running by the time this returns.
    pub async fn connect(host: &str, port: u16) -> io::Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        let (mut read_half, mut write_half) = stream.into_split();

        let connected = Arc::new(AtomicBool::new(true));
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Vec<u8>>();

        let reader_flag = Arc::clone(&connected);
        tokio::spawn(async move {
            let mut buf = [0u8; 4096];
            loop {
                match read_half.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        if inbound_tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(target: "net", "Socket read failed: {}", e);
                        break;
                    }
                }
            }
            reader_flag.store(false, Ordering::Relaxed);
        });

        let writer_flag = Arc::clone(&connected);
        tokio::spawn(async move {
            while let Some(bytes) = outbound_rx.recv().await {
                if let Err(e) = write_half.write_all(&bytes).await {
                    warn!(target: "net", "Socket write failed: {}", e);
                    break;
                }
            }
            writer_flag.store(false, Ordering::Relaxed);
        });

        Ok(Self {
            outbound_tx: Some(outbound_tx),
            inbound_rx,
            connected,
        })
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, bytes: Vec<u8>) -> Result<(), TransportError> {
        if !self.connected.load(Ordering::Relaxed) {
            return Err(TransportError::Closed);
        }
        match self.outbound_tx.as_ref() {
            Some(tx) => tx.send(bytes).map_err(|_| TransportError::Closed),
            None => Err(TransportError::Closed),
        }
    }

    fn drain_received(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        while let Ok(chunk) = self.inbound_rx.try_recv() {
            out.extend_from_slice(&chunk);
        }
        out
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    fn shutdown(&mut self) {
        // Dropping the sender ends the writer task, which closes our half.
        self.outbound_tx = None;
        self.connected.store(false, Ordering::Relaxed);
    }
}
