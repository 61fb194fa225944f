pub mod chat;
pub mod config;
pub mod entities;
pub mod session;
pub mod targeting;
pub mod transport;

// Re-export main types
pub use self::chat::{ChatEntry, ChatLog};
pub use self::entities::{BatchSummary, Entity, EntityKind, EntityManager};
pub use self::session::{SessionError, SessionState, WorldSession};
pub use self::targeting::TargetCycler;
pub use self::transport::{
    LoopbackServer, LoopbackTransport, TcpTransport, Transport, TransportError,
};
