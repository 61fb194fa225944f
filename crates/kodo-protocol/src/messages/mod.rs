//! Payload codecs for the world protocol. Each message type parses from or
//! writes to a plaintext payload; framing and header crypto live in
//! [`crate::frame`].

pub mod auth;
pub mod characters;
pub mod chat;
pub mod movement;
pub mod ping;
pub mod system;
pub mod update;

pub use auth::{AuthChallenge, AuthResponse, AuthResult, AuthSession};
pub use characters::{CharEnum, Character, LoginVerifyWorld, PlayerLogin};
pub use chat::{ChatMessageIn, ChatMessageOut, ChatType, Language};
pub use movement::{MovementFlags, MovementInfo};
pub use ping::{Ping, Pong};
pub use system::{AccountDataTimes, Motd};
pub use update::{DestroyObject, ObjectTypeId, UpdateBlock, UpdateObject};
