pub mod digest;
pub mod header;

pub use digest::session_proof;
pub use header::{HeaderCrypto, SESSION_KEY_LEN};
