pub mod crypto;
pub mod error;
pub mod frame;
pub mod guid;
pub mod messages;
pub mod opcodes;
pub mod reader;
pub mod update_mask;
pub mod writer;

pub use crypto::{session_proof, HeaderCrypto, SESSION_KEY_LEN};
pub use error::{ProtocolError, Result};
pub use frame::{encode_client_frame, FrameAssembler, ServerFrame};
pub use guid::Guid;
pub use opcodes::{ClientOpcode, OpcodeTable, ServerOpcode};
pub use reader::PacketReader;
pub use writer::PacketWriter;
