use crate::error::{ProtocolError, Result};

/// Messages the client originates. Wire values are resolved through an
/// [`OpcodeTable`] so the session logic never hardcodes build-specific
/// numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientOpcode {
    AuthSession,
    CharEnum,
    PlayerLogin,
    Ping,
    MessageChat,
    MoveStartForward,
    MoveStartBackward,
    MoveStop,
    MoveStartStrafeLeft,
    MoveStartStrafeRight,
    MoveStopStrafe,
    MoveJump,
    MoveStartTurnLeft,
    MoveStartTurnRight,
    MoveStopTurn,
    MoveSetFacing,
    MoveHeartbeat,
    MoveFallLand,
}

/// Messages the server sends that this layer understands. Anything else
/// decodes to `None` and is skipped by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerOpcode {
    AuthChallenge,
    AuthResponse,
    CharEnum,
    LoginVerifyWorld,
    AccountDataTimes,
    Motd,
    Pong,
    UpdateObject,
    DestroyObject,
    MessageChat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Build {
    /// 3.3.5a, build 12340.
    Wrath,
}

/// Per-build opcode numbering. Constructed once at connect time; an
/// unsupported build number is rejected before any traffic is sent.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeTable {
    build: Build,
    number: u32,
}

impl OpcodeTable {
    pub fn for_build(build: u32) -> Result<Self> {
        match build {
            12340 => Ok(OpcodeTable {
                build: Build::Wrath,
                number: build,
            }),
            other => Err(ProtocolError::UnsupportedBuild(other)),
        }
    }

    /// The client build this table was resolved for.
    pub fn build(&self) -> u32 {
        self.number
    }

    /// Wire value for a client message. Client headers carry a u32 opcode.
    pub fn client_wire(&self, opcode: ClientOpcode) -> u32 {
        match self.build {
            Build::Wrath => wrath::client_wire(opcode),
        }
    }

    /// Wire value for a server message. Server headers carry a u16 opcode.
    pub fn server_wire(&self, opcode: ServerOpcode) -> u16 {
        match self.build {
            Build::Wrath => wrath::server_wire(opcode),
        }
    }

    /// Map a received wire value back to a known server message.
    pub fn decode_server(&self, wire: u16) -> Option<ServerOpcode> {
        match self.build {
            Build::Wrath => wrath::decode_server(wire),
        }
    }
}

mod wrath {
    use super::{ClientOpcode, ServerOpcode};

    pub(super) fn client_wire(opcode: ClientOpcode) -> u32 {
        match opcode {
            ClientOpcode::AuthSession => 0x1ED,
            ClientOpcode::CharEnum => 0x037,
            ClientOpcode::PlayerLogin => 0x03D,
            ClientOpcode::Ping => 0x1DC,
            ClientOpcode::MessageChat => 0x095,
            ClientOpcode::MoveStartForward => 0x0B5,
            ClientOpcode::MoveStartBackward => 0x0B6,
            ClientOpcode::MoveStop => 0x0B7,
            ClientOpcode::MoveStartStrafeLeft => 0x0B8,
            ClientOpcode::MoveStartStrafeRight => 0x0B9,
            ClientOpcode::MoveStopStrafe => 0x0BA,
            ClientOpcode::MoveJump => 0x0BB,
            ClientOpcode::MoveStartTurnLeft => 0x0BC,
            ClientOpcode::MoveStartTurnRight => 0x0BD,
            ClientOpcode::MoveStopTurn => 0x0BE,
            ClientOpcode::MoveSetFacing => 0x0DA,
            ClientOpcode::MoveHeartbeat => 0x0EE,
            ClientOpcode::MoveFallLand => 0x0C9,
        }
    }

    pub(super) fn server_wire(opcode: ServerOpcode) -> u16 {
        match opcode {
            ServerOpcode::AuthChallenge => 0x1EC,
            ServerOpcode::AuthResponse => 0x1EE,
            ServerOpcode::CharEnum => 0x03B,
            ServerOpcode::LoginVerifyWorld => 0x236,
            ServerOpcode::AccountDataTimes => 0x209,
            ServerOpcode::Motd => 0x33D,
            ServerOpcode::Pong => 0x1DD,
            ServerOpcode::UpdateObject => 0x0A9,
            ServerOpcode::DestroyObject => 0x0AA,
            ServerOpcode::MessageChat => 0x096,
        }
    }

    pub(super) fn decode_server(wire: u16) -> Option<ServerOpcode> {
        let opcode = match wire {
            0x1EC => ServerOpcode::AuthChallenge,
            0x1EE => ServerOpcode::AuthResponse,
            0x03B => ServerOpcode::CharEnum,
            0x236 => ServerOpcode::LoginVerifyWorld,
            0x209 => ServerOpcode::AccountDataTimes,
            0x33D => ServerOpcode::Motd,
            0x1DD => ServerOpcode::Pong,
            0x0A9 => ServerOpcode::UpdateObject,
            0x0AA => ServerOpcode::DestroyObject,
            0x096 => ServerOpcode::MessageChat,
            _ => return None,
        };
        Some(opcode)
    }
}
