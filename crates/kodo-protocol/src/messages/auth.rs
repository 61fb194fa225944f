use crate::error::Result;
use crate::reader::PacketReader;
use crate::writer::PacketWriter;

/// Outbound auth-session payload. Several fields are reserved zeros whose
/// meaning the server never documented; they are written verbatim rather
/// than guessed at. The account must already be uppercased, and the proof
/// comes from [`crate::crypto::session_proof`] over the same seeds.
#[derive(Debug)]
pub struct AuthSession<'a> {
    pub build: u32,
    pub account: &'a str,
    pub client_seed: u32,
    pub proof: [u8; 20],
}

impl AuthSession<'_> {
    pub fn write(&self, w: &mut PacketWriter) {
        w.write_u32(self.build);
        w.write_u32(0);
        w.write_cstring(self.account);
        w.write_u32(0);
        w.write_u32(self.client_seed);
        for _ in 0..5 {
            w.write_u32(0);
        }
        w.write_bytes(&self.proof);
        // addon CRC, servers accept zero
        w.write_u32(0);
    }
}

/// Server challenge that opens the handshake. Carries one undocumented
/// leading word and the seed the client must fold into its proof. Servers
/// append further seed material we have no use for; it is left unread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthChallenge {
    pub server_seed: u32,
}

impl AuthChallenge {
    pub fn parse(r: &mut PacketReader<'_>) -> Result<Self> {
        let _reserved = r.read_u32()?;
        let server_seed = r.read_u32()?;
        Ok(AuthChallenge { server_seed })
    }
}

/// Authentication verdict codes as the server numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthResult {
    Ok,
    Failed,
    Reject,
    BadServerProof,
    Unavailable,
    SystemError,
    BillingError,
    BillingExpired,
    VersionMismatch,
    UnknownAccount,
    IncorrectPassword,
    SessionExpired,
    ServerShuttingDown,
    AlreadyLoggingIn,
    LoginServerNotFound,
    WaitQueue,
    Banned,
    AlreadyOnline,
    NoTime,
    DbBusy,
    Suspended,
    ParentalControl,
    LockedEnforced,
    Unknown(u8),
}

impl AuthResult {
    pub fn from_wire(code: u8) -> Self {
        match code {
            0x0C => AuthResult::Ok,
            0x0D => AuthResult::Failed,
            0x0E => AuthResult::Reject,
            0x0F => AuthResult::BadServerProof,
            0x10 => AuthResult::Unavailable,
            0x11 => AuthResult::SystemError,
            0x12 => AuthResult::BillingError,
            0x13 => AuthResult::BillingExpired,
            0x14 => AuthResult::VersionMismatch,
            0x15 => AuthResult::UnknownAccount,
            0x16 => AuthResult::IncorrectPassword,
            0x17 => AuthResult::SessionExpired,
            0x18 => AuthResult::ServerShuttingDown,
            0x19 => AuthResult::AlreadyLoggingIn,
            0x1A => AuthResult::LoginServerNotFound,
            0x1B => AuthResult::WaitQueue,
            0x1C => AuthResult::Banned,
            0x1D => AuthResult::AlreadyOnline,
            0x1E => AuthResult::NoTime,
            0x1F => AuthResult::DbBusy,
            0x20 => AuthResult::Suspended,
            0x21 => AuthResult::ParentalControl,
            0x22 => AuthResult::LockedEnforced,
            other => AuthResult::Unknown(other),
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, AuthResult::Ok)
    }

    pub fn description(self) -> &'static str {
        match self {
            AuthResult::Ok => "OK - Authentication successful",
            AuthResult::Failed => "FAILED - Authentication failed",
            AuthResult::Reject => "REJECT - Connection rejected",
            AuthResult::BadServerProof => "BAD_SERVER_PROOF - Invalid server proof",
            AuthResult::Unavailable => "UNAVAILABLE - Server unavailable",
            AuthResult::SystemError => "SYSTEM_ERROR - System error occurred",
            AuthResult::BillingError => "BILLING_ERROR - Billing error",
            AuthResult::BillingExpired => "BILLING_EXPIRED - Subscription expired",
            AuthResult::VersionMismatch => "VERSION_MISMATCH - Client version mismatch",
            AuthResult::UnknownAccount => "UNKNOWN_ACCOUNT - Account not found",
            AuthResult::IncorrectPassword => "INCORRECT_PASSWORD - Wrong password",
            AuthResult::SessionExpired => "SESSION_EXPIRED - Session has expired",
            AuthResult::ServerShuttingDown => "SERVER_SHUTTING_DOWN - Server is shutting down",
            AuthResult::AlreadyLoggingIn => "ALREADY_LOGGING_IN - Already logging in",
            AuthResult::LoginServerNotFound => "LOGIN_SERVER_NOT_FOUND - Can't contact login server",
            AuthResult::WaitQueue => "WAIT_QUEUE - Waiting in queue",
            AuthResult::Banned => "BANNED - Account is banned",
            AuthResult::AlreadyOnline => "ALREADY_ONLINE - Character already logged in",
            AuthResult::NoTime => "NO_TIME - No game time remaining",
            AuthResult::DbBusy => "DB_BUSY - Database is busy",
            AuthResult::Suspended => "SUSPENDED - Account is suspended",
            AuthResult::ParentalControl => "PARENTAL_CONTROL - Parental controls active",
            AuthResult::LockedEnforced => "LOCKED_ENFORCED - Account is locked",
            AuthResult::Unknown(_) => "UNKNOWN - Unknown result code",
        }
    }
}

/// Server verdict on the auth-session proof. Success variants append billing
/// details and queue responses a queue position; neither matters here, so
/// the trailing bytes are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthResponse {
    pub result: AuthResult,
}

impl AuthResponse {
    pub fn parse(r: &mut PacketReader<'_>) -> Result<Self> {
        let code = r.read_u8()?;
        Ok(AuthResponse {
            result: AuthResult::from_wire(code),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_session_layout() {
        let session = AuthSession {
            build: 12340,
            account: "ALICE",
            client_seed: 0x11223344,
            proof: [0xAB; 20],
        };
        let mut w = PacketWriter::new();
        session.write(&mut w);
        let buf = w.into_inner();

        // build + reserved + "ALICE\0" + reserved + seed + 5 reserved + proof + crc
        assert_eq!(buf.len(), 4 + 4 + 6 + 4 + 4 + 20 + 20 + 4);
        assert_eq!(&buf[0..4], &12340u32.to_le_bytes());
        assert_eq!(&buf[4..8], &[0, 0, 0, 0]);
        assert_eq!(&buf[8..14], b"ALICE\0");
        assert_eq!(&buf[14..18], &[0, 0, 0, 0]);
        assert_eq!(&buf[18..22], &0x11223344u32.to_le_bytes());
        assert_eq!(&buf[22..42], &[0u8; 20]);
        assert_eq!(&buf[42..62], &[0xAB; 20]);
        assert_eq!(&buf[62..66], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_challenge_takes_second_word_as_seed() {
        let mut w = PacketWriter::new();
        w.write_u32(1);
        w.write_u32(0xCAFEBABE);
        w.write_bytes(&[0u8; 32]); // extra seed material, ignored

        let buf = w.into_inner();
        let mut r = PacketReader::new(&buf);
        let challenge = AuthChallenge::parse(&mut r).unwrap();
        assert_eq!(challenge.server_seed, 0xCAFEBABE);
    }

    #[test]
    fn test_truncated_challenge_fails() {
        let buf = [1, 0, 0, 0, 0xBE];
        let mut r = PacketReader::new(&buf);
        assert!(AuthChallenge::parse(&mut r).is_err());
    }

    #[test]
    fn test_response_codes_map_to_results() {
        let cases = [
            (0x0Cu8, AuthResult::Ok),
            (0x0D, AuthResult::Failed),
            (0x15, AuthResult::UnknownAccount),
            (0x1B, AuthResult::WaitQueue),
            (0x22, AuthResult::LockedEnforced),
            (0x55, AuthResult::Unknown(0x55)),
        ];
        for (code, expected) in cases {
            let buf = [code];
            let mut r = PacketReader::new(&buf);
            let response = AuthResponse::parse(&mut r).unwrap();
            assert_eq!(response.result, expected);
        }
    }

    #[test]
    fn test_only_ok_is_success() {
        assert!(AuthResult::Ok.is_success());
        assert!(!AuthResult::Failed.is_success());
        assert!(!AuthResult::WaitQueue.is_success());
        assert!(!AuthResult::Unknown(0xFF).is_success());
    }
}
