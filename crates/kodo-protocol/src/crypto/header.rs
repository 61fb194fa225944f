use rc4::consts::U40;
use rc4::{Key, KeyInit, Rc4, StreamCipher};

use crate::error::{ProtocolError, Result};

/// Session keys are always 40 bytes on this protocol family.
pub const SESSION_KEY_LEN: usize = 40;

/// Both keystreams discard this many bytes after keying, before the first
/// header is touched. Server and client must agree or every header after
/// the handshake decodes to garbage.
const DROP_BYTES: usize = 1024;

/// Stream cipher over frame headers only; payloads travel in the clear.
///
/// Starts disarmed and passes headers through untouched, which is how the
/// handshake frames travel. Arming keys two independent RC4 instances from
/// the same session key, one per direction, so send and receive advance
/// separately. Once armed there is no rewind; a skipped or double-processed
/// header desynchronizes the stream for good.
pub struct HeaderCrypto {
    ciphers: Option<Ciphers>,
}

struct Ciphers {
    encrypt: Rc4<U40>,
    decrypt: Rc4<U40>,
}

impl HeaderCrypto {
    pub fn new() -> Self {
        HeaderCrypto { ciphers: None }
    }

    pub fn is_armed(&self) -> bool {
        self.ciphers.is_some()
    }

    /// Key both directions and discard the keystream prefix. The session
    /// key must be exactly [`SESSION_KEY_LEN`] bytes.
    pub fn arm(&mut self, session_key: &[u8]) -> Result<()> {
        if session_key.len() != SESSION_KEY_LEN {
            return Err(ProtocolError::BadSessionKey {
                expected: SESSION_KEY_LEN,
                actual: session_key.len(),
            });
        }
        let key = Key::<U40>::from_slice(session_key);
        let mut encrypt = Rc4::new(key);
        let mut decrypt = Rc4::new(key);
        let mut skip = [0u8; DROP_BYTES];
        encrypt.apply_keystream(&mut skip);
        decrypt.apply_keystream(&mut skip);
        self.ciphers = Some(Ciphers { encrypt, decrypt });
        Ok(())
    }

    /// Encrypt an outgoing header in place. Pass-through while disarmed.
    pub fn encrypt(&mut self, header: &mut [u8]) {
        if let Some(ciphers) = &mut self.ciphers {
            ciphers.encrypt.apply_keystream(header);
        }
    }

    /// Decrypt an incoming header in place. Pass-through while disarmed.
    pub fn decrypt(&mut self, header: &mut [u8]) {
        if let Some(ciphers) = &mut self.ciphers {
            ciphers.decrypt.apply_keystream(header);
        }
    }
}

impl Default for HeaderCrypto {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> Vec<u8> {
        (0u8..SESSION_KEY_LEN as u8).collect()
    }

    #[test]
    fn test_disarmed_is_pass_through() {
        let mut crypto = HeaderCrypto::new();
        assert!(!crypto.is_armed());
        let mut header = [0x00, 0x2A, 0xDC, 0x01];
        crypto.encrypt(&mut header);
        assert_eq!(header, [0x00, 0x2A, 0xDC, 0x01]);
        crypto.decrypt(&mut header);
        assert_eq!(header, [0x00, 0x2A, 0xDC, 0x01]);
    }

    #[test]
    fn test_keystream_after_drop_matches_known_answer() {
        let mut crypto = HeaderCrypto::new();
        crypto.arm(&test_key()).unwrap();
        assert!(crypto.is_armed());

        // Encrypting zeros exposes the keystream directly.
        let mut buf = [0u8; 8];
        crypto.encrypt(&mut buf);
        assert_eq!(buf, [0x93, 0x72, 0x11, 0xDF, 0x9E, 0xBD, 0xFB, 0x51]);
    }

    #[test]
    fn test_keystream_prefix_is_discarded() {
        let mut crypto = HeaderCrypto::new();
        crypto.arm(&test_key()).unwrap();

        // Raw RC4 under this key starts 0B 91 03 83; armed output must not.
        let mut buf = [0u8; 4];
        crypto.encrypt(&mut buf);
        assert_ne!(buf, [0x0B, 0x91, 0x03, 0x83]);
    }

    #[test]
    fn test_encrypt_advances_across_calls() {
        let mut crypto = HeaderCrypto::new();
        crypto.arm(&test_key()).unwrap();

        let mut first = [0u8; 4];
        crypto.encrypt(&mut first);
        let mut second = [0u8; 4];
        crypto.encrypt(&mut second);
        assert_eq!(first, [0x93, 0x72, 0x11, 0xDF]);
        assert_eq!(second, [0x9E, 0xBD, 0xFB, 0x51]);
    }

    #[test]
    fn test_known_header_encrypts_to_known_bytes() {
        let mut crypto = HeaderCrypto::new();
        crypto.arm(&test_key()).unwrap();

        let mut header = [0x00, 0x2A, 0xDC, 0x01];
        crypto.encrypt(&mut header);
        assert_eq!(header, [0x93, 0x58, 0xCD, 0xDE]);
    }

    #[test]
    fn test_peer_decrypt_recovers_plaintext() {
        // Two endpoints armed with the same key: one side's encrypt stream
        // pairs with the other side's decrypt stream at the same offset.
        let mut sender = HeaderCrypto::new();
        let mut receiver = HeaderCrypto::new();
        sender.arm(&test_key()).unwrap();
        receiver.arm(&test_key()).unwrap();

        for original in [[0x00, 0x2A, 0xDC, 0x01], [0x12, 0x34, 0x56, 0x78]] {
            let mut header = original;
            sender.encrypt(&mut header);
            receiver.decrypt(&mut header);
            assert_eq!(header, original);
        }
    }

    #[test]
    fn test_directions_do_not_share_state() {
        let mut crypto = HeaderCrypto::new();
        crypto.arm(&test_key()).unwrap();

        // Interleaving directions must not perturb either stream.
        let mut sent = [0u8; 4];
        crypto.encrypt(&mut sent);
        let mut received = [0u8; 4];
        crypto.decrypt(&mut received);
        assert_eq!(sent, received);
    }

    #[test]
    fn test_wrong_key_length_is_rejected() {
        let mut crypto = HeaderCrypto::new();
        match crypto.arm(&[0u8; 39]) {
            Err(ProtocolError::BadSessionKey { expected, actual }) => {
                assert_eq!(expected, SESSION_KEY_LEN);
                assert_eq!(actual, 39);
            }
            other => panic!("expected key length error, got {:?}", other),
        }
        assert!(!crypto.is_armed());
    }
}
