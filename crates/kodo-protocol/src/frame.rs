//! Frame layer. Server frames carry a 4-byte header (big-endian u16 size
//! counting opcode plus payload, little-endian u16 opcode); client frames a
//! 6-byte header (big-endian u16 size, little-endian u32 opcode). Only the
//! header bytes are ciphered once the session arms the header crypto.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::crypto::HeaderCrypto;
use crate::error::{ProtocolError, Result};

pub const SERVER_HEADER_LEN: usize = 4;
pub const CLIENT_HEADER_LEN: usize = 6;

/// One reassembled server frame; the payload is plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerFrame {
    pub opcode: u16,
    pub payload: Vec<u8>,
}

/// Reassembles server frames from an arbitrary byte stream.
///
/// Header bytes are decrypted exactly once, at the moment all four are
/// available, and the decoded length is remembered until the payload
/// arrives. Feeding and draining are decoupled so a TCP read can deliver
/// half a header or three frames at once.
#[derive(Default)]
pub struct FrameAssembler {
    buf: Vec<u8>,
    pending: Option<PendingHeader>,
}

struct PendingHeader {
    opcode: u16,
    payload_len: usize,
}

impl FrameAssembler {
    pub fn new() -> Self {
        FrameAssembler {
            buf: Vec::new(),
            pending: None,
        }
    }

    /// Buffered bytes not yet returned as frames.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pull the next complete frame, or `None` if more bytes are needed.
    ///
    /// A size field too small to hold the opcode is reported as
    /// [`ProtocolError::BadFrameSize`]; the stream is almost certainly
    /// cipher-desynchronized at that point and everything after will be
    /// garbage until the caller reconnects.
    pub fn next_frame(&mut self, crypto: &mut HeaderCrypto) -> Result<Option<ServerFrame>> {
        if self.pending.is_none() {
            if self.buf.len() < SERVER_HEADER_LEN {
                return Ok(None);
            }
            let mut header = [0u8; SERVER_HEADER_LEN];
            header.copy_from_slice(&self.buf[..SERVER_HEADER_LEN]);
            self.buf.drain(..SERVER_HEADER_LEN);
            crypto.decrypt(&mut header);

            let size = BigEndian::read_u16(&header[0..2]);
            let opcode = LittleEndian::read_u16(&header[2..4]);
            if size < 2 {
                return Err(ProtocolError::BadFrameSize(size));
            }
            self.pending = Some(PendingHeader {
                opcode,
                payload_len: size as usize - 2,
            });
        }

        let payload_len = match &self.pending {
            Some(pending) => pending.payload_len,
            None => return Ok(None),
        };
        if self.buf.len() < payload_len {
            return Ok(None);
        }

        let pending = match self.pending.take() {
            Some(pending) => pending,
            None => return Ok(None),
        };
        let payload = self.buf.drain(..payload_len).collect();
        Ok(Some(ServerFrame {
            opcode: pending.opcode,
            payload,
        }))
    }
}

/// Encode a client frame: 6-byte header (encrypted in place when the crypto
/// is armed) followed by the plaintext payload.
pub fn encode_client_frame(
    opcode: u32,
    payload: &[u8],
    crypto: &mut HeaderCrypto,
) -> Result<Vec<u8>> {
    let size = payload.len() + 4;
    if size > u16::MAX as usize {
        return Err(ProtocolError::FrameTooLarge(payload.len()));
    }

    let mut header = [0u8; CLIENT_HEADER_LEN];
    BigEndian::write_u16(&mut header[0..2], size as u16);
    LittleEndian::write_u32(&mut header[2..6], opcode);
    crypto.encrypt(&mut header);

    let mut frame = Vec::with_capacity(CLIENT_HEADER_LEN + payload.len());
    frame.extend_from_slice(&header);
    frame.extend_from_slice(payload);
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> Vec<u8> {
        (0u8..40).collect()
    }

    #[test]
    fn test_assembles_a_plaintext_frame() {
        let mut crypto = HeaderCrypto::new();
        let mut assembler = FrameAssembler::new();
        // size 6 = opcode (2) + payload (4), opcode 0x01EC
        assembler.feed(&[0x00, 0x06, 0xEC, 0x01, 0xDE, 0xAD, 0xBE, 0xEF]);

        let frame = assembler.next_frame(&mut crypto).unwrap().unwrap();
        assert_eq!(frame.opcode, 0x1EC);
        assert_eq!(frame.payload, vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(assembler.next_frame(&mut crypto).unwrap().is_none());
    }

    #[test]
    fn test_assembles_byte_at_a_time() {
        let mut crypto = HeaderCrypto::new();
        let mut assembler = FrameAssembler::new();
        let stream = [0x00, 0x04, 0xDD, 0x01, 0x2A, 0x00];

        for (i, byte) in stream.iter().enumerate() {
            let got = assembler.next_frame(&mut crypto).unwrap();
            assert!(got.is_none(), "frame completed early at byte {}", i);
            assembler.feed(&[*byte]);
        }
        let frame = assembler.next_frame(&mut crypto).unwrap().unwrap();
        assert_eq!(frame.opcode, 0x1DD);
        assert_eq!(frame.payload, vec![0x2A, 0x00]);
    }

    #[test]
    fn test_drains_multiple_frames_from_one_feed() {
        let mut crypto = HeaderCrypto::new();
        let mut assembler = FrameAssembler::new();
        assembler.feed(&[
            0x00, 0x02, 0x3B, 0x00, // empty payload
            0x00, 0x03, 0xEE, 0x01, 0x0C, // single byte payload
        ]);

        let first = assembler.next_frame(&mut crypto).unwrap().unwrap();
        assert_eq!(first.opcode, 0x03B);
        assert!(first.payload.is_empty());

        let second = assembler.next_frame(&mut crypto).unwrap().unwrap();
        assert_eq!(second.opcode, 0x1EE);
        assert_eq!(second.payload, vec![0x0C]);
        assert_eq!(assembler.buffered(), 0);
    }

    #[test]
    fn test_undersized_length_field_is_an_error() {
        let mut crypto = HeaderCrypto::new();
        let mut assembler = FrameAssembler::new();
        assembler.feed(&[0x00, 0x01, 0xAA, 0xBB]);

        match assembler.next_frame(&mut crypto) {
            Err(ProtocolError::BadFrameSize(1)) => {}
            other => panic!("expected bad frame size, got {:?}", other),
        }
    }

    #[test]
    fn test_decrypts_headers_from_an_armed_peer() {
        let mut server = HeaderCrypto::new();
        let mut client = HeaderCrypto::new();
        server.arm(&test_key()).unwrap();
        client.arm(&test_key()).unwrap();

        // Server encrypts each header as it sends; payload stays clear.
        let mut wire = Vec::new();
        for (opcode, payload) in [(0x236u16, vec![0u8; 20]), (0x1DDu16, vec![1, 0, 0, 0])] {
            let mut header = [0u8; SERVER_HEADER_LEN];
            BigEndian::write_u16(&mut header[0..2], payload.len() as u16 + 2);
            LittleEndian::write_u16(&mut header[2..4], opcode);
            server.encrypt(&mut header);
            wire.extend_from_slice(&header);
            wire.extend_from_slice(&payload);
        }

        let mut assembler = FrameAssembler::new();
        assembler.feed(&wire);
        let first = assembler.next_frame(&mut client).unwrap().unwrap();
        assert_eq!(first.opcode, 0x236);
        assert_eq!(first.payload.len(), 20);
        let second = assembler.next_frame(&mut client).unwrap().unwrap();
        assert_eq!(second.opcode, 0x1DD);
        assert_eq!(second.payload, vec![1, 0, 0, 0]);
    }

    #[test]
    fn test_client_frame_layout() {
        let mut crypto = HeaderCrypto::new();
        let frame = encode_client_frame(0x1ED, &[0xAA, 0xBB], &mut crypto).unwrap();
        // size 6 = opcode (4) + payload (2), big-endian; opcode little-endian
        assert_eq!(frame, vec![0x00, 0x06, 0xED, 0x01, 0x00, 0x00, 0xAA, 0xBB]);
    }

    #[test]
    fn test_oversized_client_payload_is_rejected() {
        let mut crypto = HeaderCrypto::new();
        let payload = vec![0u8; u16::MAX as usize - 3];
        match encode_client_frame(0x095, &payload, &mut crypto) {
            Err(ProtocolError::FrameTooLarge(_)) => {}
            other => panic!("expected frame too large, got {:?}", other),
        }
    }

    #[test]
    fn test_armed_encode_ciphers_only_the_header() {
        let mut sender = HeaderCrypto::new();
        sender.arm(&test_key()).unwrap();

        let payload = [0x11, 0x22, 0x33];
        let frame = encode_client_frame(0x1DC, &payload, &mut sender).unwrap();
        assert_eq!(&frame[CLIENT_HEADER_LEN..], &payload);

        let mut plain_crypto = HeaderCrypto::new();
        let plain = encode_client_frame(0x1DC, &payload, &mut plain_crypto).unwrap();
        assert_ne!(&frame[..CLIENT_HEADER_LEN], &plain[..CLIENT_HEADER_LEN]);
    }
}
