use crate::guid::Guid;

/// Append-only builder for an outgoing payload. Integers and floats are
/// little-endian. Writing cannot fail; the transport applies the frame
/// header and size checks when the payload is sent.
#[derive(Default)]
pub struct PacketWriter {
    buf: Vec<u8>,
}

impl PacketWriter {
    pub fn new() -> Self {
        PacketWriter { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        PacketWriter {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write the string bytes followed by a NUL terminator.
    pub fn write_cstring(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
    }

    /// Write a guid in packed form: mask byte, then only the non-zero value
    /// bytes, lowest first. The zero guid is the single byte 0x00.
    pub fn write_packed_guid(&mut self, guid: Guid) {
        let raw = guid.raw();
        let mut mask = 0u8;
        let mut bytes = [0u8; 8];
        let mut count = 0;
        for i in 0..8 {
            let b = ((raw >> (i * 8)) & 0xFF) as u8;
            if b != 0 {
                mask |= 1 << i;
                bytes[count] = b;
                count += 1;
            }
        }
        self.buf.push(mask);
        self.buf.extend_from_slice(&bytes[..count]);
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}
