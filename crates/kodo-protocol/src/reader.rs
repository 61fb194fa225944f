use byteorder::{ByteOrder, LittleEndian};

use crate::error::{ProtocolError, Result};
use crate::guid::Guid;

/// Forward-only cursor over a received payload.
///
/// Every read checks the remaining length first and fails with
/// [`ProtocolError::UnexpectedEof`] instead of reading past the end, so
/// handlers can bail out of a truncated frame without partial state.
/// Integers and floats are little-endian.
pub struct PacketReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PacketReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        PacketReader { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn ensure(&self, wanted: usize) -> Result<()> {
        let remaining = self.remaining();
        if remaining < wanted {
            return Err(ProtocolError::UnexpectedEof { wanted, remaining });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        let v = LittleEndian::read_u16(&self.data[self.pos..]);
        self.pos += 2;
        Ok(v)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        let v = LittleEndian::read_u32(&self.data[self.pos..]);
        self.pos += 4;
        Ok(v)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.ensure(8)?;
        let v = LittleEndian::read_u64(&self.data[self.pos..]);
        self.pos += 8;
        Ok(v)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.ensure(4)?;
        let v = LittleEndian::read_f32(&self.data[self.pos..]);
        self.pos += 4;
        Ok(v)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        self.ensure(len)?;
        let v = self.data[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Ok(v)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.ensure(len)?;
        self.pos += len;
        Ok(())
    }

    /// Read a NUL-terminated string. The end of the payload also terminates,
    /// matching how servers omit the NUL on the final field of some frames.
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn read_cstring(&mut self) -> Result<String> {
        let start = self.pos;
        while self.pos < self.data.len() && self.data[self.pos] != 0 {
            self.pos += 1;
        }
        let bytes = &self.data[start..self.pos];
        if self.pos < self.data.len() {
            self.pos += 1; // consume the NUL
        }
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read a packed guid: a mask byte, then one byte per set mask bit,
    /// bit `i` populating byte `i` of the value. A zero mask is the zero guid.
    pub fn read_packed_guid(&mut self) -> Result<Guid> {
        let mask = self.read_u8()?;
        if mask == 0 {
            return Ok(Guid::ZERO);
        }
        let mut raw = 0u64;
        for i in 0..8 {
            if mask & (1 << i) != 0 {
                let byte = self.read_u8()?;
                raw |= (byte as u64) << (i * 8);
            }
        }
        Ok(Guid(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_are_little_endian() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05];
        let mut r = PacketReader::new(&data);
        assert_eq!(r.read_u32().unwrap(), 0x04030201);
        assert_eq!(r.read_u8().unwrap(), 0x05);
        assert!(r.is_empty());
    }

    #[test]
    fn test_eof_reports_shortfall() {
        let data = [0x01, 0x02];
        let mut r = PacketReader::new(&data);
        match r.read_u32() {
            Err(ProtocolError::UnexpectedEof { wanted, remaining }) => {
                assert_eq!(wanted, 4);
                assert_eq!(remaining, 2);
            }
            other => panic!("expected eof, got {:?}", other),
        }
    }

    #[test]
    fn test_cstring_stops_at_nul() {
        let data = b"Thrall\0X";
        let mut r = PacketReader::new(data);
        assert_eq!(r.read_cstring().unwrap(), "Thrall");
        assert_eq!(r.read_u8().unwrap(), b'X');
    }

    #[test]
    fn test_cstring_accepts_missing_terminator() {
        let data = b"Jaina";
        let mut r = PacketReader::new(data);
        assert_eq!(r.read_cstring().unwrap(), "Jaina");
        assert!(r.is_empty());
    }

    #[test]
    fn test_packed_guid_zero_mask() {
        let data = [0x00, 0xFF];
        let mut r = PacketReader::new(&data);
        assert_eq!(r.read_packed_guid().unwrap(), Guid::ZERO);
        assert_eq!(r.remaining(), 1);
    }

    #[test]
    fn test_packed_guid_reads_set_bytes() {
        // mask 0b0000_0101: bytes 0 and 2 present
        let data = [0x05, 0x34, 0x12];
        let mut r = PacketReader::new(&data);
        assert_eq!(r.read_packed_guid().unwrap(), Guid(0x0012_0034));
    }

    #[test]
    fn test_packed_guid_accepts_non_minimal_mask() {
        // byte 1 present but zero: legal on the wire, same value as 0x34
        let data = [0x03, 0x34, 0x00];
        let mut r = PacketReader::new(&data);
        assert_eq!(r.read_packed_guid().unwrap(), Guid(0x34));
    }

    #[test]
    fn test_packed_guid_truncated_is_an_error() {
        let data = [0xFF, 0x01, 0x02];
        let mut r = PacketReader::new(&data);
        assert!(r.read_packed_guid().is_err());
    }
}
