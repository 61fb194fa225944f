use crate::error::Result;
use crate::reader::PacketReader;
use crate::writer::PacketWriter;

/// Keepalive probe. `latency` reports the round-trip measured for the
/// previous probe; the first ping sends zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ping {
    pub sequence: u32,
    pub latency: u32,
}

impl Ping {
    pub fn write(&self, w: &mut PacketWriter) {
        w.write_u32(self.sequence);
        w.write_u32(self.latency);
    }
}

/// Keepalive echo. The sequence must match the outstanding ping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pong {
    pub sequence: u32,
}

impl Pong {
    pub fn parse(r: &mut PacketReader<'_>) -> Result<Self> {
        Ok(Pong {
            sequence: r.read_u32()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_writes_sequence_then_latency() {
        let mut w = PacketWriter::new();
        Ping {
            sequence: 3,
            latency: 45,
        }
        .write(&mut w);
        assert_eq!(w.as_slice(), &[3, 0, 0, 0, 45, 0, 0, 0]);
    }

    #[test]
    fn test_pong_reads_sequence() {
        let buf = [7, 0, 0, 0];
        let mut r = PacketReader::new(&buf);
        assert_eq!(Pong::parse(&mut r).unwrap().sequence, 7);
    }

    #[test]
    fn test_empty_pong_fails() {
        let buf = [];
        let mut r = PacketReader::new(&buf);
        assert!(Pong::parse(&mut r).is_err());
    }
}
