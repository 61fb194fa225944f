use crate::error::Result;
use crate::reader::PacketReader;

/// Server clock plus per-slot timestamps for server-side account data
/// (UI config, macros and so on). The client only needs them to decide
/// whether a cached copy is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountDataTimes {
    pub server_time: u32,
    pub cache_times: [u32; 8],
}

impl AccountDataTimes {
    pub fn parse(r: &mut PacketReader<'_>) -> Result<Self> {
        let server_time = r.read_u32()?;
        let _activity = r.read_u8()?;
        let mut cache_times = [0u32; 8];
        for slot in cache_times.iter_mut() {
            *slot = r.read_u32()?;
        }
        Ok(AccountDataTimes {
            server_time,
            cache_times,
        })
    }
}

/// Message-of-the-day lines shown at login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Motd {
    pub lines: Vec<String>,
}

impl Motd {
    pub fn parse(r: &mut PacketReader<'_>) -> Result<Self> {
        let count = r.read_u32()?;
        let mut lines = Vec::new();
        for _ in 0..count {
            // A short payload ends the list rather than yielding empties.
            if r.is_empty() {
                break;
            }
            lines.push(r.read_cstring()?);
        }
        Ok(Motd { lines })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::PacketWriter;

    #[test]
    fn test_account_data_times_reads_all_slots() {
        let mut w = PacketWriter::new();
        w.write_u32(1_700_000_000);
        w.write_u8(1);
        for i in 0..8u32 {
            w.write_u32(i * 100);
        }

        let buf = w.into_inner();
        let mut r = PacketReader::new(&buf);
        let times = AccountDataTimes::parse(&mut r).unwrap();
        assert_eq!(times.server_time, 1_700_000_000);
        assert_eq!(times.cache_times[3], 300);
        assert!(r.is_empty());
    }

    #[test]
    fn test_undersized_account_data_times_fails() {
        let buf = [0u8; 36];
        let mut r = PacketReader::new(&buf);
        assert!(AccountDataTimes::parse(&mut r).is_err());
    }

    #[test]
    fn test_motd_reads_each_line() {
        let mut w = PacketWriter::new();
        w.write_u32(2);
        w.write_cstring("Welcome.");
        w.write_cstring("Be kind.");

        let buf = w.into_inner();
        let mut r = PacketReader::new(&buf);
        let motd = Motd::parse(&mut r).unwrap();
        assert_eq!(motd.lines, vec!["Welcome.".to_string(), "Be kind.".to_string()]);
    }

    #[test]
    fn test_motd_ignores_excess_count() {
        let mut w = PacketWriter::new();
        w.write_u32(50);
        w.write_cstring("only line");

        let buf = w.into_inner();
        let mut r = PacketReader::new(&buf);
        let motd = Motd::parse(&mut r).unwrap();
        assert_eq!(motd.lines.len(), 1);
    }
}
