//! Bitmask field-diff codec.
//!
//! A diff starts with a block count `n`, then `n` 32-bit mask words, then one
//! 32-bit value per set mask bit in bit order. Bit `b` of word `w` addresses
//! field index `w * 32 + b`. Unchanged fields are simply absent from the mask.

use std::collections::BTreeMap;

use crate::error::{ProtocolError, Result};
use crate::reader::PacketReader;
use crate::writer::PacketWriter;

/// Highest field index a u8 block count can address (255 words of 32 bits).
pub const MAX_FIELD_INDEX: u16 = 255 * 32 - 1;

/// Decode a field diff into (index, value) pairs in ascending index order.
pub fn read_field_diff(r: &mut PacketReader<'_>) -> Result<Vec<(u16, u32)>> {
    let block_count = r.read_u8()? as usize;
    if block_count == 0 {
        return Ok(Vec::new());
    }

    let mut mask = Vec::with_capacity(block_count);
    for _ in 0..block_count {
        mask.push(r.read_u32()?);
    }

    let mut fields = Vec::new();
    for (word, &bits) in mask.iter().enumerate() {
        for bit in 0..32 {
            if bits & (1 << bit) != 0 {
                let index = (word * 32 + bit) as u16;
                let value = r.read_u32()?;
                fields.push((index, value));
            }
        }
    }
    Ok(fields)
}

/// Encode (index, value) pairs as a field diff. Input order does not matter;
/// duplicate indices keep the last value. Fails if an index cannot be
/// addressed by the u8 block count.
pub fn write_field_diff(w: &mut PacketWriter, fields: &[(u16, u32)]) -> Result<()> {
    let mut ordered = BTreeMap::new();
    for &(index, value) in fields {
        if index > MAX_FIELD_INDEX {
            return Err(ProtocolError::BadFieldCount(index as usize));
        }
        ordered.insert(index, value);
    }

    let block_count = match ordered.keys().next_back() {
        Some(&max) => max as usize / 32 + 1,
        None => 0,
    };
    w.write_u8(block_count as u8);

    let mut mask = vec![0u32; block_count];
    for &index in ordered.keys() {
        mask[index as usize / 32] |= 1 << (index % 32);
    }
    for word in &mask {
        w.write_u32(*word);
    }
    for value in ordered.values() {
        w.write_u32(*value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_diff_is_one_byte() {
        let mut w = PacketWriter::new();
        write_field_diff(&mut w, &[]).unwrap();
        assert_eq!(w.as_slice(), &[0x00]);

        let buf = w.into_inner();
        let mut r = PacketReader::new(&buf);
        assert!(read_field_diff(&mut r).unwrap().is_empty());
    }

    #[test]
    fn test_sparse_fields_round_trip() {
        let fields = [(3u16, 0xAAu32), (95, 0xCC), (64, 0xBB)];
        let mut w = PacketWriter::new();
        write_field_diff(&mut w, &fields).unwrap();

        let buf = w.into_inner();
        // 3 mask words cover index 95
        assert_eq!(buf[0], 3);

        let mut r = PacketReader::new(&buf);
        let decoded = read_field_diff(&mut r).unwrap();
        assert_eq!(decoded, vec![(3, 0xAA), (64, 0xBB), (95, 0xCC)]);
        assert!(r.is_empty());
    }

    #[test]
    fn test_values_follow_mask_bit_order() {
        // word 0 = bits 1 and 4 set, values in bit order
        let mut w = PacketWriter::new();
        w.write_u8(1);
        w.write_u32(0b1_0010);
        w.write_u32(111);
        w.write_u32(444);

        let buf = w.into_inner();
        let mut r = PacketReader::new(&buf);
        let decoded = read_field_diff(&mut r).unwrap();
        assert_eq!(decoded, vec![(1, 111), (4, 444)]);
    }

    #[test]
    fn test_unaddressable_index_is_rejected() {
        let mut w = PacketWriter::new();
        let err = write_field_diff(&mut w, &[(MAX_FIELD_INDEX + 1, 1)]).unwrap_err();
        assert!(matches!(err, ProtocolError::BadFieldCount(_)));
    }

    #[test]
    fn test_truncated_values_fail() {
        let mut w = PacketWriter::new();
        w.write_u8(1);
        w.write_u32(0b11); // two values promised
        w.write_u32(7); // only one present

        let buf = w.into_inner();
        let mut r = PacketReader::new(&buf);
        assert!(read_field_diff(&mut r).is_err());
    }
}
