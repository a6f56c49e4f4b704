//! Big-endian, densely packed, bounds-checked reads and writes into a
//! wire buffer. Unlike [`crate::host`], there is no alignment on this
//! side: every value sits directly after the previous one.

/// Read `width` (1, 2, 4, or 8) bytes at `pos` as a big-endian
/// unsigned integer, widened to `u64`.
pub(crate) fn read_be(buf: &[u8], pos: usize, width: usize) -> Option<u64> {
    let end = pos.checked_add(width)?;
    let bytes = buf.get(pos..end)?;
    Some(match width {
        1 => bytes[0] as u64,
        2 => u16::from_be_bytes(bytes.try_into().unwrap()) as u64,
        4 => u32::from_be_bytes(bytes.try_into().unwrap()) as u64,
        8 => u64::from_be_bytes(bytes.try_into().unwrap()),
        _ => unreachable!("wire primitive widths are 1, 2, 4, or 8"),
    })
}

/// Write the low `width` bytes of `value` at `pos` in big-endian byte
/// order.
pub(crate) fn write_be(buf: &mut [u8], pos: usize, width: usize, value: u64) -> Option<()> {
    let end = pos.checked_add(width)?;
    let slice = buf.get_mut(pos..end)?;
    match width {
        1 => slice[0] = value as u8,
        2 => slice.copy_from_slice(&(value as u16).to_be_bytes()),
        4 => slice.copy_from_slice(&(value as u32).to_be_bytes()),
        8 => slice.copy_from_slice(&value.to_be_bytes()),
        _ => unreachable!("wire primitive widths are 1, 2, 4, or 8"),
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_big_endian() {
        let mut buf = [0u8; 4];
        write_be(&mut buf, 0, 4, 0x1234_5678).unwrap();
        assert_eq!(buf, [0x12, 0x34, 0x56, 0x78]);
        assert_eq!(read_be(&buf, 0, 4).unwrap(), 0x1234_5678);
    }

    #[test]
    fn out_of_range_is_none() {
        let buf = [0u8; 2];
        assert!(write_be(&mut [0u8; 1], 0, 2, 0).is_none());
        assert!(read_be(&buf, 1, 2).is_none());
    }
}
