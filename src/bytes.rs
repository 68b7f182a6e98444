//! Low-level helpers for fixed-width integers laid out as bytes.
//!
//! Widths are 1 to 8 bytes; values travel as `i128` so that the full `u64` and
//! `i64` ranges can be checked against a width before anything is written.

use crate::settings::ByteOrder;

/// Inclusive `(min, max)` range of an integer stored in `size` bytes.
pub fn int_bounds(size: usize, signed: bool) -> (i128, i128) {
    let bits = size * 8;
    if signed {
        (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
    } else {
        (0, (1i128 << bits) - 1)
    }
}

/// Returns true if `value` is representable in `size` bytes.
pub fn fits(value: i128, size: usize, signed: bool) -> bool {
    let (min, max) = int_bounds(size, signed);
    (min..=max).contains(&value)
}

/// Appends the low `size` bytes of `value` (two's complement) in the given byte order.
pub fn write_int(value: i128, size: usize, order: ByteOrder, out: &mut Vec<u8>) {
    let le = (value as u128).to_le_bytes();
    let bytes = &le[..size];

    match order {
        ByteOrder::Little => out.extend_from_slice(bytes),
        ByteOrder::Big => out.extend(bytes.iter().rev()),
    }
}

/// Reads `data` (at most 8 bytes) as an unsigned integer in the given byte order.
pub fn read_uint(data: &[u8], order: ByteOrder) -> u64 {
    let mut value = 0u64;

    match order {
        ByteOrder::Big => {
            for byte in data {
                value = (value << 8) | *byte as u64;
            }
        }
        ByteOrder::Little => {
            for byte in data.iter().rev() {
                value = (value << 8) | *byte as u64;
            }
        }
    }

    value
}

/// Sign-extends the low `bits` of `value` to a full `i64`.
pub fn sign_extend(value: u64, bits: usize) -> i64 {
    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_bounds() {
        assert_eq!(int_bounds(1, false), (0, 255));
        assert_eq!(int_bounds(1, true), (-128, 127));
        assert_eq!(int_bounds(8, false), (0, u64::MAX as i128));
        assert_eq!(int_bounds(8, true), (i64::MIN as i128, i64::MAX as i128));
    }

    #[test]
    fn test_fits() {
        assert!(fits(0xFFFF, 2, false));
        assert!(!fits(0x10000, 2, false));
        assert!(!fits(-1, 4, false));
        assert!(fits(-1, 4, true));
    }

    #[test]
    fn test_write_int() {
        let mut out = Vec::new();
        write_int(0xCAFE, 2, ByteOrder::Little, &mut out);
        write_int(0xCAFE, 2, ByteOrder::Big, &mut out);
        assert_eq!(out, vec![0xFE, 0xCA, 0xCA, 0xFE]);
    }

    #[test]
    fn test_write_negative() {
        let mut out = Vec::new();
        write_int(-2, 2, ByteOrder::Big, &mut out);
        assert_eq!(out, vec![0xFF, 0xFE]);
    }

    #[test]
    fn test_read_uint() {
        assert_eq!(read_uint(&[0xEF, 0xBE, 0xAD, 0xDE], ByteOrder::Little), 0xDEADBEEF);
        assert_eq!(read_uint(&[0xDE, 0xAD, 0xBE, 0xEF], ByteOrder::Big), 0xDEADBEEF);
    }

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(0b11111111, 8), -1);
        assert_eq!(sign_extend(0xFFFE, 16), -2);
        assert_eq!(sign_extend(u64::MAX, 64), -1);
    }
}
