//! Bit-level reads of single octets.
//!
//! Bit 0 is the most significant bit:
//! ```text
//! 0xA5 = 1 0 1 0 0 1 0 1
//!  bit:  0 1 2 3 4 5 6 7
//! ```

use crate::error::{PacketError, Result};

/// Number of bits in an octet.
pub const BITS_PER_OCTET: usize = 8;

/// Return bit `bit_index` (0 = most significant) of `octet` as 0 or 1.
///
/// # Errors
///
/// Returns `IndexOutOfRange` if `bit_index >= 8`.
///
/// # Example
///
/// ```
/// use packet_stream::packet::bit_of;
///
/// assert_eq!(bit_of(0b1000_0000, 0).unwrap(), 1);
/// assert_eq!(bit_of(0b1000_0000, 7).unwrap(), 0);
/// ```
#[inline]
pub fn bit_of(octet: u8, bit_index: usize) -> Result<u8> {
    if bit_index >= BITS_PER_OCTET {
        return Err(PacketError::IndexOutOfRange {
            index: bit_index,
            len: BITS_PER_OCTET,
        });
    }
    Ok((octet >> (BITS_PER_OCTET - 1 - bit_index)) & 1)
}

/// All eight bits of `octet`, most significant first.
#[inline]
pub fn bits_of(octet: u8) -> [u8; BITS_PER_OCTET] {
    let mut bits = [0u8; BITS_PER_OCTET];
    for (i, bit) in bits.iter_mut().enumerate() {
        *bit = (octet >> (BITS_PER_OCTET - 1 - i)) & 1;
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_of_msb_first() {
        let octet = 0xA5; // 1010_0101
        let expected = [1, 0, 1, 0, 0, 1, 0, 1];
        for (i, want) in expected.iter().enumerate() {
            assert_eq!(bit_of(octet, i).unwrap(), *want, "bit {}", i);
        }
    }

    #[test]
    fn test_bit_of_out_of_range() {
        let err = bit_of(0xFF, 8).unwrap_err();
        assert!(matches!(
            err,
            PacketError::IndexOutOfRange { index: 8, len: 8 }
        ));
    }

    #[test]
    fn test_bits_of_matches_bit_of() {
        for octet in [0x00, 0x01, 0x80, 0x5A, 0xFF] {
            let bits = bits_of(octet);
            for (i, bit) in bits.iter().enumerate() {
                assert_eq!(*bit, bit_of(octet, i).unwrap());
            }
        }
    }
}
