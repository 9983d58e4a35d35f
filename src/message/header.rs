/*
 * Fragment Header
 *
 * The 8-byte little-endian header every transport frame in the message
 * layer carries. Byte order is explicit rather than left to host order,
 * since frames may cross between machines with different native
 * endianness.
 */

use crate::config::MESSAGE_HEADER_LENGTH;

/// A decoded fragment header: type id, sequence number, total message
/// length, and this fragment's byte offset, at offsets 0/2/4/6.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FragmentHeader {
    pub type_id: u16,
    pub sequence: u16,
    pub length: u16,
    pub offset: u16,
}

impl FragmentHeader {
    /// Encode this header as the first `MESSAGE_HEADER_LENGTH` bytes of `buf`.
    pub fn encode(&self, buf: &mut [u8]) {
        buf[0..2].copy_from_slice(&self.type_id.to_le_bytes());
        buf[2..4].copy_from_slice(&self.sequence.to_le_bytes());
        buf[4..6].copy_from_slice(&self.length.to_le_bytes());
        buf[6..8].copy_from_slice(&self.offset.to_le_bytes());
    }

    /// Decode a header from `buf`. Returns `None` if `buf` is shorter than
    /// `MESSAGE_HEADER_LENGTH` (a malformed/truncated fragment).
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < MESSAGE_HEADER_LENGTH {
            return None;
        }
        Some(Self {
            type_id: u16::from_le_bytes([buf[0], buf[1]]),
            sequence: u16::from_le_bytes([buf[2], buf[3]]),
            length: u16::from_le_bytes([buf[4], buf[5]]),
            offset: u16::from_le_bytes([buf[6], buf[7]]),
        })
    }
}
