//! Integer codec: the minimal-width argument encoding shared by every header.

use crate::cursor::Cursor;
use crate::error::{CborError, Result};
use crate::{MAJOR_NEGATIVE, MAJOR_UNSIGNED};

/// An encoded leading byte plus up to eight big-endian argument bytes.
#[derive(Debug, Clone, Copy)]
pub struct Header {
    buf: [u8; 9],
    len: usize,
}

impl Header {
    /// Builds the header for `major` with the smallest argument width holding `value`.
    pub fn new(major: u8, value: u64) -> Self {
        let mut buf = [0u8; 9];
        let len = if value < 24 {
            buf[0] = (major << 5) | value as u8;
            1
        } else if value <= u8::MAX as u64 {
            buf[0] = (major << 5) | 24;
            buf[1] = value as u8;
            2
        } else if value <= u16::MAX as u64 {
            buf[0] = (major << 5) | 25;
            buf[1..3].copy_from_slice(&(value as u16).to_be_bytes());
            3
        } else if value <= u32::MAX as u64 {
            buf[0] = (major << 5) | 26;
            buf[1..5].copy_from_slice(&(value as u32).to_be_bytes());
            5
        } else {
            buf[0] = (major << 5) | 27;
            buf[1..9].copy_from_slice(&value.to_be_bytes());
            9
        };
        Header { buf, len }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

/// Encodes an unsigned integer (major type 0).
pub fn encode_unsigned(value: u64) -> Vec<u8> {
    Header::new(MAJOR_UNSIGNED, value).as_bytes().to_vec()
}

/// Encodes a signed integer; negative values use major type 1 with `-1 - value`.
pub fn encode_signed(value: i64) -> Vec<u8> {
    if value >= 0 {
        encode_unsigned(value as u64)
    } else {
        // -1 - value is in 0..=i64::MAX for every negative value
        Header::new(MAJOR_NEGATIVE, (-1 - value) as u64)
            .as_bytes()
            .to_vec()
    }
}

/// Reads the argument selected by `info` (the low five bits of the leading byte).
///
/// Values 28-31 are rejected; callers handling indefinite lengths must check
/// for 31 before calling.
pub fn decode_unsigned(info: u8, cursor: &mut Cursor<'_>) -> Result<u64> {
    Ok(match info {
        0..=23 => info as u64,
        24 => cursor.read_u8()? as u64,
        25 => u16::from_be_bytes(cursor.read_array()?) as u64,
        26 => u32::from_be_bytes(cursor.read_array()?) as u64,
        27 => u64::from_be_bytes(cursor.read_array()?),
        _ => return Err(CborError::InvalidAdditionalInfo(info)),
    })
}

/// Reads a major type 1 argument and maps it to `-1 - n`.
pub fn decode_signed(info: u8, cursor: &mut Cursor<'_>) -> Result<i64> {
    let n = decode_unsigned(info, cursor)?;
    if n > i64::MAX as u64 {
        return Err(CborError::IntegerOverflow(n));
    }
    Ok(-1 - n as i64)
}
