//! # Length-Prefixed Strings
//!
//! Names and error messages travel as `[u16 byteLen][modified UTF-8 bytes]`,
//! the same layout produced by a standard data-stream `writeUTF`.
//!
//! Modified UTF-8 differs from UTF-8 in two places: NUL is written as the
//! two-byte sequence `C0 80`, and supplementary characters are written as two
//! three-byte encoded surrogates instead of one four-byte sequence.

use crate::error::{constants, Result, RpcError};
use bytes::{Buf, BufMut};

/// Size of the length prefix
pub const UTF_PREFIX_SIZE: u64 = 2;

/// Largest encoded body a length prefix can describe
pub const MAX_UTF_BYTES: usize = u16::MAX as usize;

#[inline]
fn unit_size(unit: u16) -> usize {
    match unit {
        0x0001..=0x007F => 1,
        0x0000 | 0x0080..=0x07FF => 2,
        _ => 3,
    }
}

/// Encoded body length of `s`, without the prefix
pub fn utf_body_len(s: &str) -> usize {
    s.encode_utf16().map(unit_size).sum()
}

/// Exact encoded size of `s`, including the 2-byte prefix
pub fn utf_size(s: &str) -> u64 {
    UTF_PREFIX_SIZE + utf_body_len(s) as u64
}

/// Check that `s` fits the 16-bit length prefix
pub fn check_utf(s: &str) -> Result<()> {
    let len = utf_body_len(s);
    if len > MAX_UTF_BYTES {
        return Err(RpcError::Validation(format!(
            "{} ({len} bytes)",
            constants::ERR_STRING_TOO_LONG
        )));
    }
    Ok(())
}

/// Write `s` as a length-prefixed modified UTF-8 string
pub fn put_utf<B: BufMut>(buf: &mut B, s: &str) -> Result<()> {
    check_utf(s)?;
    buf.put_u16(utf_body_len(s) as u16);

    for unit in s.encode_utf16() {
        match unit_size(unit) {
            1 => buf.put_u8(unit as u8),
            2 => {
                buf.put_u8(0xC0 | ((unit >> 6) & 0x1F) as u8);
                buf.put_u8(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                buf.put_u8(0xE0 | ((unit >> 12) & 0x0F) as u8);
                buf.put_u8(0x80 | ((unit >> 6) & 0x3F) as u8);
                buf.put_u8(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    Ok(())
}

/// Read a length-prefixed modified UTF-8 string
pub fn get_utf<B: Buf>(buf: &mut B) -> Result<String> {
    if buf.remaining() < UTF_PREFIX_SIZE as usize {
        return Err(RpcError::malformed(constants::ERR_TRUNCATED_STRING));
    }
    let len = buf.get_u16() as usize;
    if buf.remaining() < len {
        return Err(RpcError::malformed(format!(
            "{}: need {len} bytes, {} remaining",
            constants::ERR_TRUNCATED_STRING,
            buf.remaining()
        )));
    }

    let mut bytes = vec![0u8; len];
    buf.copy_to_slice(&mut bytes);

    let mut units = Vec::with_capacity(len);
    let mut i = 0;
    while i < len {
        let b = bytes[i];
        if b < 0x80 {
            units.push(b as u16);
            i += 1;
        } else if b >> 5 == 0b110 {
            let b2 = continuation(&bytes, i + 1)?;
            units.push((((b & 0x1F) as u16) << 6) | b2);
            i += 2;
        } else if b >> 4 == 0b1110 {
            let b2 = continuation(&bytes, i + 1)?;
            let b3 = continuation(&bytes, i + 2)?;
            units.push((((b & 0x0F) as u16) << 12) | (b2 << 6) | b3);
            i += 3;
        } else {
            return Err(RpcError::malformed(format!(
                "Invalid UTF lead byte 0x{b:02X} at offset {i}"
            )));
        }
    }

    String::from_utf16(&units).map_err(|e| RpcError::malformed(format!("Invalid UTF string: {e}")))
}

fn continuation(bytes: &[u8], at: usize) -> Result<u16> {
    match bytes.get(at) {
        Some(&b) if b & 0xC0 == 0x80 => Ok((b & 0x3F) as u16),
        Some(&b) => Err(RpcError::malformed(format!(
            "Invalid UTF continuation byte 0x{b:02X} at offset {at}"
        ))),
        None => Err(RpcError::malformed(constants::ERR_TRUNCATED_STRING)),
    }
}
