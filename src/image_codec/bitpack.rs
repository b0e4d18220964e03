//! MSB-first packing of sub-byte quantized values into a contiguous byte
//! stream, and the inverse.

use crate::image_codec::codec_error::CodecError;
use crate::image_codec::quantize::check_bit_depth;

/// Packs `bit_depth`-wide values MSB-first, zero-padding only the final
/// byte.
pub fn pack(values: &[u8], bit_depth: u8) -> Result<Vec<u8>, CodecError> {
    check_bit_depth(bit_depth)?;
    let bit_depth = u32::from(bit_depth);

    let mut out = Vec::with_capacity((values.len() * bit_depth as usize).div_ceil(8));
    let mut buffer: u32 = 0;
    let mut bits_filled: u32 = 0;

    for &val in values {
        buffer = (buffer << bit_depth) | u32::from(val);
        bits_filled += bit_depth;

        while bits_filled >= 8 {
            bits_filled -= 8;
            out.push(((buffer >> bits_filled) & 0xFF) as u8);
        }
        buffer &= (1 << bits_filled) - 1;
    }

    if bits_filled > 0 {
        buffer <<= 8 - bits_filled;
        out.push((buffer & 0xFF) as u8);
    }

    Ok(out)
}

/// Unpacks exactly `count` values, discarding trailing pad bits.
///
/// # Errors
///
/// [`CodecError::PixelShortfall`] when the stream carries fewer than
/// `count` values.
pub fn unpack(data: &[u8], bit_depth: u8, count: usize) -> Result<Vec<u8>, CodecError> {
    check_bit_depth(bit_depth)?;
    let bit_depth = u32::from(bit_depth);
    let mask: u32 = (1 << bit_depth) - 1;

    let mut out = Vec::with_capacity(count);
    let mut buffer: u32 = 0;
    let mut bits_in_buffer: u32 = 0;

    for &byte in data {
        buffer = (buffer << 8) | u32::from(byte);
        bits_in_buffer += 8;

        while bits_in_buffer >= bit_depth && out.len() < count {
            bits_in_buffer -= bit_depth;
            out.push(((buffer >> bits_in_buffer) & mask) as u8);
        }
        buffer &= (1 << bits_in_buffer) - 1;

        if out.len() == count {
            break;
        }
    }

    if out.len() < count {
        return Err(CodecError::PixelShortfall {
            expected: count,
            actual: out.len(),
        });
    }
    Ok(out)
}
