//! Grayscale image -> compressed, bit-packed payload, and the inverse.
//!
//! Encode pipeline: grayscale + nearest-neighbor resize, Floyd-Steinberg
//! quantization, MSB-first bit-packing, zlib compression. The compressed
//! buffer is hex-encoded for the text transport path or framed with binary
//! seq/total headers for the packet path.
//!
//! Encode is lossy (quantization); pack/unpack of a fixed pixel count
//! round-trips exactly for any depth in 1..=7.

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use image::imageops::{self, FilterType};
use std::io::{Read, Write};

use crate::image_codec::bitpack;
use crate::image_codec::codec_error::CodecError;
use crate::image_codec::quantize::{self, check_bit_depth};
use crate::image_codec::raster::Raster;

pub const DEFAULT_BIT_DEPTH: u8 = 4;
pub const DEFAULT_IMAGE_SIZE: (u32, u32) = (128, 128);

/// Encoder/decoder for one (bit_depth, size) parameter set.
///
/// Both ends of the link must agree on the parameters; nothing about them
/// is carried in the payload itself.
#[derive(Debug, Clone, Copy)]
pub struct ImageCodec {
    bit_depth: u8,
    width: u32,
    height: u32,
}

impl ImageCodec {
    pub fn new(bit_depth: u8, size: (u32, u32)) -> Result<Self, CodecError> {
        check_bit_depth(bit_depth)?;
        Ok(Self {
            bit_depth,
            width: size.0,
            height: size.1,
        })
    }

    #[must_use]
    pub fn bit_depth(&self) -> u8 {
        self.bit_depth
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Full encode: resize, quantize with dithering, pack, compress.
    pub fn encode(&self, source: &Raster) -> Result<Vec<u8>, CodecError> {
        let resized = self.resize(source);
        let quantized = quantize::quantize_with_dithering(&resized, self.bit_depth)?;
        let packed = bitpack::pack(&quantized, self.bit_depth)?;
        compress(&packed)
    }

    /// Encode to the text-safe hexadecimal form used on the serial path.
    pub fn encode_hex(&self, source: &Raster) -> Result<String, CodecError> {
        Ok(to_hex(&self.encode(source)?))
    }

    /// Inverse of [`encode`](Self::encode): decompress, unpack exactly
    /// width * height values, rescale to 8-bit.
    pub fn decode(&self, compressed: &[u8]) -> Result<Raster, CodecError> {
        let packed = decompress(compressed)?;
        let count = (self.width as usize) * (self.height as usize);
        let quantized = bitpack::unpack(&packed, self.bit_depth, count)?;
        let scale = quantize::level_scale(self.bit_depth);
        let pixels: Vec<u8> = quantized
            .iter()
            .map(|&q| (u16::from(q) * scale).min(255) as u8)
            .collect();
        Raster::new(self.width, self.height, pixels)
    }

    /// Decode a hex blob exactly as received off the text path: surrounding
    /// ASCII whitespace is tolerated, anything non-hex is rejected.
    pub fn decode_hex(&self, blob: &[u8]) -> Result<Raster, CodecError> {
        let text = std::str::from_utf8(blob).map_err(|_| CodecError::InvalidHex)?;
        let compressed = from_hex(text.trim())?;
        self.decode(&compressed)
    }

    fn resize(&self, source: &Raster) -> Raster {
        if source.width() == self.width && source.height() == self.height {
            return source.clone();
        }
        let img = source.to_gray_image();
        let resized = imageops::resize(&img, self.width, self.height, FilterType::Nearest);
        Raster::from_gray_image(&resized)
    }
}

fn compress(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|()| encoder.finish())
        .map_err(|e| CodecError::Compress(e.to_string()))
}

fn decompress(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| CodecError::Decompress(e.to_string()))?;
    Ok(out)
}

/// Lowercase hex encoding of a byte buffer.
#[must_use]
pub fn to_hex(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for byte in data {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Strict inverse of [`to_hex`]; either case accepted.
pub fn from_hex(s: &str) -> Result<Vec<u8>, CodecError> {
    if s.is_empty() || !s.len().is_multiple_of(2) {
        return Err(CodecError::InvalidHex);
    }
    let mut out = Vec::with_capacity(s.len() / 2);
    let bytes = s.as_bytes();
    for pair in bytes.chunks(2) {
        let hi = hex_nibble(pair[0]).ok_or(CodecError::InvalidHex)?;
        let lo = hex_nibble(pair[1]).ok_or(CodecError::InvalidHex)?;
        out.push((hi << 4) | lo);
    }
    Ok(out)
}

#[inline]
fn hex_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}
