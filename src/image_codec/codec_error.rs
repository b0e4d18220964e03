use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum CodecError {
    /// Quantization depth outside 1..=7 bits.
    InvalidBitDepth(u8),
    /// Pixel buffer length does not match width * height.
    DimensionMismatch { expected: usize, actual: usize },
    /// Text-path payload was not a hexadecimal string.
    InvalidHex,
    /// zlib compression failed.
    Compress(String),
    /// zlib decompression failed.
    Decompress(String),
    /// Decompressed data yields fewer quantized values than width * height.
    PixelShortfall { expected: usize, actual: usize },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBitDepth(d) => write!(f, "bit depth {d} outside 1..=7"),
            Self::DimensionMismatch { expected, actual } => {
                write!(f, "pixel buffer holds {actual} samples, expected {expected}")
            }
            Self::InvalidHex => write!(f, "invalid hex data received"),
            Self::Compress(e) => write!(f, "compression failed: {e}"),
            Self::Decompress(e) => write!(f, "decompression failed: {e}"),
            Self::PixelShortfall { expected, actual } => {
                write!(f, "decoded {actual} pixels, expected {expected}")
            }
        }
    }
}

impl std::error::Error for CodecError {}
