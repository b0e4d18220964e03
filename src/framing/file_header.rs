use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

use crate::framing::framing_error::FramingError;

/// Magic bytes opening a file header packet.
pub const FILE_HEADER_MAGIC: &[u8; 3] = b"HDR";

/// Payload category announced ahead of a binary transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Image,
    Text,
    Binary,
}

impl FileType {
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Image => 1,
            Self::Text => 2,
            Self::Binary => 3,
        }
    }

    pub fn from_u8(code: u8) -> Result<Self, FramingError> {
        match code {
            1 => Ok(Self::Image),
            2 => Ok(Self::Text),
            3 => Ok(Self::Binary),
            other => Err(FramingError::UnknownFileType(other)),
        }
    }
}

/// Header packet sent before the data chunks of a binary file transfer.
///
/// Wire format: `"HDR" || total_packets(u16 BE) || file_type(u8) ||
/// compression_flag(u8)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub total_packets: u16,
    pub file_type: FileType,
    pub compressed: bool,
}

impl FileHeader {
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(7);
        buf.extend_from_slice(FILE_HEADER_MAGIC);
        // Writes into a Vec cannot fail.
        let _ = buf.write_u16::<BigEndian>(self.total_packets);
        let _ = buf.write_u8(self.file_type.as_u8());
        let _ = buf.write_u8(u8::from(self.compressed));
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self, FramingError> {
        if data.len() < 7 {
            return Err(FramingError::HeaderTooShort(data.len()));
        }
        if &data[..3] != FILE_HEADER_MAGIC {
            return Err(FramingError::BadMagic);
        }
        let mut cursor = Cursor::new(&data[3..]);
        let total_packets = cursor
            .read_u16::<BigEndian>()
            .map_err(|_| FramingError::HeaderTooShort(data.len()))?;
        let file_type = FileType::from_u8(
            cursor
                .read_u8()
                .map_err(|_| FramingError::HeaderTooShort(data.len()))?,
        )?;
        let compressed = cursor
            .read_u8()
            .map_err(|_| FramingError::HeaderTooShort(data.len()))?
            != 0;
        Ok(Self {
            total_packets,
            file_type,
            compressed,
        })
    }

    /// Whether a received packet looks like a file header.
    #[must_use]
    pub fn matches(data: &[u8]) -> bool {
        data.len() >= 3 && &data[..3] == FILE_HEADER_MAGIC
    }
}
