use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum FramingError {
    /// Prefix/header overhead leaves no room for payload bytes.
    PacketTooSmall {
        max_packet_size: usize,
        overhead: usize,
    },
    /// The payload needs more chunks than a u16 total can describe.
    TooManyChunks(usize),
    /// A binary packet shorter than its 4-byte header.
    HeaderTooShort(usize),
    /// Packets of one message disagree on the total count.
    TotalMismatch { expected: u16, actual: u16 },
    /// The same sequence number appeared twice during reassembly.
    DuplicateChunk(u16),
    /// A sequence number in 1..=total never arrived.
    MissingChunk(u16),
    /// File header packet without the "HDR" magic.
    BadMagic,
    /// File header carried an unassigned file-type code.
    UnknownFileType(u8),
}

impl fmt::Display for FramingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PacketTooSmall {
                max_packet_size,
                overhead,
            } => write!(
                f,
                "packet size {max_packet_size} leaves no payload after {overhead} overhead bytes"
            ),
            Self::TooManyChunks(n) => write!(f, "payload needs {n} chunks, exceeding u16 total"),
            Self::HeaderTooShort(n) => write!(f, "binary packet of {n} bytes is shorter than its header"),
            Self::TotalMismatch { expected, actual } => {
                write!(f, "chunk total mismatch: expected {expected}, got {actual}")
            }
            Self::DuplicateChunk(seq) => write!(f, "duplicate chunk seq {seq}"),
            Self::MissingChunk(seq) => write!(f, "missing chunk seq {seq}"),
            Self::BadMagic => write!(f, "file header missing HDR magic"),
            Self::UnknownFileType(t) => write!(f, "unknown file type code {t}"),
        }
    }
}

impl std::error::Error for FramingError {}
