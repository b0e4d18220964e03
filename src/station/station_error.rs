use std::fmt;

use crate::image_codec::CodecError;
use crate::link::LinkError;

#[derive(Debug)]
pub enum StationError {
    Codec(CodecError),
    Link(LinkError),
    /// Reconstructed image could not be written to disk.
    Persist(String),
}

impl fmt::Display for StationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(e) => write!(f, "{e}"),
            Self::Link(e) => write!(f, "{e}"),
            Self::Persist(e) => write!(f, "failed to persist image: {e}"),
        }
    }
}

impl std::error::Error for StationError {}

impl From<CodecError> for StationError {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

impl From<LinkError> for StationError {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}
