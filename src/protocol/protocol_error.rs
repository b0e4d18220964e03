use std::fmt;

use crate::framing::FramingError;
use crate::image_codec::CodecError;
use crate::link::LinkError;

#[derive(Debug)]
pub enum ProtocolError {
    /// Malformed command or missing arguments; carries the usage line.
    Usage(&'static str),
    /// An argument parsed but is out of range or meaningless.
    InvalidArgument(String),
    Link(LinkError),
    Framing(FramingError),
    Codec(CodecError),
    /// Failure inside a handler's collaborator (actuator, frame source).
    Handler(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage(u) => write!(f, "usage: {u}"),
            Self::InvalidArgument(e) => write!(f, "{e}"),
            Self::Link(e) => write!(f, "{e}"),
            Self::Framing(e) => write!(f, "{e}"),
            Self::Codec(e) => write!(f, "{e}"),
            Self::Handler(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<LinkError> for ProtocolError {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

impl From<FramingError> for ProtocolError {
    fn from(e: FramingError) -> Self {
        Self::Framing(e)
    }
}

impl From<CodecError> for ProtocolError {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}
