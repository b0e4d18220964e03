use std::fmt;

#[derive(Debug)]
pub enum LinkError {
    /// The peer end of the link is gone.
    Closed,
    /// Driver-level failure while sending or receiving.
    Io(String),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "link closed"),
            Self::Io(e) => write!(f, "link I/O error: {e}"),
        }
    }
}

impl std::error::Error for LinkError {}
