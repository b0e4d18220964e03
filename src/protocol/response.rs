use bytes::Bytes;

/// What a handler hands back for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Status text, chunk-framed per the session's current settings.
    Text(String),
    /// Text-safe bulk payload (e.g. a hex-encoded image): split into
    /// bounded chunks with no prefix, so the receiver sees the bytes
    /// verbatim.
    Blob(Vec<u8>),
    /// Binary bulk payload: a file header packet followed by
    /// seq/total-framed chunks.
    Binary(Vec<u8>),
    /// Replayed verbatim: no framing, no history append.
    Raw(Bytes),
}

impl Response {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }
}
