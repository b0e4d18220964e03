use std::path::PathBuf;

/// What the background reader reports to the foreground console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationEvent {
    /// A text status line from the remote unit.
    StatusLine(String),
    /// Undecodable bytes appeared; a binary transfer is being collected.
    TransferStarted,
    /// A finalized transfer decoded and was written to disk.
    ImageSaved(PathBuf),
    /// A finalized transfer could not be decoded; nothing was persisted.
    TransferFailed(String),
}
