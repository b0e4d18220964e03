use std::time::Duration;

/// Reserved message-boundary marker. Sent as its own packet, never chunked;
/// payload content never collides with it because framed text chunks always
/// carry a prefix and binary chunks a header.
pub const END_OF_STREAM: &[u8] = b"END_OF_STREAM";

/// How long the rover waits for a command packet per loop turn.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(2);

/// Max wait between packets of one response on the station side.
pub const DEFAULT_INTER_PACKET_TIMEOUT: Duration = Duration::from_millis(500);

/// Absolute ceiling on one response stream, sentinel or not.
pub const DEFAULT_RECEIVE_CEILING: Duration = Duration::from_secs(5);
