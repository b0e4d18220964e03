pub mod file_header;
pub mod framer;
pub mod framing_error;
pub mod history;

pub use file_header::{FileHeader, FileType};
pub use framer::{PrefixPolicy, TransportFramer};
pub use framing_error::FramingError;
pub use history::{MAX_HISTORY, PacketHistory};
