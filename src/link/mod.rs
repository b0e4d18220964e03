pub mod link_error;
pub mod radio;
pub mod stream;

pub use link_error::LinkError;
pub use radio::{LoopbackRadio, RadioLink};
pub use stream::{ByteStream, ChannelByteStream, StreamWriter};
