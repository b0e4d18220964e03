pub mod bitpack;
pub mod codec;
pub mod codec_error;
pub mod quantize;
pub mod raster;

pub use codec::{DEFAULT_BIT_DEPTH, DEFAULT_IMAGE_SIZE, ImageCodec, from_hex, to_hex};
pub use codec_error::CodecError;
pub use raster::Raster;
