use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::image_codec::ImageCodec;
use crate::log::log_sink::LogSink;
use crate::station::station_error::StationError;
use crate::{sink_error, sink_info};

/// Turns a finalized transfer blob back into a grayscale PNG on disk.
///
/// The blob is expected to be the hex-encoded, zlib-compressed, bit-packed
/// form the rover's IMAGE command emits. A failed decode abandons the
/// reconstruction and persists nothing.
pub struct Reconstructor {
    codec: ImageCodec,
    output_path: PathBuf,
    log_sink: Arc<dyn LogSink>,
}

impl Reconstructor {
    #[must_use]
    pub fn new(codec: ImageCodec, output_path: impl Into<PathBuf>, log_sink: Arc<dyn LogSink>) -> Self {
        Self {
            codec,
            output_path: output_path.into(),
            log_sink,
        }
    }

    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn reconstruct(&self, blob: &[u8]) -> Result<PathBuf, StationError> {
        let raster = match self.codec.decode_hex(blob) {
            Ok(raster) => raster,
            Err(e) => {
                sink_error!(self.log_sink, "[RECONSTRUCT] failed to reconstruct image: {e}");
                return Err(e.into());
            }
        };

        raster
            .to_gray_image()
            .save(&self.output_path)
            .map_err(|e| StationError::Persist(e.to_string()))?;
        sink_info!(
            self.log_sink,
            "[RECONSTRUCT] image reconstruction complete, saved to {:?}",
            self.output_path
        );
        Ok(self.output_path.clone())
    }
}
