//! Collaborator seams for hardware the protocol drives but does not own.

use std::sync::Arc;

use crate::image_codec::{CodecError, Raster};
use crate::log::log_sink::LogSink;
use crate::sink_info;

/// Motor/GPIO actuation. The real driver lives outside this crate; the
/// protocol only relays intents.
pub trait Actuator: Send {
    fn drive(&mut self, direction: &str, distance: i32) -> Result<(), String>;
    fn led(&mut self, on: bool) -> Result<(), String>;
    fn stop(&mut self) -> Result<(), String>;
}

/// Actuator that only records intents to the log. Default on a rover with
/// no motors wired up.
pub struct LogActuator {
    log_sink: Arc<dyn LogSink>,
}

impl LogActuator {
    #[must_use]
    pub fn new(log_sink: Arc<dyn LogSink>) -> Self {
        Self { log_sink }
    }
}

impl Actuator for LogActuator {
    fn drive(&mut self, direction: &str, distance: i32) -> Result<(), String> {
        sink_info!(self.log_sink, "[ACTUATOR] drive {direction} for {distance} units");
        Ok(())
    }

    fn led(&mut self, on: bool) -> Result<(), String> {
        sink_info!(self.log_sink, "[ACTUATOR] led {}", if on { "on" } else { "off" });
        Ok(())
    }

    fn stop(&mut self) -> Result<(), String> {
        sink_info!(self.log_sink, "[ACTUATOR] stop");
        Ok(())
    }
}

/// Source of grayscale frames for the IMAGE command. Camera capture is an
/// external collaborator; this seam is all the protocol sees.
pub trait FrameSource: Send {
    fn capture(&mut self) -> Result<Raster, CodecError>;
}

/// Synthetic diagonal gradient, for rovers without a camera attached and
/// for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct GradientSource {
    pub width: u32,
    pub height: u32,
}

impl GradientSource {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl FrameSource for GradientSource {
    fn capture(&mut self) -> Result<Raster, CodecError> {
        let (w, h) = (self.width.max(1), self.height.max(1));
        let span = (w + h).saturating_sub(2).max(1);
        let pixels: Vec<u8> = (0..h)
            .flat_map(|y| (0..w).map(move |x| (((x + y) * 255) / span) as u8))
            .collect();
        Raster::new(w, h, pixels)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn gradient_spans_full_range() {
        let mut src = GradientSource::new(64, 64);
        let frame = src.capture().unwrap();
        assert_eq!(frame.pixels()[0], 0);
        assert_eq!(*frame.pixels().last().unwrap(), 255);
    }
}
