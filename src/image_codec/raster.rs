use image::{DynamicImage, GrayImage};

use crate::image_codec::codec_error::CodecError;

/// W x H grid of 8-bit grayscale samples, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, CodecError> {
        let expected = (width as usize) * (height as usize);
        if pixels.len() != expected {
            return Err(CodecError::DimensionMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Grayscale-converts an arbitrary decoded image.
    #[must_use]
    pub fn from_dynamic(img: &DynamicImage) -> Self {
        let gray = img.to_luma8();
        Self::from_gray_image(&gray)
    }

    #[must_use]
    pub fn from_gray_image(img: &GrayImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            pixels: img.as_raw().clone(),
        }
    }

    /// The same samples as an `image` buffer, for resizing or PNG output.
    #[must_use]
    pub fn to_gray_image(&self) -> GrayImage {
        // Construction is infallible: the length invariant is held by `new`.
        GrayImage::from_raw(self.width, self.height, self.pixels.clone())
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn new_enforces_dimensions() {
        assert!(Raster::new(2, 2, vec![0; 4]).is_ok());
        assert!(matches!(
            Raster::new(2, 2, vec![0; 5]),
            Err(CodecError::DimensionMismatch {
                expected: 4,
                actual: 5
            })
        ));
    }

    #[test]
    fn gray_image_conversion_roundtrips() {
        let r = Raster::new(3, 2, vec![0, 50, 100, 150, 200, 250]).unwrap();
        let img = r.to_gray_image();
        assert_eq!(Raster::from_gray_image(&img), r);
    }
}
