//! Grayscale quantization with Floyd-Steinberg error diffusion.
//!
//! At the bit depths the link budget forces (commonly 4 bits for 64x64 to
//! 128x128 rasters) straight quantization bands badly; diffusing the
//! residual into unvisited neighbors trades banding for noise the eye
//! tolerates.

use crate::image_codec::codec_error::CodecError;
use crate::image_codec::raster::Raster;

/// Largest representable sample value for a given depth.
#[inline]
#[must_use]
pub fn max_level(bit_depth: u8) -> u16 {
    (1u16 << bit_depth) - 1
}

/// Reconstruction step between adjacent quantized levels.
#[inline]
#[must_use]
pub fn level_scale(bit_depth: u8) -> u16 {
    255 / max_level(bit_depth)
}

pub fn check_bit_depth(bit_depth: u8) -> Result<(), CodecError> {
    if (1..=7).contains(&bit_depth) {
        Ok(())
    } else {
        Err(CodecError::InvalidBitDepth(bit_depth))
    }
}

/// Quantizes each sample to `bit_depth` levels, diffusing the residual
/// error with the Floyd-Steinberg kernel: 7/16 right, 3/16 lower-left,
/// 5/16 below, 1/16 lower-right. Neighbor updates clip to [0, 255].
///
/// Returns the quantized values (0..=`max_level`), row-major.
pub fn quantize_with_dithering(raster: &Raster, bit_depth: u8) -> Result<Vec<u8>, CodecError> {
    check_bit_depth(bit_depth)?;

    let width = raster.width() as usize;
    let height = raster.height() as usize;
    let max_val = i32::from(max_level(bit_depth));
    let scale = i32::from(level_scale(bit_depth));

    let mut work: Vec<i32> = raster.pixels().iter().map(|&p| i32::from(p)).collect();
    let mut quantized = vec![0u8; work.len()];

    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            let old = work[i].clamp(0, 255);
            // round(old * max_val / 255)
            let q = (2 * old * max_val + 255) / 510;
            let recon = q * scale;
            let error = old - recon;
            quantized[i] = q as u8;

            if x + 1 < width {
                diffuse(&mut work[i + 1], error * 7 / 16);
            }
            if y + 1 < height {
                if x > 0 {
                    diffuse(&mut work[i + width - 1], error * 3 / 16);
                }
                diffuse(&mut work[i + width], error * 5 / 16);
                if x + 1 < width {
                    diffuse(&mut work[i + width + 1], error / 16);
                }
            }
        }
    }

    Ok(quantized)
}

/// Quantizes without error diffusion. Used as the reference in accuracy
/// comparisons.
pub fn quantize_direct(raster: &Raster, bit_depth: u8) -> Result<Vec<u8>, CodecError> {
    check_bit_depth(bit_depth)?;
    let max_val = i32::from(max_level(bit_depth));
    Ok(raster
        .pixels()
        .iter()
        .map(|&p| ((2 * i32::from(p) * max_val + 255) / 510) as u8)
        .collect())
}

#[inline]
fn diffuse(target: &mut i32, amount: i32) {
    *target = (*target + amount).clamp(0, 255);
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn flat(width: u32, height: u32, value: u8) -> Raster {
        Raster::new(width, height, vec![value; (width * height) as usize]).unwrap()
    }

    #[test]
    fn rejects_out_of_range_depth() {
        let r = flat(2, 2, 128);
        assert!(matches!(
            quantize_with_dithering(&r, 0),
            Err(CodecError::InvalidBitDepth(0))
        ));
        assert!(matches!(
            quantize_with_dithering(&r, 8),
            Err(CodecError::InvalidBitDepth(8))
        ));
    }

    #[test]
    fn extremes_are_fixed_points() {
        for depth in 1..=7u8 {
            let black = quantize_with_dithering(&flat(4, 4, 0), depth).unwrap();
            assert!(black.iter().all(|&q| q == 0), "depth {depth}");
            let white = quantize_with_dithering(&flat(4, 4, 255), depth).unwrap();
            let max = max_level(depth) as u8;
            assert!(white.iter().all(|&q| q == max), "depth {depth}");
        }
    }

    #[test]
    fn values_stay_within_level_range() {
        let pixels: Vec<u8> = (0..64 * 64).map(|i| (i % 256) as u8).collect();
        let r = Raster::new(64, 64, pixels).unwrap();
        for depth in 1..=7u8 {
            let q = quantize_with_dithering(&r, depth).unwrap();
            let max = max_level(depth) as u8;
            assert!(q.iter().all(|&v| v <= max), "depth {depth}");
        }
    }

    #[test]
    fn dithering_preserves_mean_brightness() {
        // A mid-gray that sits between two 1-bit levels: plain quantization
        // slams every pixel to one side, dithering keeps the average close.
        let r = flat(32, 32, 100);
        let q = quantize_with_dithering(&r, 1).unwrap();
        let scale = level_scale(1) as u32; // 255
        let mean: f64 = q.iter().map(|&v| f64::from(u32::from(v) * scale)).sum::<f64>()
            / f64::from(32u32 * 32);
        assert!(
            (mean - 100.0).abs() < 10.0,
            "dithered mean {mean} strays from source brightness"
        );
    }

    #[test]
    fn direct_quantization_rounds_to_nearest_level() {
        let r = Raster::new(3, 1, vec![0, 128, 255]).unwrap();
        let q = quantize_direct(&r, 4).unwrap();
        // 128 * 15 / 255 = 7.53 -> 8
        assert_eq!(q, vec![0, 8, 15]);
    }
}
