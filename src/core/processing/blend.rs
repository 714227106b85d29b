use image::RgbImage;
use ndarray::{Array3, Zip};

use crate::error::{Error, Result};
use crate::io::codec::{array_to_rgb, rgb_to_array};

/// Blend one channel value: `a + alpha * (b - a)`, truncated and clamped to u8.
#[inline]
pub fn blend_value(a: u8, b: u8, alpha: f32) -> u8 {
    let v = a as f32 + alpha * (b as f32 - a as f32);
    if v <= 0.0 {
        0
    } else if v >= 255.0 {
        255
    } else {
        v as u8
    }
}

/// Element-wise alpha blend of two equally shaped arrays
pub fn blend_arrays(a: &Array3<u8>, b: &Array3<u8>, alpha: f32) -> Result<Array3<u8>> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(Error::invalid_arg("blend_alpha", alpha));
    }
    if a.dim() != b.dim() {
        return Err(Error::invalid_arg(
            "overlay",
            format!("shape {:?} does not match {:?}", b.dim(), a.dim()),
        ));
    }
    Ok(Zip::from(a)
        .and(b)
        .par_map_collect(|&x, &y| blend_value(x, y, alpha)))
}

pub fn blend_images(a: &RgbImage, b: &RgbImage, alpha: f32) -> Result<RgbImage> {
    if a.dimensions() != b.dimensions() {
        return Err(Error::invalid_arg(
            "overlay",
            format!("{:?} does not match {:?}", b.dimensions(), a.dimensions()),
        ));
    }
    let blended = blend_arrays(&rgb_to_array(a.clone())?, &rgb_to_array(b.clone())?, alpha)?;
    array_to_rgb(blended)
}
