use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::RgbImage;
use tracing::debug;

use crate::error::{Error, Result};

/// Resize an RGB image to exactly `target_cols` x `target_rows` with a Lanczos3 filter.
pub fn resize_rgb_image(img: &RgbImage, target_cols: u32, target_rows: u32) -> Result<RgbImage> {
    if target_cols == 0 || target_rows == 0 {
        return Err(Error::invalid_arg(
            "target_size",
            format!("{}x{}", target_cols, target_rows),
        ));
    }
    let (cols, rows) = img.dimensions();
    if (cols, rows) == (target_cols, target_rows) {
        return Ok(img.clone());
    }
    debug!(
        "Resizing {}x{} -> {}x{}",
        cols, rows, target_cols, target_rows
    );

    let resize_options =
        ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    let mut resizer = Resizer::new();

    let src_image = Image::from_vec_u8(cols, rows, img.as_raw().clone(), PixelType::U8x3)
        .map_err(Error::external)?;
    let mut dst_image = Image::new(target_cols, target_rows, PixelType::U8x3);
    resizer
        .resize(&src_image, &mut dst_image, &resize_options)
        .map_err(Error::external)?;

    RgbImage::from_raw(target_cols, target_rows, dst_image.into_vec())
        .ok_or_else(|| Error::Processing("resized buffer has unexpected length".to_string()))
}
