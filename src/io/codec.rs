//! Image codec adapters: decode files to pixel buffers, convert between
//! `image` buffers and `ndarray` arrays, and encode back to disk.
use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbImage};
use ndarray::Array3;
use tracing::debug;

use crate::error::{Error, Result};
use crate::io::writers::jpeg::{write_gray_jpeg, write_rgb_jpeg};
use crate::types::OutputFormat;

/// Extensions picked up when a whole folder of images is processed.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp", "webp"];

/// Decode any supported image and convert it to 8-bit RGB (palette images included).
pub fn open_rgb(path: &Path) -> Result<RgbImage> {
    let img = image::open(path)?;
    Ok(img.to_rgb8())
}

/// View an RGB image as a `(height, width, 3)` array.
pub fn rgb_to_array(img: RgbImage) -> Result<Array3<u8>> {
    let (w, h) = img.dimensions();
    Array3::from_shape_vec((h as usize, w as usize, 3), img.into_raw()).map_err(Error::external)
}

/// Inverse of [`rgb_to_array`].
pub fn array_to_rgb(array: Array3<u8>) -> Result<RgbImage> {
    let (h, w, c) = array.dim();
    if c != 3 {
        return Err(Error::invalid_arg("channels", c));
    }
    let raw = if array.is_standard_layout() {
        array.into_raw_vec()
    } else {
        array.iter().copied().collect()
    };
    RgbImage::from_raw(w as u32, h as u32, raw)
        .ok_or_else(|| Error::Processing(format!("buffer does not fit {}x{} RGB", w, h)))
}

/// Encode `img` to `path`, picking the encoder from the extension.
///
/// JPEG goes through `jpeg-encoder`; everything else through the `image` codec.
pub fn save_image(img: &DynamicImage, path: &Path) -> Result<()> {
    match OutputFormat::from_path(path) {
        OutputFormat::JPEG => match img {
            DynamicImage::ImageLuma8(gray) => write_gray_jpeg(
                path,
                gray.width() as usize,
                gray.height() as usize,
                gray.as_raw(),
            ),
            other => {
                let rgb = other.to_rgb8();
                write_rgb_jpeg(path, rgb.width() as usize, rgb.height() as usize, rgb.as_raw())
            }
        },
        OutputFormat::PNG | OutputFormat::TIFF => {
            img.save(path)?;
            Ok(())
        }
    }?;
    debug!("Saved image: {:?}", path);
    Ok(())
}

pub fn save_rgb(img: &RgbImage, path: &Path) -> Result<()> {
    save_image(&DynamicImage::ImageRgb8(img.clone()), path)
}

/// Files directly inside `folder` whose lowercase extension is one of `extensions`, sorted.
pub fn list_images(folder: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .is_some_and(|e| extensions.iter().any(|want| *want == e));
        if matches {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
