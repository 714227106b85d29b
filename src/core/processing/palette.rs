use std::collections::BTreeMap;

use image::{Rgb, RgbImage};
use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::{Error, Result};

/// Index 0 white, 1 red, 2 black.
pub const BINARY_PALETTE: [u8; 9] = [255, 255, 255, 255, 0, 0, 0, 0, 0];

/// Single-band image whose pixels index into an RGB palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    pub width: usize,
    pub height: usize,
    pub indices: Vec<u8>,
    pub palette: Vec<u8>,
}

impl IndexedImage {
    /// Expand to RGB; indices past the end of the palette render black.
    pub fn to_rgb(&self) -> RgbImage {
        RgbImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let idx = self.indices[y as usize * self.width + x as usize] as usize;
            match self.palette.get(idx * 3..idx * 3 + 3) {
                Some(c) => Rgb([c[0], c[1], c[2]]),
                None => Rgb([0, 0, 0]),
            }
        })
    }
}

pub fn validate_palette(palette: &[u8]) -> Result<()> {
    if palette.is_empty() || palette.len() % 3 != 0 || palette.len() > 256 * 3 {
        return Err(Error::invalid_arg(
            "palette",
            format!("{} bytes (expected 3..=768, multiple of 3)", palette.len()),
        ));
    }
    Ok(())
}

pub fn array_to_indexed(array: ArrayView2<'_, u8>, palette: &[u8]) -> Result<IndexedImage> {
    validate_palette(palette)?;
    let (height, width) = array.dim();
    Ok(IndexedImage {
        width,
        height,
        indices: array.iter().copied().collect(),
        palette: palette.to_vec(),
    })
}

/// Cast labels to u8 with wrap-around (`256 -> 0`, `-1 -> 255`).
pub fn wrap_to_u8(array: ArrayView2<'_, i64>) -> Array2<u8> {
    array.mapv(|v| v as u8)
}

/// Colour each distinct label with a random RGB triple drawn from `seed`.
///
/// Labels are coloured in ascending order, so the same labels and seed always
/// give the same image.
pub fn labels_to_rgb(labels: ArrayView2<'_, i64>, seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut colors: BTreeMap<i64, Rgb<u8>> =
        labels.iter().map(|&v| (v, Rgb([0, 0, 0]))).collect();
    for color in colors.values_mut() {
        *color = Rgb([
            rng.gen_range(0..=255),
            rng.gen_range(0..=255),
            rng.gen_range(0..=255),
        ]);
    }
    debug!("Assigned colours to {} labels", colors.len());

    let (height, width) = labels.dim();
    RgbImage::from_fn(width as u32, height as u32, |x, y| {
        colors[&labels[[y as usize, x as usize]]]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn indexed_image_keeps_row_major_indices() {
        let a = array![[0u8, 1], [2, 0], [1, 1]];
        let img = array_to_indexed(a.view(), &BINARY_PALETTE).unwrap();
        assert_eq!((img.width, img.height), (2, 3));
        assert_eq!(img.indices, vec![0, 1, 2, 0, 1, 1]);

        let rgb = img.to_rgb();
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(rgb.get_pixel(1, 0), &Rgb([255, 0, 0]));
        assert_eq!(rgb.get_pixel(0, 1), &Rgb([0, 0, 0]));
    }

    #[test]
    fn out_of_palette_index_renders_black() {
        let a = array![[7u8]];
        let img = array_to_indexed(a.view(), &BINARY_PALETTE).unwrap();
        assert_eq!(img.to_rgb().get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn malformed_palette_is_rejected() {
        let a = array![[0u8]];
        assert!(array_to_indexed(a.view(), &[1, 2]).is_err());
        assert!(array_to_indexed(a.view(), &[]).is_err());
        assert!(array_to_indexed(a.view(), &[0u8; 771]).is_err());
    }

    #[test]
    fn labels_wrap_like_an_unsigned_cast() {
        let a = array![[256i64, -1], [3, 258]];
        assert_eq!(wrap_to_u8(a.view()), array![[0u8, 255], [3, 2]]);
    }

    #[test]
    fn equal_labels_share_a_colour_and_seed_is_reproducible() {
        let labels = array![[5i64, 5, 9], [9, -2, 5]];
        let a = labels_to_rgb(labels.view(), 42);
        let b = labels_to_rgb(labels.view(), 42);
        assert_eq!(a, b);
        assert_eq!(a.dimensions(), (3, 2));
        assert_eq!(a.get_pixel(0, 0), a.get_pixel(1, 0));
        assert_eq!(a.get_pixel(0, 0), a.get_pixel(2, 1));
        assert_eq!(a.get_pixel(2, 0), a.get_pixel(0, 1));
    }
}
