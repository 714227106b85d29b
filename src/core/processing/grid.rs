use std::borrow::Cow;

use image::{RgbImage, imageops};
use tracing::{debug, info};

use crate::core::params::GridParams;
use crate::core::processing::blend::blend_images;
use crate::core::processing::resize::resize_rgb_image;
use crate::error::{Error, Result};

fn source(images: &[RgbImage], index: usize) -> Result<&RgbImage> {
    images.get(index).ok_or_else(|| {
        Error::invalid_arg(
            "blend_index",
            format!("image {} out of range ({} images)", index, images.len()),
        )
    })
}

/// Compose `images` into a `rows x cols` grid of `width x height` cells.
///
/// Cell `i` (row-major) is filled from `params.cells(n)[i]` when that entry exists:
/// the base image is pasted as-is, or alpha-blended with the overlay first.
/// Pasting clips at the canvas border; an oversized source spills into the
/// following cells and is overwritten by them.
pub fn compose_grid(images: &[RgbImage], params: &GridParams) -> Result<RgbImage> {
    params.validate()?;
    let (width, height) = params.image_hw;
    let (rows, cols) = params.grid_hw;

    let grid_width = width
        .checked_mul(cols)
        .ok_or_else(|| Error::invalid_arg("grid_hw", format!("({}, {})", rows, cols)))?;
    let grid_height = height
        .checked_mul(rows)
        .ok_or_else(|| Error::invalid_arg("grid_hw", format!("({}, {})", rows, cols)))?;

    let images: Cow<'_, [RgbImage]> = if params.fit {
        Cow::Owned(
            images
                .iter()
                .map(|img| resize_rgb_image(img, width, height))
                .collect::<Result<Vec<_>>>()?,
        )
    } else {
        Cow::Borrowed(images)
    };

    info!(
        "Composing {}x{} grid of {}x{} cells ({}x{} px)",
        rows, cols, width, height, grid_width, grid_height
    );
    let mut grid = RgbImage::new(grid_width, grid_height);

    let cells = params.cells(images.len());
    for (i, cell) in cells.iter().take(params.cell_count()).enumerate() {
        let x = (i as u32 % cols) * width;
        let y = (i as u32 / cols) * height;

        let base = source(&images, cell.base)?;
        let tile: Cow<'_, RgbImage> = match cell.overlay {
            None => Cow::Borrowed(base),
            Some(overlay) => Cow::Owned(blend_images(
                base,
                source(&images, overlay)?,
                params.blend_alpha,
            )?),
        };
        debug!("Cell {} at ({}, {}): {:?}", i, x, y, cell);
        imageops::replace(&mut grid, &*tile, x as i64, y as i64);
    }

    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::CellSource;
    use image::Rgb;

    fn solid(w: u32, h: u32, v: u8) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([v, v, v]))
    }

    #[test]
    fn identity_layout_places_images_row_major() {
        let images = vec![solid(2, 2, 10), solid(2, 2, 20), solid(2, 2, 30)];
        let params = GridParams {
            image_hw: (2, 2),
            grid_hw: (2, 2),
            ..GridParams::default()
        };
        let grid = compose_grid(&images, &params).unwrap();
        assert_eq!(grid.dimensions(), (4, 4));
        assert_eq!(grid.get_pixel(0, 0), &Rgb([10, 10, 10]));
        assert_eq!(grid.get_pixel(3, 1), &Rgb([20, 20, 20]));
        assert_eq!(grid.get_pixel(1, 3), &Rgb([30, 30, 30]));
        // Fourth cell has no image and stays black.
        assert_eq!(grid.get_pixel(3, 3), &Rgb([0, 0, 0]));
    }

    #[test]
    fn overlay_cells_are_blended() {
        let images = vec![solid(2, 2, 0), solid(2, 2, 200)];
        let params = GridParams {
            image_hw: (2, 2),
            grid_hw: (1, 2),
            blend_index: Some(vec![CellSource::paste(1), CellSource::blend(0, 1)]),
            blend_alpha: 0.25,
            fit: false,
        };
        let grid = compose_grid(&images, &params).unwrap();
        assert_eq!(grid.get_pixel(0, 0), &Rgb([200, 200, 200]));
        assert_eq!(grid.get_pixel(2, 1), &Rgb([50, 50, 50]));
    }

    #[test]
    fn short_blend_index_leaves_trailing_cells_empty() {
        let images = vec![solid(1, 1, 99)];
        let params = GridParams {
            image_hw: (1, 1),
            grid_hw: (1, 3),
            blend_index: Some(vec![CellSource::paste(0)]),
            ..GridParams::default()
        };
        let grid = compose_grid(&images, &params).unwrap();
        assert_eq!(grid.get_pixel(0, 0), &Rgb([99, 99, 99]));
        assert_eq!(grid.get_pixel(1, 0), &Rgb([0, 0, 0]));
        assert_eq!(grid.get_pixel(2, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn missing_source_is_an_argument_error() {
        let images = vec![solid(2, 2, 1)];
        let params = GridParams {
            image_hw: (2, 2),
            grid_hw: (1, 2),
            blend_index: Some(vec![CellSource::paste(0), CellSource::blend(0, 1)]),
            ..GridParams::default()
        };
        let err = compose_grid(&images, &params).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { arg: "blend_index", .. }));
    }

    #[test]
    fn fit_resizes_sources_to_the_cell() {
        let images = vec![solid(8, 6, 40), solid(3, 3, 80)];
        let params = GridParams {
            image_hw: (4, 4),
            grid_hw: (1, 2),
            blend_index: Some(vec![CellSource::paste(0), CellSource::blend(0, 1)]),
            blend_alpha: 0.5,
            fit: true,
        };
        let grid = compose_grid(&images, &params).unwrap();
        assert_eq!(grid.dimensions(), (8, 4));
        assert_eq!(grid.get_pixel(1, 1), &Rgb([40, 40, 40]));
        assert_eq!(grid.get_pixel(6, 2), &Rgb([60, 60, 60]));
    }

    #[test]
    fn oversized_source_is_clipped_by_the_next_cell() {
        let images = vec![solid(3, 1, 7), solid(1, 1, 9)];
        let params = GridParams {
            image_hw: (1, 1),
            grid_hw: (1, 2),
            ..GridParams::default()
        };
        let grid = compose_grid(&images, &params).unwrap();
        assert_eq!(grid.dimensions(), (2, 1));
        assert_eq!(grid.get_pixel(0, 0), &Rgb([7, 7, 7]));
        assert_eq!(grid.get_pixel(1, 0), &Rgb([9, 9, 9]));
    }
}
