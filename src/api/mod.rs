//! High-level, path-based library API: grid composition, sliding-window crops
//! (single file or a whole folder through the parallel mapper), palette and
//! label-map conversion, and channel statistics over a folder. Prefer these
//! entrypoints over the low-level `core` modules when integrating qytools.
use std::path::{Path, PathBuf};

use image::DynamicImage;
use ndarray::ArrayView2;
use tracing::{debug, info};

use crate::core::params::{CellSource, CropParams, GridParams, StatsParams};
use crate::core::pool::{Multipool, PoolReport};
use crate::core::processing::crop::{base_stem, patch_file_name, window_origins};
use crate::core::processing::grid::compose_grid;
use crate::core::processing::palette::{array_to_indexed, labels_to_rgb, wrap_to_u8};
use crate::core::processing::stats::{RgbStats, rgb_stats_batched, rgb_stats_cpu};
use crate::error::Result;
use crate::io::codec::{IMAGE_EXTENSIONS, open_rgb, save_image, save_rgb};
use crate::io::writers::json::write_json_report;
use crate::io::writers::png::write_indexed_png;
use crate::types::StatsDevice;

pub use crate::io::codec::list_images;

/// Compose images into a grid and save it to `output_path`.
///
/// `image_hw` is the cell size as (width, height); `grid_hw` is the layout as
/// (rows, cols). Without `blend_index`, cell i shows image i.
pub fn combine_images<P: AsRef<Path>>(
    image_paths: &[P],
    image_hw: (u32, u32),
    output_path: &Path,
    grid_hw: (u32, u32),
    blend_index: Option<Vec<CellSource>>,
    blend_alpha: f32,
) -> Result<()> {
    let params = GridParams {
        image_hw,
        grid_hw,
        blend_index,
        blend_alpha,
        fit: false,
    };
    combine_images_with(image_paths, output_path, &params)
}

/// Same as [`combine_images`], driven by a `GridParams` (e.g. from a config file).
pub fn combine_images_with<P: AsRef<Path>>(
    image_paths: &[P],
    output_path: &Path,
    params: &GridParams,
) -> Result<()> {
    // Reject bad parameters before decoding anything.
    params.validate()?;

    let images = image_paths
        .iter()
        .map(|p| open_rgb(p.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    let grid = compose_grid(&images, params)?;
    save_rgb(&grid, output_path)?;
    info!(
        "Saved {}x{} grid: {:?}",
        grid.width(),
        grid.height(),
        output_path
    );
    Ok(())
}

/// Cut `image_path` into `crop_size` squares every `stride` pixels and save them
/// as `{stem}_{left}_{top}.png` in `save_dir`. Returns the written paths.
pub fn crop_img(
    image_path: &Path,
    save_dir: &Path,
    crop_size: u32,
    stride: u32,
) -> Result<Vec<PathBuf>> {
    crop_img_with(image_path, save_dir, &CropParams { crop_size, stride })
}

pub fn crop_img_with(
    image_path: &Path,
    save_dir: &Path,
    params: &CropParams,
) -> Result<Vec<PathBuf>> {
    params.validate()?;
    let img: DynamicImage = image::open(image_path)?;
    let origins = window_origins(img.width(), img.height(), params)?;
    let stem = base_stem(image_path);

    std::fs::create_dir_all(save_dir)?;
    let mut written = Vec::with_capacity(origins.len());
    for (left, top) in origins {
        let patch = img.crop_imm(left, top, params.crop_size, params.crop_size);
        let output_path = save_dir.join(patch_file_name(&stem, left, top));
        save_image(&patch, &output_path)?;
        written.push(output_path);
    }
    debug!("Cropped {:?} into {} patches", image_path, written.len());
    Ok(written)
}

/// Crop every image in `input_dir` through the parallel mapper.
///
/// Images that fail (unreadable, too small) are listed in the report; the rest
/// are still processed.
pub fn crop_dir(
    input_dir: &Path,
    save_dir: &Path,
    params: &CropParams,
    pool: &Multipool,
) -> Result<PoolReport<PathBuf>> {
    params.validate()?;
    let paths = list_images(input_dir, IMAGE_EXTENSIONS)?;
    std::fs::create_dir_all(save_dir)?;
    info!(
        "Cropping {} images from {:?} into {:?} with {} workers",
        paths.len(),
        input_dir,
        save_dir,
        pool.workers()
    );
    pool.run(|path: &PathBuf| crop_img_with(path, save_dir, params), paths)
}

/// Save a 2-D index array as an indexed PNG using `palette` (flat RGB triples).
pub fn array2img(array: ArrayView2<'_, u8>, save_path: &Path, palette: &[u8]) -> Result<()> {
    let indexed = array_to_indexed(array, palette)?;
    write_indexed_png(
        save_path,
        indexed.width,
        indexed.height,
        &indexed.indices,
        &indexed.palette,
    )?;
    debug!("Saved indexed image: {:?}", save_path);
    Ok(())
}

/// Like [`array2img`] for integer labels, wrapping them into `0..=255` first.
pub fn array2img_from_i64(
    array: ArrayView2<'_, i64>,
    save_path: &Path,
    palette: &[u8],
) -> Result<()> {
    array2img(wrap_to_u8(array).view(), save_path, palette)
}

/// Colour every distinct label randomly (reproducible for a given `seed`) and save as RGB.
pub fn labels_to_rgb_path(
    labels: ArrayView2<'_, i64>,
    output_path: &Path,
    seed: u64,
) -> Result<()> {
    let img = labels_to_rgb(labels, seed);
    save_rgb(&img, output_path)?;
    info!("Image saved to {:?}", output_path);
    Ok(())
}

/// CPU channel statistics over the PNG files in `image_folder`.
pub fn compute_rgb_stats(image_folder: &Path, workers: usize) -> Result<RgbStats> {
    let paths = list_images(image_folder, &["png"])?;
    rgb_stats_cpu(&paths, workers)
}

/// Batched channel statistics over the PNG files in `image_folder`.
pub fn compute_rgb_stats_batched(
    image_folder: &Path,
    device: StatsDevice,
    batch_size: usize,
) -> Result<RgbStats> {
    let paths = list_images(image_folder, &["png"])?;
    rgb_stats_batched(&paths, device, batch_size)
}

/// Channel statistics driven by `StatsParams`: `Cpu` runs the CPU variant on
/// `params.workers` threads, other devices run the batched variant.
pub fn compute_rgb_stats_with(image_folder: &Path, params: &StatsParams) -> Result<RgbStats> {
    let extensions: Vec<&str> = params.extensions.iter().map(String::as_str).collect();
    let paths = list_images(image_folder, &extensions)?;
    match params.device {
        StatsDevice::Cpu => rgb_stats_cpu(&paths, params.workers),
        device => rgb_stats_batched(&paths, device, params.batch_size),
    }
}

/// Write `stats` as a timestamped JSON report.
pub fn write_stats_json(stats: &RgbStats, path: &Path) -> Result<()> {
    write_json_report(stats, path)?;
    debug!("Saved statistics: {:?}", path);
    Ok(())
}
