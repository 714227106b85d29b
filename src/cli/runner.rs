use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use qytools::{
    CellSource, Config, GridParams, Multipool, combine_images_with, compute_rgb_stats_with,
    create_sidecar, crop_dir, crop_img_with, write_stats_json,
};

use super::args::{CliArgs, Command, CropArgs, GridArgs, StatsArgs};
use super::errors::AppError;
use super::progress::BarSink;

/// Parse a `--cell` value: `3` pastes image 3, `0+1` blends image 0 with image 1.
fn parse_cell(spec: &str) -> Result<CellSource, AppError> {
    let invalid = || AppError::InvalidCell {
        cell: spec.to_string(),
    };
    let index = |s: &str| s.trim().parse::<usize>().map_err(|_| invalid());
    match spec.split_once('+') {
        Some((base, overlay)) => Ok(CellSource::blend(index(base)?, index(overlay)?)),
        None => Ok(CellSource::paste(index(spec)?)),
    }
}

#[derive(Serialize)]
struct GridLayout<'a> {
    images: &'a [PathBuf],
    #[serde(flatten)]
    params: &'a GridParams,
}

fn run_crop(args: CropArgs, config: &Config) -> Result<(), AppError> {
    let mut params = config.crop;
    if let Some(crop_size) = args.crop_size {
        params.crop_size = crop_size;
    }
    if let Some(stride) = args.stride {
        params.stride = stride;
    }

    if args.input.is_dir() {
        let workers = args.workers.unwrap_or(config.workers);
        let pool = Multipool::new(workers)?.with_sink(Arc::new(BarSink::new()));
        let report = crop_dir(&args.input, &args.output_dir, &params, &pool)?;
        info!(
            "Batch crop complete: {} succeeded, {} failed",
            report.succeeded_count(),
            report.failed_count()
        );
        for failure in &report.failures {
            warn!("Failed to crop {:?}: {}", failure.arg(), failure.message());
        }
    } else {
        let written = crop_img_with(&args.input, &args.output_dir, &params)?;
        info!(
            "Wrote {} patches from {:?} into {:?}",
            written.len(),
            args.input,
            args.output_dir
        );
    }
    Ok(())
}

fn run_grid(args: GridArgs, config: &Config) -> Result<(), AppError> {
    let mut params = config.grid.clone();
    if let Some(w) = args.image_width {
        params.image_hw.0 = w;
    }
    if let Some(h) = args.image_height {
        params.image_hw.1 = h;
    }
    if let Some(rows) = args.rows {
        params.grid_hw.0 = rows;
    }
    if let Some(cols) = args.cols {
        params.grid_hw.1 = cols;
    }
    if let Some(alpha) = args.alpha {
        params.blend_alpha = alpha;
    }
    if args.fit {
        params.fit = true;
    }
    if !args.cells.is_empty() {
        let cells = args
            .cells
            .iter()
            .map(|c| parse_cell(c))
            .collect::<Result<Vec<_>, _>>()?;
        params.blend_index = Some(cells);
    }

    combine_images_with(&args.images, &args.output, &params)?;

    if args.sidecar {
        let layout = GridLayout {
            images: &args.images,
            params: &params,
        };
        let path = create_sidecar(&args.output, &layout)?;
        info!("Wrote layout sidecar: {:?}", path);
    }
    Ok(())
}

fn run_stats(args: StatsArgs, config: &Config) -> Result<(), AppError> {
    let mut params = config.stats.clone();
    if let Some(device) = args.device {
        params.device = device;
    }
    if let Some(batch_size) = args.batch_size {
        params.batch_size = batch_size;
    }
    if let Some(workers) = args.workers {
        params.workers = workers;
    }

    let stats = compute_rgb_stats_with(&args.input_dir, &params)?;
    for line in stats.lines() {
        println!("{}", line);
    }
    if let Some(json) = args.json.as_deref() {
        write_stats_json(&stats, json)?;
        info!("Wrote statistics: {:?}", json);
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config, AppError> {
    match path {
        Some(path) => {
            info!("Loading config: {:?}", path);
            Ok(Config::from_json_file(path)?)
        }
        None => Ok(Config::default()),
    }
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.log {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Crop(crop) => run_crop(crop, &config)?,
        Command::Grid(grid) => run_grid(grid, &config)?,
        Command::Stats(stats) => run_stats(stats, &config)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_paste_and_blend_cells() {
        assert_eq!(parse_cell("3").unwrap(), CellSource::paste(3));
        assert_eq!(parse_cell("0+1").unwrap(), CellSource::blend(0, 1));
        assert_eq!(parse_cell(" 2 + 4 ").unwrap(), CellSource::blend(2, 4));
    }

    #[test]
    fn rejects_malformed_cells() {
        for bad in ["", "a", "1+", "+1", "1+2+3", "-1"] {
            assert!(
                matches!(parse_cell(bad), Err(AppError::InvalidCell { .. })),
                "{bad} should be rejected"
            );
        }
    }
}
