use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use qytools::StatsDevice;

#[derive(Parser)]
#[command(name = "qytools", version, about = "qytools CLI")]
pub struct CliArgs {
    /// Enable logging (RUST_LOG overrides the default debug level)
    #[arg(long, global = true, default_value_t = false)]
    pub log: bool,

    /// JSON config file with optional `workers`, `crop`, `grid` and `stats` sections.
    /// Command-line flags take precedence over it.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Cut images into fixed-size square patches with a sliding window
    Crop(CropArgs),
    /// Compose images into a grid, optionally alpha-blending cells
    Grid(GridArgs),
    /// Per-channel mean and standard deviation over a folder of PNG images
    Stats(StatsArgs),
}

#[derive(Args)]
pub struct CropArgs {
    /// Input image, or a directory of images (batch mode)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory receiving `{stem}_{left}_{top}.png` patches
    #[arg(short, long)]
    pub output_dir: PathBuf,

    /// Patch side length in pixels [default: 1024]
    #[arg(long)]
    pub crop_size: Option<u32>,

    /// Window step in pixels [default: 512]
    #[arg(long)]
    pub stride: Option<u32>,

    /// Worker threads for batch mode [default: 40]
    #[arg(short, long)]
    pub workers: Option<usize>,
}

#[derive(Args)]
pub struct GridArgs {
    /// Source images, referenced by position in cell specs
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// Output image (extension picks the encoder: png, jpg, tiff)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Cell width in pixels
    #[arg(long)]
    pub image_width: Option<u32>,

    /// Cell height in pixels
    #[arg(long)]
    pub image_height: Option<u32>,

    /// Grid rows
    #[arg(long)]
    pub rows: Option<u32>,

    /// Grid columns
    #[arg(long)]
    pub cols: Option<u32>,

    /// Cell sources in row-major order: `3` pastes image 3, `0+1` blends image 0 with image 1
    #[arg(long = "cell")]
    pub cells: Vec<String>,

    /// Blend weight of the overlay image (0..=1) [default: 0.25]
    #[arg(long)]
    pub alpha: Option<f32>,

    /// Resize every source to the cell size first
    #[arg(long, default_value_t = false)]
    pub fit: bool,

    /// Write a JSON sidecar describing the layout next to the output
    #[arg(long, default_value_t = false)]
    pub sidecar: bool,
}

#[derive(Args)]
pub struct StatsArgs {
    /// Directory containing the images
    #[arg(short, long)]
    pub input_dir: PathBuf,

    /// cpu runs the exact CPU variant; accelerator/auto run the batched variant
    #[arg(long, value_enum)]
    pub device: Option<StatsDevice>,

    /// Images per batch for the batched variant [default: 1]
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Worker threads for the CPU variant [default: 8]
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Also write the statistics as JSON to this path
    #[arg(long)]
    pub json: Option<PathBuf>,
}
