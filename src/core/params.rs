use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::pool::DEFAULT_WORKERS;
use crate::error::{Error, Result};
use crate::types::StatsDevice;

/// One grid cell: `base` alone, or `base` blended with `overlay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSource {
    pub base: usize,
    #[serde(default)]
    pub overlay: Option<usize>,
}

impl CellSource {
    pub fn paste(base: usize) -> Self {
        Self {
            base,
            overlay: None,
        }
    }

    pub fn blend(base: usize, overlay: usize) -> Self {
        Self {
            base,
            overlay: Some(overlay),
        }
    }
}

/// Grid composition parameters suitable for config files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    /// Cell size as (width, height)
    pub image_hw: (u32, u32),
    /// Grid layout as (rows, cols)
    pub grid_hw: (u32, u32),
    /// Per-cell sources; None means cell i shows image i
    pub blend_index: Option<Vec<CellSource>>,
    pub blend_alpha: f32,
    /// If true, resize every source to the cell size before compositing
    pub fit: bool,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            image_hw: (512, 512),
            grid_hw: (1, 1),
            blend_index: None,
            blend_alpha: 0.25,
            fit: false,
        }
    }
}

impl GridParams {
    pub fn validate(&self) -> Result<()> {
        let (w, h) = self.image_hw;
        if w == 0 || h == 0 {
            return Err(Error::invalid_arg("image_hw", format!("({}, {})", w, h)));
        }
        let (rows, cols) = self.grid_hw;
        if rows == 0 || cols == 0 {
            return Err(Error::invalid_arg("grid_hw", format!("({}, {})", rows, cols)));
        }
        if !(0.0..=1.0).contains(&self.blend_alpha) {
            return Err(Error::invalid_arg("blend_alpha", self.blend_alpha));
        }
        Ok(())
    }

    pub fn cell_count(&self) -> usize {
        self.grid_hw.0 as usize * self.grid_hw.1 as usize
    }

    /// Cell sources; without an explicit layout, cell i shows image i for every
    /// available image.
    pub fn cells(&self, image_count: usize) -> Vec<CellSource> {
        match &self.blend_index {
            Some(cells) => cells.clone(),
            None => (0..self.cell_count().min(image_count))
                .map(CellSource::paste)
                .collect(),
        }
    }
}

/// Sliding-window crop parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropParams {
    pub crop_size: u32,
    pub stride: u32,
}

impl Default for CropParams {
    fn default() -> Self {
        Self {
            crop_size: 1024,
            stride: 512,
        }
    }
}

impl CropParams {
    pub fn validate(&self) -> Result<()> {
        if self.crop_size == 0 {
            return Err(Error::invalid_arg("crop_size", self.crop_size));
        }
        if self.stride == 0 {
            return Err(Error::invalid_arg("stride", self.stride));
        }
        Ok(())
    }
}

/// Channel statistics parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsParams {
    pub device: StatsDevice,
    pub batch_size: usize,
    pub workers: usize,
    /// Lowercase file extensions to include
    pub extensions: Vec<String>,
}

impl Default for StatsParams {
    fn default() -> Self {
        Self {
            device: StatsDevice::Cpu,
            batch_size: 1,
            workers: 8,
            extensions: vec!["png".to_string()],
        }
    }
}

/// Top-level config file layout; every section is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub workers: usize,
    pub crop: CropParams,
    pub grid: GridParams,
    pub stats: StatsParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            crop: CropParams::default(),
            grid: GridParams::default(),
            stats: StatsParams::default(),
        }
    }
}

impl Config {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }
}
