//! Shared types and enums used across qytools.
//! Includes `StatsDevice`, `OutputFormat` and `Channel`.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Where the batched statistics path accumulates and reduces its buffers.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsDevice {
    /// Plain single-threaded reduction.
    Cpu,
    /// Data-parallel array runtime (ndarray + rayon).
    Accelerator,
    /// Accelerator when more than one CPU is available, otherwise CPU.
    Auto,
}

impl StatsDevice {
    /// Resolve `Auto` to a concrete device.
    pub fn resolve(self) -> StatsDevice {
        match self {
            StatsDevice::Auto => {
                if rayon::current_num_threads() > 1 {
                    StatsDevice::Accelerator
                } else {
                    StatsDevice::Cpu
                }
            }
            other => other,
        }
    }
}

impl std::fmt::Display for StatsDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsDevice::Cpu => write!(f, "cpu"),
            StatsDevice::Accelerator => write!(f, "accelerator"),
            StatsDevice::Auto => write!(f, "auto"),
        }
    }
}

#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum, Serialize, Deserialize,
)]
pub enum OutputFormat {
    PNG,
    JPEG, // Lossy
    TIFF,
}

impl OutputFormat {
    /// Pick a format from a path extension; unknown extensions fall back to PNG.
    pub fn from_path(path: &std::path::Path) -> OutputFormat {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("jpg") | Some("jpeg") => OutputFormat::JPEG,
            Some("tif") | Some("tiff") => OutputFormat::TIFF,
            _ => OutputFormat::PNG,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum Channel {
    R,
    G,
    B,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::R, Channel::G, Channel::B];

    pub fn index(&self) -> usize {
        match self {
            Channel::R => 0,
            Channel::G => 1,
            Channel::B => 2,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Channel::R => "R",
            Channel::G => "G",
            Channel::B => "B",
        };
        write!(f, "{}", s)
    }
}
