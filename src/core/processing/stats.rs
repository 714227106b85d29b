//! Per-channel mean and standard deviation over a set of RGB images.
//!
//! Two variants:
//! - `rgb_stats_cpu` decodes on a scoped worker pool and folds every image into
//!   exact integer accumulators; std is the population value (ddof = 0).
//! - `rgb_stats_batched` concatenates channel planes batch by batch into `f32`
//!   buffers and reduces them with the array runtime; std is the sample value
//!   (ddof = 1).
use std::path::{Path, PathBuf};

use image::RgbImage;
use ndarray::{Array1, Axis};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::pool::run_scoped;
use crate::error::{Error, Result};
use crate::io::codec::{open_rgb, rgb_to_array};
use crate::types::{Channel, StatsDevice};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelStats {
    pub channel: Channel,
    pub mean: f64,
    pub std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RgbStats {
    pub image_count: usize,
    pub pixel_count: u64,
    pub device: StatsDevice,
    /// Delta degrees of freedom used for `std`
    pub ddof: u8,
    pub channels: [ChannelStats; 3],
}

impl RgbStats {
    pub fn channel(&self, channel: Channel) -> &ChannelStats {
        &self.channels[channel.index()]
    }

    pub fn means(&self) -> [f64; 3] {
        self.channels.map(|c| c.mean)
    }

    pub fn stds(&self) -> [f64; 3] {
        self.channels.map(|c| c.std)
    }

    /// One `R mean: 123.45, std: 67.89` line per channel.
    pub fn lines(&self) -> Vec<String> {
        self.channels
            .iter()
            .map(|c| format!("{} mean: {:.2}, std: {:.2}", c.channel, c.mean, c.std))
            .collect()
    }

    pub fn log(&self) {
        for line in self.lines() {
            info!("{}", line);
        }
    }
}

/// Exact running sums for the three channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelAccumulator {
    pub count: u64,
    pub sum: [u64; 3],
    pub sum_sq: [u128; 3],
}

impl ChannelAccumulator {
    pub fn add_image(&mut self, img: &RgbImage) {
        for px in img.pixels() {
            for c in 0..3 {
                let v = px.0[c] as u64;
                self.sum[c] += v;
                self.sum_sq[c] += (v * v) as u128;
            }
        }
        self.count += img.width() as u64 * img.height() as u64;
    }

    pub fn merge(mut self, other: ChannelAccumulator) -> ChannelAccumulator {
        self.count += other.count;
        for c in 0..3 {
            self.sum[c] += other.sum[c];
            self.sum_sq[c] += other.sum_sq[c];
        }
        self
    }

    /// Mean and standard deviation per channel; NaN when `count <= ddof`.
    pub fn finish(&self, ddof: u8) -> [(f64, f64); 3] {
        let n = self.count as u128;
        let d = ddof as u128;
        [0, 1, 2].map(|c| {
            if n == 0 {
                return (f64::NAN, f64::NAN);
            }
            let mean = self.sum[c] as f64 / n as f64;
            if n <= d {
                return (mean, f64::NAN);
            }
            // n * sum_sq - sum^2 is exact in u128 and never negative.
            let s = self.sum[c] as u128;
            let numerator = n * self.sum_sq[c] - s * s;
            let var = numerator as f64 / (n as f64 * (n - d) as f64);
            (mean, var.sqrt())
        })
    }
}

fn open_for_stats(path: &Path) -> Result<RgbImage> {
    open_rgb(path).map_err(|e| Error::Processing(format!("{:?}: {}", path, e)))
}

fn require_images(paths: &[PathBuf]) -> Result<()> {
    if paths.is_empty() {
        return Err(Error::invalid_arg("image_folder", "no matching images"));
    }
    Ok(())
}

fn build_stats(
    image_count: usize,
    pixel_count: u64,
    device: StatsDevice,
    ddof: u8,
    values: [(f64, f64); 3],
) -> RgbStats {
    let channels = Channel::ALL.map(|channel| {
        let (mean, std) = values[channel.index()];
        ChannelStats { channel, mean, std }
    });
    RgbStats {
        image_count,
        pixel_count,
        device,
        ddof,
        channels,
    }
}

/// CPU statistics: parallel decode on `workers` threads, exact accumulation, population std.
pub fn rgb_stats_cpu(paths: &[PathBuf], workers: usize) -> Result<RgbStats> {
    require_images(paths)?;
    info!(
        "Computing RGB statistics over {} images with {} workers",
        paths.len(),
        workers
    );

    let acc = run_scoped(workers, || {
        paths
            .par_iter()
            .map(|path| -> Result<ChannelAccumulator> {
                let img = open_for_stats(path)?;
                let mut acc = ChannelAccumulator::default();
                acc.add_image(&img);
                debug!("Accumulated {:?}", path);
                Ok(acc)
            })
            .try_reduce(ChannelAccumulator::default, |a, b| Ok(a.merge(b)))
    })??;

    let stats = build_stats(paths.len(), acc.count, StatsDevice::Cpu, 0, acc.finish(0));
    stats.log();
    Ok(stats)
}

fn reduce_plane(plane: Vec<f32>) -> (f64, f64) {
    let buf = Array1::from_vec(plane);
    let n = buf.len();
    let mean = buf.mean().map(f64::from).unwrap_or(f64::NAN);
    let std = if n > 1 {
        buf.std(1.0) as f64
    } else {
        f64::NAN
    };
    (mean, std)
}

/// Batched statistics: channel planes are gathered into `f32` buffers `batch_size`
/// images at a time, then reduced with sample std.
///
/// On `StatsDevice::Accelerator` each batch is decoded in parallel and the three
/// channel reductions run concurrently on the global data-parallel runtime.
pub fn rgb_stats_batched(
    paths: &[PathBuf],
    device: StatsDevice,
    batch_size: usize,
) -> Result<RgbStats> {
    require_images(paths)?;
    if batch_size == 0 {
        return Err(Error::invalid_arg("batch_size", batch_size));
    }
    let device = device.resolve();
    let batches = paths.len().div_ceil(batch_size);
    info!(
        "Computing RGB statistics over {} images on {} ({} batches of {})",
        paths.len(),
        device,
        batches,
        batch_size
    );

    let mut planes: [Vec<f32>; 3] = Default::default();
    for (i, batch) in paths.chunks(batch_size).enumerate() {
        let decoded: Vec<RgbImage> = match device {
            StatsDevice::Accelerator => batch
                .par_iter()
                .map(|p| open_for_stats(p))
                .collect::<Result<_>>()?,
            _ => batch
                .iter()
                .map(|p| open_for_stats(p))
                .collect::<Result<_>>()?,
        };

        for img in decoded {
            let array = rgb_to_array(img)?;
            for (c, plane) in planes.iter_mut().enumerate() {
                plane.extend(array.index_axis(Axis(2), c).iter().map(|&v| v as f32));
            }
        }
        debug!("Batch {}/{} accumulated", i + 1, batches);
    }

    let pixel_count = planes[0].len() as u64;
    let [r, g, b] = planes;
    let values = match device {
        StatsDevice::Accelerator => {
            let (r, (g, b)) = rayon::join(
                || reduce_plane(r),
                || rayon::join(|| reduce_plane(g), || reduce_plane(b)),
            );
            [r, g, b]
        }
        _ => [reduce_plane(r), reduce_plane(g), reduce_plane(b)],
    };

    let stats = build_stats(paths.len(), pixel_count, device, 1, values);
    stats.log();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-4, "{} != {}", a, b);
    }

    #[test]
    fn accumulator_population_std() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([0, 10, 100]));
        img.put_pixel(1, 0, Rgb([4, 10, 200]));
        let mut acc = ChannelAccumulator::default();
        acc.add_image(&img);

        let [r, g, b] = acc.finish(0);
        assert_close(r.0, 2.0);
        assert_close(r.1, 2.0);
        assert_close(g.0, 10.0);
        assert_close(g.1, 0.0);
        assert_close(b.0, 150.0);
        assert_close(b.1, 50.0);

        let [r1, _, _] = acc.finish(1);
        assert_close(r1.1, 8.0f64.sqrt());
    }

    #[test]
    fn merge_matches_single_pass() {
        let a = RgbImage::from_pixel(3, 3, Rgb([1, 2, 3]));
        let b = RgbImage::from_pixel(2, 5, Rgb([250, 0, 9]));

        let mut whole = ChannelAccumulator::default();
        whole.add_image(&a);
        whole.add_image(&b);

        let mut left = ChannelAccumulator::default();
        left.add_image(&a);
        let mut right = ChannelAccumulator::default();
        right.add_image(&b);

        assert_eq!(left.merge(right), whole);
        assert_eq!(whole.count, 19);
    }

    #[test]
    fn empty_accumulator_is_nan() {
        let [r, _, _] = ChannelAccumulator::default().finish(0);
        assert!(r.0.is_nan() && r.1.is_nan());
    }

    #[test]
    fn sample_std_of_plane() {
        let (mean, std) = reduce_plane(vec![0.0, 4.0]);
        assert_close(mean, 2.0);
        assert_close(std, 8.0f64.sqrt());
        assert!(reduce_plane(vec![1.0]).1.is_nan());
    }

    #[test]
    fn lines_use_two_decimals() {
        let stats = build_stats(
            1,
            4,
            StatsDevice::Cpu,
            0,
            [(123.456, 1.0), (0.0, 0.0), (255.0, 2.345)],
        );
        assert_eq!(
            stats.lines(),
            vec![
                "R mean: 123.46, std: 1.00",
                "G mean: 0.00, std: 0.00",
                "B mean: 255.00, std: 2.35",
            ]
        );
    }

    #[test]
    fn no_images_is_an_argument_error() {
        assert!(matches!(
            rgb_stats_cpu(&[], 2),
            Err(Error::InvalidArgument { arg: "image_folder", .. })
        ));
        assert!(matches!(
            rgb_stats_batched(&[], StatsDevice::Cpu, 1),
            Err(Error::InvalidArgument { arg: "image_folder", .. })
        ));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let paths = vec![PathBuf::from("a.png")];
        assert!(matches!(
            rgb_stats_batched(&paths, StatsDevice::Cpu, 0),
            Err(Error::InvalidArgument { arg: "batch_size", .. })
        ));
    }
}
