use std::path::Path;

use crate::core::params::CropParams;
use crate::error::{Error, Result};

/// Start offsets of fixed-size windows along one axis.
///
/// Windows step by `stride`; if the last stepped window does not end at `len`,
/// one more window flush with the border is appended. `crop` and `stride` must
/// be positive and `crop` must fit in `len`.
pub fn window_starts(len: u32, crop: u32, stride: u32) -> Result<Vec<u32>> {
    if crop == 0 {
        return Err(Error::invalid_arg("crop_size", crop));
    }
    if stride == 0 {
        return Err(Error::invalid_arg("stride", stride));
    }
    let last = len.checked_sub(crop).ok_or_else(|| {
        Error::invalid_arg("crop_size", format!("{} exceeds length {}", crop, len))
    })?;
    let mut starts: Vec<u32> = (0..=last).step_by(stride as usize).collect();
    if starts.last() != Some(&last) {
        starts.push(last);
    }
    Ok(starts)
}

/// Top-left corners of every crop window for a `width x height` image, row-major.
pub fn window_origins(width: u32, height: u32, params: &CropParams) -> Result<Vec<(u32, u32)>> {
    params.validate()?;
    if width < params.crop_size || height < params.crop_size {
        return Err(Error::invalid_arg(
            "crop_size",
            format!(
                "{} exceeds image size {}x{}",
                params.crop_size, width, height
            ),
        ));
    }

    let xs = window_starts(width, params.crop_size, params.stride)?;
    let ys = window_starts(height, params.crop_size, params.stride)?;
    Ok(ys
        .iter()
        .flat_map(|&top| xs.iter().map(move |&left| (left, top)))
        .collect())
}

/// File name stem up to the first `.`, e.g. `scene.tile.png` -> `scene`.
pub fn base_stem(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default()
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string()
}

pub fn patch_file_name(stem: &str, left: u32, top: u32) -> String {
    format!("{}_{}_{}.png", stem, left, top)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_end_flush_with_border() {
        assert_eq!(window_starts(2048, 1024, 512).unwrap(), vec![0, 512, 1024]);
        assert_eq!(window_starts(1300, 1024, 512).unwrap(), vec![0, 276]);
        assert_eq!(window_starts(1024, 1024, 512).unwrap(), vec![0]);
        assert_eq!(window_starts(10, 4, 3).unwrap(), vec![0, 3, 6]);
        assert_eq!(window_starts(11, 4, 3).unwrap(), vec![0, 3, 6, 7]);
    }

    #[test]
    fn window_longer_than_axis_is_rejected() {
        assert!(matches!(
            window_starts(100, 1024, 512),
            Err(Error::InvalidArgument { arg: "crop_size", .. })
        ));
        assert!(matches!(
            window_starts(100, 0, 512),
            Err(Error::InvalidArgument { arg: "crop_size", .. })
        ));
        assert!(matches!(
            window_starts(100, 10, 0),
            Err(Error::InvalidArgument { arg: "stride", .. })
        ));
    }

    #[test]
    fn origins_are_row_major() {
        let params = CropParams {
            crop_size: 4,
            stride: 4,
        };
        let origins = window_origins(8, 6, &params).unwrap();
        assert_eq!(origins, vec![(0, 0), (4, 0), (0, 2), (4, 2)]);
    }

    #[test]
    fn image_smaller_than_window_is_rejected() {
        let params = CropParams {
            crop_size: 16,
            stride: 8,
        };
        let err = window_origins(32, 8, &params).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { arg: "crop_size", .. }));
    }

    #[test]
    fn stem_stops_at_first_dot() {
        assert_eq!(base_stem(Path::new("/data/scene.tile.png")), "scene");
        assert_eq!(base_stem(Path::new("plain")), "plain");
        assert_eq!(patch_file_name("scene", 512, 0), "scene_512_0.png");
    }
}
