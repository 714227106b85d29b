use jpeg_encoder::{ColorType, Encoder};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::{Error, Result};

pub const DEFAULT_QUALITY: u8 = 95;

fn jpeg_dim(arg: &'static str, value: usize) -> Result<u16> {
    u16::try_from(value).map_err(|_| Error::invalid_arg(arg, value))
}

pub fn write_gray_jpeg(output: &Path, cols: usize, rows: usize, data: &[u8]) -> Result<()> {
    let file = File::create(output)?;
    let mut writer = BufWriter::new(file);
    let encoder = Encoder::new(&mut writer, DEFAULT_QUALITY);
    encoder
        .encode(data, jpeg_dim("width", cols)?, jpeg_dim("height", rows)?, ColorType::Luma)
        .map_err(Error::external)?;
    Ok(())
}

pub fn write_rgb_jpeg(output: &Path, cols: usize, rows: usize, rgb_data: &[u8]) -> Result<()> {
    let file = File::create(output)?;
    let mut writer = BufWriter::new(file);
    let encoder = Encoder::new(&mut writer, DEFAULT_QUALITY);
    encoder
        .encode(rgb_data, jpeg_dim("width", cols)?, jpeg_dim("height", rows)?, ColorType::Rgb)
        .map_err(Error::external)?;
    Ok(())
}
