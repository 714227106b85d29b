use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::{Error, Result};

/// Write a single-band indexed PNG with the given RGB palette.
pub fn write_indexed_png(
    output: &Path,
    cols: usize,
    rows: usize,
    indices: &[u8],
    palette: &[u8],
) -> Result<()> {
    let width = u32::try_from(cols).map_err(|_| Error::invalid_arg("width", cols))?;
    let height = u32::try_from(rows).map_err(|_| Error::invalid_arg("height", rows))?;
    if indices.len() != cols * rows {
        return Err(Error::invalid_arg("indices", indices.len()));
    }

    let file = File::create(output)?;
    let writer = BufWriter::new(file);
    let mut encoder = png::Encoder::new(writer, width, height);
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_palette(palette.to_vec());
    let mut writer = encoder.write_header()?;
    writer.write_image_data(indices)?;
    writer.finish()?;
    Ok(())
}
