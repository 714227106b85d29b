//! Argument construction for the parallel mapper: combine image names with a
//! list of directories into per-task path tuples.
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Build one argument per image name.
///
/// With `join`, each argument is `[dir_1/name, dir_2/name, ...]`; without it,
/// `[name, dir_1, dir_2, ...]`. At least one directory is required.
pub fn multipool_path_args<N, D>(
    image_names: &[N],
    dirs: &[D],
    join: bool,
) -> Result<Vec<Vec<PathBuf>>>
where
    N: AsRef<Path>,
    D: AsRef<Path>,
{
    if dirs.is_empty() {
        return Err(Error::invalid_config(
            "at least one directory is required to build path arguments",
        ));
    }

    let args = image_names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            if join {
                dirs.iter().map(|d| d.as_ref().join(name)).collect()
            } else {
                std::iter::once(name.to_path_buf())
                    .chain(dirs.iter().map(|d| d.as_ref().to_path_buf()))
                    .collect()
            }
        })
        .collect();

    Ok(args)
}

/// Convert path arguments into fixed two-element tuples.
pub fn into_pairs(args: Vec<Vec<PathBuf>>) -> Result<Vec<(PathBuf, PathBuf)>> {
    args.into_iter()
        .enumerate()
        .map(|(i, arg)| {
            let arity = arg.len();
            let mut it = arg.into_iter();
            match (it.next(), it.next(), it.next()) {
                (Some(a), Some(b), None) => Ok((a, b)),
                _ => Err(Error::invalid_config(format!(
                    "argument {} has {} elements, expected 2",
                    i, arity
                ))),
            }
        })
        .collect()
}
