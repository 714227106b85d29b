#![doc = r#"
qytools — small image and dataset utilities.

This crate bundles the helpers used when preparing image datasets: a bounded
parallel mapper that collects failing inputs instead of aborting, grid
composition with alpha blending, fixed-size sliding-window crops, palette and
label-map conversion, and per-channel statistics over a folder of images. It
powers the `qytools` CLI and can be embedded in your own Rust applications.

Add dependency
--------------
```toml
[dependencies]
qytools = "0.1"
```

Parallel map with per-item error collection
-------------------------------------------
```rust
use qytools::multipool;

fn main() -> qytools::Result<()> {
    let report = multipool(
        |x: &u32| if *x == 3 { Err(format!("cannot handle {x}")) } else { Ok(()) },
        vec![1, 2, 3, 4, 5],
        2,
    )?;

    assert_eq!(report.completed, 5);
    assert_eq!(report.into_failed_args(), vec![3]);
    Ok(())
}
```

A worker count of zero is rejected before any task runs:

```rust
use qytools::{multipool, Error};

let err = multipool(|_: &u8| Ok::<(), String>(()), vec![1], 0).unwrap_err();
assert!(matches!(err, Error::InvalidConfiguration { .. }));
```

Crop a folder of images
-----------------------
```rust,no_run
use std::path::Path;
use qytools::{crop_dir, CropParams, Multipool, DEFAULT_WORKERS};

fn main() -> qytools::Result<()> {
    let pool = Multipool::new(DEFAULT_WORKERS)?;
    let report = crop_dir(
        Path::new("/data/scenes"),
        Path::new("/data/patches"),
        &CropParams { crop_size: 1024, stride: 512 },
        &pool,
    )?;
    for path in report.failed_args() {
        eprintln!("failed: {}", path.display());
    }
    Ok(())
}
```

Compose a grid
--------------
```rust,no_run
use std::path::Path;
use qytools::{combine_images, CellSource};

fn main() -> qytools::Result<()> {
    // 1 row x 3 columns: image, label, image blended with label.
    combine_images(
        &["img.png", "label.png"],
        (512, 512),
        Path::new("grid.png"),
        (1, 3),
        Some(vec![
            CellSource::paste(0),
            CellSource::paste(1),
            CellSource::blend(0, 1),
        ]),
        0.25,
    )
}
```

Channel statistics
------------------
```rust,no_run
use std::path::Path;
use qytools::{compute_rgb_stats, compute_rgb_stats_batched, StatsDevice};

fn main() -> qytools::Result<()> {
    let cpu = compute_rgb_stats(Path::new("/data/train"), 8)?;
    let batched = compute_rgb_stats_batched(Path::new("/data/train"), StatsDevice::Auto, 16)?;
    println!("{:?} {:?}", cpu.means(), batched.stds());
    Ok(())
}
```

Error handling
--------------
All public functions return `qytools::Result<T>`. Inside a mapper batch, task
errors never escape: they are collected as `TaskFailure` records in the
returned `PoolReport`.

Useful modules
--------------
- [`api`] — high-level, path-based entry points.
- [`core::pool`](crate::core::pool) — the bounded parallel mapper and progress sinks.
- [`core::processing`](crate::core::processing) — in-memory blend, grid, crop, palette and stats primitives.
- [`io`] — codec adapters and writers.
- [`error`] — crate-level `Error`, `Result` and `TaskFailure`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use crate::core::params::{CellSource, Config, CropParams, GridParams, StatsParams};
pub use crate::error::{Error, Result, TaskFailure};
pub use crate::types::{Channel, OutputFormat, StatsDevice};

// Parallel mapper
pub use crate::core::args::{into_pairs, multipool_path_args};
pub use crate::core::pool::{
    DEFAULT_WORKERS, LineSink, Multipool, PoolReport, PoolSummary, ProgressSink, SilentSink,
    TracingSink, WORKER_THREAD_PREFIX, multipool, run_scoped,
};

// Processing primitives
pub use crate::core::processing::palette::{BINARY_PALETTE, IndexedImage};
pub use crate::core::processing::stats::{ChannelStats, RgbStats};

// High-level API re-exports
pub use crate::api::{
    array2img, array2img_from_i64, combine_images, combine_images_with, compute_rgb_stats,
    compute_rgb_stats_batched, compute_rgb_stats_with, crop_dir, crop_img, crop_img_with,
    labels_to_rgb_path, list_images, write_stats_json,
};
pub use crate::io::writers::json::{create_sidecar, write_json_report};
