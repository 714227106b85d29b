//! I/O layer: image decode/encode through the `image` codec plus `writers`
//! for JPEG output, indexed PNGs and JSON sidecars.
pub mod codec;
pub use codec::{array_to_rgb, list_images, open_rgb, rgb_to_array, save_image, save_rgb};

pub mod writers;
