pub mod blend;
pub mod crop;
pub mod grid;
pub mod palette;
pub mod resize;
pub mod stats;
