pub mod jpeg;
pub mod json;
pub mod png;
