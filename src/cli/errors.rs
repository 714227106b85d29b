use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid cell spec: {cell}. Expected an image index like '0' or a blend like '0+1'")]
    InvalidCell { cell: String },

    #[error(transparent)]
    Lib(#[from] qytools::Error),
}
