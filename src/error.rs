use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the editor core, the image store and configuration loading.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid color '{0}'")]
    InvalidColor(String),

    #[error("Image not found: {}", .0.display())]
    ImageNotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
