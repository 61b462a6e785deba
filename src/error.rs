use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Detection deserialization error: {0}")]
    Deserialization(#[from] bincode::Error),

    #[error("Invalid face {index}: {reason}")]
    InvalidFace { index: usize, reason: String },

    #[error("Pixel buffer of {len} bytes does not match {width}x{height} RGBA")]
    InvalidPixelBuffer { len: usize, width: u32, height: u32 },

    #[error("Detector error: {0}")]
    Detector(String),

    #[error("Detector handle poisoned by a panicked analysis")]
    DetectorPoisoned,

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
