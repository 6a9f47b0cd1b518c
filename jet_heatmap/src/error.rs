//! Error types for heatmap accumulation.

use thiserror::Error;

/// Every failure the library can report. The C entry points log these and
/// still return a color; the Rust API surfaces them.
#[derive(Error, Debug)]
pub enum HeatmapError {
    #[error("invalid value range: min {min} must be finite and below max {max}")]
    InvalidRange { min: f32, max: f32 },

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("cell ({row}, {col}) lies outside the {columns}x{rows} grid")]
    CellOutOfBounds {
        row: i32,
        col: i32,
        columns: u32,
        rows: u32,
    },

    #[error("cell ({row}, {col}) was already received in this session")]
    DuplicateCell { row: i32, col: i32 },

    #[error("session is already finalized; reset it before sending more cells")]
    AlreadyFinalized,

    #[error("invalid smoothing kernel {width}x{height} (sigma {sigma_x}, {sigma_y}): {reason}")]
    InvalidKernel {
        width: u32,
        height: u32,
        sigma_x: f64,
        sigma_y: f64,
        reason: &'static str,
    },

    #[error("unknown session handle {0}")]
    UnknownSession(u64),

    #[error("session service is no longer running")]
    ServiceClosed,

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),

    #[cfg(feature = "opencv")]
    #[error("opencv error: {0}")]
    OpenCv(#[from] opencv::Error),
}

pub type Result<T> = std::result::Result<T, HeatmapError>;
