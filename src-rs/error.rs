use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("pixel buffer length mismatch: expected {expected} bytes for {width}x{height}, got {actual}")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Drawing or allocation failed on the raster backend.
    #[error("render failed: {0}")]
    Render(String),
}
