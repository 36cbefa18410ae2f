use thiserror::Error;

/// Rejected generation parameters. Raised before any grid is allocated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("grid size must be at least 1")]
    ZeroSize,
    #[error("noise scale must be positive, got {0}")]
    NonPositiveScale(f32),
    #[error("octaves must be at least 1")]
    ZeroOctaves,
    #[error("lacunarity must be positive, got {0}")]
    InvalidLacunarity(f32),
    #[error("{field} must lie in [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f32 },
    #[error("{field} must be finite")]
    NonFinite { field: &'static str },
}

pub type Result<T> = std::result::Result<T, ParamError>;
