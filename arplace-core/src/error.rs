//! Error types for the placement pipeline.
//!
//! Only [`ArError`] ever reaches the user. Tracking gaps and ground misses
//! are ordinary `Option::None` results, and [`GeometryError`] is logged by
//! the frame loop and swallowed.

use thiserror::Error;

/// Result type for operations that can surface to the user.
pub type ArResult<T> = Result<T, ArError>;

/// User-visible failures. Both are terminal.
#[derive(Debug, Error)]
pub enum ArError {
    /// The host cannot run an immersive AR session.
    #[error("immersive AR is not supported: {0}")]
    UnsupportedEnvironment(String),

    /// Shader compilation, program linking or buffer setup failed.
    #[error("render setup failed: {0}")]
    Setup(String),
}

/// Failures while turning a screen point into a world-space ray.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    /// `projection * view` (or the view itself) has no inverse.
    #[error("view-projection matrix is singular")]
    SingularMatrix,

    /// The unprojected point coincides with the ray origin or is not finite.
    #[error("unprojected point does not define a ray direction")]
    DegenerateRay,
}
