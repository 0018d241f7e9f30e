use thiserror::Error;

use crate::context::SurfaceKind;

/// Errors raised by a [`Surface`](crate::Surface).
#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("Expected a 2D canvas surface, got: \"{found}\"")]
    InvalidSurfaceKind { found: SurfaceKind },

    #[error("Surface did not provide a 2D drawing context")]
    ContextUnavailable,

    #[error("Shape '{name}' failed to draw: {source}")]
    Shape {
        name: String,
        #[source]
        source: ShapeError,
    },
}

/// Errors a shape procedure may return while painting.
#[derive(Error, Debug)]
pub enum ShapeError {
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Nested(#[from] Box<SurfaceError>),
}

impl ShapeError {
    pub fn failed(message: impl Into<String>) -> Self {
        ShapeError::Failed(message.into())
    }
}

impl From<SurfaceError> for ShapeError {
    fn from(err: SurfaceError) -> Self {
        ShapeError::Nested(Box::new(err))
    }
}
