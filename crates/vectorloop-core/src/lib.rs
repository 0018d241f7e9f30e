//! # Vectorloop Core
//!
//! Named vector shapes painted onto a 2D drawing surface. A [`Surface`] owns
//! the shape registry, the ordered set of enabled shapes and a rotation, and
//! renders them through a fixed logical canvas (clip, scale, rotation about
//! the surface centre).
//!
//! Drawing targets plug in through the [`DrawingSurface`] and [`DrawContext`]
//! traits; see `vectorloop-renderer` for a recording implementation.

pub mod color;
pub mod context;
pub mod error;
pub mod geometry;
pub mod logo;
pub mod shape;
pub mod surface;
pub mod viewport;

pub use color::Color;
pub use context::{DrawContext, DrawingSurface, LineCap, LineJoin, SurfaceKind};
pub use error::{ShapeError, SurfaceError};
pub use geometry::{Affine, BBox, Point};
pub use shape::{procedure, PathShape, ShapeProcedure, ShapeRegistry};
pub use surface::{RenderStatus, ShapeBuilder, Surface, DEFAULT_ROTATION_DEGREES};
pub use viewport::{LogicalCanvas, LOGICAL_CANVAS_SIZE, LOGICAL_SCALE, MITER_LIMIT};
