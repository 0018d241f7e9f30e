//! # Vectorloop Renderer
//!
//! A recording 2D canvas for Vectorloop surfaces. [`RecordingCanvas`]
//! implements the core drawing traits, resolves the canvas state stack
//! (transforms, styles) as commands arrive, and keeps the current frame as
//! JSON-serializable [`RenderFrame`] data that a frontend 2D canvas replays.

pub mod recording;
pub mod render_data;

pub use recording::RecordingCanvas;
pub use render_data::{DrawCommand, PathElement, RenderFrame};
