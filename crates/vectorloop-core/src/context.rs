//! Drawing capabilities consumed by the renderer and by shape procedures.
//!
//! The surface handle ([`DrawingSurface`]) hands out a 2D context
//! ([`DrawContext`]) that follows canvas semantics: a save/restore state stack
//! holding the current transform, styles and clip; path construction in the
//! current transform; fill/stroke of the current path.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// The kind of target a surface handle refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceKind {
    /// A rectangular surface with a 2D drawing context.
    Canvas2d,
    /// Anything else, named by the host (e.g. `"div"`, `"webgl"`).
    Other(String),
}

impl SurfaceKind {
    pub fn is_2d(&self) -> bool {
        matches!(self, SurfaceKind::Canvas2d)
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceKind::Canvas2d => f.write_str("canvas"),
            SurfaceKind::Other(name) => f.write_str(&name.to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// A 2D drawing context.
///
/// Path coordinates are interpreted in the transform current at the time
/// they are added. `restore` on an empty state stack does nothing.
pub trait DrawContext {
    // ── State stack ──────────────────────────────────────────────────

    fn save(&mut self);
    fn restore(&mut self);

    // ── Transforms ───────────────────────────────────────────────────

    fn translate(&mut self, dx: f64, dy: f64);
    /// Rotate clockwise by `radians`.
    fn rotate(&mut self, radians: f64);
    fn scale(&mut self, sx: f64, sy: f64);

    // ── Styles ───────────────────────────────────────────────────────

    fn set_fill_style(&mut self, color: Color);
    fn set_stroke_style(&mut self, color: Color);
    fn set_line_cap(&mut self, cap: LineCap);
    fn set_line_join(&mut self, join: LineJoin);
    fn set_miter_limit(&mut self, limit: f64);

    // ── Paths ────────────────────────────────────────────────────────

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64);
    fn close_path(&mut self);

    // ── Painting ─────────────────────────────────────────────────────

    fn fill(&mut self);
    fn stroke(&mut self);
    /// Intersect the clip region with the current path.
    fn clip(&mut self);
    /// Clear a rectangle to transparent, in the current transform.
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
}

/// A handle to a drawing target with fixed dimensions.
pub trait DrawingSurface {
    fn kind(&self) -> SurfaceKind;

    /// Width in device-independent pixels.
    fn width(&self) -> f64;

    /// Height in device-independent pixels.
    fn height(&self) -> f64;

    /// The 2D context, or `None` if the target cannot provide one.
    fn context_2d(&mut self) -> Option<&mut dyn DrawContext>;
}
