use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::color::Color;
use crate::context::DrawContext;
use crate::error::ShapeError;
use crate::geometry::{BBox, Point};

/// A named paint routine for one shape.
///
/// Procedures paint with their own styling and must leave the context's
/// save/restore stack balanced.
pub type ShapeProcedure =
    Arc<dyn Fn(&mut dyn DrawContext) -> Result<(), ShapeError> + Send + Sync>;

/// Wrap a closure as a [`ShapeProcedure`].
pub fn procedure<F>(f: F) -> ShapeProcedure
where
    F: Fn(&mut dyn DrawContext) -> Result<(), ShapeError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A closed, filled outline made of cubic Bézier segments.
///
/// Each segment is `[cp1x, cp1y, cp2x, cp2y, x, y]` in logical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathShape {
    pub fill: Color,
    pub start: Point,
    pub curves: &'static [[f64; 6]],
}

impl PathShape {
    /// Paint the outline: fill with `self.fill`, then stroke with the
    /// context's current stroke style.
    pub fn paint(&self, ctx: &mut dyn DrawContext) {
        ctx.save();
        ctx.set_fill_style(self.fill);
        ctx.begin_path();
        ctx.move_to(self.start.x, self.start.y);
        for &[c1x, c1y, c2x, c2y, x, y] in self.curves {
            ctx.bezier_curve_to(c1x, c1y, c2x, c2y, x, y);
        }
        ctx.close_path();
        ctx.fill();
        ctx.stroke();
        ctx.restore();
    }

    /// Bounding box of the end and control points.
    pub fn control_bbox(&self) -> Option<BBox> {
        let mut points = vec![self.start];
        for &[c1x, c1y, c2x, c2y, x, y] in self.curves {
            points.push(Point::new(c1x, c1y));
            points.push(Point::new(c2x, c2y));
            points.push(Point::new(x, y));
        }
        BBox::from_points(&points)
    }

    pub fn into_procedure(self) -> ShapeProcedure {
        procedure(move |ctx| {
            self.paint(ctx);
            Ok(())
        })
    }
}

/// Name → procedure mapping. Re-registering a name replaces its procedure.
#[derive(Default, Clone)]
pub struct ShapeRegistry {
    shapes: HashMap<String, ShapeProcedure>,
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `procedure` under `name`, returning the one it replaced.
    pub fn insert(&mut self, name: &str, procedure: ShapeProcedure) -> Option<ShapeProcedure> {
        self.shapes.insert(name.to_string(), procedure)
    }

    pub fn remove(&mut self, name: &str) -> Option<ShapeProcedure> {
        self.shapes.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&ShapeProcedure> {
        self.shapes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.shapes.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.shapes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl fmt::Debug for ShapeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeRegistry")
            .field("shapes", &self.names())
            .finish()
    }
}
