use serde::{Deserialize, Serialize};

use vectorloop_core::{BBox, Color, LineCap, LineJoin, Point};

/// One path segment, already in device coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PathElement {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    BezierTo { c1: Point, c2: Point, to: Point },
    Close,
}

impl PathElement {
    /// End point of the segment, `None` for `Close`.
    pub fn end_point(&self) -> Option<Point> {
        match self {
            PathElement::MoveTo { x, y } | PathElement::LineTo { x, y } => {
                Some(Point::new(*x, *y))
            }
            PathElement::BezierTo { to, .. } => Some(*to),
            PathElement::Close => None,
        }
    }
}

/// A recorded drawing operation. Transforms are already applied, so a
/// frontend replays these on an untransformed 2D context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Save,
    Restore,
    /// Clear the area inside `path` to transparent.
    Clear { path: Vec<PathElement> },
    /// Intersect the clip region with `path`.
    Clip { path: Vec<PathElement> },
    Fill { color: Color, path: Vec<PathElement> },
    Stroke {
        color: Color,
        line_width: f64,
        line_cap: LineCap,
        line_join: LineJoin,
        miter_limit: f64,
        path: Vec<PathElement>,
    },
}

/// Everything drawn since the surface was last fully cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub width: f64,
    pub height: f64,
    /// Number of full clears the surface has seen; one per rendered frame.
    pub sequence: u64,
    pub commands: Vec<DrawCommand>,
}

impl RenderFrame {
    pub fn empty(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            sequence: 0,
            commands: Vec::new(),
        }
    }

    /// Fill commands in paint order.
    pub fn fills(&self) -> impl Iterator<Item = (&Color, &[PathElement])> {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::Fill { color, path } => Some((color, path.as_slice())),
            _ => None,
        })
    }

    /// Bounding box of every filled end point.
    pub fn fill_bounds(&self) -> Option<BBox> {
        let points: Vec<Point> = self
            .fills()
            .flat_map(|(_, path)| path.iter().filter_map(PathElement::end_point))
            .collect();
        BBox::from_points(&points)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_json_shape() {
        let cmd = DrawCommand::Fill {
            color: Color::rgb(0, 0xad, 0xde),
            path: vec![PathElement::MoveTo { x: 1.0, y: 2.0 }, PathElement::Close],
        };
        let value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(value["op"], "fill");
        assert_eq!(value["path"][0]["type"], "move_to");
        assert_eq!(value["path"][1]["type"], "close");
        assert_eq!(value["color"]["b"], 0xde);
    }

    #[test]
    fn test_fill_bounds() {
        let mut frame = RenderFrame::empty(100.0, 100.0);
        assert!(frame.fill_bounds().is_none());
        frame.commands.push(DrawCommand::Fill {
            color: Color::BLACK,
            path: vec![
                PathElement::MoveTo { x: 10.0, y: 5.0 },
                PathElement::BezierTo {
                    c1: Point::new(90.0, 90.0),
                    c2: Point::new(0.0, 0.0),
                    to: Point::new(30.0, 40.0),
                },
                PathElement::Close,
            ],
        });
        let bb = frame.fill_bounds().unwrap();
        assert_eq!(bb.min, Point::new(10.0, 5.0));
        assert_eq!(bb.max, Point::new(30.0, 40.0));
    }
}
