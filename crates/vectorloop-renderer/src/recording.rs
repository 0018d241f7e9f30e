use vectorloop_core::{
    Affine, Color, DrawContext, DrawingSurface, LineCap, LineJoin, Point, SurfaceKind,
};

use crate::render_data::{DrawCommand, PathElement, RenderFrame};

/// Context state saved and restored by `save`/`restore`.
#[derive(Debug, Clone, PartialEq)]
struct CanvasState {
    transform: Affine,
    fill_style: Color,
    stroke_style: Color,
    line_width: f64,
    line_cap: LineCap,
    line_join: LineJoin,
    miter_limit: f64,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            fill_style: Color::BLACK,
            stroke_style: Color::BLACK,
            line_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 10.0,
        }
    }
}

/// An in-memory 2D canvas that records what is drawn on it.
///
/// Paths are transformed into device coordinates as they are built, so the
/// recorded [`RenderFrame`] can be replayed by a frontend without any
/// transform state. A clear that covers the whole surface starts a new
/// frame. Strokes with a fully transparent style are not recorded.
#[derive(Debug, Clone)]
pub struct RecordingCanvas {
    width: f64,
    height: f64,
    kind: SurfaceKind,
    state: CanvasState,
    stack: Vec<CanvasState>,
    path: Vec<PathElement>,
    /// Device-space start of the current subpath, for `close_path`.
    subpath_start: Option<Point>,
    commands: Vec<DrawCommand>,
    sequence: u64,
}

impl RecordingCanvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_kind(width, height, SurfaceKind::Canvas2d)
    }

    /// A canvas that reports itself as `kind`; only `Canvas2d` hands out a
    /// drawing context.
    pub fn with_kind(width: f64, height: f64, kind: SurfaceKind) -> Self {
        Self {
            width,
            height,
            kind,
            state: CanvasState::default(),
            stack: Vec::new(),
            path: Vec::new(),
            subpath_start: None,
            commands: Vec::new(),
            sequence: 0,
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Snapshot of the current frame.
    pub fn frame(&self) -> RenderFrame {
        RenderFrame {
            width: self.width,
            height: self.height,
            sequence: self.sequence,
            commands: self.commands.clone(),
        }
    }

    /// Take the current frame, leaving the command log empty.
    pub fn take_frame(&mut self) -> RenderFrame {
        RenderFrame {
            width: self.width,
            height: self.height,
            sequence: self.sequence,
            commands: std::mem::take(&mut self.commands),
        }
    }

    /// Number of full-surface clears seen so far.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Depth of the save/restore stack.
    pub fn save_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn current_transform(&self) -> Affine {
        self.state.transform
    }

    fn to_device(&self, x: f64, y: f64) -> Point {
        self.state.transform.apply(&Point::new(x, y))
    }

    fn current_path(&self) -> Vec<PathElement> {
        self.path.clone()
    }

    /// True when the device-space rectangle spans the whole surface.
    fn covers_surface(&self, corners: &[Point; 4]) -> bool {
        let axis_aligned = self.state.transform.b.abs() < f64::EPSILON
            && self.state.transform.c.abs() < f64::EPSILON;
        let xs = corners.iter().map(|p| p.x);
        let ys = corners.iter().map(|p| p.y);
        let min_x = xs.clone().fold(f64::INFINITY, f64::min);
        let max_x = xs.fold(f64::NEG_INFINITY, f64::max);
        let min_y = ys.clone().fold(f64::INFINITY, f64::min);
        let max_y = ys.fold(f64::NEG_INFINITY, f64::max);
        axis_aligned
            && min_x <= 0.0
            && min_y <= 0.0
            && max_x >= self.width
            && max_y >= self.height
    }
}

impl DrawContext for RecordingCanvas {
    fn save(&mut self) {
        self.stack.push(self.state.clone());
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
            self.commands.push(DrawCommand::Restore);
        }
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.state.transform = self.state.transform.translate(dx, dy);
    }

    fn rotate(&mut self, radians: f64) {
        self.state.transform = self.state.transform.rotate(radians);
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.state.transform = self.state.transform.scale(sx, sy);
    }

    fn set_fill_style(&mut self, color: Color) {
        self.state.fill_style = color;
    }

    fn set_stroke_style(&mut self, color: Color) {
        self.state.stroke_style = color;
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.state.line_cap = cap;
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.state.line_join = join;
    }

    fn set_miter_limit(&mut self, limit: f64) {
        // Canvas ignores non-positive and non-finite limits.
        if limit.is_finite() && limit > 0.0 {
            self.state.miter_limit = limit;
        }
    }

    fn begin_path(&mut self) {
        self.path.clear();
        self.subpath_start = None;
    }

    fn move_to(&mut self, x: f64, y: f64) {
        let p = self.to_device(x, y);
        self.subpath_start = Some(p);
        self.path.push(PathElement::MoveTo { x: p.x, y: p.y });
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let p = self.to_device(x, y);
        if self.subpath_start.is_none() {
            // A line with no current point starts a subpath.
            self.move_to(x, y);
            return;
        }
        self.path.push(PathElement::LineTo { x: p.x, y: p.y });
    }

    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        if self.subpath_start.is_none() {
            self.move_to(cp1x, cp1y);
        }
        let c1 = self.to_device(cp1x, cp1y);
        let c2 = self.to_device(cp2x, cp2y);
        let to = self.to_device(x, y);
        self.path.push(PathElement::BezierTo { c1, c2, to });
    }

    fn close_path(&mut self) {
        if self.subpath_start.is_some() {
            self.path.push(PathElement::Close);
        }
    }

    fn fill(&mut self) {
        if self.path.is_empty() {
            return;
        }
        self.commands.push(DrawCommand::Fill {
            color: self.state.fill_style,
            path: self.current_path(),
        });
    }

    fn stroke(&mut self) {
        if self.path.is_empty() || self.state.stroke_style.is_transparent() {
            return;
        }
        self.commands.push(DrawCommand::Stroke {
            color: self.state.stroke_style,
            line_width: self.state.line_width,
            line_cap: self.state.line_cap,
            line_join: self.state.line_join,
            miter_limit: self.state.miter_limit,
            path: self.current_path(),
        });
    }

    fn clip(&mut self) {
        self.commands.push(DrawCommand::Clip {
            path: self.current_path(),
        });
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let corners = [
            self.to_device(x, y),
            self.to_device(x + width, y),
            self.to_device(x + width, y + height),
            self.to_device(x, y + height),
        ];
        if self.covers_surface(&corners) {
            // Only the save/restore state survives a full clear.
            let open_saves = self.stack.len();
            self.commands.clear();
            self.commands
                .extend(std::iter::repeat(DrawCommand::Save).take(open_saves));
            self.sequence += 1;
            log::trace!("Canvas cleared, frame {}", self.sequence);
            return;
        }

        let [first, rest @ ..] = corners;
        let mut path = vec![PathElement::MoveTo {
            x: first.x,
            y: first.y,
        }];
        path.extend(rest.iter().map(|p| PathElement::LineTo { x: p.x, y: p.y }));
        path.push(PathElement::Close);
        self.commands.push(DrawCommand::Clear { path });
    }
}

impl DrawingSurface for RecordingCanvas {
    fn kind(&self) -> SurfaceKind {
        self.kind.clone()
    }

    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn context_2d(&mut self) -> Option<&mut dyn DrawContext> {
        if self.kind.is_2d() {
            Some(self)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use vectorloop_core::logo;
    use vectorloop_core::{RenderStatus, ShapeError, Surface, SurfaceError};

    fn fill_points(frame: &RenderFrame) -> Vec<Point> {
        frame
            .fills()
            .flat_map(|(_, path)| path.iter().filter_map(PathElement::end_point))
            .collect()
    }

    #[test]
    fn test_save_restore_state() {
        let mut canvas = RecordingCanvas::new(100.0, 100.0);
        canvas.set_fill_style(Color::WHITE);
        canvas.save();
        canvas.translate(10.0, 0.0);
        canvas.set_fill_style(Color::BLACK);
        canvas.restore();
        canvas.restore();
        assert_eq!(canvas.save_depth(), 0);
        assert_eq!(canvas.current_transform(), Affine::IDENTITY);

        canvas.begin_path();
        canvas.move_to(1.0, 1.0);
        canvas.line_to(2.0, 1.0);
        canvas.fill();
        assert!(matches!(
            canvas.commands().last(),
            Some(DrawCommand::Fill { color, .. }) if *color == Color::WHITE
        ));
    }

    #[test]
    fn test_paths_recorded_in_device_space() {
        let mut canvas = RecordingCanvas::new(100.0, 100.0);
        canvas.scale(2.0, 2.0);
        canvas.begin_path();
        canvas.move_to(1.0, 2.0);
        canvas.bezier_curve_to(3.0, 3.0, 4.0, 4.0, 5.0, 6.0);
        canvas.close_path();
        canvas.fill();

        let frame = canvas.frame();
        let (_, path) = frame.fills().next().unwrap();
        assert_eq!(path[0], PathElement::MoveTo { x: 2.0, y: 4.0 });
        assert_eq!(path[1].end_point(), Some(Point::new(10.0, 12.0)));
        assert_eq!(path[2], PathElement::Close);
    }

    #[test]
    fn test_full_clear_starts_new_frame() {
        let mut canvas = RecordingCanvas::new(50.0, 40.0);
        canvas.begin_path();
        canvas.move_to(0.0, 0.0);
        canvas.fill();
        canvas.clear_rect(0.0, 0.0, 50.0, 40.0);
        assert!(canvas.commands().is_empty());
        assert_eq!(canvas.sequence(), 1);

        canvas.clear_rect(5.0, 5.0, 10.0, 10.0);
        assert!(matches!(canvas.commands()[0], DrawCommand::Clear { .. }));
        assert_eq!(canvas.sequence(), 1);
    }

    #[test]
    fn test_transparent_stroke_not_recorded() {
        let mut canvas = RecordingCanvas::new(10.0, 10.0);
        canvas.set_stroke_style(Color::TRANSPARENT);
        canvas.begin_path();
        canvas.move_to(0.0, 0.0);
        canvas.line_to(5.0, 5.0);
        canvas.stroke();
        assert!(canvas.commands().is_empty());

        canvas.set_stroke_style(Color::BLACK);
        canvas.set_miter_limit(-1.0);
        canvas.stroke();
        assert!(matches!(
            canvas.commands()[0],
            DrawCommand::Stroke { miter_limit, .. } if miter_limit == 10.0
        ));
    }

    #[test]
    fn test_non_canvas_kind_rejected() {
        let canvas = RecordingCanvas::with_kind(10.0, 10.0, SurfaceKind::Other("img".into()));
        assert!(matches!(
            Surface::new(canvas),
            Err(SurfaceError::InvalidSurfaceKind { .. })
        ));
    }

    #[test]
    fn test_logo_frame() {
        let surface = Surface::with_logo(RecordingCanvas::new(180.0, 180.0)).unwrap();
        surface.set_rotation(0.0);
        assert_eq!(
            surface.render().unwrap(),
            RenderStatus::Rendered { painted: 3, skipped: 0 }
        );

        let frame = surface.with_target(RecordingCanvas::frame);
        assert_eq!(frame.sequence, 1);
        assert!(matches!(frame.commands[0], DrawCommand::Save));
        assert!(matches!(frame.commands[1], DrawCommand::Clip { .. }));
        assert!(matches!(frame.commands.last(), Some(DrawCommand::Restore)));

        let colors: Vec<Color> = frame.fills().map(|(c, _)| *c).collect();
        assert_eq!(
            colors,
            vec![
                logo::GRAY_DISC.fill,
                logo::WHITE_DISC.fill,
                logo::Z_GLYPH.fill,
                logo::STRIPE.fill,
            ]
        );
        // Logo strokes use the transparent baseline style.
        assert!(!frame
            .commands
            .iter()
            .any(|c| matches!(c, DrawCommand::Stroke { .. })));

        let bb = frame.fill_bounds().unwrap();
        assert!(bb.max.x <= 142.5 && bb.max.y <= 142.5);
    }

    #[test]
    fn test_each_render_replaces_frame() {
        let surface = Surface::with_logo(RecordingCanvas::new(180.0, 180.0)).unwrap();
        surface.render().unwrap();
        let first = surface.with_target(RecordingCanvas::frame);
        surface.render().unwrap();
        let second = surface.with_target(RecordingCanvas::frame);
        assert_eq!(second.sequence, 2);
        assert_eq!(first.commands, second.commands);
        surface.with_target(|canvas| assert_eq!(canvas.save_depth(), 0));
    }

    #[test]
    fn test_failed_frames_leave_canvas_clean() {
        let surface = Surface::with_logo(RecordingCanvas::new(180.0, 180.0)).unwrap();
        surface.set_rotation(0.0);
        surface.render().unwrap();
        let clean = surface.with_target(RecordingCanvas::frame);

        surface
            .builder()
            .add("scaled_error", |ctx| {
                ctx.save();
                ctx.scale(3.0, 3.0);
                Err(ShapeError::failed("gave up"))
            })
            .add("scaled_panic", |ctx| {
                ctx.save();
                ctx.scale(3.0, 3.0);
                panic!("shape exploded")
            });
        for name in ["scaled_error", "scaled_panic"] {
            surface.enable(name);
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| surface.render()));
            assert!(!matches!(outcome, Ok(Ok(_))));
            surface.disable(name);
            surface.with_target(|canvas| {
                assert_eq!(canvas.save_depth(), 0);
                assert_eq!(canvas.current_transform(), Affine::IDENTITY);
            });

            surface.render().unwrap();
            let frame = surface.with_target(RecordingCanvas::frame);
            assert_eq!(fill_points(&frame), fill_points(&clean));
        }
    }

    #[test]
    fn test_rotation_90_about_center() {
        let render = |degrees: f64| {
            let surface = Surface::with_logo(RecordingCanvas::new(200.0, 160.0)).unwrap();
            surface.set_rotation(degrees);
            surface.render().unwrap();
            surface.into_target().take_frame()
        };
        let straight = fill_points(&render(0.0));
        let turned = fill_points(&render(90.0));
        assert_eq!(straight.len(), turned.len());

        let quarter = Affine::IDENTITY.rotate_about(Point::new(100.0, 80.0), 90f64.to_radians());
        for (s, t) in straight.iter().zip(&turned) {
            assert!(quarter.apply(s).distance_to(t) < 1e-9);
        }
    }

    #[test]
    fn test_frame_json_roundtrip() {
        let surface = Surface::with_logo(RecordingCanvas::new(180.0, 180.0)).unwrap();
        surface.render().unwrap();
        let frame = surface.with_target(RecordingCanvas::frame);
        let parsed = RenderFrame::from_json(&frame.to_json().unwrap()).unwrap();
        assert_eq!(parsed.commands.len(), frame.commands.len());
        assert_eq!(parsed.sequence, frame.sequence);
    }
}
