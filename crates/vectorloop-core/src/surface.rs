use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::color::Color;
use crate::context::{DrawContext, DrawingSurface, LineCap, LineJoin};
use crate::error::{ShapeError, SurfaceError};
use crate::logo;
use crate::shape::{ShapeProcedure, ShapeRegistry};
use crate::viewport::{LogicalCanvas, MITER_LIMIT};

/// Rotation applied to a fresh surface, in degrees.
pub const DEFAULT_ROTATION_DEGREES: f64 = 1.0;

/// Outcome of a [`Surface::render`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// A full pass ran. `skipped` counts enabled names with no procedure.
    Rendered { painted: usize, skipped: usize },
    /// Another render was in flight; this frame was dropped.
    Dropped,
}

#[derive(Debug)]
struct SurfaceState {
    shapes: ShapeRegistry,
    /// Paint order, no duplicates.
    enabled: Vec<String>,
    rotation_degrees: f64,
}

/// Held for the duration of one render pass; releases on drop, including
/// early returns and unwinding.
struct RenderGuard<'a>(&'a AtomicBool);

impl<'a> RenderGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| RenderGuard(flag))
    }
}

impl Drop for RenderGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A drawing surface plus the named shapes painted onto it.
///
/// All methods take `&self`, so a surface can be shared (e.g. in an `Arc`)
/// between a tick loop and the code toggling shapes. Overlapping calls to
/// [`render`](Self::render) drop frames instead of nesting.
pub struct Surface<S> {
    width: f64,
    height: f64,
    canvas: LogicalCanvas,
    target: Mutex<S>,
    state: Mutex<SurfaceState>,
    render_lock: AtomicBool,
}

impl<S: DrawingSurface> Surface<S> {
    /// Bind to `target`. Fails unless the target is a 2D canvas.
    pub fn new(target: S) -> Result<Self, SurfaceError> {
        let kind = target.kind();
        if !kind.is_2d() {
            return Err(SurfaceError::InvalidSurfaceKind { found: kind });
        }
        let width = target.width();
        let height = target.height();
        log::debug!("Surface bound: {}x{}", width, height);

        Ok(Self {
            width,
            height,
            canvas: LogicalCanvas::new(width, height),
            target: Mutex::new(target),
            state: Mutex::new(SurfaceState {
                shapes: ShapeRegistry::new(),
                enabled: Vec::new(),
                rotation_degrees: DEFAULT_ROTATION_DEGREES,
            }),
            render_lock: AtomicBool::new(false),
        })
    }

    /// Bind to `target` with the logo shapes registered and the default
    /// set enabled.
    pub fn with_logo(target: S) -> Result<Self, SurfaceError> {
        let surface = Self::new(target)?;
        {
            let builder = surface.builder();
            for (name, procedure) in logo::shapes() {
                builder.add_procedure(name, procedure);
            }
        }
        for name in logo::DEFAULT_ENABLED {
            surface.enable(name);
        }
        Ok(surface)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn canvas(&self) -> LogicalCanvas {
        self.canvas
    }

    // ── Shape registry ───────────────────────────────────────────────

    pub fn builder(&self) -> ShapeBuilder<'_, S> {
        ShapeBuilder { surface: self }
    }

    pub fn registered_names(&self) -> Vec<String> {
        self.lock_state()
            .shapes
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    // ── Enabled set ──────────────────────────────────────────────────

    /// Append `name` to the paint order unless it is already enabled. The
    /// name does not have to be registered yet.
    pub fn enable(&self, name: &str) {
        let mut state = self.lock_state();
        if !state.enabled.iter().any(|n| n == name) {
            state.enabled.push(name.to_string());
        }
    }

    pub fn disable(&self, name: &str) {
        let mut state = self.lock_state();
        if let Some(index) = state.enabled.iter().position(|n| n == name) {
            state.enabled.remove(index);
        }
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.lock_state().enabled.iter().any(|n| n == name)
    }

    pub fn enabled_names(&self) -> Vec<String> {
        self.lock_state().enabled.clone()
    }

    // ── Rotation ─────────────────────────────────────────────────────

    pub fn rotation(&self) -> f64 {
        self.lock_state().rotation_degrees
    }

    /// Store the rotation in degrees. Not range-checked.
    pub fn set_rotation(&self, degrees: f64) {
        self.lock_state().rotation_degrees = degrees;
    }

    // ── Rendering ────────────────────────────────────────────────────

    pub fn is_rendering(&self) -> bool {
        self.render_lock.load(Ordering::Acquire)
    }

    /// Clear the surface and paint every enabled shape, in order, rotated
    /// about the surface centre.
    ///
    /// If a shape procedure fails, the remaining shapes are not painted, the
    /// context is restored and the error is returned. Saves a procedure
    /// leaves open are popped when the frame ends, also when it panics.
    pub fn render(&self) -> Result<RenderStatus, SurfaceError> {
        let Some(_guard) = RenderGuard::try_acquire(&self.render_lock) else {
            log::trace!("Render already in progress, dropping frame");
            return Ok(RenderStatus::Dropped);
        };

        // Snapshot so procedures can touch the registry without deadlocking.
        let (rotation, queue) = {
            let state = self.lock_state();
            let queue: Vec<(String, Option<ShapeProcedure>)> = state
                .enabled
                .iter()
                .map(|name| (name.clone(), state.shapes.get(name).cloned()))
                .collect();
            (state.rotation_degrees, queue)
        };

        let mut target = self.target.lock().unwrap_or_else(PoisonError::into_inner);
        let ctx = target
            .context_2d()
            .ok_or(SurfaceError::ContextUnavailable)?;

        let mut frame = FrameContext::new(ctx);
        frame.clear_rect(0.0, 0.0, self.width, self.height);
        self.begin_frame(&mut frame, rotation);
        let painted = paint_shapes(&mut frame, &queue);
        drop(frame);

        let painted = painted?;
        Ok(RenderStatus::Rendered {
            painted,
            skipped: queue.len() - painted,
        })
    }

    /// Run `f` with the bound target, e.g. to read back what was drawn.
    pub fn with_target<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let target = self.target.lock().unwrap_or_else(PoisonError::into_inner);
        f(&target)
    }

    pub fn into_target(self) -> S {
        self.target
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Save, rotate about the centre, clip to the logical canvas, scale and
    /// set the baseline stroke style. Undone when the frame context drops.
    fn begin_frame(&self, ctx: &mut dyn DrawContext, rotation_degrees: f64) {
        let center = self.canvas.center();
        let side = self.canvas.clip_size;

        ctx.save();
        ctx.translate(center.x, center.y);
        ctx.rotate(rotation_degrees.to_radians());
        ctx.translate(-center.x, -center.y);

        ctx.begin_path();
        ctx.move_to(0.0, 0.0);
        ctx.line_to(side, 0.0);
        ctx.line_to(side, side);
        ctx.line_to(0.0, side);
        ctx.close_path();
        ctx.clip();
        ctx.scale(self.canvas.scale, self.canvas.scale);

        ctx.set_stroke_style(Color::TRANSPARENT);
        ctx.set_line_cap(LineCap::Butt);
        ctx.set_line_join(LineJoin::Miter);
        ctx.set_miter_limit(MITER_LIMIT);
    }

    fn lock_state(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The target context for one frame. Counts the saves opened through it
/// and pops the ones still open when dropped, so a failing or panicking
/// procedure cannot leak transforms or clips into later frames. Restores
/// beyond the frame's own saves are ignored.
struct FrameContext<'a> {
    inner: &'a mut dyn DrawContext,
    depth: usize,
}

impl<'a> FrameContext<'a> {
    fn new(inner: &'a mut dyn DrawContext) -> Self {
        Self { inner, depth: 0 }
    }
}

impl Drop for FrameContext<'_> {
    fn drop(&mut self) {
        if self.depth > 1 {
            log::debug!("Frame ended with {} unbalanced saves", self.depth - 1);
        }
        while self.depth > 0 {
            self.inner.restore();
            self.depth -= 1;
        }
    }
}

impl DrawContext for FrameContext<'_> {
    fn save(&mut self) {
        self.depth += 1;
        self.inner.save();
    }

    fn restore(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
            self.inner.restore();
        }
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.inner.translate(dx, dy);
    }

    fn rotate(&mut self, radians: f64) {
        self.inner.rotate(radians);
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.inner.scale(sx, sy);
    }

    fn set_fill_style(&mut self, color: Color) {
        self.inner.set_fill_style(color);
    }

    fn set_stroke_style(&mut self, color: Color) {
        self.inner.set_stroke_style(color);
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.inner.set_line_cap(cap);
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.inner.set_line_join(join);
    }

    fn set_miter_limit(&mut self, limit: f64) {
        self.inner.set_miter_limit(limit);
    }

    fn begin_path(&mut self) {
        self.inner.begin_path();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.inner.move_to(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.inner.line_to(x, y);
    }

    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        self.inner.bezier_curve_to(cp1x, cp1y, cp2x, cp2y, x, y);
    }

    fn close_path(&mut self) {
        self.inner.close_path();
    }

    fn fill(&mut self) {
        self.inner.fill();
    }

    fn stroke(&mut self) {
        self.inner.stroke();
    }

    fn clip(&mut self) {
        self.inner.clip();
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.inner.clear_rect(x, y, width, height);
    }
}

/// Paint the queue in order; returns how many procedures ran.
fn paint_shapes(
    ctx: &mut dyn DrawContext,
    queue: &[(String, Option<ShapeProcedure>)],
) -> Result<usize, SurfaceError> {
    let mut painted = 0;
    for (name, procedure) in queue {
        let Some(procedure) = procedure else {
            log::trace!("Shape '{}' is enabled but not registered, skipping", name);
            continue;
        };
        procedure(ctx).map_err(|source| SurfaceError::Shape {
            name: name.clone(),
            source,
        })?;
        painted += 1;
    }
    Ok(painted)
}

/// Registers and removes shape procedures on a [`Surface`].
pub struct ShapeBuilder<'a, S> {
    surface: &'a Surface<S>,
}

impl<S: DrawingSurface> ShapeBuilder<'_, S> {
    /// Register `f` under `name`, replacing any previous procedure.
    pub fn add<F>(&self, name: &str, f: F) -> &Self
    where
        F: Fn(&mut dyn DrawContext) -> Result<(), ShapeError> + Send + Sync + 'static,
    {
        self.add_procedure(name, crate::shape::procedure(f))
    }

    pub fn add_procedure(&self, name: &str, procedure: ShapeProcedure) -> &Self {
        if self
            .surface
            .lock_state()
            .shapes
            .insert(name, procedure)
            .is_some()
        {
            log::debug!("Replaced shape '{}'", name);
        }
        self
    }

    /// Remove the procedure registered under `name`, if any.
    pub fn remove(&self, name: &str) -> &Self {
        self.surface.lock_state().shapes.remove(name);
        self
    }
}
