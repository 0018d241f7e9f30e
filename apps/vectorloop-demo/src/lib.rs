//! Animated logo: a tick loop rotating and re-rendering the logo surface on
//! a recording canvas.

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use vectorloop_core::{logo, RenderStatus, Surface, SurfaceError};
use vectorloop_renderer::{RecordingCanvas, RenderFrame};
use vectorloop_tick::{FrameCounter, LoopError, TickLoop, Timer};

pub use config::{AnimationConfig, ConfigError};

pub type LogoSurface = Surface<RecordingCanvas>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error(transparent)]
    Loop(#[from] LoopError),
}

/// Result of an animation run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Ticks fired.
    pub frames: u64,
    /// Final rate of the loop.
    pub fps: f64,
    /// Last frame drawn on the canvas.
    pub frame: RenderFrame,
}

/// Logo surface on a fresh recording canvas, with `config.shapes` enabled
/// in order.
pub fn build_surface(config: &AnimationConfig) -> Result<Arc<LogoSurface>, SurfaceError> {
    let surface = Surface::with_logo(RecordingCanvas::new(config.width, config.height))?;
    for name in logo::DEFAULT_ENABLED {
        surface.disable(name);
    }
    for name in &config.shapes {
        surface.enable(name);
    }
    Ok(Arc::new(surface))
}

/// Tick callback: rotate by `degrees_per_frame` per elapsed frame, then
/// render. Failures are logged; the loop keeps going.
pub fn frame_callback(
    surface: Arc<LogoSurface>,
    frames: FrameCounter,
    degrees_per_frame: f64,
) -> impl FnMut() + Send + 'static {
    move || {
        let frame = frames.get();
        surface.set_rotation(frame as f64 * degrees_per_frame);
        match surface.render() {
            Ok(RenderStatus::Rendered { skipped, .. }) if skipped > 0 => {
                log::trace!("Frame {}: {} enabled shapes not registered", frame, skipped);
            }
            Ok(RenderStatus::Rendered { .. }) => {}
            Ok(RenderStatus::Dropped) => log::debug!("Frame {} dropped", frame),
            Err(err) => log::error!("Frame {} failed: {}", frame, err),
        }
    }
}

/// Run the animation on `tick`, letting `wait` pass time (a real sleep for
/// thread timers, a clock advance for manual ones).
pub fn run_with<T, W>(
    config: &AnimationConfig,
    mut tick: TickLoop<T>,
    mut wait: W,
) -> Result<RunSummary, AppError>
where
    T: Timer,
    W: FnMut(Duration),
{
    config.validate()?;
    let surface = build_surface(config)?;
    tick.run(frame_callback(
        surface.clone(),
        tick.frame_counter(),
        config.degrees_per_frame,
    ))?;

    let total = Duration::from_millis(config.duration_ms);
    match config.fps_after_reset {
        Some(fps) => {
            let half = total / 2;
            wait(half);
            tick.set_frames_per_second(fps);
            tick.reset()?;
            wait(total - half);
        }
        None => wait(total),
    }
    tick.stop();

    let summary = RunSummary {
        frames: tick.current_frame(),
        fps: tick.frames_per_second(),
        frame: surface.with_target(RecordingCanvas::frame),
    };
    log::info!(
        "Rendered {} frames, last frame has {} commands",
        summary.frames,
        summary.frame.commands.len()
    );
    Ok(summary)
}

/// Run the animation in real time on background timer threads.
pub fn run(config: &AnimationConfig) -> Result<RunSummary, AppError> {
    run_with(config, TickLoop::with_fps(config.fps), std::thread::sleep)
}
