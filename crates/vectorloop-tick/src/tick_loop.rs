use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::LoopError;
use crate::timer::{interval_for, ThreadTimer, Timer, TimerId, TimerTask};

/// Rate used when none is given.
pub const DEFAULT_FPS: f64 = 30.0;

/// Callback run on every tick.
pub type TickCallback = Box<dyn FnMut() + Send>;

type CallbackSlot = Arc<Mutex<TickCallback>>;

thread_local! {
    /// Address of the callback slot whose tick is running on this thread.
    static TICKING: Cell<usize> = const { Cell::new(0) };
}

fn slot_key(slot: &CallbackSlot) -> usize {
    Arc::as_ptr(slot) as usize
}

/// Marks the current thread as inside a slot's callback until dropped.
struct TickScope {
    previous: usize,
}

impl TickScope {
    fn enter(slot: &CallbackSlot) -> Self {
        let previous = TICKING.with(|ticking| ticking.replace(slot_key(slot)));
        Self { previous }
    }

    fn is_inside(slot: &CallbackSlot) -> bool {
        TICKING.with(|ticking| ticking.get() == slot_key(slot))
    }
}

impl Drop for TickScope {
    fn drop(&mut self) {
        TICKING.with(|ticking| ticking.set(self.previous));
    }
}

/// The timer currently driving a loop.
struct ActiveTimer {
    id: TimerId,
    /// Cleared before the timer is cancelled; a firing that sees it false
    /// does nothing.
    live: Arc<AtomicBool>,
    slot: CallbackSlot,
}

/// Shared, read-only view of a loop's frame count.
///
/// Cloned into callbacks that need to know which frame they are drawing.
#[derive(Debug, Clone, Default)]
pub struct FrameCounter(Arc<AtomicU64>);

impl FrameCounter {
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    fn advance(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

/// Calls a callback at a fixed frame rate.
///
/// Each tick increments the frame counter and then invokes the callback.
/// The loop owns exactly one timer while running; dropping the loop cancels
/// it.
pub struct TickLoop<T: Timer = ThreadTimer> {
    fps: f64,
    frames: FrameCounter,
    timer: T,
    active: Option<ActiveTimer>,
    callback: Option<CallbackSlot>,
}

impl TickLoop<ThreadTimer> {
    /// A loop at [`DEFAULT_FPS`] driven by background threads.
    pub fn new() -> Self {
        Self::with_fps(DEFAULT_FPS)
    }

    pub fn with_fps(fps: f64) -> Self {
        Self::with_timer(fps, ThreadTimer::new())
    }
}

impl Default for TickLoop<ThreadTimer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Timer> TickLoop<T> {
    /// A loop at `fps` driven by `timer`. The rate is not validated; see
    /// [`interval_for`] for how degenerate rates are scheduled.
    pub fn with_timer(fps: f64, timer: T) -> Self {
        Self {
            fps,
            frames: FrameCounter::default(),
            timer,
            active: None,
            callback: None,
        }
    }

    pub fn frames_per_second(&self) -> f64 {
        self.fps
    }

    /// Change the rate. A running timer keeps its old rate until
    /// [`reset`](Self::reset).
    pub fn set_frames_per_second(&mut self, fps: f64) {
        if fps.is_nan() || fps <= 0.0 {
            log::warn!("Non-positive frame rate {}, ticks fall back to the minimum interval", fps);
        }
        self.fps = fps;
    }

    /// Ticks so far. Never goes back to zero.
    pub fn current_frame(&self) -> u64 {
        self.frames.get()
    }

    pub fn frame_counter(&self) -> FrameCounter {
        self.frames.clone()
    }

    /// The rate as a percentage of 1000 fps.
    pub fn percentage(&self) -> f64 {
        self.fps / 1000.0 * 100.0
    }

    pub fn state(&self) -> LoopState {
        if self.active.is_some() {
            LoopState::Running
        } else {
            LoopState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == LoopState::Running
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Start ticking `callback` at the current rate.
    ///
    /// Calling `run` on a running loop swaps the callback and restarts the
    /// timer; the frame counter carries on.
    pub fn run<F>(&mut self, callback: F) -> Result<(), LoopError>
    where
        F: FnMut() + Send + 'static,
    {
        self.run_boxed(Some(Box::new(callback)))
    }

    /// [`run`](Self::run) for callbacks resolved at runtime. `None` is
    /// rejected with [`LoopError::InvalidCallback`] and leaves the loop as
    /// it was.
    pub fn run_boxed(&mut self, callback: Option<TickCallback>) -> Result<(), LoopError> {
        let callback = callback.ok_or(LoopError::InvalidCallback)?;
        self.callback = Some(Arc::new(Mutex::new(callback)));
        self.restart()?;
        log::info!("Tick loop running at {} fps", self.fps);
        Ok(())
    }

    /// Replace the timer with one at the current rate, keeping the frame
    /// count. Does nothing if no callback has been bound.
    pub fn reset(&mut self) -> Result<(), LoopError> {
        if self.callback.is_none() {
            return Ok(());
        }
        self.restart()?;
        log::info!("Tick loop reset to {} fps", self.fps);
        Ok(())
    }

    /// Cancel the timer. The callback stays bound, so `reset` resumes.
    ///
    /// A tick already running on another thread finishes before this
    /// returns; after that the frame count no longer moves.
    pub fn stop(&mut self) {
        if self.active.is_some() {
            self.cancel();
            log::info!("Tick loop stopped at frame {}", self.frames.get());
        }
    }

    fn restart(&mut self) -> Result<(), LoopError> {
        self.cancel();
        let Some(slot) = self.callback.clone() else {
            return Ok(());
        };
        let frames = self.frames.clone();
        let live = Arc::new(AtomicBool::new(true));
        let gate = live.clone();
        let ticking = slot.clone();
        let task: TimerTask = Box::new(move || {
            let mut guard = ticking.lock().unwrap_or_else(PoisonError::into_inner);
            if !gate.load(Ordering::SeqCst) {
                return;
            }
            frames.advance();
            let _scope = TickScope::enter(&ticking);
            let callback: &mut TickCallback = &mut guard;
            callback();
        });
        let id = self.timer.set_interval(interval_for(self.fps), task)?;
        self.active = Some(ActiveTimer { id, live, slot });
        Ok(())
    }

    fn cancel(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        active.live.store(false, Ordering::SeqCst);
        self.timer.clear_interval(active.id);
        // Wait out a firing in progress elsewhere. From inside our own
        // callback the slot is already held by this thread.
        if !TickScope::is_inside(&active.slot) {
            drop(active.slot.lock().unwrap_or_else(PoisonError::into_inner));
        }
    }
}

impl<T: Timer> Drop for TickLoop<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manual::ManualTimer;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn manual_loop(fps: f64) -> (ManualTimer, TickLoop<ManualTimer>) {
        let timer = ManualTimer::new();
        (timer.clone(), TickLoop::with_timer(fps, timer))
    }

    fn counting(count: &Arc<AtomicUsize>) -> impl FnMut() + Send + 'static {
        let count = count.clone();
        move || {
            count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_defaults() {
        let tick = TickLoop::new();
        assert_eq!(tick.frames_per_second(), DEFAULT_FPS);
        assert_eq!(tick.current_frame(), 0);
        assert_eq!(tick.state(), LoopState::Idle);
    }

    #[test]
    fn test_thirty_fps_for_one_second() {
        let (clock, mut tick) = manual_loop(30.0);
        let calls = Arc::new(AtomicUsize::new(0));
        tick.run(counting(&calls)).unwrap();
        assert!(tick.is_running());

        clock.advance(Duration::from_millis(1000));
        assert_eq!(tick.current_frame(), 30);
        assert_eq!(calls.load(Ordering::SeqCst), 30);
    }

    #[test]
    fn test_frame_increments_before_callback() {
        let (clock, mut tick) = manual_loop(10.0);
        let frames = tick.frame_counter();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = seen.clone();
        tick.run(move || record.lock().unwrap().push(frames.get()))
            .unwrap();
        clock.advance(Duration::from_millis(300));
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_percentage() {
        let (_, tick) = manual_loop(30.0);
        assert!((tick.percentage() - 3.0).abs() < 1e-12);
        let (_, tick) = manual_loop(500.0);
        assert!((tick.percentage() - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_setter_waits_for_reset() {
        let (clock, mut tick) = manual_loop(10.0);
        let calls = Arc::new(AtomicUsize::new(0));
        tick.run(counting(&calls)).unwrap();

        clock.advance(Duration::from_millis(300));
        assert_eq!(tick.current_frame(), 3);

        tick.set_frames_per_second(100.0);
        assert_eq!(tick.frames_per_second(), 100.0);
        clock.advance(Duration::from_millis(100));
        assert_eq!(tick.current_frame(), 4);

        tick.reset().unwrap();
        assert_eq!(tick.current_frame(), 4);
        assert_eq!(clock.active_count(), 1);
        clock.advance(Duration::from_millis(100));
        assert_eq!(tick.current_frame(), 14);
        assert_eq!(calls.load(Ordering::SeqCst), 14);
    }

    #[test]
    fn test_invalid_callback_leaves_loop_idle() {
        let (clock, mut tick) = manual_loop(30.0);
        let err = tick.run_boxed(None).unwrap_err();
        assert!(matches!(err, LoopError::InvalidCallback));
        assert_eq!(tick.state(), LoopState::Idle);
        assert_eq!(clock.active_count(), 0);
        clock.advance(Duration::from_millis(1000));
        assert_eq!(tick.current_frame(), 0);
    }

    #[test]
    fn test_reset_without_callback_is_noop() {
        let (clock, mut tick) = manual_loop(30.0);
        tick.reset().unwrap();
        assert_eq!(clock.active_count(), 0);
        assert!(!tick.is_running());
    }

    #[test]
    fn test_second_run_replaces_timer() {
        let (clock, mut tick) = manual_loop(10.0);
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        tick.run(counting(&first)).unwrap();
        clock.advance(Duration::from_millis(200));
        tick.run(counting(&second)).unwrap();
        assert_eq!(clock.active_count(), 1);

        clock.advance(Duration::from_millis(500));
        assert_eq!(first.load(Ordering::SeqCst), 2);
        assert_eq!(second.load(Ordering::SeqCst), 5);
        assert_eq!(tick.current_frame(), 7);
    }

    #[test]
    fn test_stop_and_resume() {
        let (clock, mut tick) = manual_loop(10.0);
        let calls = Arc::new(AtomicUsize::new(0));
        tick.run(counting(&calls)).unwrap();
        clock.advance(Duration::from_millis(100));

        tick.stop();
        assert_eq!(tick.state(), LoopState::Idle);
        assert_eq!(clock.active_count(), 0);
        clock.advance(Duration::from_millis(500));
        assert_eq!(tick.current_frame(), 1);

        tick.reset().unwrap();
        clock.advance(Duration::from_millis(100));
        assert_eq!(tick.current_frame(), 2);
    }

    #[test]
    fn test_drop_cancels_timer() {
        let (clock, mut tick) = manual_loop(30.0);
        tick.run(|| {}).unwrap();
        assert_eq!(clock.active_count(), 1);
        drop(tick);
        assert_eq!(clock.active_count(), 0);
    }

    #[test]
    fn test_stop_settles_frame_count_on_threads() {
        let mut tick = TickLoop::with_fps(1000.0);
        tick.run(|| std::thread::sleep(Duration::from_micros(300)))
            .unwrap();
        std::thread::sleep(Duration::from_millis(40));
        tick.stop();
        let stopped_at = tick.current_frame();
        assert!(stopped_at > 0);
        assert_eq!(tick.timer().active_count(), 0);

        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(tick.current_frame(), stopped_at);
    }

    #[test]
    fn test_threaded_resets_never_overlap() {
        let mut tick = TickLoop::with_fps(1000.0);
        let frames = tick.frame_counter();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = seen.clone();
        tick.run(move || record.lock().unwrap().push(frames.get()))
            .unwrap();
        for _ in 0..10 {
            std::thread::sleep(Duration::from_millis(3));
            tick.reset().unwrap();
            assert_eq!(tick.timer().active_count(), 1);
        }
        tick.stop();

        let seen = seen.lock().unwrap().clone();
        let expected: Vec<u64> = (1..=tick.current_frame()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_stop_from_inside_callback() {
        let clock = ManualTimer::new();
        let tick = Arc::new(Mutex::new(TickLoop::with_timer(10.0, clock.clone())));
        let inner = Arc::downgrade(&tick);
        tick.lock()
            .unwrap()
            .run(move || {
                if let Some(tick) = inner.upgrade() {
                    tick.lock().unwrap().stop();
                }
            })
            .unwrap();

        clock.advance(Duration::from_millis(500));
        let tick = tick.lock().unwrap();
        assert_eq!(tick.current_frame(), 1);
        assert!(!tick.is_running());
    }

    #[test]
    fn test_zero_fps_uses_minimum_interval() {
        let (clock, mut tick) = manual_loop(0.0);
        tick.run(|| {}).unwrap();
        clock.advance(Duration::from_millis(10));
        assert_eq!(tick.current_frame(), 10);
    }
}
