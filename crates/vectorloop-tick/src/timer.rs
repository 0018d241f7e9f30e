use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::TimerError;

/// Work run on every firing of a repeating timer.
pub type TimerTask = Box<dyn FnMut() + Send>;

/// Shortest interval a timer will be scheduled with.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Handle to a scheduled repeating timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

impl TimerId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// A source of repeating callbacks.
pub trait Timer {
    /// Run `task` every `period` until cancelled.
    fn set_interval(&mut self, period: Duration, task: TimerTask) -> Result<TimerId, TimerError>;

    /// Cancel a repeating timer. Unknown ids are ignored.
    fn clear_interval(&mut self, id: TimerId);

    /// Number of timers scheduled and not cancelled.
    fn active_count(&self) -> usize;
}

/// Interval between ticks at `fps` frames per second.
///
/// `1000 / fps` milliseconds, truncated to whole milliseconds. Zero,
/// negative and non-finite rates fall back to [`MIN_INTERVAL`].
pub fn interval_for(fps: f64) -> Duration {
    let ms = 1000.0 / fps;
    if !ms.is_finite() || ms < 1.0 {
        return MIN_INTERVAL;
    }
    Duration::from_millis(ms.trunc() as u64)
}

/// Runs each repeating timer on its own background thread.
///
/// Cancelling flips a flag the thread checks before every firing; the
/// thread exits at its next wake-up and is never joined, so cancelling from
/// inside a task does not block.
#[derive(Default)]
pub struct ThreadTimer {
    next_id: u64,
    running: HashMap<TimerId, Arc<AtomicBool>>,
}

impl ThreadTimer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Timer for ThreadTimer {
    fn set_interval(
        &mut self,
        period: Duration,
        mut task: TimerTask,
    ) -> Result<TimerId, TimerError> {
        let period = period.max(MIN_INTERVAL);
        self.next_id += 1;
        let id = TimerId::new(self.next_id);
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();

        thread::Builder::new()
            .name(format!("vectorloop-{}", id))
            .spawn(move || {
                let mut next = Instant::now() + period;
                loop {
                    if let Some(wait) = next.checked_duration_since(Instant::now()) {
                        thread::sleep(wait);
                    }
                    if !flag.load(Ordering::SeqCst) {
                        break;
                    }
                    task();
                    next += period;
                    // Missed firings are skipped rather than bunched up.
                    let now = Instant::now();
                    if next + period < now {
                        next = now;
                    }
                }
            })?;

        log::debug!("Scheduled {} every {:?}", id, period);
        self.running.insert(id, running);
        Ok(id)
    }

    fn clear_interval(&mut self, id: TimerId) {
        if let Some(running) = self.running.remove(&id) {
            running.store(false, Ordering::SeqCst);
            log::debug!("Cancelled {}", id);
        }
    }

    fn active_count(&self) -> usize {
        self.running.len()
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        for running in self.running.values() {
            running.store(false, Ordering::SeqCst);
        }
    }
}
