use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::TimerError;
use crate::timer::{Timer, TimerId, TimerTask, MIN_INTERVAL};

struct Registration {
    id: TimerId,
    period: Duration,
    next_due: Duration,
    /// `None` while the task is running.
    task: Option<TimerTask>,
}

#[derive(Default)]
struct ManualClock {
    now: Duration,
    next_id: u64,
    registrations: Vec<Registration>,
}

/// A virtual-time [`Timer`]: nothing fires until [`advance`](Self::advance)
/// moves the clock.
///
/// Clones share the same clock, so a test can keep one handle while a
/// `TickLoop` owns another.
#[derive(Clone, Default)]
pub struct ManualTimer {
    clock: Arc<Mutex<ManualClock>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Move the clock forward by `by`, running every task that falls due in
    /// time order. Returns the number of firings.
    ///
    /// Tasks run without the clock locked, so they may schedule or cancel
    /// timers, including their own. A task that panics stays scheduled; the
    /// panic propagates out of `advance`.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.lock().now + by;
        let mut fired = 0;

        loop {
            let (id, task) = {
                let mut clock = self.lock();
                let due = clock
                    .registrations
                    .iter_mut()
                    .filter(|r| r.task.is_some() && r.next_due <= target)
                    .min_by_key(|r| r.next_due);
                let Some(registration) = due else {
                    clock.now = target;
                    break;
                };
                let id = registration.id;
                let due_at = registration.next_due;
                registration.next_due += registration.period;
                let task = registration.task.take();
                clock.now = due_at;
                match task {
                    Some(task) => (id, task),
                    None => continue,
                }
            };

            let mut running = RunningTask {
                timer: self,
                id,
                task: Some(task),
            };
            if let Some(task) = running.task.as_mut() {
                task();
            }
            fired += 1;
        }

        fired
    }

    fn lock(&self) -> MutexGuard<'_, ManualClock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A task taken out of its registration while it runs. Dropping it puts the
/// task back, unless the timer was cancelled in the meantime.
struct RunningTask<'a> {
    timer: &'a ManualTimer,
    id: TimerId,
    task: Option<TimerTask>,
}

impl Drop for RunningTask<'_> {
    fn drop(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        let mut clock = self.timer.lock();
        if let Some(registration) = clock.registrations.iter_mut().find(|r| r.id == self.id) {
            registration.task = Some(task);
        }
    }
}

impl Timer for ManualTimer {
    fn set_interval(&mut self, period: Duration, task: TimerTask) -> Result<TimerId, TimerError> {
        let period = period.max(MIN_INTERVAL);
        let mut clock = self.lock();
        clock.next_id += 1;
        let id = TimerId::new(clock.next_id);
        let next_due = clock.now + period;
        clock.registrations.push(Registration {
            id,
            period,
            next_due,
            task: Some(task),
        });
        Ok(id)
    }

    fn clear_interval(&mut self, id: TimerId) {
        self.lock().registrations.retain(|r| r.id != id);
    }

    fn active_count(&self) -> usize {
        self.lock().registrations.len()
    }
}
