//! Leading-edge throttling with a single trailing call.

use super::task_queue::{RunId, TaskQueue};

/// Rate limits one handler to at most one execution per interval.
///
/// The first call of a window executes immediately. A call arriving inside the
/// window schedules one deferred execution at the end of the window, carrying
/// the arguments of that call. Any further call while the deferred execution is
/// pending is dropped, not merged.
///
/// One `Throttle` exists per registered handler and is owned by whoever
/// dispatches to it.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: u64,
    /// Tick of the last execution, `None` until the handler first ran.
    last_executed: Option<u64>,
    /// The deferred execution, if one is scheduled.
    pending: Option<RunId>,
}

impl Throttle {
    /// Creates a throttle allowing one execution every `interval_ticks` ticks.
    #[must_use]
    pub const fn new(interval_ticks: u64) -> Self {
        Self {
            interval: interval_ticks,
            last_executed: None,
            pending: None,
        }
    }

    /// The interval in ticks.
    #[must_use]
    pub const fn interval(&self) -> u64 {
        self.interval
    }

    /// Whether a deferred execution is scheduled.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Offers a call to the throttle.
    ///
    /// Returns `Some(task)` when the caller should execute it right away.
    /// Otherwise the task was either scheduled on `queue` or dropped. The
    /// caller must report a scheduled task's execution through [`Self::on_fire`].
    pub fn invoke<T>(&mut self, queue: &mut TaskQueue<T>, now: u64, task: T) -> Option<T> {
        let elapsed = self
            .last_executed
            .map_or(u64::MAX, |last| now.saturating_sub(last));

        if elapsed >= self.interval {
            if let Some(id) = self.pending.take() {
                queue.clear_run(id);
            }
            self.last_executed = Some(now);
            return Some(task);
        }

        if self.pending.is_none() {
            let delay = self.interval - elapsed;
            self.pending = Some(queue.run_timeout(task, now, delay));
            log::trace!("Throttled call at tick {now} deferred by {delay} ticks");
        } else {
            log::trace!("Throttled call at tick {now} dropped");
        }
        None
    }

    /// Forgets the deferred execution if it was cancelled on `queue`.
    pub fn sync<T>(&mut self, queue: &TaskQueue<T>) {
        if self.pending.is_some_and(|id| !queue.is_pending(id)) {
            self.pending = None;
        }
    }

    /// Records that the deferred execution ran at `now`.
    pub fn on_fire(&mut self, now: u64) {
        self.last_executed = Some(now);
        self.pending = None;
    }
}
