//! Deferred task queue.
//!
//! All world mutations run as tasks drained from this queue at the start of a
//! game tick. A task runs to completion before the next one starts.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;

/// Handle to a scheduled task, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(u64);

/// A task waiting for its trigger tick.
#[derive(Debug)]
struct ScheduledTask<T> {
    id: RunId,
    /// The game tick when this should run.
    trigger_tick: u64,
    /// Insertion order for tasks sharing a trigger tick.
    sequence: u64,
    task: T,
}

impl<T> PartialEq for ScheduledTask<T> {
    fn eq(&self, other: &Self) -> bool {
        self.trigger_tick == other.trigger_tick && self.sequence == other.sequence
    }
}

impl<T> Eq for ScheduledTask<T> {}

// Min-heap on (trigger_tick, sequence).
impl<T> Ord for ScheduledTask<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .trigger_tick
            .cmp(&self.trigger_tick)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl<T> PartialOrd for ScheduledTask<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A queue of tasks ordered by the tick they should run on.
///
/// Cancellation is lazy: a cancelled task stays in the heap until it would have
/// fired and is then discarded.
pub struct TaskQueue<T> {
    pending: BinaryHeap<ScheduledTask<T>>,
    /// Ids of tasks that were scheduled and not yet run or cancelled.
    live: FxHashSet<RunId>,
    next_sequence: u64,
}

impl<T> TaskQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: BinaryHeap::new(),
            live: FxHashSet::default(),
            next_sequence: 0,
        }
    }

    /// Queues `task` for the next opportunity, i.e. the next drain at or after `now`.
    pub fn run(&mut self, task: T, now: u64) -> RunId {
        self.run_timeout(task, now, 0)
    }

    /// Queues `task` to run `delay` ticks after `now`.
    pub fn run_timeout(&mut self, task: T, now: u64, delay: u64) -> RunId {
        let id = RunId(self.next_sequence);
        let trigger_tick = now + delay;
        self.pending.push(ScheduledTask {
            id,
            trigger_tick,
            sequence: self.next_sequence,
            task,
        });
        self.live.insert(id);
        self.next_sequence = self.next_sequence.wrapping_add(1);

        log::trace!("Queued task {id:?} for tick {trigger_tick} (delay={delay})");
        id
    }

    /// Cancels a scheduled task. Returns false if it already ran or was cancelled.
    pub fn clear_run(&mut self, id: RunId) -> bool {
        self.live.remove(&id)
    }

    /// Whether the task is still waiting to run.
    #[must_use]
    pub fn is_pending(&self, id: RunId) -> bool {
        self.live.contains(&id)
    }

    /// Removes and returns all tasks due at or before `now`, in run order.
    pub fn drain_due(&mut self, now: u64) -> Vec<T> {
        let mut due = Vec::new();

        while let Some(next) = self.pending.peek() {
            if next.trigger_tick > now {
                break;
            }
            let Some(scheduled) = self.pending.pop() else {
                break;
            };
            if self.live.remove(&scheduled.id) {
                due.push(scheduled.task);
            } else {
                log::trace!("Dropping cancelled task {:?}", scheduled.id);
            }
        }

        due
    }

    /// Returns the number of live tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Returns true if no live task is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Cancels every live task for which `keep` returns false. Returns the
    /// number of cancelled tasks.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) -> usize {
        let mut cancelled = 0;
        for scheduled in &self.pending {
            if self.live.contains(&scheduled.id) && !keep(&scheduled.task) {
                self.live.remove(&scheduled.id);
                cancelled += 1;
            }
        }
        cancelled
    }

    /// Drops every queued task.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.live.clear();
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
