//! Deterministic task queue for deferred work
//!
//! Timers, simulated `<script>` loads and `fs.readFile` callbacks are queued
//! here instead of on a real event loop. Tasks run in (due time, insertion
//! order), against a virtual clock that jumps straight to the next due task,
//! so a run never sleeps and ordering is identical on every machine.

use std::collections::{BTreeMap, HashMap};

type Slot = (u64, u64);

#[derive(Debug)]
struct Entry<T> {
    id: u32,
    task: T,
    interval: Option<u64>,
}

/// Virtual-clock FIFO of pending tasks
#[derive(Debug)]
pub struct Scheduler<T> {
    now: u64,
    next_id: u32,
    next_seq: u64,
    executed: usize,
    queue: BTreeMap<Slot, Entry<T>>,
    slots: HashMap<u32, Slot>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_id: 1,
            next_seq: 0,
            executed: 0,
            queue: BTreeMap::new(),
            slots: HashMap::new(),
        }
    }

    /// Queue `task` to run `delay` virtual milliseconds from now
    pub fn schedule(&mut self, delay: u64, task: T) -> u32 {
        let id = self.allocate_id();
        self.insert(id, delay, task, None);
        id
    }

    /// Queue `task` to run every `period` virtual milliseconds until cancelled
    pub fn schedule_repeating(&mut self, period: u64, task: T) -> u32 {
        let id = self.allocate_id();
        self.insert(id, period, task, Some(period));
        id
    }

    /// Drop a pending task; unknown ids are ignored
    pub fn cancel(&mut self, id: u32) -> bool {
        match self.slots.remove(&id) {
            Some(slot) => self.queue.remove(&slot).is_some(),
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Current virtual time in milliseconds
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Number of tasks handed out by [`Scheduler::pop`] so far
    pub fn executed(&self) -> usize {
        self.executed
    }

    /// Discard every pending task
    pub fn clear(&mut self) {
        self.queue.clear();
        self.slots.clear();
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    fn insert(&mut self, id: u32, delay: u64, task: T, interval: Option<u64>) {
        let slot = (self.now.saturating_add(delay), self.next_seq);
        self.next_seq += 1;
        self.queue.insert(slot, Entry { id, task, interval });
        self.slots.insert(id, slot);
    }
}

impl<T: Clone> Scheduler<T> {
    /// Take the next due task, advancing the clock to its due time.
    ///
    /// Repeating tasks are re-queued under the same id before being returned,
    /// so cancelling from inside the callback stops further runs.
    pub fn pop(&mut self) -> Option<T> {
        let (slot, entry) = self.queue.pop_first()?;
        self.slots.remove(&entry.id);
        self.now = self.now.max(slot.0);
        self.executed += 1;

        if let Some(period) = entry.interval {
            self.insert(entry.id, period, entry.task.clone(), Some(period));
        }

        Some(entry.task)
    }
}
