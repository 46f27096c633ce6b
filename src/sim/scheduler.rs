//! Timer scheduling
//!
//! The engine never owns a clock. It asks a [`Scheduler`] for one-shot and
//! repeating timers, and the driver feeds fired timers back through
//! [`super::Game::handle_timer`]. Handlers run to completion one at a time.
//!
//! [`TimerQueue`] is a manual clock: tests advance it explicitly, and a
//! real-time frontend advances it by wall-clock time every frame.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Milliseconds on the scheduler's clock
pub type Millis = u64;

/// Cancellation handle for a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle(u64);

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerEvent {
    /// Advance the game one step
    Tick,
    /// Drift food toward the head
    MagnetPull,
    /// End the active power-up
    PowerUpExpiry,
}

/// A timer that came due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub handle: TimerHandle,
    pub event: TimerEvent,
    /// Instant it was due
    pub at: Millis,
}

pub trait Scheduler {
    /// Current instant
    fn now(&self) -> Millis;
    /// Fire `event` once after `delay`
    fn after(&mut self, delay: Duration, event: TimerEvent) -> TimerHandle;
    /// Fire `event` every `period`, first time one period from now
    fn every(&mut self, period: Duration, event: TimerEvent) -> TimerHandle;
    /// Stop a timer. Unknown or already-fired handles are ignored.
    fn cancel(&mut self, handle: TimerHandle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    due: Millis,
    seq: u64,
    handle: TimerHandle,
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    event: TimerEvent,
    period: Option<Millis>,
}

/// Min-heap timer queue on a manually advanced clock
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Millis,
    next_handle: u64,
    seq: u64,
    heap: BinaryHeap<Reverse<Entry>>,
    live: HashMap<TimerHandle, Timer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue whose clock starts at `now`
    pub fn starting_at(now: Millis) -> Self {
        Self {
            now,
            ..Self::default()
        }
    }

    /// Number of armed timers
    pub fn pending(&self) -> usize {
        self.live.len()
    }

    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.live.contains_key(&handle)
    }

    /// Earliest instant a live timer is due
    pub fn next_due(&mut self) -> Option<Millis> {
        self.prune();
        self.heap.peek().map(|Reverse(entry)| entry.due)
    }

    /// Pop the next timer due at or before `until`, moving the clock to its due time
    pub fn pop_due(&mut self, until: Millis) -> Option<Fired> {
        self.prune();
        let Reverse(entry) = *self.heap.peek()?;
        if entry.due > until {
            return None;
        }
        self.heap.pop();
        self.now = self.now.max(entry.due);

        let timer = self.live.get(&entry.handle).copied()?;
        match timer.period {
            Some(period) => self.push(entry.due + period, entry.handle),
            None => {
                self.live.remove(&entry.handle);
            }
        }

        Some(Fired {
            handle: entry.handle,
            event: timer.event,
            at: entry.due,
        })
    }

    /// Fire everything due up to `until` in order, then park the clock at `until`
    ///
    /// The handler may schedule or cancel timers; anything it arms that falls
    /// inside the window fires in the same call.
    pub fn run_until<F>(&mut self, until: Millis, mut handler: F) -> usize
    where
        F: FnMut(&mut TimerQueue, Fired),
    {
        let mut fired = 0;
        while let Some(timer) = self.pop_due(until) {
            handler(self, timer);
            fired += 1;
        }
        self.now = self.now.max(until);
        fired
    }

    /// `run_until(now + delta)`
    pub fn advance<F>(&mut self, delta: Duration, handler: F) -> usize
    where
        F: FnMut(&mut TimerQueue, Fired),
    {
        let until = self.now + delta.as_millis() as Millis;
        self.run_until(until, handler)
    }

    fn schedule(&mut self, delay: Duration, event: TimerEvent, period: Option<Millis>) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.live.insert(handle, Timer { event, period });
        self.push(self.now + delay.as_millis() as Millis, handle);
        handle
    }

    fn push(&mut self, due: Millis, handle: TimerHandle) {
        self.seq += 1;
        self.heap.push(Reverse(Entry {
            due,
            seq: self.seq,
            handle,
        }));
    }

    /// Drop cancelled entries from the top of the heap
    fn prune(&mut self) {
        while let Some(Reverse(entry)) = self.heap.peek() {
            if self.live.contains_key(&entry.handle) {
                break;
            }
            self.heap.pop();
        }
    }
}

impl Scheduler for TimerQueue {
    fn now(&self) -> Millis {
        self.now
    }

    fn after(&mut self, delay: Duration, event: TimerEvent) -> TimerHandle {
        self.schedule(delay, event, None)
    }

    fn every(&mut self, period: Duration, event: TimerEvent) -> TimerHandle {
        // A zero period would spin forever inside run_until
        let period_ms = (period.as_millis() as Millis).max(1);
        self.schedule(Duration::from_millis(period_ms), event, Some(period_ms))
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.live.remove(&handle);
    }
}
