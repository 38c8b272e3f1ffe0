//! Single-threaded timer queue standing in for the host UI event loop.
//!
//! Scheduled tasks run on the thread that drives the loop, never on a
//! worker. The host pumps it by calling [`EventLoop::run_expired`] each turn
//! (or [`EventLoop::run_until_idle`] in the smoke binary); tests drive a
//! [`ManualClock`] with [`EventLoop::advance`].

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use slotmap::{new_key_type, SlotMap};
use tracing::trace;

new_key_type! {
    /// Handle to a scheduled task.
    pub struct TimerId;
}

/// Time source for the loop.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Rc<ManualClockInner>,
}

#[derive(Debug)]
struct ManualClockInner {
    base: Instant,
    offset: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ManualClockInner {
                base: Instant::now(),
                offset: Cell::new(Duration::ZERO),
            }),
        }
    }

    /// Time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        self.inner.offset.get()
    }

    fn set_elapsed(&self, elapsed: Duration) {
        if elapsed > self.inner.offset.get() {
            self.inner.offset.set(elapsed);
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.inner.base + self.inner.offset.get()
    }
}

type Task = Box<dyn FnOnce()>;

struct TimerData {
    fire_at: Instant,
    task: Task,
}

/// Queue entry, min-heap by fire time then scheduling order.
#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    id: TimerId,
    fire_at: Instant,
    seq: u64,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
struct TimerQueue {
    timers: SlotMap<TimerId, TimerData>,
    queue: BinaryHeap<QueueEntry>,
    next_seq: u64,
}

impl TimerQueue {
    /// Drop cancelled entries from the front of the heap.
    fn prune(&mut self) {
        while let Some(entry) = self.queue.peek() {
            if self.timers.contains_key(entry.id) {
                break;
            }
            self.queue.pop();
        }
    }

    fn next_fire(&mut self) -> Option<Instant> {
        self.prune();
        self.queue.peek().map(|e| e.fire_at)
    }

    fn pop_expired(&mut self, now: Instant) -> Option<(TimerId, Task)> {
        self.prune();
        let entry = *self.queue.peek()?;
        if entry.fire_at > now {
            return None;
        }
        self.queue.pop();
        self.timers.remove(entry.id).map(|data| (entry.id, data.task))
    }
}

/// Cheaply clonable handle to a single-threaded event loop.
#[derive(Clone)]
pub struct EventLoop {
    queue: Rc<RefCell<TimerQueue>>,
    clock: Rc<dyn Clock>,
    manual: Option<ManualClock>,
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("pending", &self.pending_count())
            .field("manual", &self.manual.is_some())
            .finish()
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLoop {
    /// Loop driven by the wall clock.
    pub fn new() -> Self {
        Self::with_clock(Rc::new(SystemClock))
    }

    pub fn with_clock(clock: Rc<dyn Clock>) -> Self {
        Self {
            queue: Rc::new(RefCell::new(TimerQueue::default())),
            clock,
            manual: None,
        }
    }

    /// Loop driven by a manual clock; returns the clock for inspection.
    pub fn manual() -> (Self, ManualClock) {
        let clock = ManualClock::new();
        let mut event_loop = Self::with_clock(Rc::new(clock.clone()));
        event_loop.manual = Some(clock.clone());
        (event_loop, clock)
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Run `task` on this loop once `delay` has elapsed.
    pub fn schedule(&self, delay: Duration, task: impl FnOnce() + 'static) -> TimerId {
        let fire_at = self.clock.now() + delay;
        let mut queue = self.queue.borrow_mut();
        let id = queue.timers.insert(TimerData {
            fire_at,
            task: Box::new(task),
        });
        let seq = queue.next_seq;
        queue.next_seq += 1;
        queue.queue.push(QueueEntry { id, fire_at, seq });
        trace!(?id, delay_ms = delay.as_millis() as u64, "timer scheduled");
        id
    }

    /// Cancel a pending task. Returns false if it already ran or was cancelled.
    pub fn cancel(&self, id: TimerId) -> bool {
        let removed = self.queue.borrow_mut().timers.remove(id).is_some();
        if removed {
            trace!(?id, "timer cancelled");
        }
        removed
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.queue.borrow().timers.contains_key(id)
    }

    pub fn pending_count(&self) -> usize {
        self.queue.borrow().timers.len()
    }

    /// Time until the next pending task is due, `None` if nothing is pending.
    pub fn time_until_next(&self) -> Option<Duration> {
        let next = self.queue.borrow_mut().next_fire()?;
        Some(next.saturating_duration_since(self.clock.now()))
    }

    /// Run every task that is due now. Tasks may schedule or cancel others;
    /// newly scheduled tasks that are already due run in the same call.
    pub fn run_expired(&self) -> usize {
        let mut ran = 0;
        loop {
            let now = self.clock.now();
            // Borrow released before the task runs
            let next = self.queue.borrow_mut().pop_expired(now);
            let Some((id, task)) = next else {
                break;
            };
            trace!(?id, "timer fired");
            task();
            ran += 1;
        }
        ran
    }

    /// Advance a manual clock by `by`, firing tasks in due order.
    ///
    /// Has no effect on the clock of a wall-clock loop; due tasks still run.
    pub fn advance(&self, by: Duration) -> usize {
        let Some(clock) = self.manual.as_ref() else {
            return self.run_expired();
        };
        let target = clock.elapsed() + by;
        let mut ran = 0;
        loop {
            let next = self.queue.borrow_mut().next_fire();
            match next {
                Some(fire_at) if fire_at <= clock.inner.base + target => {
                    clock.set_elapsed(fire_at.saturating_duration_since(clock.inner.base));
                    ran += self.run_expired();
                }
                _ => break,
            }
        }
        clock.set_elapsed(target);
        ran + self.run_expired()
    }

    /// Block the current thread running tasks until none are pending.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while let Some(wait) = self.time_until_next() {
            if self.manual.is_some() {
                ran += self.advance(wait);
            } else {
                if !wait.is_zero() {
                    std::thread::sleep(wait);
                }
                ran += self.run_expired();
            }
        }
        ran
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_fires_after_delay() {
        let (ev, clock) = EventLoop::manual();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        ev.schedule(Duration::from_millis(100), move || flag.set(true));

        assert_eq!(ev.advance(Duration::from_millis(99)), 0);
        assert!(!fired.get());
        assert_eq!(ev.advance(Duration::from_millis(1)), 1);
        assert!(fired.get());
        assert_eq!(clock.elapsed(), Duration::from_millis(100));
    }

    #[test]
    fn test_cancelled_task_never_runs() {
        let (ev, _clock) = EventLoop::manual();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let id = ev.schedule(Duration::from_millis(10), move || flag.set(true));
        assert!(ev.is_pending(id));
        assert!(ev.cancel(id));
        assert!(!ev.cancel(id));
        ev.advance(Duration::from_secs(1));
        assert!(!fired.get());
        assert_eq!(ev.pending_count(), 0);
    }

    #[test]
    fn test_tasks_run_in_due_order() {
        let (ev, _clock) = EventLoop::manual();
        let order = Rc::new(RefCell::new(Vec::new()));
        for (name, ms) in [("b", 20u64), ("a", 10), ("c", 20)] {
            let order = order.clone();
            ev.schedule(Duration::from_millis(ms), move || order.borrow_mut().push(name));
        }
        ev.advance(Duration::from_millis(50));
        assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_task_can_reschedule_within_advance_window() {
        let (ev, clock) = EventLoop::manual();
        let hits = Rc::new(Cell::new(0));
        let inner_ev = ev.clone();
        let inner_hits = hits.clone();
        ev.schedule(Duration::from_millis(10), move || {
            inner_hits.set(inner_hits.get() + 1);
            let hits = inner_hits.clone();
            inner_ev.schedule(Duration::from_millis(10), move || hits.set(hits.get() + 1));
        });
        assert_eq!(ev.advance(Duration::from_millis(25)), 2);
        assert_eq!(hits.get(), 2);
        assert_eq!(clock.elapsed(), Duration::from_millis(25));
    }

    #[test]
    fn test_time_until_next_skips_cancelled() {
        let (ev, _clock) = EventLoop::manual();
        let first = ev.schedule(Duration::from_millis(5), || {});
        ev.schedule(Duration::from_millis(30), || {});
        ev.cancel(first);
        assert_eq!(ev.time_until_next(), Some(Duration::from_millis(30)));
    }

    #[test]
    fn test_run_until_idle_with_manual_clock() {
        let (ev, clock) = EventLoop::manual();
        ev.schedule(Duration::from_millis(200), || {});
        assert_eq!(ev.run_until_idle(), 1);
        assert_eq!(clock.elapsed(), Duration::from_millis(200));
    }
}
