//! Trailing-edge debouncer for query-change notifications.
//!
//! Every [`Debouncer::notify`] cancels the pending timer and starts a new one;
//! when the loop has been quiet for `delay` the callback receives the last
//! value only. A zero delay delivers synchronously. The callback never runs
//! re-entrantly: a value notified from inside the callback is delivered after
//! it returns.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::{debug, trace};

use crate::event_loop::{EventLoop, TimerId};

type Callback<T> = Box<dyn FnMut(T)>;

struct Shared<T> {
    pending: Cell<Option<TimerId>>,
    latest: RefCell<Option<T>>,
    callback: RefCell<Option<Callback<T>>>,
    firing: Cell<bool>,
}

impl<T> Shared<T> {
    fn deliver(&self) {
        if self.firing.replace(true) {
            return;
        }
        loop {
            // A value notified from the callback with a delay waits for its timer
            if self.pending.get().is_some() {
                break;
            }
            let Some(value) = self.latest.borrow_mut().take() else {
                break;
            };
            let callback = self.callback.borrow_mut().take();
            if let Some(mut callback) = callback {
                callback(value);
                let mut slot = self.callback.borrow_mut();
                // Keep a callback installed while this one ran
                if slot.is_none() {
                    *slot = Some(callback);
                }
            }
        }
        self.firing.set(false);
    }
}

pub struct Debouncer<T> {
    event_loop: EventLoop,
    delay: Duration,
    shared: Rc<Shared<T>>,
}

impl<T: 'static> Debouncer<T> {
    pub fn new(event_loop: EventLoop, delay: Duration) -> Self {
        Self {
            event_loop,
            delay,
            shared: Rc::new(Shared {
                pending: Cell::new(None),
                latest: RefCell::new(None),
                callback: RefCell::new(None),
                firing: Cell::new(false),
            }),
        }
    }

    pub fn set_callback(&mut self, callback: impl FnMut(T) + 'static) {
        *self.shared.callback.borrow_mut() = Some(Box::new(callback));
    }

    pub fn clear_callback(&mut self) {
        self.shared.callback.borrow_mut().take();
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Takes effect on the next `notify`; an already pending timer keeps its deadline.
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Record `value` and (re)start the quiet period.
    pub fn notify(&self, value: T) {
        *self.shared.latest.borrow_mut() = Some(value);
        self.cancel_timer();

        if self.delay.is_zero() {
            self.shared.deliver();
            return;
        }

        let weak: Weak<Shared<T>> = Rc::downgrade(&self.shared);
        let id = self.event_loop.schedule(self.delay, move || {
            if let Some(shared) = weak.upgrade() {
                shared.pending.set(None);
                shared.deliver();
            }
        });
        self.shared.pending.set(Some(id));
        trace!(delay_ms = self.delay.as_millis() as u64, "debounce restarted");
    }

    /// Drop the pending value and timer. Nothing fires afterwards.
    pub fn cancel(&self) {
        let had_timer = self.cancel_timer();
        let had_value = self.shared.latest.borrow_mut().take().is_some();
        if had_timer || had_value {
            debug!(event_type = "chooser", action = "debounce_cancelled", "Pending query notification dropped");
        }
    }

    pub fn is_pending(&self) -> bool {
        self.shared.pending.get().is_some()
    }

    fn cancel_timer(&self) -> bool {
        match self.shared.pending.take() {
            Some(id) => self.event_loop.cancel(id),
            None => false,
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(id) = self.shared.pending.take() {
            self.event_loop.cancel(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(ev: &EventLoop, delay_ms: u64) -> (Debouncer<String>, Rc<RefCell<Vec<String>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut debouncer = Debouncer::new(ev.clone(), Duration::from_millis(delay_ms));
        let sink = seen.clone();
        debouncer.set_callback(move |q: String| sink.borrow_mut().push(q));
        (debouncer, seen)
    }

    #[test]
    fn test_zero_delay_is_synchronous() {
        let (ev, _clock) = EventLoop::manual();
        let (debouncer, seen) = recording(&ev, 0);
        debouncer.notify("a".into());
        debouncer.notify("ab".into());
        assert_eq!(*seen.borrow(), vec!["a", "ab"]);
        assert_eq!(ev.pending_count(), 0);
    }

    #[test]
    fn test_coalesces_to_last_value() {
        let (ev, clock) = EventLoop::manual();
        let (debouncer, seen) = recording(&ev, 150);

        debouncer.notify("a".into());
        ev.advance(Duration::from_millis(50));
        debouncer.notify("ab".into());

        ev.advance(Duration::from_millis(149));
        assert!(seen.borrow().is_empty());
        ev.advance(Duration::from_millis(1));
        assert_eq!(*seen.borrow(), vec!["ab"]);
        assert_eq!(clock.elapsed(), Duration::from_millis(200));

        ev.advance(Duration::from_secs(5));
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_many_notifies_fire_once() {
        let (ev, _clock) = EventLoop::manual();
        let (debouncer, seen) = recording(&ev, 100);
        for i in 0..50 {
            debouncer.notify(format!("q{i}"));
            ev.advance(Duration::from_millis(10));
        }
        assert!(seen.borrow().is_empty());
        assert_eq!(ev.pending_count(), 1);
        ev.advance(Duration::from_millis(100));
        assert_eq!(*seen.borrow(), vec!["q49"]);
    }

    #[test]
    fn test_cancel_prevents_callback() {
        let (ev, _clock) = EventLoop::manual();
        let (debouncer, seen) = recording(&ev, 100);
        debouncer.notify("a".into());
        assert!(debouncer.is_pending());
        debouncer.cancel();
        assert!(!debouncer.is_pending());
        ev.advance(Duration::from_secs(1));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_drop_cancels_timer() {
        let (ev, _clock) = EventLoop::manual();
        let (debouncer, seen) = recording(&ev, 100);
        debouncer.notify("a".into());
        drop(debouncer);
        assert_eq!(ev.pending_count(), 0);
        ev.advance(Duration::from_secs(1));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_delay_change_applies_to_next_notify() {
        let (ev, _clock) = EventLoop::manual();
        let (mut debouncer, seen) = recording(&ev, 100);
        debouncer.set_delay(Duration::from_millis(10));
        debouncer.notify("x".into());
        ev.advance(Duration::from_millis(10));
        assert_eq!(*seen.borrow(), vec!["x"]);
    }

    #[test]
    fn test_reentrant_notify_is_serialized() {
        let (ev, _clock) = EventLoop::manual();
        let debouncer = Rc::new(RefCell::new(Debouncer::<u32>::new(ev.clone(), Duration::ZERO)));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let depth = Rc::new(Cell::new(0));
        let max_depth = Rc::new(Cell::new(0));

        let weak = Rc::downgrade(&debouncer);
        let sink = seen.clone();
        let (d, m) = (depth.clone(), max_depth.clone());
        debouncer.borrow_mut().set_callback(move |v: u32| {
            d.set(d.get() + 1);
            m.set(m.get().max(d.get()));
            sink.borrow_mut().push(v);
            if v < 3 {
                if let Some(deb) = weak.upgrade() {
                    deb.borrow().notify(v + 1);
                }
            }
            d.set(d.get() - 1);
        });

        debouncer.borrow().notify(1);
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
        assert_eq!(max_depth.get(), 1);
    }

    #[test]
    fn test_notify_from_callback_waits_for_delay() {
        let (ev, clock) = EventLoop::manual();
        let debouncer = Rc::new(RefCell::new(Debouncer::<u32>::new(
            ev.clone(),
            Duration::from_millis(100),
        )));
        let seen = Rc::new(RefCell::new(Vec::new()));

        let weak = Rc::downgrade(&debouncer);
        let sink = seen.clone();
        let at = clock.clone();
        debouncer.borrow_mut().set_callback(move |v: u32| {
            sink.borrow_mut().push((v, at.elapsed()));
            if v == 1 {
                if let Some(deb) = weak.upgrade() {
                    deb.borrow().notify(2);
                }
            }
        });

        debouncer.borrow().notify(1);
        ev.advance(Duration::from_millis(100));
        assert_eq!(*seen.borrow(), vec![(1, Duration::from_millis(100))]);
        assert!(debouncer.borrow().is_pending());

        ev.advance(Duration::from_millis(99));
        assert_eq!(seen.borrow().len(), 1);
        ev.advance(Duration::from_millis(1));
        assert_eq!(
            *seen.borrow(),
            vec![(1, Duration::from_millis(100)), (2, Duration::from_millis(200))]
        );
        assert!(!debouncer.borrow().is_pending());
    }
}
