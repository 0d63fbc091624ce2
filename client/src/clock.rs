//! Millisecond time source and the single-slot debounce timer used by the
//! persistence layer.

use std::cell::Cell;
use std::rc::Rc;

pub type Millis = u64;

pub trait Clock {
    fn now(&self) -> Millis;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[cfg(target_arch = "wasm32")]
    fn now(&self) -> Millis {
        js_sys::Date::now() as Millis
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn now(&self) -> Millis {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as Millis)
            .unwrap_or(0)
    }
}

/// Hand-driven clock. Clones share the same instant.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<Millis>>,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, now: Millis) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Millis) {
        self.now.set(self.now.get().saturating_add(by));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Millis {
        self.now.get()
    }
}

/// At most one pending deadline; scheduling again replaces it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DebounceTimer {
    deadline: Option<Millis>,
}

impl DebounceTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: Millis, delay: Millis) {
        self.deadline = Some(now.saturating_add(delay));
    }

    /// Returns whether something was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn deadline(&self) -> Option<Millis> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fires (and clears) the timer once `now` has reached the deadline.
    pub fn poll(&mut self, now: Millis) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Fires immediately if anything is pending.
    pub fn fire_now(&mut self) -> bool {
        self.cancel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescheduling_replaces_the_pending_deadline() {
        let mut timer = DebounceTimer::new();
        timer.schedule(0, 2000);
        timer.schedule(1500, 2000);
        assert_eq!(timer.deadline(), Some(3500));
        assert!(!timer.poll(2000));
        assert!(!timer.poll(3499));
        assert!(timer.poll(3500));
        assert!(!timer.is_pending());
        assert!(!timer.poll(10_000));
    }

    #[test]
    fn cancel_and_fire_now_report_pending_state() {
        let mut timer = DebounceTimer::new();
        assert!(!timer.cancel());
        assert!(!timer.fire_now());
        timer.schedule(10, 5);
        assert!(timer.fire_now());
        assert!(!timer.is_pending());
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(100);
        let other = clock.clone();
        clock.advance(50);
        assert_eq!(other.now(), 150);
        other.set(7);
        assert_eq!(clock.now(), 7);
    }
}
