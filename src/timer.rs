//! Virtual cooperative timeline.
//!
//! Nothing runs on its own: the host advances the clock and receives the
//! payloads of every timer that came due, in due order. Timers scheduled for
//! the same instant fire in scheduling order.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Timer<T> {
    when: u64,
    id: TimerId,
    payload: T,
}

impl<T> PartialEq for Timer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Timer<T> {}

impl<T> PartialOrd for Timer<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Timer<T> {
    // BinaryHeap is a max-heap; the earliest timer must compare greatest.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .when
            .cmp(&self.when)
            .then_with(|| other.id.cmp(&self.id))
    }
}

#[derive(Debug)]
pub struct Timeline<T> {
    now: u64,
    next_id: u64,
    pending: BinaryHeap<Timer<T>>,
    cancelled: HashSet<TimerId>,
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Timeline<T> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_id: 0,
            pending: BinaryHeap::new(),
            cancelled: HashSet::new(),
        }
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Run `payload` once `delay_ms` have elapsed.
    pub fn schedule(&mut self, delay_ms: u64, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Timer {
            when: self.now.saturating_add(delay_ms),
            id,
            payload,
        });
        id
    }

    /// Cancel a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        if self.pending.iter().any(|t| t.id == id) {
            self.cancelled.insert(id)
        } else {
            false
        }
    }

    /// Number of live timers.
    pub fn len(&self) -> usize {
        self.pending.len() - self.cancelled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move the clock forward by `ms`, returning the payloads that came due.
    pub fn advance(&mut self, ms: u64) -> Vec<T> {
        let target = self.now.saturating_add(ms);
        let mut fired = Vec::new();
        while let Some(timer) = self.pop_due(target) {
            fired.push(timer);
        }
        self.now = target;
        fired
    }

    /// Move the clock to `target` without firing anything. Never moves it back.
    pub fn skip_to(&mut self, target: u64) {
        self.now = self.now.max(target);
    }

    /// Pop the next timer due at or before `target`, moving the clock to
    /// its due time. Lets a host interleave timers scheduled by earlier ones.
    pub fn pop_due(&mut self, target: u64) -> Option<T> {
        while let Some(timer) = self.pending.peek() {
            if timer.when > target {
                return None;
            }
            let timer = self.pending.pop()?;
            if self.cancelled.remove(&timer.id) {
                continue;
            }
            self.now = self.now.max(timer.when);
            return Some(timer.payload);
        }
        None
    }
}

/// Owned single-slot timer: arming it again cancels the pending one.
#[derive(Debug, Default)]
pub struct Debounce {
    pending: Option<TimerId>,
}

impl Debounce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any pending run and schedule a new one.
    pub fn arm<T>(&mut self, timeline: &mut Timeline<T>, delay_ms: u64, payload: T) -> TimerId {
        self.cancel(timeline);
        let id = timeline.schedule(delay_ms, payload);
        self.pending = Some(id);
        id
    }

    pub fn cancel<T>(&mut self, timeline: &mut Timeline<T>) {
        if let Some(id) = self.pending.take() {
            timeline.cancel(id);
        }
    }

    /// Mark the pending run as fired.
    pub fn settle(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_due_order() {
        let mut timeline = Timeline::new();
        timeline.schedule(500, "settle");
        timeline.schedule(200, "debounce");
        timeline.schedule(200, "second");
        assert!(timeline.advance(199).is_empty());
        assert_eq!(timeline.advance(1), ["debounce", "second"]);
        assert_eq!(timeline.advance(1000), ["settle"]);
        assert_eq!(timeline.now(), 1200);
        assert!(timeline.is_empty());
    }

    #[test]
    fn test_cancel() {
        let mut timeline = Timeline::new();
        let a = timeline.schedule(10, 'a');
        timeline.schedule(20, 'b');
        assert!(timeline.cancel(a));
        assert!(!timeline.cancel(a));
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.advance(100), ['b']);
        assert!(!timeline.cancel(a));
    }

    #[test]
    fn test_debounce_keeps_only_last() {
        let mut timeline = Timeline::new();
        let mut debounce = Debounce::new();
        for n in 0..5 {
            debounce.arm(&mut timeline, 200, n);
            timeline.advance(50);
        }
        assert!(debounce.is_pending());
        assert_eq!(timeline.advance(200), [4]);
        debounce.settle();
        assert!(!debounce.is_pending());
    }

    #[test]
    fn test_pop_due_moves_clock() {
        let mut timeline = Timeline::new();
        timeline.schedule(300, ());
        assert_eq!(timeline.pop_due(1000), Some(()));
        assert_eq!(timeline.now(), 300);
        assert_eq!(timeline.pop_due(1000), None);
    }
}
