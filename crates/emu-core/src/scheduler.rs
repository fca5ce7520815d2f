//! Discrete-event scheduler for a two-phase clock.
//!
//! Time is kept in half cycles: every clock cycle has a PHI1 slot (even
//! half cycle) followed by a PHI2 slot (odd half cycle). Chips schedule
//! their own events; the owner pops them in time order with
//! [`EventScheduler::next_event`] and routes each one back to the chip that
//! scheduled it.

use std::collections::VecDeque;

use crate::Ticks;

/// Half of a clock cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// First half. Video chips own the bus here on the C64.
    Phi1,
    /// Second half. The CPU accesses the bus here.
    Phi2,
}

impl Phase {
    const fn bit(self) -> u64 {
        match self {
            Phase::Phi1 => 0,
            Phase::Phi2 => 1,
        }
    }
}

/// Something that can queue events in simulated time.
pub trait Scheduler {
    type Event;

    /// Queue `event` at the next slot of `phase` plus `cycles` whole cycles.
    ///
    /// The current half cycle counts as the next slot if it already has the
    /// requested phase. Scheduling an event that is already pending moves it.
    fn schedule(&mut self, event: Self::Event, cycles: u32, phase: Phase);

    /// Queue `event` exactly `cycles` whole cycles from now, in the current
    /// phase.
    fn schedule_in(&mut self, event: Self::Event, cycles: u32);

    /// Remove `event` if it is pending.
    fn cancel(&mut self, event: Self::Event);

    fn is_pending(&self, event: Self::Event) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct Pending<E> {
    trigger: u64,
    event: E,
}

/// Time-ordered event queue.
///
/// Events due at the same half cycle come out in the order they were
/// scheduled.
#[derive(Debug, Clone)]
pub struct EventScheduler<E> {
    /// Current time in half cycles.
    now: u64,
    queue: VecDeque<Pending<E>>,
}

impl<E: Copy + PartialEq> Default for EventScheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Copy + PartialEq> EventScheduler<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: 0,
            queue: VecDeque::new(),
        }
    }

    /// Drop every pending event and rewind to time zero.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.now = 0;
    }

    /// Pop the earliest event and advance time to it.
    ///
    /// Returns `None` when nothing is scheduled; time does not move.
    pub fn next_event(&mut self) -> Option<E> {
        let pending = self.queue.pop_front()?;
        self.now = pending.trigger;
        Some(pending.event)
    }

    /// Whole cycles elapsed, as seen from `phase`.
    #[must_use]
    pub fn time(&self, phase: Phase) -> Ticks {
        Ticks::new((self.now + (phase.bit() ^ 1)) >> 1)
    }

    /// Phase of the current half cycle.
    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.now & 1 == 0 {
            Phase::Phi1
        } else {
            Phase::Phi2
        }
    }

    /// Current time in half cycles.
    #[must_use]
    pub fn half_cycles(&self) -> u64 {
        self.now
    }

    /// Number of events waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn insert(&mut self, event: E, trigger: u64) {
        self.remove(event);
        let index = self.queue.partition_point(|p| p.trigger <= trigger);
        self.queue.insert(index, Pending { trigger, event });
    }

    fn remove(&mut self, event: E) {
        if let Some(index) = self.queue.iter().position(|p| p.event == event) {
            self.queue.remove(index);
        }
    }
}

impl<E: Copy + PartialEq> Scheduler for EventScheduler<E> {
    type Event = E;

    fn schedule(&mut self, event: E, cycles: u32, phase: Phase) {
        let align = (self.now & 1) ^ phase.bit();
        let trigger = self.now + align + (u64::from(cycles) << 1);
        self.insert(event, trigger);
    }

    fn schedule_in(&mut self, event: E, cycles: u32) {
        let trigger = self.now + (u64::from(cycles) << 1);
        self.insert(event, trigger);
    }

    fn cancel(&mut self, event: E) {
        self.remove(event);
    }

    fn is_pending(&self, event: E) -> bool {
        self.queue.iter().any(|p| p.event == event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Ev {
        A,
        B,
        C,
    }

    #[test]
    fn phase_alignment_from_phi1() {
        let mut s = EventScheduler::new();
        s.schedule(Ev::A, 0, Phase::Phi2);
        s.schedule(Ev::B, 0, Phase::Phi1);
        s.schedule(Ev::C, 1, Phase::Phi1);

        assert_eq!(s.next_event(), Some(Ev::B));
        assert_eq!(s.half_cycles(), 0);
        assert_eq!(s.next_event(), Some(Ev::A));
        assert_eq!(s.half_cycles(), 1);
        assert_eq!(s.phase(), Phase::Phi2);
        assert_eq!(s.next_event(), Some(Ev::C));
        assert_eq!(s.half_cycles(), 2);
        assert_eq!(s.next_event(), None);
        assert_eq!(s.half_cycles(), 2);
    }

    #[test]
    fn phase_alignment_from_phi2() {
        let mut s = EventScheduler::new();
        s.schedule(Ev::A, 0, Phase::Phi2);
        assert_eq!(s.next_event(), Some(Ev::A));

        // Now at half cycle 1 (PHI2). PHI2 is the current slot, PHI1 the next.
        s.schedule(Ev::B, 0, Phase::Phi1);
        s.schedule(Ev::A, 0, Phase::Phi2);
        s.schedule_in(Ev::C, 1);

        assert_eq!(s.next_event(), Some(Ev::A));
        assert_eq!(s.half_cycles(), 1);
        assert_eq!(s.next_event(), Some(Ev::B));
        assert_eq!(s.half_cycles(), 2);
        assert_eq!(s.next_event(), Some(Ev::C));
        assert_eq!(s.half_cycles(), 3);
    }

    #[test]
    fn equal_times_are_fifo() {
        let mut s = EventScheduler::new();
        s.schedule_in(Ev::C, 2);
        s.schedule_in(Ev::A, 2);
        s.schedule_in(Ev::B, 2);
        assert_eq!(s.next_event(), Some(Ev::C));
        assert_eq!(s.next_event(), Some(Ev::A));
        assert_eq!(s.next_event(), Some(Ev::B));
    }

    #[test]
    fn cancel_and_reschedule() {
        let mut s = EventScheduler::new();
        s.schedule_in(Ev::A, 1);
        s.schedule_in(Ev::B, 2);
        assert!(s.is_pending(Ev::A));

        s.cancel(Ev::A);
        assert!(!s.is_pending(Ev::A));
        s.cancel(Ev::A);

        // Rescheduling moves rather than duplicates.
        s.schedule_in(Ev::B, 5);
        assert_eq!(s.len(), 1);
        assert_eq!(s.next_event(), Some(Ev::B));
        assert_eq!(s.half_cycles(), 10);
        assert!(s.is_empty());
    }

    #[test]
    fn time_depends_on_phase() {
        let mut s = EventScheduler::new();
        assert_eq!(s.time(Phase::Phi1), Ticks::new(0));
        assert_eq!(s.time(Phase::Phi2), Ticks::new(0));

        s.schedule(Ev::A, 3, Phase::Phi2);
        s.next_event();
        assert_eq!(s.half_cycles(), 7);
        assert_eq!(s.time(Phase::Phi2), Ticks::new(3));
        assert_eq!(s.time(Phase::Phi1), Ticks::new(4));
    }

    #[test]
    fn reset_clears_queue_and_time() {
        let mut s = EventScheduler::new();
        s.schedule_in(Ev::A, 4);
        s.next_event();
        s.schedule_in(Ev::B, 1);
        s.reset();
        assert!(s.is_empty());
        assert_eq!(s.half_cycles(), 0);
    }
}
