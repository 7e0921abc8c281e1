//! Playback timer seam.
//!
//! The player never sleeps. It asks a [`Timer`] to deliver a tick for a
//! ticket after a delay and ignores any tick whose ticket is not the one it
//! is waiting for.

use std::time::Duration;

use tokio::time::Instant;

/// Identifies one armed timer. Tickets are never reused within a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerTicket(pub(crate) u64);

impl TimerTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

pub trait Timer {
    /// Deliver `ticket` back to the player after `delay`.
    fn schedule(&mut self, ticket: TimerTicket, delay: Duration);

    /// Forget `ticket`. Canceling a ticket that already fired is a no-op.
    fn cancel(&mut self, ticket: TimerTicket);
}

/// Timer driven by the async host: it records a deadline that the host
/// sleeps on with [`tokio::time::sleep_until`].
#[derive(Debug, Default)]
pub struct DeadlineTimer {
    pending: Option<(TimerTicket, Instant)>,
}

impl DeadlineTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(_, at)| at)
    }

    /// Take the pending ticket if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<TimerTicket> {
        match self.pending {
            Some((ticket, at)) if at <= now => {
                self.pending = None;
                Some(ticket)
            }
            _ => None,
        }
    }
}

impl Timer for DeadlineTimer {
    fn schedule(&mut self, ticket: TimerTicket, delay: Duration) {
        self.pending = Some((ticket, Instant::now() + delay));
    }

    fn cancel(&mut self, ticket: TimerTicket) {
        if self.pending.is_some_and(|(pending, _)| pending == ticket) {
            self.pending = None;
        }
    }
}

/// Timer that only fires when told to. Used by one-shot front ends that
/// never auto-play and by tests that step time by hand.
#[derive(Debug, Default)]
pub struct ManualTimer {
    pending: Option<(TimerTicket, Duration)>,
    scheduled: usize,
    canceled: usize,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<TimerTicket> {
        self.pending.map(|(ticket, _)| ticket)
    }

    pub fn pending_delay(&self) -> Option<Duration> {
        self.pending.map(|(_, delay)| delay)
    }

    /// Number of `schedule` calls so far.
    pub fn scheduled(&self) -> usize {
        self.scheduled
    }

    /// Number of `cancel` calls that hit the pending ticket.
    pub fn canceled(&self) -> usize {
        self.canceled
    }

    /// Fire the pending ticket, if any.
    pub fn fire(&mut self) -> Option<TimerTicket> {
        self.pending.take().map(|(ticket, _)| ticket)
    }
}

impl Timer for ManualTimer {
    fn schedule(&mut self, ticket: TimerTicket, delay: Duration) {
        self.scheduled += 1;
        self.pending = Some((ticket, delay));
    }

    fn cancel(&mut self, ticket: TimerTicket) {
        if self.pending() == Some(ticket) {
            self.pending = None;
            self.canceled += 1;
        }
    }
}
