use std::time::{Duration, Instant};

/// Handle for one scheduled redraw. A host timer that fires with an outdated ticket is ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RedrawTicket(u64);

#[derive(Clone, Copy, Debug)]
struct Pending {
    ticket: RedrawTicket,
    first_request: Instant,
    deadline: Instant,
}

/// Coalesces bursts of redraw requests into one draw.
///
/// Every request cancels the pending draw and schedules a new one `window` after it, but never
/// later than `max_wait` after the first request of the burst. Time is always passed in.
#[derive(Clone, Debug)]
pub struct RedrawScheduler {
    window: Duration,
    max_wait: Duration,
    generation: u64,
    pending: Option<Pending>,
}

impl RedrawScheduler {
    /// Scheduler with the given coalescing window and max-wait bound.
    pub fn new(window: Duration, max_wait: Duration) -> Self {
        Self {
            window,
            max_wait: max_wait.max(window),
            generation: 0,
            pending: None,
        }
    }

    /// Request a redraw of the latest state at `now`.
    pub fn request(&mut self, now: Instant) -> RedrawTicket {
        self.generation += 1;
        let ticket = RedrawTicket(self.generation);
        let first_request = self.pending.map_or(now, |p| p.first_request);
        let deadline = (now + self.window).min(first_request + self.max_wait);
        self.pending = Some(Pending {
            ticket,
            first_request,
            deadline,
        });
        tracing::trace!(generation = self.generation, "redraw requested");
        ticket
    }

    /// `true` when a draw is scheduled.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending draw is due.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.deadline)
    }

    /// Time left until the pending draw is due (zero when overdue).
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.deadline().map(|d| d.saturating_duration_since(now))
    }

    /// Consume the pending draw if it is due at `now`. Returns `true` when the caller must draw.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(p) if now >= p.deadline => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Host-timer entry point: draw only if `ticket` is still the latest request and is due.
    pub fn fire(&mut self, ticket: RedrawTicket, now: Instant) -> bool {
        match self.pending {
            Some(p) if p.ticket == ticket => self.poll(now),
            _ => {
                tracing::trace!(?ticket, "stale redraw ticket ignored");
                false
            }
        }
    }

    /// Drop the pending draw, if any.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/scheduler.rs"]
mod tests;
