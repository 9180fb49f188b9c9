use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Timer service the slider arms its image timers on.
///
/// Nothing fires on its own: the owner calls [`Scheduler::fire_next`] with a
/// deadline and receives due timers one at a time, so a callback that cancels
/// or arms timers is seen before the next one is picked.
pub trait Scheduler {
    fn now(&self) -> Duration;
    fn set_timeout(&mut self, delay: Duration) -> TimerId;
    fn set_interval(&mut self, period: Duration) -> TimerId;
    fn cancel(&mut self, id: TimerId);

    /// Pops the earliest timer due at or before `deadline` and moves the clock
    /// to its due time. Returns `None` once nothing is due, leaving the clock
    /// at `deadline`.
    fn fire_next(&mut self, deadline: Duration) -> Option<TimerId>;
}

#[derive(Debug)]
struct Timer {
    id: TimerId,
    due: Duration,
    period: Option<Duration>,
}

/// Virtual clock with a flat list of pending timers.
///
/// Ties on due time fire in the order the timers were armed.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    next_id: u64,
    timers: Vec<Timer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    fn arm(&mut self, delay: Duration, period: Option<Duration>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer { id, due: self.now + delay, period });
        id
    }
}

impl Scheduler for TimerQueue {
    fn now(&self) -> Duration {
        self.now
    }

    fn set_timeout(&mut self, delay: Duration) -> TimerId {
        self.arm(delay, None)
    }

    fn set_interval(&mut self, period: Duration) -> TimerId {
        // A zero period would fire forever within one deadline
        let period = period.max(Duration::from_millis(1));
        self.arm(period, Some(period))
    }

    fn cancel(&mut self, id: TimerId) {
        self.timers.retain(|timer| timer.id != id);
    }

    fn fire_next(&mut self, deadline: Duration) -> Option<TimerId> {
        let next = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= deadline)
            .min_by_key(|(_, timer)| (timer.due, timer.id))
            .map(|(position, _)| position);

        let Some(position) = next else {
            self.now = self.now.max(deadline);
            return None;
        };

        let Timer { id, due, period } = self.timers[position];
        self.now = self.now.max(due);
        match period {
            Some(period) => self.timers[position].due += period,
            None => {
                self.timers.swap_remove(position);
            }
        }
        Some(id)
    }
}
