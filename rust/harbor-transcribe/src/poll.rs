use std::time::Duration;

/// The shortest delay ever left between two status checks
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How a job is polled until it finishes: an exponential backoff between
/// status checks, capped at `max_interval`, and an overall deadline.
#[derive(Clone, Debug, PartialEq)]
pub struct PollPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    /// Growth factor applied to the interval after each check; values below
    /// `1.0` are treated as `1.0`
    pub multiplier: f64,
    /// How long to wait for a terminal status before giving up
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(30),
            multiplier: 2.0,
            timeout: Duration::from_secs(30 * 60),
        }
    }
}

impl PollPolicy {
    /// The sequence of delays to wait between successive status checks. No
    /// delay is shorter than [MIN_POLL_INTERVAL], whatever the policy says.
    pub fn backoff(&self) -> Backoff {
        let max = self.max_interval.max(MIN_POLL_INTERVAL);

        let multiplier = if self.multiplier.is_finite() {
            self.multiplier.max(1.0)
        } else {
            1.0
        };

        Backoff {
            next: self.initial_interval.max(MIN_POLL_INTERVAL).min(max),
            max,
            multiplier,
        }
    }
}

/// An endless iterator of backoff delays produced by a [PollPolicy]
#[derive(Clone, Debug)]
pub struct Backoff {
    next: Duration,
    max: Duration,
    multiplier: f64,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next;
        self.next = Duration::try_from_secs_f64(current.as_secs_f64() * self.multiplier)
            .unwrap_or(self.max)
            .min(self.max);
        Some(current)
    }
}
