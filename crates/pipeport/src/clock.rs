use std::time::{Duration, Instant};

/// Paces a loop at one tick per frame period, like a media clock.
///
/// Deadlines advance by a fixed step so sleep jitter does not accumulate.
/// If the loop falls more than one period behind, the clock resyncs to now.
pub struct FrameClock {
    period: Duration,
    next: Instant,
}

impl FrameClock {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next: Instant::now() + period,
        }
    }

    /// Block until the next tick.
    pub fn wait(&mut self) {
        let now = Instant::now();
        if self.next > now {
            std::thread::sleep(self.next - now);
            self.next += self.period;
        } else if now - self.next > self.period {
            self.next = now + self.period;
        } else {
            self.next += self.period;
        }
    }
}
