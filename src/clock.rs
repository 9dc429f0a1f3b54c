use std::time;

use diffbot_control::{Clock, Instant};

/// Monotonic time counted from construction.
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: time::Instant,
}

impl StdClock {
    pub fn new() -> Self {
        StdClock { origin: time::Instant::now() }
    }
}

impl Clock for StdClock {
    fn now(&self) -> Instant {
        let micros = self.origin.elapsed().as_micros();
        Instant::from_micros(u64::try_from(micros).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_goes_backwards() {
        let clock = StdClock::new();
        let a = clock.now();
        std::thread::sleep(time::Duration::from_millis(2));
        let b = clock.now();
        assert!(b >= a);
        assert!(b.as_micros() >= 2_000);
    }
}
