use crossbeam_channel::{self, Receiver};
use std::time::{Duration, Instant};

/// Periodic trigger for the local bitmap update pass.
///
/// The timer does not run anything on its own, the owner polls it from its
/// event loop. Stopping drops the ticker, starting creates a new one, so the
/// next tick is always a full period after `start`.
pub struct HeartbeatTimer {
    period: Duration,
    ticker: Option<Receiver<Instant>>,
}

impl HeartbeatTimer {
    /// Creates a stopped timer.
    pub fn new(period: Duration) -> Self {
        HeartbeatTimer {
            period,
            ticker: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn start(&mut self) {
        if self.ticker.is_none() {
            self.ticker = Some(crossbeam_channel::tick(self.period));
        }
    }

    pub fn stop(&mut self) {
        self.ticker = None;
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Returns true if a tick is due.
    pub fn poll(&self) -> bool {
        match self.ticker {
            Some(ref ticker) => ticker.try_recv().is_ok(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn stopped_timer_never_fires() {
        let timer = HeartbeatTimer::new(Duration::from_millis(1));
        thread::sleep(Duration::from_millis(10));
        assert!(!timer.is_running());
        assert!(!timer.poll());
    }

    #[test]
    fn fires_after_period() {
        let mut timer = HeartbeatTimer::new(Duration::from_millis(5));
        timer.start();
        assert!(timer.is_running());
        thread::sleep(Duration::from_millis(50));
        assert!(timer.poll());

        timer.stop();
        thread::sleep(Duration::from_millis(20));
        assert!(!timer.poll());
    }

    #[test]
    fn restart_resets_period() {
        let mut timer = HeartbeatTimer::new(Duration::from_secs(60));
        timer.start();
        timer.stop();
        timer.start();
        assert!(!timer.poll());
    }
}
