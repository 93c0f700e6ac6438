//! Timing utilities: frame/iteration timers and stopwatches, used by the
//! build server for build `start_ts`/`end_ts` bookkeeping and timeouts.

use std::time::{Duration, Instant};

/// Tracks wall-clock time between successive calls to [`Timer::update`].
pub struct Timer {
    last_tick: Instant,
    delta: Duration,
    total: Duration,
    tick_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer, with `last_tick` set to now.
    #[must_use]
    pub fn new() -> Self {
        Self { last_tick: Instant::now(), delta: Duration::ZERO, total: Duration::ZERO, tick_count: 0 }
    }

    /// Advance the timer one tick.
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta = now.duration_since(self.last_tick);
        self.total += self.delta;
        self.last_tick = now;
        self.tick_count += 1;
    }

    /// Time elapsed since the previous `update`.
    #[must_use]
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Time elapsed since the timer was created, summed over ticks.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Number of `update` calls so far.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

/// A simple start/stop/accumulate stopwatch.
pub struct Stopwatch {
    start: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a stopped stopwatch at zero elapsed time.
    #[must_use]
    pub fn new() -> Self {
        Self { start: None, elapsed: Duration::ZERO }
    }

    /// Create and immediately start a stopwatch.
    #[must_use]
    pub fn start_new() -> Self {
        let mut sw = Self::new();
        sw.start();
        sw
    }

    /// Start (or resume) timing.
    pub fn start(&mut self) {
        if self.start.is_none() {
            self.start = Some(Instant::now());
        }
    }

    /// Stop timing, folding the running interval into `elapsed`.
    pub fn stop(&mut self) {
        if let Some(start) = self.start.take() {
            self.elapsed += start.elapsed();
        }
    }

    /// Reset to zero and stop.
    pub fn reset(&mut self) {
        self.start = None;
        self.elapsed = Duration::ZERO;
    }

    /// Total elapsed time, including any currently-running interval.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed + self.start.map_or(Duration::ZERO, |s| s.elapsed())
    }

    /// Whether the stopwatch is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.start.is_some()
    }
}

/// Milliseconds since the Unix epoch, used for build `start_ts`/`end_ts`.
#[must_use]
pub fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn stopwatch_accumulates_across_stop_start() {
        let mut sw = Stopwatch::start_new();
        sleep(Duration::from_millis(5));
        sw.stop();
        let after_first = sw.elapsed();
        assert!(after_first >= Duration::from_millis(5));
        sw.start();
        sleep(Duration::from_millis(5));
        sw.stop();
        assert!(sw.elapsed() > after_first);
    }

    #[test]
    fn unix_millis_is_monotonic_increasing() {
        let a = unix_millis();
        sleep(Duration::from_millis(2));
        let b = unix_millis();
        assert!(b >= a);
    }
}
