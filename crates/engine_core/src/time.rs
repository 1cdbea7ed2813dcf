//! Time management for the tick loop.

use std::time::Duration;

/// Fixed-step accumulator driven explicitly through [`Time::advance`].
///
/// The host feeds frame durations (wall time in a windowed host, scripted
/// steps in tests and headless runs) and drains whole fixed steps.
#[derive(Debug)]
pub struct Time {
    /// Fixed timestep for simulation (default 60 Hz).
    fixed_timestep: Duration,
    /// Accumulated time for fixed updates.
    accumulator: Duration,
    /// Upper bound on accumulated time; a long stall drops frames instead of spiralling.
    max_accumulated: Duration,
}

impl Default for Time {
    fn default() -> Self {
        Self::manual()
    }
}

impl Time {
    /// Create a clock that only moves through [`Time::advance`].
    pub fn manual() -> Self {
        Self {
            fixed_timestep: Duration::from_secs_f64(1.0 / 60.0),
            accumulator: Duration::ZERO,
            max_accumulated: Duration::from_millis(250),
        }
    }

    /// Add one frame's worth of time to the accumulator.
    pub fn advance(&mut self, delta: Duration) {
        self.accumulator = (self.accumulator + delta).min(self.max_accumulated);
    }

    /// Get the fixed timestep in seconds.
    pub fn fixed_timestep_seconds(&self) -> f32 {
        self.fixed_timestep.as_secs_f32()
    }

    /// Check if a fixed update should run and consume the time.
    pub fn should_fixed_update(&mut self) -> bool {
        if self.accumulator >= self.fixed_timestep {
            self.accumulator -= self.fixed_timestep;
            true
        } else {
            false
        }
    }

    /// Set the fixed timestep rate in Hz.
    pub fn set_fixed_rate(&mut self, hz: f64) {
        self.fixed_timestep = Duration::from_secs_f64(1.0 / hz.max(1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(time: &mut Time) -> usize {
        let mut steps = 0;
        while time.should_fixed_update() {
            steps += 1;
        }
        steps
    }

    #[test]
    fn nothing_runs_until_advanced() {
        let mut time = Time::manual();
        assert_eq!(drain(&mut time), 0);
        time.advance(Duration::from_millis(50));
        time.advance(Duration::from_millis(70));
        assert_eq!(drain(&mut time), 7);
    }

    #[test]
    fn fixed_updates_consume_accumulator() {
        let mut time = Time::manual();
        time.set_fixed_rate(60.0);
        time.advance(Duration::from_secs_f64(2.5 / 60.0));
        assert_eq!(drain(&mut time), 2);
        // The remaining half step carries over.
        time.advance(Duration::from_secs_f64(0.6 / 60.0));
        assert_eq!(drain(&mut time), 1);
    }

    #[test]
    fn long_stall_is_capped() {
        let mut time = Time::manual();
        time.set_fixed_rate(50.0);
        time.advance(Duration::from_secs(10));
        assert_eq!(drain(&mut time), 12);
    }
}
