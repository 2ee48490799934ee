use std::time::Duration;

/// Accumulator for a fixed simulation step.
///
/// Frame time is added with [`accumulate`](Self::accumulate) and drained one
/// period at a time by [`try_step`](Self::try_step). Whatever is left over
/// is less than one period and becomes the render interpolation factor.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedTimestep {
    period: f64,
    render_period: f64,
    accumulator: f64,
}

impl FixedTimestep {
    /// Step of `period`; alpha is measured against the same period.
    pub fn new(period: Duration) -> Self {
        Self::with_render_period(period, period)
    }

    pub fn with_render_period(period: Duration, render_period: Duration) -> Self {
        let period = period.as_secs_f64();
        let render_period = render_period.as_secs_f64();
        Self {
            period: if period > 0.0 { period } else { f64::EPSILON },
            render_period: if render_period > 0.0 { render_period } else { f64::EPSILON },
            accumulator: 0.0,
        }
    }

    /// Fixed step length in seconds.
    pub fn period(&self) -> f64 {
        self.period
    }

    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    pub fn accumulate(&mut self, delta: f64) {
        self.accumulator += delta.max(0.0);
    }

    /// Consume one period if at least one is owed.
    pub fn try_step(&mut self) -> bool {
        if self.accumulator >= self.period {
            self.accumulator -= self.period;
            true
        } else {
            false
        }
    }

    /// Discard every whole period still owed, keeping the fractional part.
    /// Returns the discarded time in seconds.
    pub fn drop_whole_periods(&mut self) -> f64 {
        let owed = (self.accumulator / self.period).floor();
        if owed < 1.0 {
            return 0.0;
        }
        let dropped = owed * self.period;
        self.accumulator = (self.accumulator - dropped).max(0.0);
        dropped
    }

    pub fn alpha(&self) -> f64 {
        self.accumulator / self.render_period
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn steps_drain_by_period() {
        let mut ts = FixedTimestep::new(secs(0.1));
        ts.accumulate(0.25);
        assert!(ts.try_step());
        assert!(ts.try_step());
        assert!(!ts.try_step());
        assert!((ts.accumulator() - 0.05).abs() < 1e-9);
        assert!((ts.alpha() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn alpha_uses_render_period() {
        let mut ts = FixedTimestep::with_render_period(secs(1.0 / 30.0), secs(1.0 / 75.0));
        ts.accumulate(0.01);
        assert!(!ts.try_step());
        assert!((ts.alpha() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn negative_delta_is_ignored() {
        let mut ts = FixedTimestep::new(secs(0.1));
        ts.accumulate(-1.0);
        assert_eq!(ts.accumulator(), 0.0);
    }

    #[test]
    fn drop_keeps_remainder() {
        let mut ts = FixedTimestep::new(secs(0.1));
        ts.accumulate(0.53);
        let dropped = ts.drop_whole_periods();
        assert!((dropped - 0.5).abs() < 1e-9);
        assert!((ts.accumulator() - 0.03).abs() < 1e-9);
        assert_eq!(ts.drop_whole_periods(), 0.0);
    }
}
