use crate::timestep::FixedTimestep;
use std::time::Duration;

/// Receiver of scheduled simulation steps and renders.
pub trait FrameTarget {
    type Error;

    /// One fixed step of `dt` seconds.
    fn update(&mut self, dt: f64) -> Result<(), Self::Error>;

    /// One render, `alpha` of the way towards the next step.
    fn render(&mut self, alpha: f64) -> Result<(), Self::Error>;
}

/// Timing policy for the application loop.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Fixed simulation step.
    pub update_period: Duration,
    /// Period the interpolation factor is measured against. `None` uses
    /// `update_period`, which keeps alpha in `[0, 1)`.
    pub render_period: Option<Duration>,
    /// Most updates run in one frame before owed time is dropped. `None`
    /// never drops time; `Some(0)` is treated as `Some(1)`.
    pub max_updates_per_frame: Option<u32>,
    /// Bound on joining the loop thread at shutdown. `None` waits for it.
    pub shutdown_timeout: Option<Duration>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            update_period: Duration::from_secs_f64(1.0 / 30.0),
            render_period: None,
            max_updates_per_frame: Some(5),
            shutdown_timeout: None,
        }
    }
}

/// What one frame did.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameReport {
    /// Wall time since the previous frame, in seconds.
    pub delta: f64,
    pub updates: u32,
    pub alpha: f64,
    /// Owed simulation time discarded by the update cap, in seconds.
    pub dropped: f64,
}

#[derive(Debug)]
pub struct FrameScheduler {
    config: SchedulerConfig,
    step: FixedTimestep,
    last: Option<Duration>,
}

impl FrameScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let step = FixedTimestep::with_render_period(
            config.update_period,
            config.render_period.unwrap_or(config.update_period),
        );
        Self {
            config,
            step,
            last: None,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn timestep(&self) -> &FixedTimestep {
        &self.step
    }

    /// Restart timing at `now` with nothing owed.
    pub fn reset(&mut self, now: Duration) {
        self.last = Some(now);
        self.step.reset();
    }

    /// Run one frame: catch-up updates, then exactly one render.
    ///
    /// The first frame after construction measures no elapsed time.
    pub fn frame<T: FrameTarget>(
        &mut self,
        now: Duration,
        target: &mut T,
    ) -> Result<FrameReport, T::Error> {
        let delta = match self.last {
            Some(last) => now.saturating_sub(last).as_secs_f64(),
            None => 0.0,
        };
        self.last = Some(now);
        self.step.accumulate(delta);

        let period = self.step.period();
        let mut updates = 0u32;
        let mut dropped = 0.0;
        while self.step.try_step() {
            target.update(period)?;
            updates += 1;
            if self.config.max_updates_per_frame.is_some_and(|max| updates >= max.max(1)) {
                dropped = self.step.drop_whole_periods();
                if dropped > 0.0 {
                    tracing::debug!(updates, dropped, "update cap reached, dropping owed time");
                }
                break;
            }
        }

        let alpha = self.step.alpha();
        target.render(alpha)?;
        tracing::trace!(delta, updates, alpha, "frame");

        Ok(FrameReport {
            delta,
            updates,
            alpha,
            dropped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        updates: Vec<f64>,
        renders: Vec<f64>,
        fail_update: bool,
    }

    impl FrameTarget for Recorder {
        type Error = &'static str;

        fn update(&mut self, dt: f64) -> Result<(), Self::Error> {
            if self.fail_update {
                return Err("update failed");
            }
            self.updates.push(dt);
            Ok(())
        }

        fn render(&mut self, alpha: f64) -> Result<(), Self::Error> {
            self.renders.push(alpha);
            Ok(())
        }
    }

    fn config(period: f64) -> SchedulerConfig {
        SchedulerConfig {
            update_period: Duration::from_secs_f64(period),
            ..SchedulerConfig::default()
        }
    }

    #[test]
    fn thirtieth_second_with_forty_millisecond_frames() {
        let mut sched = FrameScheduler::new(config(1.0 / 30.0));
        let mut target = Recorder::default();
        sched.reset(Duration::ZERO);

        for i in 1..=3u64 {
            sched
                .frame(Duration::from_millis(40 * i), &mut target)
                .unwrap();
        }

        assert_eq!(target.updates.len(), 3);
        assert_eq!(target.renders.len(), 3);
        assert!(target.updates.iter().all(|dt| (dt - 1.0 / 30.0).abs() < 1e-6));
        for pair in target.renders.windows(2) {
            assert!(pair[1] + 1e-9 >= pair[0], "alpha decreased: {pair:?}");
        }
        assert!(sched.timestep().accumulator() < 1.0 / 30.0);
    }

    #[test]
    fn update_count_matches_elapsed_periods() {
        let period = 1.0 / 30.0;
        for &(d, n) in &[(0.004, 500u64), (0.0125, 240), (0.021, 97), (0.033, 60)] {
            let mut sched = FrameScheduler::new(SchedulerConfig {
                max_updates_per_frame: None,
                ..config(period)
            });
            let mut target = Recorder::default();
            sched.reset(Duration::ZERO);
            for i in 1..=n {
                sched
                    .frame(Duration::from_secs_f64(d * i as f64), &mut target)
                    .unwrap();
                let acc = sched.timestep().accumulator();
                assert!((0.0..period).contains(&acc), "accumulator {acc} out of range");
            }
            let expected = (n as f64 * d / period).floor() as i64;
            let actual = target.updates.len() as i64;
            assert!((actual - expected).abs() <= 1, "d={d}: {actual} vs {expected}");
            assert_eq!(target.renders.len() as u64, n);
        }
    }

    #[test]
    fn first_frame_measures_nothing() {
        let mut sched = FrameScheduler::new(config(0.1));
        let mut target = Recorder::default();
        let report = sched.frame(Duration::from_secs(10), &mut target).unwrap();
        assert_eq!(report.delta, 0.0);
        assert_eq!(report.updates, 0);
        assert_eq!(target.renders, [0.0]);
    }

    #[test]
    fn cap_bounds_updates_and_drops_whole_periods() {
        let mut sched = FrameScheduler::new(SchedulerConfig {
            max_updates_per_frame: Some(5),
            ..config(0.1)
        });
        let mut target = Recorder::default();
        sched.reset(Duration::ZERO);

        let report = sched
            .frame(Duration::from_millis(2_050), &mut target)
            .unwrap();
        assert_eq!(report.updates, 5);
        assert!((report.dropped - 1.5).abs() < 1e-9);
        assert!((report.alpha - 0.5).abs() < 1e-6);

        let report = sched
            .frame(Duration::from_millis(2_170), &mut target)
            .unwrap();
        assert_eq!(report.updates, 1);
        assert_eq!(report.dropped, 0.0);
    }

    #[test]
    fn zero_cap_still_runs_one_update() {
        let mut sched = FrameScheduler::new(SchedulerConfig {
            max_updates_per_frame: Some(0),
            ..config(0.1)
        });
        let mut target = Recorder::default();
        sched.reset(Duration::ZERO);

        let report = sched
            .frame(Duration::from_millis(2_050), &mut target)
            .unwrap();
        assert_eq!(report.updates, 1);
        assert!((report.dropped - 1.9).abs() < 1e-6);
    }

    #[test]
    fn uncapped_catches_up_fully() {
        let mut sched = FrameScheduler::new(SchedulerConfig {
            max_updates_per_frame: None,
            ..config(0.1)
        });
        let mut target = Recorder::default();
        sched.reset(Duration::ZERO);
        let report = sched.frame(Duration::from_millis(2_050), &mut target).unwrap();
        assert_eq!(report.updates, 20);
        assert_eq!(report.dropped, 0.0);
    }

    #[test]
    fn update_error_skips_render() {
        let mut sched = FrameScheduler::new(config(0.1));
        let mut target = Recorder {
            fail_update: true,
            ..Recorder::default()
        };
        sched.reset(Duration::ZERO);
        assert!(sched.frame(Duration::from_millis(150), &mut target).is_err());
        assert!(target.renders.is_empty());
    }

    #[test]
    fn render_period_scales_alpha() {
        let mut sched = FrameScheduler::new(SchedulerConfig {
            render_period: Some(Duration::from_secs_f64(1.0 / 75.0)),
            ..config(1.0 / 30.0)
        });
        let mut target = Recorder::default();
        sched.reset(Duration::ZERO);
        let report = sched.frame(Duration::from_millis(20), &mut target).unwrap();
        assert_eq!(report.updates, 0);
        assert!((report.alpha - 1.5).abs() < 1e-6);
    }
}
