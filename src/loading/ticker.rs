//! Simulated progress for operations that report none of their own

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::LoadingCoordinator;
use crate::config::{ProgressConfig, TimingConfig};

/// Periodic task nudging the shared progress towards the ceiling.
/// The task is aborted when the ticker is stopped or dropped.
#[derive(Debug)]
pub struct ProgressTicker {
    handle: JoinHandle<()>,
}

impl ProgressTicker {
    pub fn start(coordinator: LoadingCoordinator, period: Duration, progress: ProgressConfig) -> Self {
        let (period, progress) = sanitize(period, progress);
        let handle = tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            let mut ticks = interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticks.tick().await;

            loop {
                ticks.tick().await;
                // Uniform over (0, max_increment]
                let increment = progress.max_increment - rng.gen_range(0.0..progress.max_increment);
                coordinator.update_progress(|current| next_progress(current, increment, progress.ceiling));
            }
        });

        tracing::trace!(?period, "progress ticker started");
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Cancel the task; no progress update happens after this returns
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.handle.abort();
        tracing::trace!("progress ticker stopped");
    }
}

/// Replace settings the task cannot run with by the defaults.
/// Configs built in code skip `LoaderConfig::validate`.
fn sanitize(period: Duration, mut progress: ProgressConfig) -> (Duration, ProgressConfig) {
    let defaults = ProgressConfig::default();

    let period = if period.is_zero() {
        tracing::warn!("Progress tick interval is zero, using the default");
        TimingConfig::default().tick_interval()
    } else {
        period
    };

    if !(progress.max_increment.is_finite() && progress.max_increment > 0.0) {
        tracing::warn!("Invalid progress step {}, using the default", progress.max_increment);
        progress.max_increment = defaults.max_increment;
    }
    if !(progress.ceiling.is_finite() && progress.ceiling > 0.0 && progress.ceiling <= 100.0) {
        tracing::warn!("Invalid progress ceiling {}, using the default", progress.ceiling);
        progress.ceiling = defaults.ceiling;
    }

    (period, progress)
}

/// Advance `current` by `increment` unless that would reach `ceiling`
pub fn next_progress(current: f64, increment: f64, ceiling: f64) -> f64 {
    let next = current + increment;
    if next >= ceiling {
        current
    } else {
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoaderConfig;

    #[test]
    fn test_next_progress_stays_below_ceiling() {
        assert_eq!(next_progress(0.0, 7.5, 90.0), 7.5);
        assert_eq!(next_progress(85.0, 4.0, 90.0), 89.0);
        assert_eq!(next_progress(85.0, 5.0, 90.0), 85.0);
        assert_eq!(next_progress(89.0, 10.0, 90.0), 89.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_advances_until_stopped() {
        let loader = LoadingCoordinator::default();
        loader.set_loading_with_progress(true, None, true);
        let config = loader.config().clone();

        let ticker = ProgressTicker::start(loader.clone(), config.timing.tick_interval(), config.progress.clone());
        tokio::time::sleep(Duration::from_millis(450)).await;
        assert!(ticker.is_running());

        let advanced = loader.snapshot().progress;
        assert!(advanced > 0.0);
        assert!(advanced < 90.0);

        ticker.stop();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(loader.snapshot().progress, advanced);
    }

    #[test]
    fn test_sanitize_replaces_unusable_settings() {
        let broken = ProgressConfig {
            ceiling: f64::NAN,
            max_increment: 0.0,
            clamp: true,
        };
        let (period, progress) = sanitize(Duration::ZERO, broken);
        assert_eq!(period, Duration::from_millis(200));
        assert_eq!(progress, ProgressConfig::default());

        let (_, progress) = sanitize(
            Duration::from_millis(50),
            ProgressConfig {
                max_increment: f64::INFINITY,
                ..ProgressConfig::default()
            },
        );
        assert_eq!(progress.max_increment, 10.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_survives_unvalidated_config() {
        let mut config = LoaderConfig::default();
        config.progress.max_increment = 0.0;
        assert!(config.validate().is_err());

        let loader = LoadingCoordinator::new(config);
        loader.set_loading_with_progress(true, None, true);
        let config = loader.config().clone();

        let ticker = ProgressTicker::start(loader.clone(), config.timing.tick_interval(), config.progress.clone());
        tokio::time::sleep(Duration::from_millis(450)).await;

        assert!(ticker.is_running());
        let progress = loader.snapshot().progress;
        assert!(progress > 0.0 && progress < 90.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_never_reaches_ceiling() {
        let loader = LoadingCoordinator::default();
        loader.set_loading_with_progress(true, None, true);
        let config = loader.config().clone();

        let _ticker = ProgressTicker::start(loader.clone(), config.timing.tick_interval(), config.progress.clone());
        let mut last = 0.0;
        for _ in 0..100 {
            tokio::time::sleep(config.timing.tick_interval()).await;
            let now = loader.snapshot().progress;
            assert!(now >= last, "progress went backwards: {} -> {}", last, now);
            assert!(now < 90.0);
            last = now;
        }
    }
}
