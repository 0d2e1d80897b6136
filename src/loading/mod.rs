//! Session-scoped loading state shared by every busy indicator
//!
//! One `LoadingCoordinator` is created at startup and cloned into whatever
//! needs to start, stop or observe loading. Every setter is a single
//! whole-record transition on a `watch` channel, so subscribers never see
//! a half-applied update.

pub mod loader;
pub mod navigation;
pub mod ticker;

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

use crate::config::LoaderConfig;

pub use loader::LoaderOptions;
pub use navigation::NavigationLoader;
pub use ticker::ProgressTicker;

/// Snapshot of what a busy indicator should show
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadingState {
    pub is_loading: bool,
    pub message: String,
    pub show_progress: bool,
    /// 0..=100, only meaningful while `is_loading` is true
    pub progress: f64,
}

impl LoadingState {
    /// Progress to render, if a determinate bar should be shown at all
    pub fn visible_progress(&self) -> Option<f64> {
        (self.is_loading && self.show_progress).then_some(self.progress)
    }

    fn reset_progress(&mut self) {
        self.show_progress = false;
        self.progress = 0.0;
    }
}

/// Cloneable handle to the single loading state of a session
#[derive(Debug, Clone)]
pub struct LoadingCoordinator {
    state: Arc<watch::Sender<LoadingState>>,
    config: Arc<LoaderConfig>,
}

impl Default for LoadingCoordinator {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

impl LoadingCoordinator {
    pub fn new(config: LoaderConfig) -> Self {
        let (state, _) = watch::channel(LoadingState::default());
        Self {
            state: Arc::new(state),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Current state, cloned out of the channel
    pub fn snapshot(&self) -> LoadingState {
        self.state.borrow().clone()
    }

    /// Receiver that is notified after every transition
    pub fn subscribe(&self) -> watch::Receiver<LoadingState> {
        self.state.subscribe()
    }

    /// Show or hide the indicator. Hiding always drops any progress bar.
    pub fn set_loading(&self, loading: bool, message: Option<&str>) {
        let message = self.message_or_default(message);
        tracing::debug!(loading, %message, "set_loading");

        self.state.send_modify(|state| {
            if loading && !state.is_loading {
                state.progress = 0.0;
            }
            state.is_loading = loading;
            state.message = message;
            if !loading {
                state.reset_progress();
            }
        });
    }

    /// Store a progress value, clamped to 0..=100 unless clamping is disabled
    pub fn set_progress(&self, value: f64) {
        let value = if self.config.progress.clamp {
            clamp_progress(value)
        } else {
            value
        };
        tracing::trace!(value, "set_progress");

        self.state.send_modify(|state| state.progress = value);
    }

    /// Set loading, message and bar visibility in one transition
    pub fn set_loading_with_progress(&self, loading: bool, message: Option<&str>, show_progress: bool) {
        let message = self.message_or_default(message);
        tracing::debug!(loading, %message, show_progress, "set_loading_with_progress");

        self.state.send_modify(|state| {
            // A new session, or a bar appearing, starts empty
            if loading && (!state.is_loading || (show_progress && !state.show_progress)) {
                state.progress = 0.0;
            }
            state.is_loading = loading;
            state.message = message;
            if loading {
                state.show_progress = show_progress;
            } else {
                state.reset_progress();
            }
        });
    }

    pub fn clear(&self) {
        self.set_loading(false, None);
    }

    /// Apply `f` to the stored progress in place. Does nothing unless a
    /// progress bar is currently shown, and skips the notification when the
    /// value does not change.
    pub(crate) fn update_progress(&self, f: impl FnOnce(f64) -> f64) {
        self.state.send_if_modified(|state| {
            if !(state.is_loading && state.show_progress) {
                return false;
            }
            let next = f(state.progress);
            if next == state.progress {
                return false;
            }
            state.progress = next;
            true
        });
    }

    fn message_or_default(&self, message: Option<&str>) -> String {
        message
            .unwrap_or(&self.config.messages.loading)
            .to_string()
    }
}

fn clamp_progress(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_resets_progress() {
        let loader = LoadingCoordinator::default();
        loader.set_loading_with_progress(true, Some("Uploading"), true);
        loader.set_progress(64.0);

        loader.set_loading(true, Some("Still uploading"));
        assert_eq!(loader.snapshot().progress, 64.0);

        loader.set_loading(false, None);
        let state = loader.snapshot();
        assert!(!state.is_loading);
        assert!(!state.show_progress);
        assert_eq!(state.progress, 0.0);
        assert_eq!(state.message, "Loading...");
    }

    #[test]
    fn test_set_loading_with_progress_is_visible_immediately() {
        let loader = LoadingCoordinator::default();
        loader.set_loading_with_progress(true, Some("X"), true);

        let state = loader.snapshot();
        assert!(state.is_loading);
        assert_eq!(state.message, "X");
        assert!(state.show_progress);
        assert_eq!(state.visible_progress(), Some(0.0));
    }

    #[test]
    fn test_stopping_with_progress_flag_still_resets() {
        let loader = LoadingCoordinator::default();
        loader.set_loading_with_progress(true, None, true);
        loader.set_progress(40.0);

        loader.set_loading_with_progress(false, None, true);
        let state = loader.snapshot();
        assert!(!state.show_progress);
        assert_eq!(state.progress, 0.0);
        assert_eq!(state.visible_progress(), None);
    }

    #[test]
    fn test_set_progress_clamps_by_default() {
        let loader = LoadingCoordinator::default();
        loader.set_progress(150.0);
        assert_eq!(loader.snapshot().progress, 100.0);

        loader.set_progress(-3.0);
        assert_eq!(loader.snapshot().progress, 0.0);

        loader.set_progress(f64::NAN);
        assert_eq!(loader.snapshot().progress, 0.0);
    }

    #[test]
    fn test_set_progress_passes_through_when_clamping_disabled() {
        let mut config = LoaderConfig::default();
        config.progress.clamp = false;
        let loader = LoadingCoordinator::new(config);
        let rx = loader.subscribe();

        loader.set_progress(150.0);
        assert_eq!(rx.borrow().progress, 150.0);
    }

    #[test]
    fn test_progress_hidden_while_not_loading() {
        let state = LoadingState {
            is_loading: false,
            message: String::new(),
            show_progress: true,
            progress: 50.0,
        };
        assert_eq!(state.visible_progress(), None);
    }

    #[tokio::test]
    async fn test_subscribers_see_one_change_per_call() {
        let loader = LoadingCoordinator::default();
        let mut rx = loader.subscribe();
        let other = loader.clone();

        other.set_loading_with_progress(true, Some("Saving"), true);
        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen, loader.snapshot());
        assert!(!rx.has_changed().unwrap());

        // Unchanged progress does not wake subscribers
        loader.update_progress(|p| p);
        assert!(!rx.has_changed().unwrap());
        loader.update_progress(|p| p + 5.0);
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn test_simulated_progress_ignored_without_bar() {
        let loader = LoadingCoordinator::default();
        loader.update_progress(|p| p + 5.0);
        assert_eq!(loader.snapshot().progress, 0.0);

        loader.set_loading(true, Some("Saving"));
        loader.update_progress(|p| p + 5.0);
        assert_eq!(loader.snapshot().progress, 0.0);
    }

    #[test]
    fn test_new_session_starts_with_empty_bar() {
        let mut config = LoaderConfig::default();
        config.progress.clamp = false;
        let loader = LoadingCoordinator::new(config);

        // Progress written while idle must not leak into the next session
        loader.set_progress(37.0);
        loader.set_loading_with_progress(true, Some("Uploading"), true);
        assert_eq!(loader.snapshot().visible_progress(), Some(0.0));

        loader.set_progress(55.0);
        loader.set_loading_with_progress(true, Some("Still uploading"), true);
        assert_eq!(loader.snapshot().progress, 55.0);

        loader.set_loading(true, Some("Spinner only"));
        loader.set_loading_with_progress(true, Some("Bar again"), true);
        assert_eq!(loader.snapshot().progress, 55.0);

        loader.set_loading_with_progress(true, Some("Spinner"), false);
        loader.set_loading_with_progress(true, Some("Bar again"), true);
        assert_eq!(loader.snapshot().visible_progress(), Some(0.0));
    }
}
