use std::future::Future;

use super::{LoadingCoordinator, ProgressTicker};

/// How `with_loader` presents the operation it wraps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoaderOptions {
    /// Falls back to the configured processing message
    pub message: Option<String>,
    pub show_progress: bool,
}

impl LoaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
}

/// Clears the loading state if the wrapping future is dropped before it
/// finished its own bookkeeping
struct ClearOnDrop<'a> {
    coordinator: &'a LoadingCoordinator,
    armed: bool,
}

impl ClearOnDrop<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ClearOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!("loader dropped mid-flight, clearing indicator");
            self.coordinator.clear();
        }
    }
}

impl LoadingCoordinator {
    /// Run `operation` with the indicator up, then clear it.
    ///
    /// With `show_progress` the bar creeps towards the configured ceiling
    /// while the operation runs, jumps to 100 on success and stays there for
    /// the completion delay. Errors are returned untouched after the
    /// indicator has been cleared.
    pub async fn with_loader<F, Fut, T, E>(&self, operation: F, options: LoaderOptions) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let config = self.config();
        let message = options
            .message
            .unwrap_or_else(|| config.messages.processing.clone());
        let show_progress = options.show_progress;

        self.set_loading_with_progress(true, Some(&message), show_progress);
        let guard = ClearOnDrop {
            coordinator: self,
            armed: true,
        };

        let ticker = show_progress.then(|| {
            ProgressTicker::start(self.clone(), config.timing.tick_interval(), config.progress.clone())
        });

        let result = operation().await;
        drop(ticker);

        match result {
            Ok(value) => {
                if show_progress {
                    self.set_progress(100.0);
                    tokio::time::sleep(config.timing.completion_delay()).await;
                }
                self.clear();
                guard.disarm();
                tracing::debug!(%message, "operation finished");
                Ok(value)
            }
            Err(e) => {
                self.clear();
                guard.disarm();
                tracing::debug!(%message, "operation failed");
                Err(e)
            }
        }
    }
}
