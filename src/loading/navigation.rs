//! Short "perceived loading" pulse on every route change

use tokio::task::JoinHandle;

use super::LoadingCoordinator;

/// Raises the indicator whenever the active route changes and drops it
/// again after the configured page delay. A new change restarts the delay.
#[derive(Debug)]
pub struct NavigationLoader {
    coordinator: LoadingCoordinator,
    current_route: Option<String>,
    pending_clear: Option<JoinHandle<()>>,
}

impl NavigationLoader {
    pub fn new(coordinator: LoadingCoordinator) -> Self {
        Self {
            coordinator,
            current_route: None,
            pending_clear: None,
        }
    }

    pub fn current_route(&self) -> Option<&str> {
        self.current_route.as_deref()
    }

    /// Whether a delayed clear is still outstanding
    pub fn is_pending(&self) -> bool {
        self.pending_clear
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Record the active route. Returns false when it did not change.
    pub fn navigate(&mut self, route: &str) -> bool {
        if self.current_route.as_deref() == Some(route) {
            return false;
        }

        tracing::debug!(from = ?self.current_route, to = route, "route changed");
        self.current_route = Some(route.to_string());

        if let Some(previous) = self.pending_clear.take() {
            previous.abort();
        }

        let config = self.coordinator.config();
        self.coordinator
            .set_loading(true, Some(&config.messages.navigation));

        let delay = config.timing.page_delay();
        let coordinator = self.coordinator.clone();
        self.pending_clear = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            coordinator.clear();
        }));

        true
    }
}

impl Drop for NavigationLoader {
    fn drop(&mut self) {
        if let Some(pending) = self.pending_clear.take() {
            if !pending.is_finished() {
                pending.abort();
                self.coordinator.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn test_route_change_pulses_indicator() {
        let loader = LoadingCoordinator::default();
        let mut nav = NavigationLoader::new(loader.clone());

        assert!(nav.navigate("/dashboard"));
        let state = loader.snapshot();
        assert!(state.is_loading);
        assert_eq!(state.message, "Loading page...");
        assert!(nav.is_pending());

        sleep(Duration::from_millis(799)).await;
        assert!(loader.snapshot().is_loading);

        sleep(Duration::from_millis(2)).await;
        assert!(!loader.snapshot().is_loading);
        assert!(!nav.is_pending());
        assert_eq!(nav.current_route(), Some("/dashboard"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_route_is_ignored() {
        let loader = LoadingCoordinator::default();
        let mut nav = NavigationLoader::new(loader.clone());

        nav.navigate("/chat");
        sleep(Duration::from_millis(900)).await;
        assert!(!nav.navigate("/chat"));
        assert!(!loader.snapshot().is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_route_restarts_delay() {
        let loader = LoadingCoordinator::default();
        let mut nav = NavigationLoader::new(loader.clone());

        nav.navigate("/suppliers");
        sleep(Duration::from_millis(600)).await;
        nav.navigate("/commissions");

        // The first clear would have fired at 800ms
        sleep(Duration::from_millis(400)).await;
        assert!(loader.snapshot().is_loading);

        sleep(Duration::from_millis(401)).await;
        assert!(!loader.snapshot().is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_clear() {
        let loader = LoadingCoordinator::default();
        let mut nav = NavigationLoader::new(loader.clone());
        nav.navigate("/admin");
        drop(nav);

        assert!(!loader.snapshot().is_loading);

        // A later operation must not be cut short by the old timer
        loader.set_loading(true, Some("Saving"));
        sleep(Duration::from_millis(1000)).await;
        assert!(loader.snapshot().is_loading);
    }
}
