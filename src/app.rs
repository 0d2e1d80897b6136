use crossterm::event::{KeyCode, KeyEvent};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::loading::{LoaderOptions, LoadingCoordinator, LoadingState, NavigationLoader};
use crate::theme::Theme;

pub const ROUTES: [&str; 5] = ["/dashboard", "/suppliers", "/commissions", "/chat", "/admin"];

pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Oldest activity entries are dropped past this
const MAX_ACTIVITY: usize = 50;

/// Seconds a status message stays in the info line
const STATUS_TIMEOUT_SECS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
}

/// Kind of simulated work the demo can start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Upload,       // long, with a progress bar
    Refresh,      // short, spinner only
    Verification, // fails part way through
}

impl JobKind {
    pub fn label(&self) -> &'static str {
        match self {
            JobKind::Upload => "Uploading catalogue",
            JobKind::Refresh => "Refreshing commissions",
            JobKind::Verification => "Verifying payment",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            JobKind::Upload => Duration::from_millis(2500),
            JobKind::Refresh => Duration::from_millis(900),
            JobKind::Verification => Duration::from_millis(1500),
        }
    }

    fn shows_progress(&self) -> bool {
        !matches!(self, JobKind::Refresh)
    }

    fn fails(&self) -> bool {
        matches!(self, JobKind::Verification)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("{0} was rejected by the server")]
    Rejected(String),
}

/// Stand-in for a network call: waits `duration`, then succeeds or fails
pub async fn simulate(label: &str, duration: Duration, fail: bool) -> Result<Duration, JobError> {
    tokio::time::sleep(duration).await;
    if fail {
        Err(JobError::Rejected(label.to_string()))
    } else {
        Ok(duration)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Succeeded(Duration),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub id: u32,
    pub kind: JobKind,
    pub status: JobStatus,
}

pub struct App {
    pub popup: Popup,
    pub theme: Theme,

    // Routes (left box)
    pub selected_route: usize,
    navigation: NavigationLoader,

    // Latest loading snapshot, refreshed every tick
    pub loading: LoadingState,
    loading_rx: watch::Receiver<LoadingState>,
    coordinator: LoadingCoordinator,

    // Activity log (right box), newest last
    pub activity: Vec<ActivityEntry>,
    results_tx: mpsc::UnboundedSender<(u32, JobStatus)>,
    results_rx: mpsc::UnboundedReceiver<(u32, JobStatus)>,
    next_job_id: u32,

    pub spinner_frame: usize,
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,
}

impl App {
    pub fn new(coordinator: LoadingCoordinator) -> Self {
        let theme = Theme::from_config(&coordinator.config().theme);
        let loading_rx = coordinator.subscribe();
        let loading = loading_rx.borrow().clone();
        let (results_tx, results_rx) = mpsc::unbounded_channel();

        let mut navigation = NavigationLoader::new(coordinator.clone());
        navigation.navigate(ROUTES[0]);

        Self {
            popup: Popup::None,
            theme,
            selected_route: 0,
            navigation,
            loading,
            loading_rx,
            coordinator,
            activity: Vec::new(),
            results_tx,
            results_rx,
            next_job_id: 1,
            spinner_frame: 0,
            status_message: None,
            status_message_time: None,
        }
    }

    pub fn current_route(&self) -> &str {
        self.navigation.current_route().unwrap_or(ROUTES[0])
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()]
    }

    pub fn set_status(&mut self, msg: &str) {
        self.status_message = Some(msg.to_string());
        self.status_message_time = Some(Instant::now());
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.popup != Popup::None {
            // Any key closes the help popup
            self.popup = Popup::None;
            return;
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.selected_route = (self.selected_route + 1) % ROUTES.len();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected_route = (self.selected_route + ROUTES.len() - 1) % ROUTES.len();
            }
            KeyCode::Enter => {
                let route = ROUTES[self.selected_route];
                if !self.navigation.navigate(route) {
                    self.set_status(&format!("Already on {}", route));
                }
            }
            KeyCode::Char('p') => self.start_job(JobKind::Upload),
            KeyCode::Char('o') => self.start_job(JobKind::Refresh),
            KeyCode::Char('f') => self.start_job(JobKind::Verification),
            KeyCode::Char('?') => self.popup = Popup::Help,
            _ => {}
        }
    }

    /// Spawn a simulated operation wrapped in the loader
    pub fn start_job(&mut self, kind: JobKind) {
        let id = self.next_job_id;
        self.next_job_id += 1;

        self.activity.push(ActivityEntry {
            id,
            kind,
            status: JobStatus::Running,
        });
        if self.activity.len() > MAX_ACTIVITY {
            self.activity.remove(0);
        }

        let coordinator = self.coordinator.clone();
        let results = self.results_tx.clone();
        let options = LoaderOptions::new()
            .message(format!("{}...", kind.label()))
            .with_progress(kind.shows_progress());

        tracing::info!(id, ?kind, "starting job");
        tokio::spawn(async move {
            let outcome = coordinator
                .with_loader(|| simulate(kind.label(), kind.duration(), kind.fails()), options)
                .await;
            let status = match outcome {
                Ok(elapsed) => JobStatus::Succeeded(elapsed),
                Err(e) => {
                    tracing::warn!(id, "job failed: {}", e);
                    JobStatus::Failed(e.to_string())
                }
            };
            // The app may already be gone on shutdown
            let _ = results.send((id, status));
        });
    }

    /// Periodic refresh: pull results and the latest loading state
    pub fn tick(&mut self) {
        while let Ok((id, status)) = self.results_rx.try_recv() {
            if let JobStatus::Failed(ref reason) = status {
                self.set_status(&format!("Error: {}", reason));
            }
            if let Some(entry) = self.activity.iter_mut().find(|e| e.id == id) {
                entry.status = status;
            }
        }

        if self.loading_rx.has_changed().unwrap_or(false) {
            self.loading = self.loading_rx.borrow_and_update().clone();
        }

        if self.loading.is_loading {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }

        // Clear status message after a few seconds
        if let Some(time) = self.status_message_time {
            if time.elapsed().as_secs() >= STATUS_TIMEOUT_SECS {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }
}
