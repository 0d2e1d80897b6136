//! Session-scoped loading coordinator
//!
//! A [`LoadingCoordinator`] holds the one record saying whether a busy
//! indicator should be shown, with what message and how much progress.
//! Call sites flip it with the setters or wrap an async operation in
//! [`LoadingCoordinator::with_loader`]; any number of consumers
//! [`subscribe`](LoadingCoordinator::subscribe) and redraw on change.

pub mod app;
pub mod config;
pub mod error;
pub mod loading;
pub mod theme;
pub mod ui;

pub use config::LoaderConfig;
pub use error::ConfigError;
pub use loading::{LoaderOptions, LoadingCoordinator, LoadingState, NavigationLoader, ProgressTicker};
