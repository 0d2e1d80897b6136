use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use busyline::app::{self, App, Popup};
use busyline::{ui, LoaderConfig, LoaderOptions, LoadingCoordinator};

#[derive(Parser, Debug)]
#[command(name = "busyline")]
#[command(version)]
#[command(about = "Loading indicator coordinator with a terminal demo")]
struct Args {
    /// Use this config file instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a simulated operation of this many milliseconds without the TUI,
    /// printing every loading state as a JSON line
    #[arg(short, long, value_name = "MS")]
    run: Option<u64>,

    /// Make the simulated operation fail
    #[arg(long, requires = "run")]
    fail: bool,

    /// Do not show a progress bar for the simulated operation
    #[arg(long, requires = "run")]
    no_progress: bool,

    /// Message shown while the simulated operation runs
    #[arg(short, long, requires = "run")]
    message: Option<String>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let headless = args.run.is_some() || args.print_config;
    init_logging(!headless);

    let config = match &args.config {
        Some(path) => LoaderConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => LoaderConfig::load(),
    };

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let coordinator = LoadingCoordinator::new(config);

    if let Some(ms) = args.run {
        let options = LoaderOptions {
            message: args.message,
            show_progress: !args.no_progress,
        };
        return run_headless(coordinator, Duration::from_millis(ms), args.fail, options).await;
    }

    run_tui(coordinator).await
}

/// Headless runs log to stderr; the TUI logs to a file so the screen stays clean
fn init_logging(to_file: bool) {
    let filter = EnvFilter::from_default_env();

    if !to_file {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .with(filter)
            .init();
        return;
    }

    match open_log_file() {
        Some(file) => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .with(filter)
            .init(),
        None => tracing_subscriber::registry().with(filter).init(),
    }
}

fn open_log_file() -> Option<std::fs::File> {
    let dir = dirs::cache_dir()?.join("busyline");
    std::fs::create_dir_all(&dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("busyline.log"))
        .ok()
}

async fn run_headless(
    coordinator: LoadingCoordinator,
    duration: Duration,
    fail: bool,
    options: LoaderOptions,
) -> Result<()> {
    let mut rx = coordinator.subscribe();

    // Print every state until the indicator is cleared
    let printer = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            println!("{}", serde_json::to_string(&state)?);
            if !state.is_loading {
                break;
            }
        }
        Ok::<_, serde_json::Error>(())
    });

    let label = options
        .message
        .clone()
        .unwrap_or_else(|| "Simulated operation".to_string());
    let result = coordinator
        .with_loader(|| app::simulate(&label, duration, fail), options)
        .await;

    printer.await.context("State printer panicked")??;

    let elapsed = result?;
    tracing::info!("Simulated operation finished after {}ms", elapsed.as_millis());
    Ok(())
}

async fn run_tui(coordinator: LoadingCoordinator) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(coordinator);
    tracing::info!("Starting busyline TUI");

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if app.popup == Popup::None => return Ok(()),
                        KeyCode::Char('c') if key.modifiers.contains(event::KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        _ => app.handle_key(key),
                    }
                }
            }
        }

        // Spinner, job results and the latest loading state
        app.tick();

        // Let spawned jobs make progress between frames
        tokio::task::yield_now().await;
    }
}
