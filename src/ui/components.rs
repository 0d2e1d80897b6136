//! Busy overlay drawn whenever the shared loading state is active

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph},
    Frame,
};

use super::centered_rect;
use crate::app::App;

pub fn draw_loading_overlay(f: &mut Frame, app: &App) {
    let theme = &app.theme;
    let progress = app.loading.visible_progress();

    let height = if progress.is_some() { 6 } else { 3 };
    let area = overlay_area(f.area(), height);
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let message = Paragraph::new(Line::from(vec![
        Span::styled(
            format!("{} ", app.spinner()),
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled(app.loading.message.clone(), Style::default().fg(theme.text)),
    ]))
    .alignment(Alignment::Center);

    let Some(percent) = progress else {
        f.render_widget(message, inner);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Message
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Gauge
            Constraint::Min(0),
        ])
        .split(inner);

    f.render_widget(message, rows[0]);

    // Out-of-range and NaN values are possible when clamping is disabled
    let ratio = if percent.is_finite() {
        (percent / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(theme.accent).bg(theme.bg_selected))
        .ratio(ratio)
        .label(format!("{:.0}%", percent));
    f.render_widget(gauge, rows[2]);
}

/// Centered box of a fixed height, half the screen wide
fn overlay_area(screen: Rect, height: u16) -> Rect {
    let column = centered_rect(50, 100, screen);
    let top = column.y + column.height.saturating_sub(height) / 2;
    Rect {
        x: column.x,
        y: top,
        width: column.width,
        height: height.min(column.height),
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::render;
    use crate::app::App;
    use crate::config::LoaderConfig;
    use crate::loading::LoadingCoordinator;

    #[tokio::test(start_paused = true)]
    async fn test_overlay_shows_message_and_gauge() {
        let coordinator = LoadingCoordinator::default();
        let mut app = App::new(coordinator.clone());

        coordinator.set_loading_with_progress(true, Some("Uploading catalogue..."), true);
        coordinator.set_progress(42.0);
        app.tick();

        let screen = render(&app);
        assert!(screen.contains("Uploading catalogue..."));
        assert!(screen.contains("42%"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlay_without_progress_has_no_gauge() {
        let coordinator = LoadingCoordinator::default();
        let mut app = App::new(coordinator.clone());

        coordinator.set_progress(42.0);
        coordinator.set_loading(true, Some("Refreshing commissions..."));
        app.tick();

        let screen = render(&app);
        assert!(screen.contains("Refreshing commissions..."));
        assert!(!screen.contains("42%"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unclamped_progress_still_renders() {
        let mut config = LoaderConfig::default();
        config.progress.clamp = false;
        let coordinator = LoadingCoordinator::new(config);
        let mut app = App::new(coordinator.clone());

        coordinator.set_loading_with_progress(true, Some("Syncing"), true);
        coordinator.set_progress(150.0);
        app.tick();

        assert!(render(&app).contains("150%"));

        coordinator.set_progress(f64::NAN);
        app.tick();
        assert!(app.loading.progress.is_nan());
        assert!(render(&app).contains("Syncing"));

        coordinator.set_progress(f64::INFINITY);
        app.tick();
        assert!(render(&app).contains("Syncing"));
    }
}
