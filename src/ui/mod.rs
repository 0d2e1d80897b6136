mod components;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table},
    Frame,
};

use crate::app::{App, JobStatus, Popup, ROUTES};

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(1), // Info line
            Constraint::Min(6),    // Routes + activity
            Constraint::Length(1), // Footer
        ])
        .split(area);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(30)])
        .split(chunks[1]);

    draw_info_line(f, app, chunks[0]);
    draw_routes_box(f, app, body[0]);
    draw_activity_box(f, app, body[1]);
    draw_footer(f, app, chunks[2]);

    // The busy overlay sits above everything but the help popup
    if app.loading.is_loading {
        components::draw_loading_overlay(f, app);
    }

    match app.popup {
        Popup::None => {}
        Popup::Help => draw_help_popup(f, app),
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let line = if let Some(ref msg) = app.status_message {
        let color = if msg.starts_with("Error") { theme.danger } else { theme.accent };
        Line::from(Span::styled(format!(" {}", msg), Style::default().fg(color)))
    } else if app.loading.is_loading {
        Line::from(vec![
            Span::styled(format!(" {} ", app.spinner()), Style::default().fg(theme.accent)),
            Span::styled(app.loading.message.clone(), Style::default().fg(theme.text)),
        ])
    } else {
        Line::from(vec![
            Span::styled(" Ready ", Style::default().fg(theme.success)),
            Span::styled(format!("│ {}", app.current_route()), Style::default().fg(theme.text_dim)),
        ])
    };

    f.render_widget(Paragraph::new(line), area);
}

fn draw_routes_box(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let block = Block::default()
        .title(Span::styled(
            " Routes ",
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent));

    let rows: Vec<Row> = ROUTES
        .iter()
        .enumerate()
        .map(|(i, route)| {
            let marker = if *route == app.current_route() { "●" } else { " " };
            let style = if i == app.selected_route {
                Style::default().fg(theme.text).bg(theme.bg_selected)
            } else {
                Style::default().fg(theme.text_dim)
            };
            Row::new(vec![marker.to_string(), route.to_string()]).style(style)
        })
        .collect();

    let table = Table::new(rows, [Constraint::Length(2), Constraint::Min(10)]).block(block);
    f.render_widget(table, area);
}

fn draw_activity_box(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let block = Block::default()
        .title(Span::styled(" Activity ", Style::default().fg(theme.inactive)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.inactive));

    // Newest entries at the top, as many as fit
    let visible = area.height.saturating_sub(2) as usize;
    let rows: Vec<Row> = app
        .activity
        .iter()
        .rev()
        .take(visible)
        .map(|entry| {
            let (status, color) = match &entry.status {
                JobStatus::Running => ("running".to_string(), theme.accent),
                JobStatus::Succeeded(took) => (format!("done in {}ms", took.as_millis()), theme.success),
                JobStatus::Failed(reason) => (format!("failed: {}", reason), theme.danger),
            };
            Row::new(vec![
                Span::styled(format!("#{}", entry.id), Style::default().fg(theme.text_dim)),
                Span::styled(entry.kind.label(), Style::default().fg(theme.text)),
                Span::styled(status, Style::default().fg(color)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [Constraint::Length(5), Constraint::Length(24), Constraint::Min(10)],
    )
    .block(block);
    f.render_widget(table, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let key = |k: &'static str| Span::styled(k, Style::default().fg(theme.accent));
    let hint = |h: &'static str| Span::styled(h, Style::default().fg(theme.text_dim));

    let line = Line::from(vec![
        key(" ↑/↓"),
        hint(" select  "),
        key("Enter"),
        hint(" open  "),
        key("p"),
        hint(" upload  "),
        key("o"),
        hint(" refresh  "),
        key("f"),
        hint(" failing  "),
        key("?"),
        hint(" help  "),
        key("q"),
        hint(" quit"),
    ]);

    f.render_widget(Paragraph::new(line), area);
}

fn draw_help_popup(f: &mut Frame, app: &App) {
    let theme = &app.theme;
    let popup_area = centered_rect(60, 60, f.area());
    f.render_widget(Clear, popup_area);

    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default().fg(theme.header).add_modifier(Modifier::BOLD),
        ))
    };
    let entry = |k: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(k, Style::default().fg(theme.accent)),
            Span::raw(what),
        ])
    };

    let help_text = vec![
        heading("═══ Navigation ═══"),
        entry("  ↑/↓ j/k   ", "Move through routes"),
        entry("  Enter     ", "Open route (short page loader)"),
        Line::from(""),
        heading("═══ Operations ═══"),
        entry("  p         ", "Upload with simulated progress"),
        entry("  o         ", "Refresh without progress bar"),
        entry("  f         ", "Verification that fails"),
        Line::from(""),
        entry("  q         ", "Quit"),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .alignment(Alignment::Left);
    f.render_widget(paragraph, popup_area);
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
