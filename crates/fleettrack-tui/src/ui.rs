// UI rendering logic
use crate::app::{App, Focus, InputMode};
use chrono::{DateTime, Utc};
use fleettrack_core::due::{describe_days, DueCalculator};
use fleettrack_core::{DueStatus, Vehicle};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
    Frame,
};

pub fn render(frame: &mut Frame, app: &mut App, now: DateTime<Utc>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(5),    // Cards + history
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0], now);

    // Narrow terminals get more room for the cards
    let (cards_pct, history_pct) = if frame.area().width < 100 {
        (45, 55)
    } else {
        (35, 65)
    };
    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(cards_pct),
            Constraint::Percentage(history_pct),
        ])
        .split(chunks[1]);

    render_vehicle_cards(frame, app, content_chunks[0], now);
    render_history(frame, app, content_chunks[1], now);
    render_status_bar(frame, app, chunks[2]);

    match app.input_mode {
        InputMode::EditingRecord => crate::form_ui::render_form(frame, app),
        InputMode::ConfirmDelete => render_delete_confirm(frame, app),
        InputMode::Analysis => crate::analysis_ui::render_analysis(frame, app),
        InputMode::Normal => {}
    }
}

pub fn status_color(status: DueStatus) -> Color {
    match status {
        DueStatus::Overdue => Color::Red,
        DueStatus::DueSoon => Color::Yellow,
        DueStatus::OnSchedule => Color::Green,
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect, now: DateTime<Utc>) {
    let mut overdue = 0;
    let mut due_soon = 0;
    for vehicle in app.store.vehicles() {
        match app
            .store
            .next_due(&vehicle.id, now)
            .map(|due| due.status(app.due_soon_days))
        {
            Some(DueStatus::Overdue) => overdue += 1,
            Some(DueStatus::DueSoon) => due_soon += 1,
            _ => {}
        }
    }

    let line = Line::from(vec![
        Span::styled(
            "🚗 FleetTrack",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::raw(format!("{} vehicles", app.store.vehicles().len())),
        Span::raw("  |  "),
        Span::styled(
            format!("{} overdue", overdue),
            Style::default().fg(status_color(DueStatus::Overdue)),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("{} due soon", due_soon),
            Style::default().fg(status_color(DueStatus::DueSoon)),
        ),
        Span::raw("  |  "),
        Span::styled(
            now.format("%Y-%m-%d").to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn vehicle_card<'a>(app: &App, vehicle: &'a Vehicle, now: DateTime<Utc>) -> ListItem<'a> {
    let selected = app.selected_vehicle.as_deref() == Some(vehicle.id.as_str());
    let name_style = if selected {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let due_line = match app.store.next_due(&vehicle.id, now) {
        Some(due) => {
            let status = due.status(app.due_soon_days);
            Line::from(vec![
                Span::styled(
                    format!("{} ", status.emoji()),
                    Style::default().fg(status_color(status)),
                ),
                Span::raw(format!("Next: {} ", due.category.label())),
                Span::styled(
                    format!("{} ({})", due.due_date.format("%Y-%m-%d"), describe_days(due.days_remaining)),
                    Style::default().fg(status_color(status)),
                ),
            ])
        }
        None => Line::from(Span::styled(
            "No upcoming deadlines",
            Style::default().fg(Color::DarkGray),
        )),
    };

    ListItem::new(vec![
        Line::from(vec![
            Span::styled(format!("{} {}", vehicle.brand, vehicle.model), name_style),
            Span::styled(
                format!("  {}", vehicle.license_plate),
                Style::default().fg(Color::Yellow),
            ),
        ]),
        Line::from(Span::styled(
            format!(
                "{} · {} · {} km",
                vehicle.year, vehicle.color, vehicle.current_mileage
            ),
            Style::default().fg(Color::Gray),
        )),
        due_line,
        Line::from(""),
    ])
}

fn render_vehicle_cards(frame: &mut Frame, app: &App, area: Rect, now: DateTime<Utc>) {
    let items: Vec<ListItem> = app
        .store
        .vehicles()
        .iter()
        .map(|vehicle| vehicle_card(app, vehicle, now))
        .collect();

    let border_style = if app.focus == Focus::Vehicles {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(format!(" Vehicles ({}) ", app.store.vehicles().len())),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    let mut state = ListState::default().with_selected(Some(app.vehicle_cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_history(frame: &mut Frame, app: &mut App, area: Rect, now: DateTime<Utc>) {
    let border_style = if app.focus == Focus::History {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let Some(vehicle) = app.selected_vehicle().cloned() else {
        let placeholder = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Select a vehicle to view its maintenance history",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(Span::styled(
                "j/k to move, ENTER to open",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(" History "),
        )
        .alignment(ratatui::layout::Alignment::Center);
        frame.render_widget(placeholder, area);
        return;
    };

    let history = app.history();
    let rows: Vec<Row> = history
        .iter()
        .map(|record| {
            let expiry_cell = match DueCalculator::record_status(record, now, app.due_soon_days) {
                Some((days, status)) => Line::from(Span::styled(
                    format!(
                        "{} ({})",
                        record
                            .expiry_date
                            .map(|d| d.format("%Y-%m-%d").to_string())
                            .unwrap_or_default(),
                        describe_days(days)
                    ),
                    Style::default().fg(status_color(status)),
                )),
                None => Line::from("-"),
            };

            Row::new(vec![
                Line::from(record.date.format("%Y-%m-%d").to_string()),
                Line::from(record.category.label()),
                expiry_cell,
                Line::from(format!("{:.2}", record.cost)),
                Line::from(
                    record
                        .mileage_at_service
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Line::from(record.provider.clone()),
                Line::from(record.notes.clone()),
            ])
        })
        .collect();

    let total: f64 = history.iter().map(|r| r.cost).sum();
    let title = format!(
        " {} · {} records · total {:.2} ",
        vehicle.display_label(),
        history.len(),
        total
    );

    let header = Row::new(vec![
        "Date", "Type", "Expiry", "Cost", "Mileage", "Provider", "Notes",
    ])
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(20),
            Constraint::Length(26),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Percentage(20),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title),
    )
    .row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );

    if history.is_empty() {
        frame.render_widget(table, area);
        let inner = Rect {
            x: area.x + 2,
            y: area.y + 3,
            width: area.width.saturating_sub(4),
            height: 1.min(area.height.saturating_sub(4)),
        };
        frame.render_widget(
            Paragraph::new(Span::styled(
                "No maintenance records yet. Press 'a' to add one.",
                Style::default().fg(Color::DarkGray),
            )),
            inner,
        );
    } else {
        frame.render_stateful_widget(table, area, &mut app.history_state);
    }
}

fn render_delete_confirm(frame: &mut Frame, app: &App) {
    let area = centered_rect(50, 20, frame.area());
    frame.render_widget(Clear, area);

    let description = app
        .pending_delete
        .as_deref()
        .and_then(|id| app.store.record(id))
        .map(|r| format!("{} on {}", r.category.label(), r.date.format("%Y-%m-%d")))
        .unwrap_or_default();

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Delete this record?",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(description),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::raw(": delete   "),
            Span::styled("n/ESC", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(": keep"),
        ]),
    ];

    let popup = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Confirm delete "),
        )
        .alignment(ratatui::layout::Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(popup, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = if let Some(error) = &app.error_message {
        vec![Span::styled(error.as_str(), Style::default().fg(Color::Red))]
    } else {
        let hints = match app.input_mode {
            InputMode::EditingRecord => Span::styled(
                "FORM | TAB/↑↓: field | ←→: type | ENTER: save | ESC: cancel",
                Style::default().fg(Color::Green),
            ),
            InputMode::ConfirmDelete => Span::styled(
                "DELETE | y: confirm | n/ESC: cancel",
                Style::default().fg(Color::Red),
            ),
            InputMode::Analysis => Span::styled(
                "ANALYSIS | j/k: scroll | ESC: close",
                Style::default().fg(Color::Magenta),
            ),
            InputMode::Normal => match app.focus {
                Focus::Vehicles => Span::raw(
                    "j/k: navigate | ENTER: open | TAB: history | i: AI analysis | x: export CSV | q: quit",
                ),
                Focus::History => Span::raw(
                    "j/k: navigate | a: add | e: edit | d: delete | TAB: vehicles | i: AI analysis | x: export CSV | q: quit",
                ),
            },
        };

        let mut spans = vec![hints];
        if let Some(message) = &app.status_message {
            spans.push(Span::raw("  |  "));
            spans.push(Span::styled(message.as_str(), Style::default().fg(Color::Green)));
        }
        spans
    };

    frame.render_widget(Paragraph::new(Line::from(status)), area);
}

/// Helper to create a centered rectangle for popups
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Action;
    use chrono::TimeZone;
    use fleettrack_core::{seed, FleetStore};
    use ratatui::{backend::TestBackend, Terminal};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn screen(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(160, 40)).unwrap();
        terminal.draw(|f| render(f, app, now())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_cards_show_next_due_and_placeholder() {
        let mut app = App::new(FleetStore::from_fleet(seed::initial_fleet()), 30);
        let text = screen(&mut app);

        assert!(text.contains("Hilux Revo"));
        assert!(text.contains("Next: Vehicle tax"));
        assert!(text.contains("19 days left"));
        assert!(text.contains("No upcoming deadlines"));
        assert!(text.contains("Select a vehicle"));
    }

    #[test]
    fn test_history_table_after_selection() {
        let mut app = App::new(FleetStore::from_fleet(seed::initial_fleet()), 30);
        app.update(Action::SelectVehicle);
        let text = screen(&mut app);

        assert!(text.contains("2 records"));
        assert!(text.contains("2024-12-15"));
        assert!(text.contains("Vehicle tax"));
        assert!(text.contains("Expiry"));
    }

    #[test]
    fn test_overlays_render() {
        let mut app = App::new(FleetStore::from_fleet(seed::initial_fleet()), 30);
        app.update(Action::SelectVehicle);
        app.update(Action::RequestDelete);
        assert!(screen(&mut app).contains("Delete this record?"));

        app.update(Action::CancelDelete);
        app.update(Action::OpenAnalysis);
        assert!(screen(&mut app).contains("Analyzing"));
    }

    #[test]
    fn test_centered_rect_is_inside() {
        let outer = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(60, 40, outer);
        assert_eq!(inner.width, 60);
        assert_eq!(inner.height, 20);
        assert_eq!(inner.x, 20);
    }
}
