// Create/edit record popup
use crate::app::App;
use crate::form::FormField;
use crate::ui::centered_rect;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub fn render_form(frame: &mut Frame, app: &App) {
    let Some(form) = app.form.as_ref() else {
        return;
    };

    let area = centered_rect(60, 70, frame.area());
    frame.render_widget(Clear, area);

    let vehicle = app
        .store
        .vehicle(&form.vehicle_id)
        .map(|v| v.display_label())
        .unwrap_or_else(|| form.vehicle_id.clone());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(form.title())
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Vehicle
            Constraint::Min(7),    // Fields
            Constraint::Length(2), // Error
        ])
        .split(inner);

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Vehicle: ", Style::default().fg(Color::Gray)),
            Span::styled(vehicle, Style::default().add_modifier(Modifier::BOLD)),
        ])),
        chunks[0],
    );

    let mut lines = Vec::new();
    for field in FormField::all() {
        let focused = form.cursor == field;
        let marker = if focused { "▶ " } else { "  " };
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };

        let value = form.value(field);
        let value_span = if field == FormField::Category {
            Span::styled(
                format!("◀ {} ▶", value),
                Style::default().fg(Color::Cyan),
            )
        } else if value.is_empty() {
            Span::styled(field.placeholder(), Style::default().fg(Color::DarkGray))
        } else {
            Span::raw(value.to_string())
        };

        let mut spans = vec![
            Span::styled(marker, label_style),
            Span::styled(format!("{:<30}", field.label()), label_style),
            value_span,
        ];
        if focused && field != FormField::Category {
            spans.push(Span::styled("█", Style::default().fg(Color::Yellow)));
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), chunks[1]);

    if let Some(error) = &form.error {
        frame.render_widget(
            Paragraph::new(Span::styled(error.as_str(), Style::default().fg(Color::Red)))
                .wrap(Wrap { trim: true }),
            chunks[2],
        );
    }
}
