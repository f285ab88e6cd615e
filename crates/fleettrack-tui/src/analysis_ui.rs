// AI analysis popup
use crate::app::{AnalysisState, App};
use crate::ui::centered_rect;
use fleettrack_core::advisory::display_text;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub fn render_analysis(frame: &mut Frame, app: &App) {
    let area = centered_rect(80, 80, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" ✨ AI Fleet Analysis ")
        .title_style(Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD));

    let lines: Vec<Line> = match &app.analysis {
        AnalysisState::Idle | AnalysisState::Pending => vec![
            Line::from(""),
            Line::from(Span::styled(
                "⏳ Analyzing fleet data...",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )),
        ],
        AnalysisState::Done(outcome) => {
            let style = if outcome.is_ok() {
                Style::default()
            } else {
                Style::default().fg(Color::Red)
            };
            display_text(outcome)
                .lines()
                .map(|line| markdown_line(line, style))
                .collect()
        }
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.analysis_scroll, 0));
    frame.render_widget(paragraph, area);
}

/// Headings and bullets get a little color; the rest is plain text
fn markdown_line(line: &str, base: Style) -> Line<'static> {
    let trimmed = line.trim_start();
    if let Some(heading) = trimmed.strip_prefix('#') {
        Line::from(Span::styled(
            heading.trim_start_matches('#').trim().to_string(),
            base.fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
    } else if let Some(item) = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
    {
        Line::from(vec![
            Span::styled("  • ", base.fg(Color::Magenta)),
            Span::styled(item.replace("**", ""), base),
        ])
    } else {
        Line::from(Span::styled(line.replace("**", ""), base))
    }
}
