// TUI event loop and terminal management
use crate::app::{Action, App, Effect, Focus, InputMode};
use crate::form::{FormAction, FormField};
use chrono::{NaiveDate, Utc};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use fleettrack_core::{ExportFormat, Exporter, FleetAdvisor};
use ratatui::{backend::Backend, backend::CrosstermBackend, Terminal};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub async fn run_tui(
    app: &mut App,
    advisor: FleetAdvisor,
    export_path: PathBuf,
    mouse_enabled: bool,
) -> anyhow::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if mouse_enabled {
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    } else {
        execute!(stdout, EnterAlternateScreen)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = event_loop(&mut terminal, app, &advisor, &export_path).await;

    // Restore terminal, even when the loop failed
    disable_raw_mode()?;
    if mouse_enabled {
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    } else {
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    }
    terminal.show_cursor()?;

    outcome
}

async fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    advisor: &FleetAdvisor,
    export_path: &Path,
) -> anyhow::Result<()> {
    while !app.should_quit {
        terminal.draw(|f| crate::ui::render(f, app, Utc::now()))?;

        let event = event::read()?;
        // Read the clock after the wait: the session may have crossed midnight
        let today = Utc::now().date_naive();
        let action = event_to_action(app, event, today);

        let Some(action) = action else {
            continue;
        };

        if let Some(effect) = app.update(action) {
            match effect {
                Effect::RunAnalysis => {
                    // Show the pending popup while the request is in flight
                    terminal.draw(|f| crate::ui::render(f, app, Utc::now()))?;
                    let records = app.store.records_snapshot();
                    let outcome = advisor
                        .analyze(app.store.vehicles(), &records, today)
                        .await;
                    app.update(Action::AnalysisFinished(outcome));
                }
                Effect::ExportCsv => {
                    let outcome = Exporter::export_to_file_with_format(
                        app.store.vehicles(),
                        app.store.records(),
                        export_path,
                        ExportFormat::Csv,
                    )
                    .map(|_| export_path.to_path_buf())
                    .map_err(|e| {
                        warn!("CSV export failed: {}", e);
                        e.to_string()
                    });
                    app.update(Action::ExportFinished(outcome));
                }
            }
        }
    }

    info!("Leaving TUI");
    Ok(())
}

/// Key presses and mouse scrolls become actions; everything else is ignored
pub fn event_to_action(app: &App, event: Event, today: NaiveDate) -> Option<Action> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => key_to_action(app, key, today),
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollDown => scroll_action(app, true),
            MouseEventKind::ScrollUp => scroll_action(app, false),
            _ => None,
        },
        _ => None,
    }
}

fn scroll_action(app: &App, down: bool) -> Option<Action> {
    match (app.input_mode, app.focus, down) {
        (InputMode::Analysis, _, true) => Some(Action::ScrollAnalysisDown),
        (InputMode::Analysis, _, false) => Some(Action::ScrollAnalysisUp),
        (InputMode::Normal, Focus::Vehicles, true) => Some(Action::NextVehicle),
        (InputMode::Normal, Focus::Vehicles, false) => Some(Action::PreviousVehicle),
        (InputMode::Normal, Focus::History, true) => Some(Action::NextRecord),
        (InputMode::Normal, Focus::History, false) => Some(Action::PreviousRecord),
        _ => None,
    }
}

/// Translate a key press into an action for the current mode
pub fn key_to_action(app: &App, key: KeyEvent, today: NaiveDate) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    match app.input_mode {
        InputMode::EditingRecord => {
            let on_category = app
                .form
                .as_ref()
                .map(|f| f.cursor == FormField::Category)
                .unwrap_or(false);
            match key.code {
                KeyCode::Enter => Some(Action::SubmitForm),
                KeyCode::Esc => Some(Action::CancelForm),
                KeyCode::Tab | KeyCode::Down => Some(Action::Form(FormAction::NextField)),
                KeyCode::BackTab | KeyCode::Up => Some(Action::Form(FormAction::PreviousField)),
                KeyCode::Right if on_category => Some(Action::Form(FormAction::NextCategory)),
                KeyCode::Left if on_category => Some(Action::Form(FormAction::PreviousCategory)),
                KeyCode::Char(' ') if on_category => Some(Action::Form(FormAction::NextCategory)),
                KeyCode::Char(c) => Some(Action::Form(FormAction::Input(c))),
                KeyCode::Backspace => Some(Action::Form(FormAction::Backspace)),
                _ => None,
            }
        }
        InputMode::ConfirmDelete => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(Action::ConfirmDelete),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(Action::CancelDelete),
            _ => None,
        },
        InputMode::Analysis => match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('i') => Some(Action::CloseAnalysis),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::ScrollAnalysisDown),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::ScrollAnalysisUp),
            _ => None,
        },
        InputMode::Normal => match (key.code, app.focus) {
            (KeyCode::Char('q'), _) => Some(Action::Quit),
            (KeyCode::Tab, _) => Some(Action::ToggleFocus),
            (KeyCode::Char('i'), _) => Some(Action::OpenAnalysis),
            (KeyCode::Char('x'), _) => Some(Action::Export),
            (KeyCode::Char('a'), _) => Some(Action::NewRecord { today }),
            (KeyCode::Down | KeyCode::Char('j'), Focus::Vehicles) => Some(Action::NextVehicle),
            (KeyCode::Up | KeyCode::Char('k'), Focus::Vehicles) => Some(Action::PreviousVehicle),
            (KeyCode::Enter, Focus::Vehicles) => Some(Action::SelectVehicle),
            (KeyCode::Down | KeyCode::Char('j'), Focus::History) => Some(Action::NextRecord),
            (KeyCode::Up | KeyCode::Char('k'), Focus::History) => Some(Action::PreviousRecord),
            (KeyCode::Enter | KeyCode::Char('e'), Focus::History) => Some(Action::EditRecord),
            (KeyCode::Char('d') | KeyCode::Delete, Focus::History) => Some(Action::RequestDelete),
            (KeyCode::Esc, Focus::History) => Some(Action::ToggleFocus),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleettrack_core::{seed, FleetStore};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        App::new(FleetStore::from_fleet(seed::initial_fleet()), 30)
    }

    #[test]
    fn test_navigation_follows_focus() {
        let mut app = app();
        assert!(matches!(
            key_to_action(&app, press(KeyCode::Char('j')), today()),
            Some(Action::NextVehicle)
        ));

        app.update(Action::SelectVehicle);
        assert!(matches!(
            key_to_action(&app, press(KeyCode::Char('j')), today()),
            Some(Action::NextRecord)
        ));
        assert!(matches!(
            key_to_action(&app, press(KeyCode::Char('d')), today()),
            Some(Action::RequestDelete)
        ));
    }

    #[test]
    fn test_form_keys_type_text() {
        let mut app = app();
        app.update(Action::SelectVehicle);
        app.update(Action::NewRecord { today: today() });

        // On the type selector, arrows cycle the category
        assert!(matches!(
            key_to_action(&app, press(KeyCode::Right), today()),
            Some(Action::Form(FormAction::NextCategory))
        ));

        app.update(Action::Form(FormAction::NextField));
        // 'q' is text inside the form, not quit
        assert!(matches!(
            key_to_action(&app, press(KeyCode::Char('q')), today()),
            Some(Action::Form(FormAction::Input('q')))
        ));
        assert!(matches!(
            key_to_action(&app, press(KeyCode::Esc), today()),
            Some(Action::CancelForm)
        ));
    }

    #[test]
    fn test_ctrl_c_always_quits() {
        let mut app = app();
        app.update(Action::SelectVehicle);
        app.update(Action::NewRecord { today: today() });
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(matches!(key_to_action(&app, key, today()), Some(Action::Quit)));
    }

    #[test]
    fn test_new_record_uses_date_of_the_event() {
        let mut app = app();
        app.update(Action::SelectVehicle);
        let next_day = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();

        let action = event_to_action(&app, Event::Key(press(KeyCode::Char('a'))), next_day);
        assert!(matches!(action, Some(Action::NewRecord { today }) if today == next_day));

        app.update(action.unwrap());
        assert_eq!(app.form.as_ref().unwrap().date, "2025-03-02");
    }

    #[test]
    fn test_resize_is_ignored() {
        assert!(event_to_action(&app(), Event::Resize(80, 24), today()).is_none());
    }

    #[test]
    fn test_delete_confirmation_keys() {
        let mut app = app();
        app.update(Action::SelectVehicle);
        app.update(Action::RequestDelete);
        assert!(matches!(
            key_to_action(&app, press(KeyCode::Char('y')), today()),
            Some(Action::ConfirmDelete)
        ));
        assert!(matches!(
            key_to_action(&app, press(KeyCode::Esc), today()),
            Some(Action::CancelDelete)
        ));
    }
}
