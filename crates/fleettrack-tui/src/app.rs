// TUI application state; every change goes through `App::update`
use crate::form::{FormAction, RecordForm};
use chrono::NaiveDate;
use fleettrack_core::{AdvisoryError, FleetStore, MaintenanceRecord, Vehicle};
use ratatui::widgets::TableState;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,        // Browsing cards and history
    EditingRecord, // Record form is open
    ConfirmDelete, // Waiting for y/n
    Analysis,      // AI analysis popup is open
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Vehicles,
    History,
}

/// Where the AI analysis stands. Kept until the records change.
#[derive(Debug)]
pub enum AnalysisState {
    Idle,
    Pending,
    Done(Result<String, AdvisoryError>),
}

/// Everything the user (or the runner, reporting back) can do
#[derive(Debug)]
pub enum Action {
    NextVehicle,
    PreviousVehicle,
    SelectVehicle,
    ToggleFocus,
    NextRecord,
    PreviousRecord,
    NewRecord { today: NaiveDate },
    EditRecord,
    Form(FormAction),
    SubmitForm,
    CancelForm,
    RequestDelete,
    ConfirmDelete,
    CancelDelete,
    OpenAnalysis,
    AnalysisFinished(Result<String, AdvisoryError>),
    ScrollAnalysisUp,
    ScrollAnalysisDown,
    CloseAnalysis,
    Export,
    ExportFinished(Result<PathBuf, String>),
    Quit,
}

/// Side effects `update` asks the runner to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    RunAnalysis,
    ExportCsv,
}

pub struct App {
    pub store: FleetStore,
    pub due_soon_days: i64,
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: Focus,
    /// Card under the cursor
    pub vehicle_cursor: usize,
    /// Vehicle whose history is shown
    pub selected_vehicle: Option<String>,
    pub history_state: TableState,
    pub form: Option<RecordForm>,
    /// Record awaiting delete confirmation
    pub pending_delete: Option<String>,
    pub analysis: AnalysisState,
    pub analysis_scroll: u16,
    pub status_message: Option<String>,
    pub error_message: Option<String>,
}

impl App {
    pub fn new(store: FleetStore, due_soon_days: i64) -> Self {
        Self {
            store,
            due_soon_days,
            should_quit: false,
            input_mode: InputMode::Normal,
            focus: Focus::Vehicles,
            vehicle_cursor: 0,
            selected_vehicle: None,
            history_state: TableState::default(),
            form: None,
            pending_delete: None,
            analysis: AnalysisState::Idle,
            analysis_scroll: 0,
            status_message: None,
            error_message: None,
        }
    }

    pub fn selected_vehicle(&self) -> Option<&Vehicle> {
        self.selected_vehicle
            .as_deref()
            .and_then(|id| self.store.vehicle(id))
    }

    /// History of the selected vehicle, newest first
    pub fn history(&self) -> Vec<MaintenanceRecord> {
        self.selected_vehicle
            .as_deref()
            .map(|id| self.store.history(id))
            .unwrap_or_default()
    }

    pub fn selected_record(&self) -> Option<MaintenanceRecord> {
        let index = self.history_state.selected()?;
        self.history().into_iter().nth(index)
    }

    /// Apply one action. Returns the side effect the runner must carry out, if any.
    pub fn update(&mut self, action: Action) -> Option<Effect> {
        debug!("update: {:?}", action);

        // Any user action dismisses the previous error
        if !matches!(action, Action::AnalysisFinished(_)) {
            self.error_message = None;
        }

        match action {
            Action::Quit => {
                self.should_quit = true;
            }
            Action::NextVehicle => {
                let count = self.store.vehicles().len();
                if count > 0 {
                    self.vehicle_cursor = (self.vehicle_cursor + 1).min(count - 1);
                }
            }
            Action::PreviousVehicle => {
                self.vehicle_cursor = self.vehicle_cursor.saturating_sub(1);
            }
            Action::SelectVehicle => {
                if let Some(vehicle) = self.store.vehicles().get(self.vehicle_cursor) {
                    self.selected_vehicle = Some(vehicle.id.clone());
                    self.reset_history_selection();
                    self.focus = Focus::History;
                }
            }
            Action::ToggleFocus => {
                self.focus = match self.focus {
                    Focus::Vehicles if self.selected_vehicle.is_some() => Focus::History,
                    _ => Focus::Vehicles,
                };
            }
            Action::NextRecord => {
                let count = self.history().len();
                if count > 0 {
                    let next = self
                        .history_state
                        .selected()
                        .map(|i| (i + 1).min(count - 1))
                        .unwrap_or(0);
                    self.history_state.select(Some(next));
                }
            }
            Action::PreviousRecord => {
                if let Some(i) = self.history_state.selected() {
                    self.history_state.select(Some(i.saturating_sub(1)));
                }
            }
            Action::NewRecord { today } => {
                if let Some(vehicle_id) = self.selected_vehicle.clone() {
                    self.form = Some(RecordForm::new(&vehicle_id, today));
                    self.input_mode = InputMode::EditingRecord;
                } else {
                    self.error_message = Some("Select a vehicle first (ENTER on a card)".into());
                }
            }
            Action::EditRecord => {
                if let Some(record) = self.selected_record() {
                    self.form = Some(RecordForm::edit(&record));
                    self.input_mode = InputMode::EditingRecord;
                }
            }
            Action::Form(form_action) => {
                if let Some(form) = self.form.as_mut() {
                    form.apply(form_action);
                }
            }
            Action::SubmitForm => self.submit_form(),
            Action::CancelForm => self.close_form(),
            Action::RequestDelete => {
                if let Some(record) = self.selected_record() {
                    self.pending_delete = Some(record.id);
                    self.input_mode = InputMode::ConfirmDelete;
                }
            }
            Action::ConfirmDelete => {
                if let Some(id) = self.pending_delete.take() {
                    if self.store.delete(&id) {
                        self.records_changed();
                        self.status_message = Some("Record deleted".into());
                    }
                    self.clamp_history_selection();
                }
                self.input_mode = InputMode::Normal;
            }
            Action::CancelDelete => {
                self.pending_delete = None;
                self.input_mode = InputMode::Normal;
            }
            Action::OpenAnalysis => {
                self.input_mode = InputMode::Analysis;
                self.analysis_scroll = 0;
                if matches!(self.analysis, AnalysisState::Idle) {
                    self.analysis = AnalysisState::Pending;
                    return Some(Effect::RunAnalysis);
                }
            }
            Action::AnalysisFinished(outcome) => {
                self.analysis = AnalysisState::Done(outcome);
            }
            Action::ScrollAnalysisUp => {
                self.analysis_scroll = self.analysis_scroll.saturating_sub(1);
            }
            Action::ScrollAnalysisDown => {
                self.analysis_scroll = self.analysis_scroll.saturating_add(1);
            }
            Action::CloseAnalysis => {
                self.input_mode = InputMode::Normal;
            }
            Action::Export => {
                return Some(Effect::ExportCsv);
            }
            Action::ExportFinished(outcome) => match outcome {
                Ok(path) => {
                    self.error_message = None;
                    self.status_message = Some(format!("Exported to {}", path.display()));
                }
                Err(e) => {
                    self.error_message = Some(format!("Export failed: {}", e));
                }
            },
        }

        None
    }

    fn submit_form(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };

        let draft = match form.to_draft() {
            Ok(draft) => draft,
            Err(e) => {
                form.error = Some(e.to_string());
                return;
            }
        };

        let outcome = match form.editing.clone() {
            Some(id) => self.store.update(&id, draft).map(|_| "Record updated"),
            None => {
                let vehicle_id = form.vehicle_id.clone();
                self.store.add(&vehicle_id, draft);
                Ok("Record added")
            }
        };

        match outcome {
            Ok(message) => {
                self.records_changed();
                self.status_message = Some(message.into());
                self.close_form();
            }
            Err(e) => {
                if let Some(form) = self.form.as_mut() {
                    form.error = Some(e.to_string());
                }
            }
        }
    }

    fn close_form(&mut self) {
        self.form = None;
        self.input_mode = InputMode::Normal;
    }

    /// A finished analysis describes the old records; drop it
    fn records_changed(&mut self) {
        if !matches!(self.analysis, AnalysisState::Pending) {
            self.analysis = AnalysisState::Idle;
        }
        self.error_message = None;
    }

    fn reset_history_selection(&mut self) {
        let selected = if self.history().is_empty() { None } else { Some(0) };
        self.history_state.select(selected);
    }

    fn clamp_history_selection(&mut self) {
        let count = self.history().len();
        let selected = match (count, self.history_state.selected()) {
            (0, _) => None,
            (n, Some(i)) => Some(i.min(n - 1)),
            (_, None) => Some(0),
        };
        self.history_state.select(selected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleettrack_core::{seed, Category};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn app() -> App {
        App::new(FleetStore::from_fleet(seed::initial_fleet()), 30)
    }

    fn type_into_form(app: &mut App, text: &str) {
        for c in text.chars() {
            app.update(Action::Form(FormAction::Input(c)));
        }
    }

    #[test]
    fn test_select_vehicle_shows_its_history() {
        let mut app = app();
        assert!(app.history().is_empty());

        app.update(Action::SelectVehicle);
        assert_eq!(app.selected_vehicle.as_deref(), Some("c1"));
        assert_eq!(app.focus, Focus::History);
        assert_eq!(app.history_state.selected(), Some(0));

        let ids: Vec<String> = app.history().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["r1", "r2"]);
    }

    #[test]
    fn test_vehicle_cursor_is_clamped() {
        let mut app = app();
        for _ in 0..10 {
            app.update(Action::NextVehicle);
        }
        assert_eq!(app.vehicle_cursor, 4);
        for _ in 0..10 {
            app.update(Action::PreviousVehicle);
        }
        assert_eq!(app.vehicle_cursor, 0);
    }

    #[test]
    fn test_new_record_requires_selection() {
        let mut app = app();
        app.update(Action::NewRecord { today: today() });
        assert!(app.form.is_none());
        assert!(app.error_message.is_some());
    }

    #[test]
    fn test_add_record_through_form() {
        let mut app = app();
        app.update(Action::NextVehicle);
        app.update(Action::NextVehicle);
        app.update(Action::NextVehicle);
        app.update(Action::NextVehicle);
        app.update(Action::SelectVehicle);
        assert_eq!(app.selected_vehicle.as_deref(), Some("c5"));

        app.update(Action::NewRecord { today: today() });
        assert_eq!(app.input_mode, InputMode::EditingRecord);

        app.update(Action::Form(FormAction::NextCategory));
        app.update(Action::Form(FormAction::NextField));
        app.update(Action::Form(FormAction::NextField));
        type_into_form(&mut app, "2026-03-01");
        app.update(Action::Form(FormAction::NextField));
        type_into_form(&mut app, "18000");
        app.update(Action::SubmitForm);

        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.form.is_none());
        let history = app.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].category, Category::Insurance);
        assert_eq!(history[0].vehicle_id, "c5");
        assert_eq!(history[0].date, today());
    }

    #[test]
    fn test_invalid_form_stays_open_with_error() {
        let mut app = app();
        app.update(Action::SelectVehicle);
        app.update(Action::NewRecord { today: today() });
        app.update(Action::SubmitForm);

        assert_eq!(app.input_mode, InputMode::EditingRecord);
        let form = app.form.as_ref().unwrap();
        assert!(form.error.as_deref().unwrap().contains("cost"));
        assert_eq!(app.store.records().len(), 6);
    }

    #[test]
    fn test_edit_keeps_identity() {
        let mut app = app();
        app.update(Action::SelectVehicle);
        app.update(Action::NextRecord); // r2, the tax record
        app.update(Action::EditRecord);
        assert_eq!(app.form.as_ref().unwrap().editing.as_deref(), Some("r2"));

        // Wraps from the type selector to notes
        app.update(Action::Form(FormAction::PreviousField));
        assert_eq!(app.form.as_ref().unwrap().cursor, crate::form::FormField::Notes);
        type_into_form(&mut app, " (paid online)");
        app.update(Action::SubmitForm);

        let record = app.store.record("r2").unwrap();
        assert_eq!(record.vehicle_id, "c1");
        assert_eq!(record.notes, "Annual vehicle tax (paid online)");
        assert_eq!(app.store.records().len(), 6);
    }

    #[test]
    fn test_delete_needs_confirmation() {
        let mut app = app();
        app.update(Action::SelectVehicle);
        app.update(Action::RequestDelete);
        assert_eq!(app.input_mode, InputMode::ConfirmDelete);

        app.update(Action::CancelDelete);
        assert_eq!(app.store.records().len(), 6);

        app.update(Action::RequestDelete);
        app.update(Action::ConfirmDelete);
        assert_eq!(app.store.records().len(), 5);
        assert!(app.store.record("r1").is_none());
        assert_eq!(app.history_state.selected(), Some(0));
        assert_eq!(app.history().len(), 1);
    }

    #[test]
    fn test_analysis_runs_once_until_records_change() {
        let mut app = app();
        assert_eq!(app.update(Action::OpenAnalysis), Some(Effect::RunAnalysis));
        assert!(matches!(app.analysis, AnalysisState::Pending));

        app.update(Action::AnalysisFinished(Ok("## Report".to_string())));
        app.update(Action::CloseAnalysis);
        assert_eq!(app.update(Action::OpenAnalysis), None);
        assert!(matches!(app.analysis, AnalysisState::Done(Ok(_))));

        app.update(Action::CloseAnalysis);
        app.update(Action::SelectVehicle);
        app.update(Action::RequestDelete);
        app.update(Action::ConfirmDelete);
        assert!(matches!(app.analysis, AnalysisState::Idle));
        assert_eq!(app.update(Action::OpenAnalysis), Some(Effect::RunAnalysis));
    }

    #[test]
    fn test_export_reports_outcome() {
        let mut app = app();
        assert_eq!(app.update(Action::Export), Some(Effect::ExportCsv));

        app.update(Action::ExportFinished(Err("disk full".to_string())));
        assert_eq!(app.error_message.as_deref(), Some("Export failed: disk full"));

        app.update(Action::ExportFinished(Ok(PathBuf::from("out.csv"))));
        assert!(app.error_message.is_none());
        assert_eq!(app.status_message.as_deref(), Some("Exported to out.csv"));
    }

    #[test]
    fn test_error_clears_on_next_action() {
        let mut app = app();
        app.update(Action::NewRecord { today: today() });
        assert!(app.error_message.is_some());

        app.update(Action::NextVehicle);
        assert!(app.error_message.is_none());

        app.update(Action::Export);
        app.update(Action::ExportFinished(Err("disk full".to_string())));
        app.update(Action::AnalysisFinished(Ok("report".to_string())));
        assert!(app.error_message.is_some());
    }

    #[test]
    fn test_quit() {
        let mut app = app();
        app.update(Action::Quit);
        assert!(app.should_quit);
    }
}
