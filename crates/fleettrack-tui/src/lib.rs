// Terminal UI implementation using ratatui
// Vehicle cards, maintenance history and the AI analysis popup

pub mod analysis_ui;
pub mod app;
pub mod form;
pub mod form_ui;
pub mod runner;
pub mod ui;

pub use app::{Action, AnalysisState, App, Effect, Focus, InputMode};
pub use runner::run_tui;
