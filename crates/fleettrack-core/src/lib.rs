// Core business logic lives here - records, deadlines, exports, AI analysis
pub mod advisory;
pub mod config;
pub mod due;
pub mod error;
pub mod export;
pub mod models;
pub mod seed;
pub mod store;

pub use advisory::{AdvisoryError, AdvisoryProvider, FleetAdvisor, FALLBACK_MESSAGE};
pub use config::Config;
pub use due::{DueCalculator, DueStatus, NextDue};
pub use error::Error;
pub use export::{ExportFormat, Exporter, EXPORT_FILE_NAME};
pub use models::{Category, FleetData, MaintenanceRecord, RecordDraft, Vehicle};
pub use store::FleetStore;

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
