// AI fleet analysis: snapshot building, prompt template and the provider seam
use crate::config::AdvisoryConfig;
use crate::models::{MaintenanceRecord, Vehicle};
use async_trait::async_trait;
use chrono::NaiveDate;
use fleettrack_api::{GeminiClient, GeminiError};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

/// Shown instead of the analysis whenever the provider call fails for any reason
pub const FALLBACK_MESSAGE: &str =
    "Unable to analyze the fleet right now. Please try again later or check the API key.";

/// Why an analysis produced no text. Detail is for the log, never for the user.
#[derive(Error, Debug)]
pub enum AdvisoryError {
    #[error("API key is missing")]
    MissingCredential,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider returned status {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Provider response had no text")]
    EmptyResponse,

    #[error("Malformed provider response: {0}")]
    Malformed(String),

    #[error("Failed to build fleet snapshot: {0}")]
    Snapshot(String),
}

impl From<GeminiError> for AdvisoryError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::MissingApiKey => AdvisoryError::MissingCredential,
            GeminiError::RequestFailed { status, message } => {
                AdvisoryError::Provider { status, message }
            }
            GeminiError::EmptyResponse => AdvisoryError::EmptyResponse,
            GeminiError::NetworkError(e) => AdvisoryError::Network(e.to_string()),
            GeminiError::ParseError(e) => AdvisoryError::Malformed(e.to_string()),
        }
    }
}

/// Anything that turns a prompt into text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdvisoryProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AdvisoryError>;
}

#[async_trait]
impl AdvisoryProvider for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, AdvisoryError> {
        Ok(self.generate_content(prompt).await?)
    }
}

/// Per-vehicle entry of the snapshot sent to the provider
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VehicleSummary {
    pub car: String,
    pub mileage: u32,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistoryEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub date: NaiveDate,
    pub cost: f64,
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<NaiveDate>,
}

/// Compact view of the fleet: every vehicle with its records in collection order
pub fn build_snapshot(vehicles: &[Vehicle], records: &[MaintenanceRecord]) -> Vec<VehicleSummary> {
    vehicles
        .iter()
        .map(|vehicle| VehicleSummary {
            car: vehicle.display_label(),
            mileage: vehicle.current_mileage,
            history: records
                .iter()
                .filter(|r| r.vehicle_id == vehicle.id)
                .map(|r| HistoryEntry {
                    kind: r.category.label().to_string(),
                    date: r.date,
                    cost: r.cost,
                    notes: r.notes.clone(),
                    expiry: r.expiry_date,
                })
                .collect(),
        })
        .collect()
}

/// Instruction template with the JSON snapshot embedded
pub fn build_prompt(
    vehicles: &[Vehicle],
    records: &[MaintenanceRecord],
    today: NaiveDate,
    response_language: &str,
) -> Result<String, AdvisoryError> {
    let snapshot = serde_json::to_string_pretty(&build_snapshot(vehicles, records))
        .map_err(|e| AdvisoryError::Snapshot(e.to_string()))?;

    Ok(format!(
        "You are a senior fleet manager and expert mechanic.\n\
         Analyze the maintenance data of these {count} company vehicles.\n\
         \n\
         Vehicles and history:\n\
         {snapshot}\n\
         \n\
         Please provide (answer in {language}, formatted as Markdown):\n\
         1. An overview of each vehicle's health (good / needs watching / critical)\n\
         2. Alerts for items that have expired or are coming due (compare expiry dates with today, {today})\n\
         3. Cost-effectiveness or unusual expenses, if any\n\
         4. Recommendations for each vehicle's next maintenance\n\
         \n\
         Use formal, easy-to-understand language and format the answer for readability.\n",
        count = vehicles.len(),
        snapshot = snapshot,
        language = response_language,
        today = today.format("%Y-%m-%d"),
    ))
}

/// Runs fleet analyses against a provider
pub struct FleetAdvisor {
    provider: Box<dyn AdvisoryProvider>,
    response_language: String,
}

impl FleetAdvisor {
    pub fn new(provider: Box<dyn AdvisoryProvider>, response_language: impl Into<String>) -> Self {
        Self {
            provider,
            response_language: response_language.into(),
        }
    }

    /// Gemini-backed advisor. A missing key is not an error here; it surfaces
    /// as `MissingCredential` on the first analysis.
    pub fn gemini(config: &AdvisoryConfig, api_key: Option<String>) -> Result<Self, AdvisoryError> {
        let client =
            GeminiClient::with_base_url(api_key, config.api_url.clone(), config.model.clone())?;
        Ok(Self::new(Box::new(client), config.response_language.clone()))
    }

    pub async fn analyze(
        &self,
        vehicles: &[Vehicle],
        records: &[MaintenanceRecord],
        today: NaiveDate,
    ) -> Result<String, AdvisoryError> {
        let prompt = build_prompt(vehicles, records, today, &self.response_language)?;
        info!(
            "Requesting fleet analysis for {} vehicles / {} records",
            vehicles.len(),
            records.len()
        );

        self.provider.generate(&prompt).await.map_err(|e| {
            error!("Error analyzing fleet: {}", e);
            e
        })
    }
}

/// What the user sees for an analysis outcome
pub fn display_text(outcome: &Result<String, AdvisoryError>) -> &str {
    match outcome {
        Ok(text) => text,
        Err(_) => FALLBACK_MESSAGE,
    }
}
