use crate::due::{DueCalculator, NextDue};
use crate::models::{FleetData, MaintenanceRecord, RecordDraft, Vehicle};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// In-memory fleet state
///
/// Both collections sit behind an `Arc`. Readers take a snapshot; every
/// mutation builds a new record vector and swaps it in, so a snapshot never
/// observes a half-applied change.
#[derive(Debug, Clone, Default)]
pub struct FleetStore {
    vehicles: Arc<Vec<Vehicle>>,
    records: Arc<Vec<MaintenanceRecord>>,
}

impl FleetStore {
    pub fn new(vehicles: Vec<Vehicle>, records: Vec<MaintenanceRecord>) -> Self {
        for record in &records {
            if !vehicles.iter().any(|v| v.id == record.vehicle_id) {
                warn!(
                    "Record {} references unknown vehicle {}; it will be hidden from vehicle views",
                    record.id, record.vehicle_id
                );
            }
        }

        Self {
            vehicles: Arc::new(vehicles),
            records: Arc::new(records),
        }
    }

    pub fn from_fleet(data: FleetData) -> Self {
        Self::new(data.vehicles, data.records)
    }

    /// Load a fleet snapshot previously written by the JSON exporter
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let data: FleetData = serde_json::from_str(&contents)?;
        Self::validate(&data)?;

        info!(
            "Loaded {} vehicles and {} records from {}",
            data.vehicles.len(),
            data.records.len(),
            path.display()
        );

        Ok(Self::from_fleet(data))
    }

    /// Ids unique per collection, costs finite and non-negative
    fn validate(data: &FleetData) -> Result<()> {
        let mut vehicle_ids = HashSet::new();
        for vehicle in &data.vehicles {
            if !vehicle_ids.insert(vehicle.id.as_str()) {
                return Err(Error::invalid(
                    "vehicle id",
                    format!("'{}' appears more than once", vehicle.id),
                ));
            }
        }

        let mut record_ids = HashSet::new();
        for record in &data.records {
            if !record_ids.insert(record.id.as_str()) {
                return Err(Error::invalid(
                    "record id",
                    format!("'{}' appears more than once", record.id),
                ));
            }
            if !record.cost.is_finite() || record.cost < 0.0 {
                return Err(Error::invalid(
                    "cost",
                    format!("record '{}' has cost {}", record.id, record.cost),
                ));
            }
        }

        Ok(())
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn records(&self) -> &[MaintenanceRecord] {
        &self.records
    }

    /// Cheap shared handle to the current record collection
    pub fn records_snapshot(&self) -> Arc<Vec<MaintenanceRecord>> {
        Arc::clone(&self.records)
    }

    pub fn to_fleet(&self) -> FleetData {
        FleetData {
            vehicles: self.vehicles.as_ref().clone(),
            records: self.records.as_ref().clone(),
        }
    }

    pub fn vehicle(&self, id: &str) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    pub fn record(&self, id: &str) -> Option<&MaintenanceRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Records of one vehicle, newest service date first.
    /// Records sharing a date keep the most recently inserted on top.
    pub fn history(&self, vehicle_id: &str) -> Vec<MaintenanceRecord> {
        let mut history: Vec<MaintenanceRecord> = self
            .records
            .iter()
            .rev()
            .filter(|r| r.vehicle_id == vehicle_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.date.cmp(&a.date));
        history
    }

    /// Nearest deadline for a vehicle, always computed from current state
    pub fn next_due(&self, vehicle_id: &str, now: DateTime<Utc>) -> Option<NextDue> {
        DueCalculator::next_due(&self.records, vehicle_id, now)
    }

    /// Append a new record and return its freshly assigned id
    pub fn add(&mut self, vehicle_id: &str, draft: RecordDraft) -> String {
        if self.vehicle(vehicle_id).is_none() {
            warn!("Adding record for unknown vehicle {}", vehicle_id);
        }

        let id = self.fresh_id();
        let mut records = self.records.as_ref().clone();
        records.push(MaintenanceRecord::from_draft(
            id.clone(),
            vehicle_id.to_string(),
            draft,
        ));
        self.records = Arc::new(records);

        debug!("Added record {} for vehicle {}", id, vehicle_id);
        id
    }

    /// Replace the fields of an existing record. Id and owning vehicle are kept.
    pub fn update(&mut self, id: &str, draft: RecordDraft) -> Result<()> {
        let position = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))?;

        let mut records = self.records.as_ref().clone();
        let vehicle_id = records[position].vehicle_id.clone();
        records[position] = MaintenanceRecord::from_draft(id.to_string(), vehicle_id, draft);
        self.records = Arc::new(records);

        debug!("Updated record {}", id);
        Ok(())
    }

    /// Remove a record. Returns whether anything was removed; unknown ids are a no-op.
    pub fn delete(&mut self, id: &str) -> bool {
        if !self.records.iter().any(|r| r.id == id) {
            return false;
        }

        let records: Vec<MaintenanceRecord> = self
            .records
            .iter()
            .filter(|r| r.id != id)
            .cloned()
            .collect();
        self.records = Arc::new(records);

        debug!("Deleted record {}", id);
        true
    }

    fn fresh_id(&self) -> String {
        loop {
            let candidate = Uuid::new_v4().simple().to_string()[..12].to_string();
            if self.record(&candidate).is_none() {
                return candidate;
            }
        }
    }
}
