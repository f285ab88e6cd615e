use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A vehicle in the fleet. Seeded at startup, never edited afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vehicle {
    pub id: String,
    pub license_plate: String,
    pub brand: String,
    pub model: String,
    pub year: u16,
    pub color: String,
    /// Odometer reading in km
    pub current_mileage: u32,
    /// Display image URL
    pub image: String,
}

impl Vehicle {
    /// "Brand Model (plate)" - how a vehicle is named in summaries and prompts
    pub fn display_label(&self) -> String {
        format!("{} {} ({})", self.brand, self.model, self.license_plate)
    }
}

/// Maintenance / compliance category
///
/// Declaration order matters: it breaks ties between categories whose
/// deadlines fall on the same day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    OilChange,
    Insurance,
    Tax,
    CompulsoryInsurance,
    Repair,
    Tires,
    Battery,
    Other,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::OilChange => "Oil change",
            Category::Insurance => "Insurance",
            Category::Tax => "Vehicle tax",
            Category::CompulsoryInsurance => "Compulsory insurance",
            Category::Repair => "General repair",
            Category::Tires => "Tires",
            Category::Battery => "Battery",
            Category::Other => "Other",
        }
    }

    pub fn all() -> Vec<Category> {
        vec![
            Category::OilChange,
            Category::Insurance,
            Category::Tax,
            Category::CompulsoryInsurance,
            Category::Repair,
            Category::Tires,
            Category::Battery,
            Category::Other,
        ]
    }

    /// Next category in declaration order, wrapping around
    pub fn next(&self) -> Category {
        let all = Self::all();
        let idx = all.iter().position(|c| c == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }

    /// Previous category in declaration order, wrapping around
    pub fn previous(&self) -> Category {
        let all = Self::all();
        let idx = all.iter().position(|c| c == self).unwrap_or(0);
        all[(idx + all.len() - 1) % all.len()]
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One maintenance or compliance event logged against a vehicle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaintenanceRecord {
    pub id: String,
    pub vehicle_id: String,
    pub category: Category,
    /// Service (or payment) date
    pub date: NaiveDate,
    /// Expiry or next-due date, when the category has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    pub cost: f64,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mileage_at_service: Option<u32>,
}

impl MaintenanceRecord {
    pub fn from_draft(id: String, vehicle_id: String, draft: RecordDraft) -> Self {
        Self {
            id,
            vehicle_id,
            category: draft.category,
            date: draft.date,
            expiry_date: draft.expiry_date,
            cost: draft.cost,
            provider: draft.provider,
            notes: draft.notes,
            mileage_at_service: draft.mileage_at_service,
        }
    }

    /// The editable fields of this record
    pub fn to_draft(&self) -> RecordDraft {
        RecordDraft {
            category: self.category,
            date: self.date,
            expiry_date: self.expiry_date,
            cost: self.cost,
            provider: self.provider.clone(),
            notes: self.notes.clone(),
            mileage_at_service: self.mileage_at_service,
        }
    }
}

/// Record fields without identity - what the form produces and the store consumes.
/// The owning vehicle is not part of a draft: an edit can't move a record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    pub category: Category,
    pub date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub cost: f64,
    pub provider: String,
    pub notes: String,
    pub mileage_at_service: Option<u32>,
}

/// Everything the app knows about: the unit of seeding, loading and JSON export
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FleetData {
    #[serde(default)]
    pub vehicles: Vec<Vehicle>,
    #[serde(default)]
    pub records: Vec<MaintenanceRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serializes_snake_case() {
        let json = serde_json::to_string(&Category::CompulsoryInsurance).unwrap();
        assert_eq!(json, "\"compulsory_insurance\"");

        let parsed: Category = serde_json::from_str("\"oil_change\"").unwrap();
        assert_eq!(parsed, Category::OilChange);
    }

    #[test]
    fn test_category_cycling_wraps() {
        assert_eq!(Category::Other.next(), Category::OilChange);
        assert_eq!(Category::OilChange.previous(), Category::Other);
        assert_eq!(Category::Tax.next(), Category::CompulsoryInsurance);
    }

    #[test]
    fn test_record_dates_parse_from_iso_strings() {
        let record: MaintenanceRecord = serde_json::from_str(
            r#"{
                "id": "r1",
                "vehicle_id": "c1",
                "category": "tax",
                "date": "2024-03-20",
                "expiry_date": "2025-03-20",
                "cost": 1500
            }"#,
        )
        .unwrap();

        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
        assert_eq!(record.expiry_date, NaiveDate::from_ymd_opt(2025, 3, 20));
        assert_eq!(record.provider, "");
        assert_eq!(record.mileage_at_service, None);
    }

    #[test]
    fn test_malformed_date_is_rejected() {
        let result: Result<MaintenanceRecord, _> = serde_json::from_str(
            r#"{"id":"r1","vehicle_id":"c1","category":"tax","date":"20-03-2024","cost":1}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_display_label() {
        let vehicle = Vehicle {
            id: "c1".to_string(),
            license_plate: "1AB 1234".to_string(),
            brand: "Toyota".to_string(),
            model: "Hilux Revo".to_string(),
            year: 2023,
            color: "White".to_string(),
            current_mileage: 45000,
            image: String::new(),
        };
        assert_eq!(vehicle.display_label(), "Toyota Hilux Revo (1AB 1234)");
    }
}
