use crate::models::{FleetData, MaintenanceRecord, Vehicle};
use crate::{Error, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// File name offered for the CSV download
pub const EXPORT_FILE_NAME: &str = "maintenance_schedule_template.csv";

const CSV_HEADERS: [&str; 10] = [
    "Car License",
    "Brand",
    "Model",
    "Maintenance Type",
    "Payment Date",
    "Expiry Date",
    "Cost",
    "Provider",
    "Notes",
    "Mileage",
];

/// Stand-in for absent optional values
const PLACEHOLDER: &str = "-";

/// Byte-order mark so spreadsheet apps pick UTF-8 for non-ASCII plates and notes
const UTF8_BOM: char = '\u{FEFF}';

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Exporter for maintenance data
pub struct Exporter;

impl Exporter {
    /// Export to a file, picking the format from the extension
    pub fn export_to_file<P: AsRef<Path>>(
        vehicles: &[Vehicle],
        records: &[MaintenanceRecord],
        path: P,
    ) -> Result<()> {
        let path = path.as_ref();

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ExportFormat::from_extension)
            .ok_or_else(|| {
                Error::ExportError(
                    "Could not determine export format from extension. Use .csv or .json"
                        .to_string(),
                )
            })?;

        Self::export_to_file_with_format(vehicles, records, path, format)
    }

    /// Export to a file with explicit format
    pub fn export_to_file_with_format<P: AsRef<Path>>(
        vehicles: &[Vehicle],
        records: &[MaintenanceRecord],
        path: P,
        format: ExportFormat,
    ) -> Result<()> {
        let path = path.as_ref();
        let content = match format {
            ExportFormat::Csv => Self::to_csv(vehicles, records),
            ExportFormat::Json => Self::to_json(vehicles, records)?,
        };

        let mut file = File::create(path)
            .map_err(|e| Error::ExportError(format!("Failed to create file: {}", e)))?;

        file.write_all(content.as_bytes())
            .map_err(|e| Error::ExportError(format!("Failed to write file: {}", e)))?;

        info!(
            "Exported {} records as {} to {}",
            records.len(),
            format.extension(),
            path.display()
        );
        Ok(())
    }

    /// Full fleet snapshot as pretty JSON (loadable with `--fleet`)
    pub fn to_json(vehicles: &[Vehicle], records: &[MaintenanceRecord]) -> Result<String> {
        let data = FleetData {
            vehicles: vehicles.to_vec(),
            records: records.to_vec(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// One header row plus one row per record, joined with the owning vehicle.
    /// Records whose vehicle is gone get empty vehicle columns.
    pub fn to_csv(vehicles: &[Vehicle], records: &[MaintenanceRecord]) -> String {
        let mut lines = Vec::with_capacity(records.len() + 1);
        lines.push(CSV_HEADERS.join(","));

        for record in records {
            let vehicle = vehicles.iter().find(|v| v.id == record.vehicle_id);
            let (plate, brand, model) = vehicle
                .map(|v| (v.license_plate.as_str(), v.brand.as_str(), v.model.as_str()))
                .unwrap_or(("", "", ""));

            let row = [
                Self::escape_csv(plate),
                Self::escape_csv(brand),
                Self::escape_csv(model),
                Self::escape_csv(record.category.label()),
                record.date.format("%Y-%m-%d").to_string(),
                record
                    .expiry_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| PLACEHOLDER.to_string()),
                Self::format_cost(record.cost),
                Self::quote_csv(&record.provider),
                Self::quote_csv(&record.notes),
                record
                    .mileage_at_service
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| PLACEHOLDER.to_string()),
            ];
            lines.push(row.join(","));
        }

        let mut output = String::new();
        output.push(UTF8_BOM);
        output.push_str(&lines.join("\n"));
        output
    }

    /// Quote only when needed
    fn escape_csv(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            Self::quote_csv(s)
        } else {
            s.to_string()
        }
    }

    /// Always quote (free-text columns)
    fn quote_csv(s: &str) -> String {
        format!("\"{}\"", s.replace('"', "\"\""))
    }

    /// Whole amounts without a fraction, everything else as-is
    fn format_cost(cost: f64) -> String {
        if cost.fract() == 0.0 && cost.abs() < 1e15 {
            format!("{}", cost as i64)
        } else {
            cost.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::NaiveDate;

    fn vehicle() -> Vehicle {
        Vehicle {
            id: "c1".to_string(),
            license_plate: "1AB 1234".to_string(),
            brand: "Toyota".to_string(),
            model: "Hilux Revo".to_string(),
            year: 2023,
            color: "White".to_string(),
            current_mileage: 45000,
            image: String::new(),
        }
    }

    fn record(id: &str, vehicle_id: &str) -> MaintenanceRecord {
        MaintenanceRecord {
            id: id.to_string(),
            vehicle_id: vehicle_id.to_string(),
            category: Category::OilChange,
            date: NaiveDate::from_ymd_opt(2024, 12, 15).unwrap(),
            expiry_date: NaiveDate::from_ymd_opt(2025, 6, 15),
            cost: 2500.0,
            provider: "Toyota Service, Bangkok".to_string(),
            notes: "Fully synthetic \"0W-20\"".to_string(),
            mileage_at_service: Some(40000),
        }
    }

    fn data_lines(csv: &str) -> Vec<&str> {
        csv.trim_start_matches(UTF8_BOM).split('\n').collect()
    }

    #[test]
    fn test_export_format_detection() {
        assert_eq!(ExportFormat::from_extension("csv"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_extension("JSON"), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_extension("md"), None);
    }

    #[test]
    fn test_csv_layout() {
        let csv = Exporter::to_csv(&[vehicle()], &[record("r1", "c1")]);

        assert!(csv.starts_with(UTF8_BOM));
        assert!(!csv.ends_with('\n'));

        let lines = data_lines(&csv);
        assert_eq!(
            lines[0],
            "Car License,Brand,Model,Maintenance Type,Payment Date,Expiry Date,Cost,Provider,Notes,Mileage"
        );
        assert_eq!(
            lines[1],
            "1AB 1234,Toyota,Hilux Revo,Oil change,2024-12-15,2025-06-15,2500,\"Toyota Service, Bangkok\",\"Fully synthetic \"\"0W-20\"\"\",40000"
        );
    }

    #[test]
    fn test_one_row_per_record_and_orphans_get_empty_vehicle_fields() {
        let mut orphan = record("r2", "gone");
        orphan.expiry_date = None;
        orphan.mileage_at_service = None;
        orphan.cost = 99.5;

        let csv = Exporter::to_csv(&[vehicle()], &[record("r1", "c1"), orphan]);
        let lines = data_lines(&csv);

        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with(",,,Oil change,2024-12-15,-,99.5,"));
        assert!(lines[2].ends_with(",-"));
    }

    #[test]
    fn test_empty_collection_is_header_only() {
        let csv = Exporter::to_csv(&[vehicle()], &[]);
        assert_eq!(data_lines(&csv).len(), 1);
    }

    #[test]
    fn test_json_export_contains_snapshot() {
        let json = Exporter::to_json(&[vehicle()], &[record("r1", "c1")]).unwrap();
        let parsed: FleetData = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.vehicles.len(), 1);
        assert_eq!(parsed.records[0].id, "r1");
    }

    #[test]
    fn test_export_to_file_detects_format() {
        let dir = tempfile::tempdir().unwrap();

        let csv_path = dir.path().join(EXPORT_FILE_NAME);
        Exporter::export_to_file(&[vehicle()], &[record("r1", "c1")], &csv_path).unwrap();
        let written = std::fs::read_to_string(&csv_path).unwrap();
        assert!(written.contains("Hilux Revo"));

        let bad_path = dir.path().join("fleet.txt");
        assert!(matches!(
            Exporter::export_to_file(&[vehicle()], &[], &bad_path),
            Err(Error::ExportError(_))
        ));
    }

    #[test]
    fn test_csv_escaping() {
        assert_eq!(Exporter::escape_csv("simple"), "simple");
        assert_eq!(Exporter::escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(Exporter::escape_csv("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(Exporter::quote_csv("plain"), "\"plain\"");
    }

    #[test]
    fn test_cost_formatting() {
        assert_eq!(Exporter::format_cost(645.0), "645");
        assert_eq!(Exporter::format_cost(18000.0), "18000");
        assert_eq!(Exporter::format_cost(12.25), "12.25");
    }
}
