// Create/edit record form state
use chrono::NaiveDate;
use fleettrack_core::{Category, Error, MaintenanceRecord, RecordDraft, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Category,
    Date,
    ExpiryDate,
    Cost,
    Mileage,
    Provider,
    Notes,
}

impl FormField {
    pub fn all() -> [FormField; 7] {
        [
            FormField::Category,
            FormField::Date,
            FormField::ExpiryDate,
            FormField::Cost,
            FormField::Mileage,
            FormField::Provider,
            FormField::Notes,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Category => "Type",
            FormField::Date => "Service date",
            FormField::ExpiryDate => "Expiry / next due (optional)",
            FormField::Cost => "Cost",
            FormField::Mileage => "Mileage (km, optional)",
            FormField::Provider => "Service provider",
            FormField::Notes => "Notes",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            FormField::Category => "",
            FormField::Date | FormField::ExpiryDate => "YYYY-MM-DD",
            FormField::Cost => "0.00",
            FormField::Mileage => "latest odometer reading",
            FormField::Provider => "e.g. Toyota service center",
            FormField::Notes => "repair details or other info",
        }
    }

    fn index(&self) -> usize {
        Self::all().iter().position(|f| f == self).unwrap_or(0)
    }
}

/// Edits the form understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    NextField,
    PreviousField,
    Input(char),
    Backspace,
    NextCategory,
    PreviousCategory,
}

/// Text buffers behind the record form. Parsed into a draft on submit.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordForm {
    pub vehicle_id: String,
    /// Id of the record being edited, `None` for a new record
    pub editing: Option<String>,
    pub category: Category,
    pub date: String,
    pub expiry_date: String,
    pub cost: String,
    pub mileage: String,
    pub provider: String,
    pub notes: String,
    pub cursor: FormField,
    pub error: Option<String>,
}

impl RecordForm {
    /// Blank form for a new record, dated today
    pub fn new(vehicle_id: &str, today: NaiveDate) -> Self {
        Self {
            vehicle_id: vehicle_id.to_string(),
            editing: None,
            category: Category::OilChange,
            date: today.format("%Y-%m-%d").to_string(),
            expiry_date: String::new(),
            cost: String::new(),
            mileage: String::new(),
            provider: String::new(),
            notes: String::new(),
            cursor: FormField::Category,
            error: None,
        }
    }

    /// Form pre-filled from an existing record
    pub fn edit(record: &MaintenanceRecord) -> Self {
        Self {
            vehicle_id: record.vehicle_id.clone(),
            editing: Some(record.id.clone()),
            category: record.category,
            date: record.date.format("%Y-%m-%d").to_string(),
            expiry_date: record
                .expiry_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            cost: record.cost.to_string(),
            mileage: record
                .mileage_at_service
                .map(|m| m.to_string())
                .unwrap_or_default(),
            provider: record.provider.clone(),
            notes: record.notes.clone(),
            cursor: FormField::Category,
            error: None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn title(&self) -> &'static str {
        if self.is_editing() {
            " Edit maintenance record "
        } else {
            " New maintenance record "
        }
    }

    pub fn apply(&mut self, action: FormAction) {
        match action {
            FormAction::NextField => {
                let fields = FormField::all();
                self.cursor = fields[(self.cursor.index() + 1) % fields.len()];
            }
            FormAction::PreviousField => {
                let fields = FormField::all();
                self.cursor = fields[(self.cursor.index() + fields.len() - 1) % fields.len()];
            }
            FormAction::NextCategory => self.category = self.category.next(),
            FormAction::PreviousCategory => self.category = self.category.previous(),
            FormAction::Input(c) => {
                if let Some(buffer) = self.buffer_mut(self.cursor) {
                    buffer.push(c);
                }
            }
            FormAction::Backspace => {
                if let Some(buffer) = self.buffer_mut(self.cursor) {
                    buffer.pop();
                }
            }
        }
    }

    /// Display value of a field
    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Category => self.category.label(),
            FormField::Date => &self.date,
            FormField::ExpiryDate => &self.expiry_date,
            FormField::Cost => &self.cost,
            FormField::Mileage => &self.mileage,
            FormField::Provider => &self.provider,
            FormField::Notes => &self.notes,
        }
    }

    fn buffer_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Category => None,
            FormField::Date => Some(&mut self.date),
            FormField::ExpiryDate => Some(&mut self.expiry_date),
            FormField::Cost => Some(&mut self.cost),
            FormField::Mileage => Some(&mut self.mileage),
            FormField::Provider => Some(&mut self.provider),
            FormField::Notes => Some(&mut self.notes),
        }
    }

    /// Validate the buffers and build a draft
    pub fn to_draft(&self) -> Result<RecordDraft> {
        let date = parse_date("service date", &self.date)?
            .ok_or_else(|| Error::invalid("service date", "required"))?;
        let expiry_date = parse_date("expiry date", &self.expiry_date)?;

        let cost_text = self.cost.trim();
        if cost_text.is_empty() {
            return Err(Error::invalid("cost", "required"));
        }
        let cost: f64 = cost_text
            .replace(',', "")
            .parse()
            .map_err(|_| Error::invalid("cost", format!("'{}' is not a number", cost_text)))?;
        if !cost.is_finite() || cost < 0.0 {
            return Err(Error::invalid("cost", "must be zero or more"));
        }

        let mileage_text = self.mileage.trim();
        let mileage_at_service = if mileage_text.is_empty() {
            None
        } else {
            Some(
                mileage_text
                    .replace(',', "")
                    .parse::<u32>()
                    .map_err(|_| Error::invalid("mileage", "must be a whole number of km"))?,
            )
        };

        Ok(RecordDraft {
            category: self.category,
            date,
            expiry_date,
            cost,
            provider: self.provider.trim().to_string(),
            notes: self.notes.trim().to_string(),
            mileage_at_service,
        })
    }
}

fn parse_date(field: &'static str, text: &str) -> Result<Option<NaiveDate>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| Error::invalid(field, format!("'{}' is not a YYYY-MM-DD date", text)))
}
