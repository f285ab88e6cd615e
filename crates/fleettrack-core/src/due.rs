use crate::models::{Category, MaintenanceRecord};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Deadlines this close (in days) count as "due soon"
pub const DEFAULT_DUE_SOON_DAYS: i64 = 30;

/// The single nearest deadline of a vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextDue {
    pub category: Category,
    pub due_date: NaiveDate,
    /// Whole days until the deadline, rounded up. Negative when overdue.
    pub days_remaining: i64,
    /// Record the deadline comes from
    pub record_id: String,
}

impl NextDue {
    pub fn status(&self, due_soon_days: i64) -> DueStatus {
        DueStatus::classify(self.days_remaining, due_soon_days)
    }
}

/// Where a deadline stands relative to today
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DueStatus {
    /// Deadline already passed
    Overdue,
    /// Within the due-soon window (inclusive)
    DueSoon,
    /// Further away than the due-soon window
    OnSchedule,
}

impl DueStatus {
    pub fn classify(days_remaining: i64, due_soon_days: i64) -> Self {
        if days_remaining < 0 {
            DueStatus::Overdue
        } else if days_remaining <= due_soon_days {
            DueStatus::DueSoon
        } else {
            DueStatus::OnSchedule
        }
    }

    pub fn from_days(days_remaining: i64) -> Self {
        Self::classify(days_remaining, DEFAULT_DUE_SOON_DAYS)
    }

    pub fn label(&self) -> &'static str {
        match self {
            DueStatus::Overdue => "Overdue",
            DueStatus::DueSoon => "Due soon",
            DueStatus::OnSchedule => "On schedule",
        }
    }

    pub fn color_code(&self) -> &'static str {
        match self {
            DueStatus::Overdue => "red",
            DueStatus::DueSoon => "yellow",
            DueStatus::OnSchedule => "green",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            DueStatus::Overdue => "✗",
            DueStatus::DueSoon => "!",
            DueStatus::OnSchedule => "✓",
        }
    }
}

/// Human phrasing of a day count: "in 16 days", "today", "overdue by 3 days"
pub fn describe_days(days_remaining: i64) -> String {
    match days_remaining {
        d if d < 0 => format!("overdue by {} day{}", -d, plural(-d)),
        0 => "due today".to_string(),
        d => format!("{} day{} left", d, plural(d)),
    }
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Ceiling of (due date at 00:00 UTC - now) in days
pub fn days_until(due_date: NaiveDate, now: DateTime<Utc>) -> i64 {
    let due = due_date.and_time(NaiveTime::MIN).and_utc();
    let millis = (due - now).num_milliseconds();
    -(-millis).div_euclid(MILLIS_PER_DAY)
}

/// Nearest-deadline computation over a record collection
pub struct DueCalculator;

impl DueCalculator {
    /// Find the next deadline for `vehicle_id`
    ///
    /// Only the most recent record of each category counts (an older oil
    /// change is superseded by a newer one even if its expiry was later).
    /// Among those, the earliest expiry wins. Returns `None` when no record
    /// of the vehicle carries an expiry date.
    pub fn next_due(
        records: &[MaintenanceRecord],
        vehicle_id: &str,
        now: DateTime<Utc>,
    ) -> Option<NextDue> {
        Self::latest_per_category(records, vehicle_id)
            .into_iter()
            .filter_map(|(category, record)| {
                record.expiry_date.map(|due_date| (due_date, category, record))
            })
            .min_by_key(|(due_date, category, _)| (*due_date, *category))
            .map(|(due_date, category, record)| NextDue {
                category,
                due_date,
                days_remaining: days_until(due_date, now),
                record_id: record.id.clone(),
            })
    }

    /// Most recent dated record of each category for one vehicle
    pub fn latest_per_category<'a>(
        records: &'a [MaintenanceRecord],
        vehicle_id: &str,
    ) -> BTreeMap<Category, &'a MaintenanceRecord> {
        let mut latest: BTreeMap<Category, &MaintenanceRecord> = BTreeMap::new();

        for record in records
            .iter()
            .filter(|r| r.vehicle_id == vehicle_id && r.expiry_date.is_some())
        {
            match latest.get(&record.category) {
                Some(current) if !supersedes(record, current) => {}
                _ => {
                    latest.insert(record.category, record);
                }
            }
        }

        latest
    }

    /// Days remaining and status for a single record, `None` without an expiry date
    pub fn record_status(
        record: &MaintenanceRecord,
        now: DateTime<Utc>,
        due_soon_days: i64,
    ) -> Option<(i64, DueStatus)> {
        record.expiry_date.map(|expiry| {
            let days = days_until(expiry, now);
            (days, DueStatus::classify(days, due_soon_days))
        })
    }
}

/// Later service date wins; equal dates fall back to later expiry, then greater id
fn supersedes(candidate: &MaintenanceRecord, current: &MaintenanceRecord) -> bool {
    (candidate.date, candidate.expiry_date, candidate.id.as_str())
        > (current.date, current.expiry_date, current.id.as_str())
}
