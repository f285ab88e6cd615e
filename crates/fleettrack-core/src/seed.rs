// Built-in demo fleet, used when no fleet file is configured
use crate::models::{Category, FleetData, MaintenanceRecord, Vehicle};
use chrono::NaiveDate;

#[allow(clippy::too_many_arguments)]
fn vehicle(
    id: &str,
    plate: &str,
    brand: &str,
    model: &str,
    year: u16,
    color: &str,
    mileage: u32,
    image: &str,
) -> Vehicle {
    Vehicle {
        id: id.to_string(),
        license_plate: plate.to_string(),
        brand: brand.to_string(),
        model: model.to_string(),
        year,
        color: color.to_string(),
        current_mileage: mileage,
        image: image.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn record(
    id: &str,
    vehicle_id: &str,
    category: Category,
    date: (i32, u32, u32),
    expiry: Option<(i32, u32, u32)>,
    cost: f64,
    provider: &str,
    notes: &str,
    mileage: Option<u32>,
) -> MaintenanceRecord {
    let ymd = |(y, m, d): (i32, u32, u32)| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
    MaintenanceRecord {
        id: id.to_string(),
        vehicle_id: vehicle_id.to_string(),
        category,
        date: ymd(date),
        expiry_date: expiry.map(ymd),
        cost,
        provider: provider.to_string(),
        notes: notes.to_string(),
        mileage_at_service: mileage,
    }
}

pub fn initial_vehicles() -> Vec<Vehicle> {
    vec![
        vehicle(
            "c1",
            "1กข 1234",
            "Toyota",
            "Hilux Revo",
            2023,
            "White",
            45000,
            "https://images.unsplash.com/photo-1533473359331-0135ef1b58bf?auto=format&fit=crop&q=80&w=800",
        ),
        vehicle(
            "c2",
            "2ขค 5678",
            "Isuzu",
            "D-Max",
            2022,
            "Silver",
            82000,
            "https://images.unsplash.com/photo-1566008885218-90abf9200ddb?auto=format&fit=crop&q=80&w=800",
        ),
        vehicle(
            "c3",
            "3งจ 9012",
            "Honda",
            "City Hatchback",
            2024,
            "Gray",
            15000,
            "https://images.unsplash.com/photo-1549317661-bd32c8ce0db2?auto=format&fit=crop&q=80&w=800",
        ),
        vehicle(
            "c4",
            "4ฉช 3456",
            "Toyota",
            "Commuter",
            2021,
            "White",
            120000,
            "https://images.unsplash.com/photo-1464219789935-c2d9d9aba644?auto=format&fit=crop&q=80&w=800",
        ),
        vehicle(
            "c5",
            "5ซฌ 7890",
            "Ford",
            "Ranger",
            2023,
            "Black",
            5000,
            "https://images.unsplash.com/photo-1609521263047-f8f205293f24?auto=format&fit=crop&q=80&w=800",
        ),
    ]
}

pub fn initial_records() -> Vec<MaintenanceRecord> {
    vec![
        record(
            "r1",
            "c1",
            Category::OilChange,
            (2024, 12, 15),
            Some((2025, 6, 15)),
            2500.0,
            "Toyota Service Center",
            "100% synthetic oil change",
            Some(40000),
        ),
        record(
            "r2",
            "c1",
            Category::Tax,
            (2024, 3, 20),
            Some((2025, 3, 20)),
            1500.0,
            "Department of Land Transport",
            "Annual vehicle tax",
            None,
        ),
        record(
            "r3",
            "c2",
            Category::Repair,
            (2024, 11, 10),
            None,
            4500.0,
            "Chang Nueng Garage",
            "Front and rear brake pads replaced",
            Some(81000),
        ),
        record(
            "r4",
            "c4",
            Category::CompulsoryInsurance,
            (2024, 5, 1),
            Some((2025, 5, 1)),
            645.0,
            "Viriyah Co.",
            "Compulsory insurance renewal",
            None,
        ),
        record(
            "r5",
            "c2",
            Category::Insurance,
            (2024, 2, 1),
            Some((2025, 2, 1)),
            18000.0,
            "Viriyah Insurance",
            "First-class insurance",
            None,
        ),
        record(
            "r6",
            "c3",
            Category::OilChange,
            (2024, 10, 5),
            Some((2025, 4, 5)),
            1200.0,
            "B-Quik",
            "Fully synthetic",
            Some(12000),
        ),
    ]
}

pub fn initial_fleet() -> FleetData {
    FleetData {
        vehicles: initial_vehicles(),
        records: initial_records(),
    }
}
