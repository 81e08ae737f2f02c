#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime};
use std::sync::Arc;

use rota_engine::{
    models::{CreatePatternInput, CreateShiftInput, PatternShiftInput, PatternWithShifts, Shift},
    services::RotaServices,
    store::MemoryStore,
};

pub const ADMIN: i32 = 1;
pub const ANN: i32 = 10;
pub const BEN: i32 = 11;
pub const CARA: i32 = 12;
pub const DAN: i32 = 13;

pub const TEST_WEEKS: u32 = 8;

pub struct Rota {
    pub store: MemoryStore,
    pub services: RotaServices,
}

/// A memory-backed rota with a small directory: one admin, three nurses
/// (Cara is also a doctor) and Dan, who holds no roles.
pub fn rota() -> Rota {
    let store = MemoryStore::new();
    store.add_employee(ADMIN, "Alice Admin", &["ADMIN"]);
    store.add_employee(ANN, "Ann Archer", &["NURSE"]);
    store.add_employee(BEN, "Ben Baker", &["NURSE"]);
    store.add_employee(CARA, "Cara Cole", &["NURSE", "DOCTOR"]);
    store.add_employee(DAN, "Dan Dale", &[]);

    let services = RotaServices::new(Arc::new(store.clone()), Arc::new(store.clone()), TEST_WEEKS);
    Rota { store, services }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M:%S").unwrap()
}

pub async fn shift(rota: &Rota, name: &str, start: &str, end: &str) -> Shift {
    rota.services
        .catalog
        .create(CreateShiftInput {
            name: name.to_string(),
            start_time: time(start),
            end_time: time(end),
        })
        .await
        .unwrap()
}

pub fn cell(week_number: i16, day_of_week: i16, shift_id: i32) -> PatternShiftInput {
    PatternShiftInput {
        week_number,
        day_of_week,
        shift_id,
    }
}

pub async fn pattern(rota: &Rota, employee_id: i32, cells: Vec<PatternShiftInput>) -> PatternWithShifts {
    rota.services
        .patterns
        .create(CreatePatternInput {
            employee_id,
            name: format!("Pattern for {}", employee_id),
            shifts: cells,
        })
        .await
        .unwrap()
}
