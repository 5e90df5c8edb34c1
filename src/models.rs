//! Data models for the daily production metrics pipeline.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ---

/// One production-log entry extracted from the SQL dump.
///
/// Immutable once parsed; negative tonnage is carried through as-is and
/// clamped later by the transform stage, never by the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionRecord {
    // ---
    pub date: NaiveDate,
    pub mine_id: u32,
    pub shift: String,
    pub tons_extracted: f64,
    pub quality_grade: f64,
}

/// Raw equipment telemetry row from the sensor CSV.
///
/// The timestamp stays a string at load time; rows whose timestamp fails to
/// parse are dropped by the transform stage, not rejected by the loader.
#[derive(Debug, Clone, Deserialize)]
pub struct SensorRecord {
    // ---
    pub timestamp: String,
    pub equipment_id: String,
    pub status: String,
    pub fuel_consumption: f64,
}

/// One day of weather observations for the mining site.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRecord {
    // ---
    pub date: NaiveDate,
    pub temperature_mean: f64,
    pub precipitation_sum: f64,
}

/// Final denormalized metrics row, one per (date, mine_id).
///
/// `equipment_utilization` and `fuel_efficiency` are date-level aggregates
/// broadcast across every mine sharing that date; they stay `None` when no
/// sensor data exists for the date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyMetric {
    // ---
    pub date: NaiveDate,
    pub mine_id: u32,
    pub total_production_daily: f64,
    pub average_quality_grade: f64,
    pub equipment_utilization: Option<f64>,
    pub fuel_efficiency: Option<f64>,
    pub rainfall_mm: f64,
    pub weather_impact: f64,
}

// ---

impl SensorRecord {
    /// Calendar date of the reading, or `None` when the timestamp does not
    /// match any recognised format.
    pub fn observation_date(&self) -> Option<NaiveDate> {
        // ---
        let raw = self.timestamp.trim();

        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
            return Some(dt.date());
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
            return Some(dt.date());
        }
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
            return Some(dt.date_naive());
        }
        if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(d);
        }

        None
    }

    /// Whether the equipment reported itself as working during this reading.
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}
