use chrono::NaiveDate;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::calendar::{Locale, add_months_rollover};

/// Upper bound on the number of monthly samples a single series may hold.
pub const MAX_HORIZON_MONTHS: u32 = 1200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Key under which a point's numeric sample is serialized.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricField {
    Value,
    Incidents,
    Delayed,
}

impl MetricField {
    pub fn key(self) -> &'static str {
        match self {
            MetricField::Value => "value",
            MetricField::Incidents => "incidents",
            MetricField::Delayed => "delayed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub period_label: String,
    pub date: NaiveDate,
    pub value: f64,
}

impl SeriesPoint {
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn iso_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedSeries {
    pub field: MetricField,
    pub points: Vec<SeriesPoint>,
}

impl GeneratedSeries {
    pub fn empty(field: MetricField) -> Self {
        Self {
            field,
            points: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }
}

/// Serialized as `{"field": "...", "points": [{"name", "date", <field>}]}` so
/// chart consumers can key on `incidents` or `delayed` directly.
impl Serialize for GeneratedSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let records: Vec<PointRecord<'_>> = self
            .points
            .iter()
            .map(|point| PointRecord {
                point,
                field: self.field,
            })
            .collect();
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("field", &self.field)?;
        map.serialize_entry("points", &records)?;
        map.end()
    }
}

struct PointRecord<'a> {
    point: &'a SeriesPoint,
    field: MetricField,
}

impl Serialize for PointRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("name", &self.point.period_label)?;
        map.serialize_entry("date", &self.point.iso_date())?;
        map.serialize_entry(self.field.key(), &self.point.value)?;
        map.end()
    }
}

/// Target-convergence configuration shared by the trend and count generators.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesConfig {
    pub start_date: NaiveDate,
    pub horizon_months: u32,
    pub initial_value: f64,
    pub target_value: f64,
    pub target_date: NaiveDate,
    pub fluctuates: bool,
    pub locale: Locale,
}

impl SeriesConfig {
    pub fn validate(&self) -> Result<(), SeriesError> {
        if !self.initial_value.is_finite() {
            return Err(invalid("initial value must be finite"));
        }
        if !self.target_value.is_finite() {
            return Err(invalid("target value must be finite"));
        }
        validate_horizon(self.start_date, self.horizon_months)
    }

    /// Fraction of the elapsed time between the start and target dates, in days.
    pub fn progress_at(&self, date: NaiveDate) -> f64 {
        let span = (self.target_date - self.start_date).num_days();
        if span == 0 {
            return 1.0;
        }
        (date - self.start_date).num_days() as f64 / span as f64
    }

    /// Noiseless trend value at `date`.
    pub fn trend_value_at(&self, date: NaiveDate) -> f64 {
        if date <= self.target_date {
            self.initial_value + (self.target_value - self.initial_value) * self.progress_at(date)
        } else {
            self.target_value
        }
    }
}

/// Configuration of the target-less generator used for backlog-style counts.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineConfig {
    pub start_date: NaiveDate,
    pub horizon_months: u32,
    pub base_value: f64,
    pub locale: Locale,
}

impl BaselineConfig {
    pub fn validate(&self) -> Result<(), SeriesError> {
        if !self.base_value.is_finite() || self.base_value < 0.0 {
            return Err(invalid("base value must be a finite number >= 0"));
        }
        validate_horizon(self.start_date, self.horizon_months)
    }
}

fn validate_horizon(start_date: NaiveDate, horizon_months: u32) -> Result<(), SeriesError> {
    if horizon_months > MAX_HORIZON_MONTHS {
        return Err(invalid(&format!(
            "horizon must be <= {MAX_HORIZON_MONTHS} months"
        )));
    }
    if horizon_months > 0 && add_months_rollover(start_date, horizon_months - 1).is_none() {
        return Err(invalid("horizon runs past the supported calendar range"));
    }
    Ok(())
}

pub(crate) fn invalid(reason: &str) -> SeriesError {
    SeriesError::InvalidConfiguration(reason.to_string())
}
