//! Data-quality validation for vehicle records.
//!
//! Findings are data, not failures: validation never returns an error.
//! Each run produces a cleaned copy of the input, the list of issues and a
//! summary report.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::record::VehicleRecord;

/// Plate text that counts as missing.
pub const NO_PLATE: &str = "NO PLATE";
/// Earliest accepted in-service year.
pub const MIN_START_YEAR: i32 = 1900;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
/// Local date-times without an offset, as date-time form fields emit them.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// The record field an issue refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueField {
    LicensePlate,
    ReplaceDate,
    AcquisitionValue,
    StartYear,
}

impl IssueField {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueField::LicensePlate => "licensePlate",
            IssueField::ReplaceDate => "replaceDate",
            IssueField::AcquisitionValue => "acquisitionValue",
            IssueField::StartYear => "startYear",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    /// `{record_key}-{field}`.
    pub id: String,
    pub record_key: String,
    pub field: IssueField,
    pub severity: Severity,
    pub message: String,
    pub original_value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_value: Option<Value>,
}

impl ValidationIssue {
    fn new(
        record_key: &str,
        field: IssueField,
        severity: Severity,
        message: String,
        original_value: Value,
        suggested_value: Option<Value>,
    ) -> Self {
        Self {
            id: format!("{record_key}-{}", field.as_str()),
            record_key: record_key.to_string(),
            field,
            severity,
            message,
            original_value,
            suggested_value,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleaningReport {
    pub total_records: usize,
    /// `total_records` minus the number of error-severity issues.
    pub clean_records: usize,
    pub issues_found: usize,
    pub missing_license_plates: usize,
    pub invalid_dates: usize,
    pub invalid_values: usize,
    pub out_of_range_years: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleaningResult {
    pub cleaned: Vec<VehicleRecord>,
    pub issues: Vec<ValidationIssue>,
    pub report: CleaningReport,
}

/// Identity used to tie issues back to records: the id, else a usable
/// plate, else the 1-based position.
pub fn record_key(record: &VehicleRecord, index: usize) -> String {
    let usable = |s: &&String| !s.trim().is_empty() && s.trim() != NO_PLATE;
    record
        .id
        .as_ref()
        .filter(usable)
        .or_else(|| record.license_plate.as_ref().filter(usable))
        .cloned()
        .unwrap_or_else(|| format!("record-{}", index + 1))
}

fn placeholder_plate(index: usize) -> String {
    format!("TEMP-{:03}", index + 1)
}

fn plate_missing(plate: Option<&str>) -> bool {
    match plate {
        None => true,
        Some(p) => p.trim().is_empty() || p.trim() == NO_PLATE,
    }
}

fn parses_as_date(text: &str) -> bool {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text).is_ok()
        || DATE_FORMATS
            .iter()
            .any(|fmt| NaiveDate::parse_from_str(text, fmt).is_ok())
        || DATETIME_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(text, fmt).is_ok())
}

fn number(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(v.to_string()))
}

/// Validate with the current calendar year.
pub fn validate_records(records: &[VehicleRecord]) -> CleaningResult {
    validate_records_as_of(records, Utc::now().year())
}

/// Validate every record independently, treating `current_year` as today.
pub fn validate_records_as_of(records: &[VehicleRecord], current_year: i32) -> CleaningResult {
    let mut cleaned = Vec::with_capacity(records.len());
    let mut issues = Vec::new();
    let mut report = CleaningReport {
        total_records: records.len(),
        ..CleaningReport::default()
    };

    for (index, record) in records.iter().enumerate() {
        let key = record_key(record, index);
        let mut fixed = record.clone();

        if plate_missing(record.license_plate.as_deref()) {
            let placeholder = placeholder_plate(index);
            issues.push(ValidationIssue::new(
                &key,
                IssueField::LicensePlate,
                Severity::Warning,
                "Missing license plate".to_string(),
                json!(record.license_plate),
                Some(json!(placeholder)),
            ));
            fixed.license_plate = Some(placeholder);
            report.missing_license_plates += 1;
        }

        if let Some(date) = record.replace_date.as_deref() {
            if !date.trim().is_empty() && !parses_as_date(date) {
                issues.push(ValidationIssue::new(
                    &key,
                    IssueField::ReplaceDate,
                    Severity::Error,
                    format!("Invalid replace date: {date}"),
                    json!(date),
                    None,
                ));
                report.invalid_dates += 1;
            }
        }

        if let Some(value) = record.acquisition_value {
            if value.is_nan() || value < 0.0 {
                issues.push(ValidationIssue::new(
                    &key,
                    IssueField::AcquisitionValue,
                    Severity::Error,
                    "Invalid acquisition value".to_string(),
                    number(value),
                    Some(json!(0)),
                ));
                fixed.acquisition_value = Some(0.0);
                report.invalid_values += 1;
            }
        }

        if let Some(year) = record.start_year {
            if !(MIN_START_YEAR..=current_year + 1).contains(&year) {
                // reported only; the cleaned copy keeps the original year
                issues.push(ValidationIssue::new(
                    &key,
                    IssueField::StartYear,
                    Severity::Warning,
                    format!("Start year {year} out of range"),
                    json!(year),
                    Some(json!(current_year)),
                ));
                report.out_of_range_years += 1;
            }
        }

        cleaned.push(fixed);
    }

    let errors = issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count();
    report.clean_records = report.total_records.saturating_sub(errors);
    report.issues_found = issues.len();
    info!(
        total = report.total_records,
        clean = report.clean_records,
        issues = report.issues_found,
        "validated vehicle records"
    );

    CleaningResult {
        cleaned,
        issues,
        report,
    }
}

/// Percentage of clean records, rounded; an empty input scores 100.
pub fn quality_score(report: &CleaningReport) -> u32 {
    if report.total_records == 0 {
        return 100;
    }
    (report.clean_records as f64 / report.total_records as f64 * 100.0).round() as u32
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoFixOutcome {
    /// Number of suggestions written onto records.
    pub applied: usize,
    pub result: CleaningResult,
}

fn apply_suggestion(record: &mut VehicleRecord, field: IssueField, suggested: &Value) -> bool {
    match field {
        IssueField::LicensePlate => match suggested.as_str() {
            Some(plate) => {
                record.license_plate = Some(plate.to_string());
                true
            }
            None => false,
        },
        IssueField::AcquisitionValue => match suggested.as_f64() {
            Some(v) => {
                record.acquisition_value = Some(v);
                true
            }
            None => false,
        },
        IssueField::StartYear => match suggested.as_i64().and_then(|y| i32::try_from(y).ok()) {
            Some(y) => {
                record.start_year = Some(y);
                true
            }
            None => false,
        },
        IssueField::ReplaceDate => match suggested.as_str() {
            Some(d) => {
                record.replace_date = Some(d.to_string());
                true
            }
            None => false,
        },
    }
}

/// Auto-fix with the current calendar year.
pub fn auto_fix(records: &[VehicleRecord], issues: &[ValidationIssue]) -> AutoFixOutcome {
    auto_fix_as_of(records, issues, Utc::now().year())
}

/// Write every suggested value onto its record, then validate again.
///
/// Records are matched on the key they had before any fix was applied.
pub fn auto_fix_as_of(
    records: &[VehicleRecord],
    issues: &[ValidationIssue],
    current_year: i32,
) -> AutoFixOutcome {
    let keys: Vec<String> = records
        .iter()
        .enumerate()
        .map(|(i, r)| record_key(r, i))
        .collect();
    let mut fixed = records.to_vec();
    let mut applied = 0;
    for issue in issues {
        let Some(suggested) = issue.suggested_value.as_ref() else {
            continue;
        };
        for (record, key) in fixed.iter_mut().zip(&keys) {
            if *key == issue.record_key && apply_suggestion(record, issue.field, suggested) {
                applied += 1;
            }
        }
    }
    info!(applied, "applied suggested fixes");
    AutoFixOutcome {
        applied,
        result: validate_records_as_of(&fixed, current_year),
    }
}
