//! CSV export and import of stored records.
//!
//! Export flattens each record to its JSON object: scalars become plain
//! cells and nested objects or arrays are JSON-encoded inline. Generic import
//! mirrors this with a best-effort JSON parse of cells that start with `[`
//! or `{`. Typed imports go through `csv`'s serde support.

use chrono::{DateTime, Utc};
use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use fleet_core::{generate_id, CategoryType, EquipmentCategory, VehiclePriceHistory};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::record::VehicleRecord;

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    /// Only records that serialize to JSON objects can be exported.
    #[error("record {0} is not an object")]
    NotAnObject(usize),
}

fn cell(value: &Value) -> Result<String, CsvError> {
    Ok(match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value)?,
    })
}

/// Export records as CSV with a header row. Columns are the union of all
/// record keys in first-seen order; an empty slice exports as "".
pub fn export_csv<T: Serialize>(records: &[T]) -> Result<String, CsvError> {
    if records.is_empty() {
        return Ok(String::new());
    }
    let mut rows: Vec<Map<String, Value>> = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        match serde_json::to_value(record)? {
            Value::Object(map) => rows.push(map),
            _ => return Err(CsvError::NotAnObject(i)),
        }
    }
    let mut headers: Vec<String> = Vec::new();
    for row in &rows {
        for key in row.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(Vec::new());
    wtr.write_record(&headers)?;
    for row in &rows {
        let cells = headers
            .iter()
            .map(|h| row.get(h).map_or(Ok(String::new()), cell))
            .collect::<Result<Vec<String>, CsvError>>()?;
        wtr.write_record(&cells)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    debug!(rows = rows.len(), columns = headers.len(), "exported csv");
    Ok(String::from_utf8(bytes)?)
}

fn parse_cell(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if raw.starts_with('[') || raw.starts_with('{') {
        if let Ok(v) = serde_json::from_str(raw) {
            return v;
        }
    }
    Value::String(raw.to_string())
}

/// Import CSV into JSON objects keyed by header. Empty cells become null.
pub fn import_rows(text: &str) -> Result<Vec<Map<String, Value>>, CsvError> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(text.as_bytes());
    let headers = rdr.headers()?.clone();
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let row: Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .map(|(h, raw)| (h.to_string(), parse_cell(raw)))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Import vehicle rows through the record normalization step.
pub fn import_vehicles(text: &str) -> Result<Vec<VehicleRecord>, CsvError> {
    Ok(import_rows(text)?
        .into_iter()
        .map(|row| VehicleRecord::from_json(&Value::Object(row)))
        .collect())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryRow {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(rename = "type")]
    category_type: CategoryType,
    default_lifespan: u32,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

/// Stamp identity and timestamps the way an import does: a missing id is
/// regenerated together with `updatedAt`, a missing `createdAt` is now.
fn stamp(
    id: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
) -> (String, DateTime<Utc>, DateTime<Utc>) {
    let now = Utc::now();
    let created_at = created_at.unwrap_or(now);
    match id.filter(|id| !id.trim().is_empty()) {
        Some(id) => (id, created_at, updated_at.unwrap_or(now)),
        None => (generate_id(), created_at, now),
    }
}

pub fn import_categories(text: &str) -> Result<Vec<EquipmentCategory>, CsvError> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(text.as_bytes());
    let mut out = Vec::new();
    for row in rdr.deserialize::<CategoryRow>() {
        let row = row?;
        let (id, created_at, updated_at) = stamp(row.id, row.created_at, row.updated_at);
        out.push(EquipmentCategory {
            id,
            name: row.name,
            category_type: row.category_type,
            default_lifespan: row.default_lifespan,
            created_at,
            updated_at,
        });
    }
    debug!(count = out.len(), "imported categories");
    Ok(out)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceRow {
    #[serde(default)]
    id: Option<String>,
    category: String,
    year: i32,
    base_price: Decimal,
    #[serde(default)]
    ev_price: Option<Decimal>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

pub fn import_price_history(text: &str) -> Result<Vec<VehiclePriceHistory>, CsvError> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(text.as_bytes());
    let mut out = Vec::new();
    for row in rdr.deserialize::<PriceRow>() {
        let row = row?;
        let (id, created_at, updated_at) = stamp(row.id, row.created_at, row.updated_at);
        out.push(VehiclePriceHistory {
            id,
            category: row.category,
            year: row.year,
            base_price: row.base_price,
            ev_price: row.ev_price,
            source: row.source.unwrap_or_else(|| "import".to_string()),
            created_at,
            updated_at,
        });
    }
    debug!(count = out.len(), "imported price history");
    Ok(out)
}
