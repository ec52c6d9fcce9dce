//! Vehicle records as they arrive from imports and forms.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A loosely populated vehicle record; every field may be missing.
///
/// Build one from arbitrary JSON with [`VehicleRecord::from_json`], the single
/// normalization step at the data-entry boundary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub license_plate: Option<String>,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub start_year: Option<i32>,
    /// Raw date text; parsed only by the validator.
    #[serde(default)]
    pub replace_date: Option<String>,
    /// NaN marks a value that was present but not numeric.
    #[serde(default)]
    pub acquisition_value: Option<f64>,
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn year(value: Option<&Value>) -> Option<i32> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn amount(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Null => None,
        Value::Number(n) => Some(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().parse().unwrap_or(f64::NAN)),
        _ => Some(f64::NAN),
    }
}

impl VehicleRecord {
    /// Normalize one JSON object (camelCase keys) into a record.
    ///
    /// Non-object input yields an empty record. A present but non-numeric
    /// acquisition value becomes NaN so the validator reports it.
    pub fn from_json(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        Self {
            id: text(obj.get("id")).filter(|s| !s.is_empty()),
            license_plate: text(obj.get("licensePlate")),
            make: text(obj.get("make")),
            model: text(obj.get("model")),
            category: text(obj.get("category")),
            fuel_type: text(obj.get("fuelType")),
            start_year: year(obj.get("startYear")),
            replace_date: text(obj.get("replaceDate")),
            acquisition_value: amount(obj.get("acquisitionValue")),
        }
    }

    /// Normalize a JSON array of objects; anything else yields no records.
    pub fn from_json_array(value: &Value) -> Vec<Self> {
        value
            .as_array()
            .map(|items| items.iter().map(Self::from_json).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_loose_types() {
        let r = VehicleRecord::from_json(&json!({
            "id": 17,
            "licensePlate": "ABC-123",
            "startYear": "2019",
            "acquisitionValue": "42000.50",
            "replaceDate": "2030-01-01"
        }));
        assert_eq!(r.id.as_deref(), Some("17"));
        assert_eq!(r.license_plate.as_deref(), Some("ABC-123"));
        assert_eq!(r.start_year, Some(2019));
        assert_eq!(r.acquisition_value, Some(42000.5));
        assert_eq!(r.replace_date.as_deref(), Some("2030-01-01"));
        assert!(r.make.is_none());
    }

    #[test]
    fn non_numeric_value_becomes_nan() {
        let r = VehicleRecord::from_json(&json!({ "acquisitionValue": "lots" }));
        assert!(r.acquisition_value.is_some_and(f64::is_nan));
        let r = VehicleRecord::from_json(&json!({ "acquisitionValue": "" }));
        assert!(r.acquisition_value.is_none());
    }

    #[test]
    fn non_objects_are_empty() {
        assert_eq!(VehicleRecord::from_json(&json!(3)), VehicleRecord::default());
        assert!(VehicleRecord::from_json_array(&json!({"a": 1})).is_empty());
        assert_eq!(VehicleRecord::from_json_array(&json!([{}, {}])).len(), 2);
    }
}
