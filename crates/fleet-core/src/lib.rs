#![deny(warnings)]

//! Core domain models and invariants for fleetcast.
//!
//! This crate defines the serializable records shared by the forecast,
//! persistence and settings crates, together with the input-layer bounds
//! checks applied before values reach the engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Generate a record identifier: epoch milliseconds plus a random suffix.
pub fn generate_id() -> String {
    format!("{}-{:08x}", Utc::now().timestamp_millis(), rand::random::<u32>())
}

/// Economic inputs driving the forecast engine. All rates are percentages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostParameters {
    /// Annual inflation applied with compounding, e.g. 3.2 = 3.2%.
    pub inflation_rate: f64,
    /// Flat tariff surcharge on unit cost.
    pub tariff_rate: f64,
    /// Share of small vehicles replaced by EVs.
    pub small_to_ev_ratio: f64,
    /// Share of large vehicles replaced by EVs.
    pub big_to_ev_ratio: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for CostParameters {
    /// The fallback tuple used whenever current parameters cannot be read.
    fn default() -> Self {
        Self::with_rates(3.2, 2.5, 25.0, 15.0)
    }
}

impl CostParameters {
    /// Parameters with the four rates set and no metadata.
    pub fn with_rates(inflation: f64, tariff: f64, small_to_ev: f64, big_to_ev: f64) -> Self {
        Self {
            inflation_rate: inflation,
            tariff_rate: tariff,
            small_to_ev_ratio: small_to_ev,
            big_to_ev_ratio: big_to_ev,
            id: None,
            updated_by: None,
            updated_at: None,
        }
    }

    /// Compare only the four rates, ignoring id and attribution.
    pub fn same_rates(&self, other: &CostParameters) -> bool {
        self.inflation_rate == other.inflation_rate
            && self.tariff_rate == other.tariff_rate
            && self.small_to_ev_ratio == other.small_to_ev_ratio
            && self.big_to_ev_ratio == other.big_to_ev_ratio
    }

    /// Input-layer bounds check. The engine itself never clamps.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_rate("inflationRate", self.inflation_rate, 0.0, 20.0)?;
        check_rate("tariffRate", self.tariff_rate, 0.0, 50.0)?;
        check_rate("smallToEvRatio", self.small_to_ev_ratio, 0.0, 100.0)?;
        check_rate("bigToEvRatio", self.big_to_ev_ratio, 0.0, 100.0)?;
        Ok(())
    }
}

fn check_rate(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite(field));
    }
    if value < min || value > max {
        return Err(ValidationError::RateOutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Append-only snapshot of cost parameters, stamped once if reverted to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostParameterHistory {
    pub id: String,
    pub parameters: CostParameters,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverted_at: Option<DateTime<Utc>>,
}

impl CostParameterHistory {
    /// Snapshot `parameters` as a new history entry attributed to `updated_by`.
    pub fn snapshot(parameters: &CostParameters, updated_by: &str) -> Self {
        let updated_at = Utc::now();
        let mut parameters = parameters.clone();
        parameters.updated_by = Some(updated_by.to_string());
        parameters.updated_at = Some(updated_at);
        Self {
            id: generate_id(),
            parameters,
            updated_by: updated_by.to_string(),
            updated_at,
            reverted_at: None,
        }
    }
}

/// Whether a category describes road vehicles or other equipment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Vehicle,
    Equipment,
}

/// A named vehicle/equipment class with its expected service life.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentCategory {
    pub id: String,
    /// Unique by convention only.
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    /// Expected service life in years (> 0).
    pub default_lifespan: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EquipmentCategory {
    pub fn new(
        name: impl Into<String>,
        category_type: CategoryType,
        default_lifespan: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            name: name.into(),
            category_type,
            default_lifespan,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.default_lifespan == 0 {
            return Err(ValidationError::NonPositiveLifespan);
        }
        Ok(())
    }
}

/// Observed acquisition price for a category in a given year.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePriceHistory {
    pub id: String,
    /// Free-text match against `EquipmentCategory::name`.
    pub category: String,
    pub year: i32,
    pub base_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev_price: Option<Decimal>,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VehiclePriceHistory {
    pub fn new(
        category: impl Into<String>,
        year: i32,
        base_price: Decimal,
        ev_price: Option<Decimal>,
        source: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            category: category.into(),
            year,
            base_price,
            ev_price,
            source: source.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1900..=2100).contains(&self.year) {
            return Err(ValidationError::YearOutOfRange(self.year));
        }
        if self.base_price < Decimal::ZERO || self.ev_price.is_some_and(|p| p < Decimal::ZERO) {
            return Err(ValidationError::NegativeMoney);
        }
        Ok(())
    }
}

/// EV transition percentages per vehicle class.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvTransitionRates {
    pub small_vehicles: f64,
    pub large_vehicles: f64,
}

/// Inputs of a named forecast scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioParameters {
    pub start_year: i32,
    pub end_year: i32,
    pub inflation_rate: f64,
    pub tariff_rate: f64,
    pub ev_transition_rates: EvTransitionRates,
}

impl ScenarioParameters {
    /// Number of forecast years covered, inclusive of both ends.
    pub fn horizon(&self) -> i32 {
        self.end_year - self.start_year + 1
    }

    /// Map scenario inputs onto engine parameters.
    pub fn to_cost_parameters(&self) -> CostParameters {
        CostParameters::with_rates(
            self.inflation_rate,
            self.tariff_rate,
            self.ev_transition_rates.small_vehicles,
            self.ev_transition_rates.large_vehicles,
        )
    }

    /// Seed scenario inputs from the current cost parameters.
    pub fn from_cost_parameters(params: &CostParameters, start_year: i32, end_year: i32) -> Self {
        Self {
            start_year,
            end_year,
            inflation_rate: params.inflation_rate,
            tariff_rate: params.tariff_rate,
            ev_transition_rates: EvTransitionRates {
                small_vehicles: params.small_to_ev_ratio,
                large_vehicles: params.big_to_ev_ratio,
            },
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.end_year < self.start_year {
            return Err(ValidationError::InvertedYearRange {
                start: self.start_year,
                end: self.end_year,
            });
        }
        self.to_cost_parameters().validate()
    }
}

/// Spending per vehicle class in one forecast year.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub small: f64,
    pub large: f64,
    pub ev: f64,
}

/// One year of a scenario forecast.
///
/// Vehicle counts are whole numbers kept as `f64` so that malformed rates
/// surface as NaN instead of being truncated to zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyForecast {
    pub year: i32,
    pub total_spending: f64,
    pub ev_spending: f64,
    pub small_vehicles: f64,
    pub large_vehicles: f64,
    pub ev_vehicles: f64,
    pub category_breakdown: CategoryBreakdown,
}

/// Flat-fraction attribution of total cost to its drivers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostDriverAnalysis {
    pub inflation: f64,
    pub tariffs: f64,
    pub ev_premium: f64,
}

/// Derived results attached to a scenario; fully recomputable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResults {
    /// Always the sum of `yearly_breakdown[*].total_spending`.
    pub total_cost: f64,
    pub ev_transition_impact: f64,
    pub yearly_breakdown: Vec<YearlyForecast>,
    pub cost_driver_analysis: CostDriverAnalysis,
    pub generated_at: DateTime<Utc>,
}

/// A named, persisted set of forecast inputs plus its last results.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastScenario {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub parameters: ScenarioParameters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<ForecastResults>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ForecastScenario {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ScenarioParameters,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            name: name.into(),
            description: description.into(),
            parameters,
            results: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        self.parameters.validate()
    }
}

/// Creation time stamped on built-in records (2024-01-01T00:00:00Z).
fn seed_timestamp() -> DateTime<Utc> {
    DateTime::from_timestamp(1_704_067_200, 0).unwrap_or_default()
}

/// Stable id of a built-in record, e.g. `seed-small-vehicle`.
fn seed_id(name: &str) -> String {
    format!("seed-{}", name.to_lowercase().replace(' ', "-"))
}

/// Built-in reference categories used until the user saves their own.
///
/// Ids and timestamps are fixed, so every call returns identical records.
pub fn default_categories() -> Vec<EquipmentCategory> {
    [
        ("Small Vehicle", CategoryType::Vehicle, 8),
        ("Large Vehicle", CategoryType::Vehicle, 10),
        ("Electric Vehicle", CategoryType::Vehicle, 8),
        ("Heavy Equipment", CategoryType::Equipment, 15),
    ]
    .into_iter()
    .map(|(name, category_type, default_lifespan)| EquipmentCategory {
        id: seed_id(name),
        name: name.to_string(),
        category_type,
        default_lifespan,
        created_at: seed_timestamp(),
        updated_at: seed_timestamp(),
    })
    .collect()
}

/// Built-in price history matching `default_categories`.
pub fn default_price_history() -> Vec<VehiclePriceHistory> {
    let rows: [(&str, i32, i64, Option<i64>); 9] = [
        ("Small Vehicle", 2021, 31_000, Some(42_000)),
        ("Small Vehicle", 2022, 32_500, Some(43_000)),
        ("Small Vehicle", 2023, 34_000, Some(44_000)),
        ("Small Vehicle", 2024, 35_000, Some(45_000)),
        ("Large Vehicle", 2021, 68_000, Some(95_000)),
        ("Large Vehicle", 2022, 70_500, Some(93_000)),
        ("Large Vehicle", 2024, 75_000, Some(90_000)),
        ("Heavy Equipment", 2022, 180_000, None),
        ("Heavy Equipment", 2024, 182_000, None),
    ];
    rows.into_iter()
        .map(|(category, year, base, ev)| VehiclePriceHistory {
            id: format!("{}-{year}", seed_id(category)),
            category: category.to_string(),
            year,
            base_price: Decimal::new(base, 0),
            ev_price: ev.map(|p| Decimal::new(p, 0)),
            source: "sample".to_string(),
            created_at: seed_timestamp(),
            updated_at: seed_timestamp(),
        })
        .collect()
}

/// Validation errors for input-layer invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A rate is outside the accepted input range.
    #[error("{field} = {value} is out of range [{min}, {max}]")]
    RateOutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// Numeric field must be finite.
    #[error("non-finite value for {0}")]
    NonFinite(&'static str),
    /// Names must contain non-whitespace characters.
    #[error("name must not be empty")]
    EmptyName,
    /// Lifespan must be at least one year.
    #[error("default lifespan must be > 0")]
    NonPositiveLifespan,
    /// Year outside supported range [1900, 2100].
    #[error("year {0} is out of supported range [1900, 2100]")]
    YearOutOfRange(i32),
    /// Price must be non-negative.
    #[error("negative monetary value is invalid")]
    NegativeMoney,
    /// Scenario end year precedes its start year.
    #[error("end year {end} precedes start year {start}")]
    InvertedYearRange { start: i32, end: i32 },
}
