//! Price trends and replacement advice from category price history.

use fleet_core::VehiclePriceHistory;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Annual growth above which prices count as rising (and below whose
/// negation they count as falling).
pub const TREND_THRESHOLD: f64 = 0.02;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

/// Direction and geometric annual growth rate (a fraction, 0.1 = 10%).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceTrend {
    pub trend: TrendDirection,
    pub rate: f64,
}

impl PriceTrend {
    pub const STABLE: PriceTrend = PriceTrend {
        trend: TrendDirection::Stable,
        rate: 0.0,
    };
}

fn entries_by_year<'a>(
    history: &'a [VehiclePriceHistory],
    category: &str,
) -> Vec<&'a VehiclePriceHistory> {
    let mut entries: Vec<&VehiclePriceHistory> =
        history.iter().filter(|p| p.category == category).collect();
    // stable: entries sharing a year keep their insertion order
    entries.sort_by_key(|p| p.year);
    entries
}

/// Geometric annual growth of base price between the earliest and latest
/// entries of `category`.
///
/// Fewer than two entries give `PriceTrend::STABLE`. When the earliest and
/// latest entries share a year the span is zero and the rate follows IEEE
/// `powf` semantics; callers must supply two distinct years for a
/// meaningful result.
///
/// Example:
/// 2023 at 100 and 2025 at 121 -> rate 0.10, increasing.
pub fn calculate_price_trend(history: &[VehiclePriceHistory], category: &str) -> PriceTrend {
    let entries = entries_by_year(history, category);
    let (first, last) = match (entries.first(), entries.last()) {
        (Some(first), Some(last)) if entries.len() >= 2 => (*first, *last),
        _ => return PriceTrend::STABLE,
    };
    let first_price = first.base_price.to_f64().unwrap_or(f64::NAN);
    let last_price = last.base_price.to_f64().unwrap_or(f64::NAN);
    let span = f64::from(last.year - first.year);
    let rate = (last_price / first_price).powf(1.0 / span) - 1.0;
    let trend = if rate > TREND_THRESHOLD {
        TrendDirection::Increasing
    } else if rate < -TREND_THRESHOLD {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };
    PriceTrend { trend, rate }
}

/// Extrapolate the latest base price of `category` to `target_year` using
/// its trend rate, rounded to cents.
///
/// Returns `None` when the category has no history or the projection is
/// not finite.
pub fn project_price(
    history: &[VehiclePriceHistory],
    category: &str,
    target_year: i32,
) -> Option<Decimal> {
    let entries = entries_by_year(history, category);
    let latest = entries.last()?;
    let trend = calculate_price_trend(history, category);
    let years_ahead = target_year - latest.year;
    let factor = (1.0 + trend.rate).powi(years_ahead);
    let projected = latest.base_price.to_f64()? * factor;
    if !projected.is_finite() {
        return None;
    }
    Decimal::from_f64(projected).map(|d| d.round_dp(2))
}

/// Replacement advice for a single vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Recommendation {
    /// The vehicle has reached its category lifespan.
    ReplaceNow,
    /// Replacement should be budgeted for the coming cycle.
    PlanAhead,
    Keep,
}

/// Advise on replacement from vehicle age, category lifespan and price trend.
///
/// Rising prices pull planning forward by one extra year.
pub fn recommend_replacement(
    age_years: i32,
    lifespan: u32,
    trend: TrendDirection,
) -> Recommendation {
    let lifespan = i64::from(lifespan);
    let remaining = lifespan - i64::from(age_years);
    let planning_window = if trend == TrendDirection::Increasing { 2 } else { 1 };
    if remaining <= 0 {
        Recommendation::ReplaceNow
    } else if remaining <= planning_window {
        Recommendation::PlanAhead
    } else {
        Recommendation::Keep
    }
}
