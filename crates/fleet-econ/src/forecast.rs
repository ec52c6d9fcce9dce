//! Multi-year fleet spending forecast.
//!
//! The engine is a pure function of cost parameters, a start year and a
//! horizon. Fleet size follows a fixed growth assumption; a share of each
//! vehicle class converts to EVs; unit costs carry a flat tariff and
//! inflation compounding from the start year.
//!
//! No clamping or NaN guard is applied here. Bounds are enforced at the
//! input layer (`CostParameters::validate`).

use fleet_core::{CategoryBreakdown, CostParameters, YearlyForecast};
use serde::{Deserialize, Serialize};

/// Unit acquisition cost of a small vehicle before tariff and inflation.
pub const SMALL_UNIT_COST: f64 = 35_000.0;
/// Unit acquisition cost of a large vehicle before tariff and inflation.
pub const LARGE_UNIT_COST: f64 = 75_000.0;
/// Unit acquisition cost of an EV before tariff and inflation.
pub const EV_UNIT_COST: f64 = 45_000.0;

const SMALL_FLEET_BASE: f64 = 120.0;
const SMALL_FLEET_GROWTH: f64 = 5.0;
const LARGE_FLEET_BASE: f64 = 45.0;
const LARGE_FLEET_GROWTH: f64 = 2.0;

/// Projected purchases and spending for one year.
///
/// Monetary values are rounded to whole currency units. Counts are whole
/// numbers carried as `f64` so NaN inputs propagate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearForecast {
    pub year: i32,
    pub total_spending: f64,
    pub ev_spending: f64,
    pub small_spending: f64,
    pub large_spending: f64,
    /// Small vehicles remaining on combustion after EV conversion.
    pub small_vehicles: f64,
    /// Large vehicles remaining on combustion after EV conversion.
    pub large_vehicles: f64,
    pub ev_vehicles: f64,
}

impl YearForecast {
    /// Scenario-facing view of this year with its per-class breakdown.
    pub fn to_yearly(&self) -> YearlyForecast {
        YearlyForecast {
            year: self.year,
            total_spending: self.total_spending,
            ev_spending: self.ev_spending,
            small_vehicles: self.small_vehicles,
            large_vehicles: self.large_vehicles,
            ev_vehicles: self.ev_vehicles,
            category_breakdown: CategoryBreakdown {
                small: self.small_spending,
                large: self.large_spending,
                ev: self.ev_spending,
            },
        }
    }
}

/// Forecast `years` consecutive years starting at `start_year`.
///
/// A zero or negative horizon yields an empty series.
///
/// Example:
/// let p = CostParameters::with_rates(0.0, 0.0, 0.0, 0.0);
/// let f = forecast(&p, 2024, 1);
/// assert_eq!(f[0].total_spending, 7_575_000.0);
pub fn forecast(params: &CostParameters, start_year: i32, years: i32) -> Vec<YearForecast> {
    (0..years).map(|i| project_year(params, start_year, i)).collect()
}

fn project_year(params: &CostParameters, start_year: i32, index: i32) -> YearForecast {
    let i = f64::from(index);
    let small_base = SMALL_FLEET_BASE + SMALL_FLEET_GROWTH * i;
    let large_base = LARGE_FLEET_BASE + LARGE_FLEET_GROWTH * i;

    let ev_from_small = (small_base * params.small_to_ev_ratio / 100.0).floor();
    let ev_from_large = (large_base * params.big_to_ev_ratio / 100.0).floor();
    let small_vehicles = small_base - ev_from_small;
    let large_vehicles = large_base - ev_from_large;
    let ev_vehicles = ev_from_small + ev_from_large;

    // tariff is flat, inflation compounds from the start year
    let tariff_multiplier = 1.0 + params.tariff_rate / 100.0;
    let inflation_multiplier = (1.0 + params.inflation_rate / 100.0).powi(index);
    let adjust = |base: f64| base * tariff_multiplier * inflation_multiplier;

    let small_spending = small_vehicles * adjust(SMALL_UNIT_COST);
    let large_spending = large_vehicles * adjust(LARGE_UNIT_COST);
    let ev_spending = ev_vehicles * adjust(EV_UNIT_COST);

    YearForecast {
        year: start_year + index,
        total_spending: (small_spending + large_spending + ev_spending).round(),
        ev_spending: ev_spending.round(),
        small_spending: small_spending.round(),
        large_spending: large_spending.round(),
        small_vehicles,
        large_vehicles,
        ev_vehicles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn zero_rates() -> CostParameters {
        CostParameters::with_rates(0.0, 0.0, 0.0, 0.0)
    }

    #[test]
    fn baseline_year_without_rates() {
        let f = forecast(&zero_rates(), 2024, 1);
        assert_eq!(f.len(), 1);
        let y = &f[0];
        assert_eq!(y.year, 2024);
        assert_eq!(y.small_vehicles, 120.0);
        assert_eq!(y.large_vehicles, 45.0);
        assert_eq!(y.ev_vehicles, 0.0);
        assert_eq!(y.total_spending, 7_575_000.0);
        assert_eq!(y.ev_spending, 0.0);
    }

    #[test]
    fn non_positive_horizon_is_empty() {
        assert!(forecast(&zero_rates(), 2024, 0).is_empty());
        assert!(forecast(&zero_rates(), 2024, -3).is_empty());
    }

    #[test]
    fn ev_conversion_floors_each_class() {
        let p = CostParameters::with_rates(0.0, 0.0, 25.0, 15.0);
        let y = &forecast(&p, 2024, 1)[0];
        // 120 * 25% = 30, 45 * 15% = 6.75 -> 6
        assert_eq!(y.small_vehicles, 90.0);
        assert_eq!(y.large_vehicles, 39.0);
        assert_eq!(y.ev_vehicles, 36.0);
        assert_eq!(y.ev_spending, 1_620_000.0);
        assert_eq!(y.total_spending, 3_150_000.0 + 2_925_000.0 + 1_620_000.0);
    }

    #[test]
    fn inflation_compounds_from_start_year() {
        let p = CostParameters::with_rates(10.0, 0.0, 0.0, 0.0);
        let f = forecast(&p, 2024, 3);
        assert_eq!(f[0].total_spending, 7_575_000.0);
        // year 1: 125 small at 38,500 and 47 large at 82,500
        assert_eq!(f[1].total_spending, 4_812_500.0 + 3_877_500.0);
        // year 2: 130 small at 42,350 and 49 large at 90,750
        assert_eq!(f[2].total_spending, 5_505_500.0 + 4_446_750.0);
    }

    #[test]
    fn tariff_is_flat_across_years() {
        let p = CostParameters::with_rates(0.0, 10.0, 0.0, 0.0);
        let f = forecast(&p, 2030, 2);
        assert_eq!(f[0].total_spending, 8_332_500.0);
        assert_eq!(f[1].year, 2031);
        // growth only comes from fleet size: 125*38,500 + 47*82,500
        assert_eq!(f[1].total_spending, 8_690_000.0);
    }

    #[test]
    fn nan_rates_propagate() {
        let p = CostParameters::with_rates(f64::NAN, 0.0, 0.0, 0.0);
        let f = forecast(&p, 2024, 2);
        // (1 + NaN)^0 is 1, so only the compounding years are affected
        assert!(!f[0].total_spending.is_nan());
        assert!(f[1].total_spending.is_nan());

        let p = CostParameters::with_rates(0.0, 0.0, f64::NAN, 0.0);
        let y = &forecast(&p, 2024, 1)[0];
        assert!(y.ev_vehicles.is_nan());
        assert!(y.total_spending.is_nan());
    }

    #[test]
    fn yearly_view_carries_breakdown() {
        let p = CostParameters::with_rates(0.0, 0.0, 25.0, 15.0);
        let y = forecast(&p, 2024, 1)[0].to_yearly();
        assert_eq!(y.category_breakdown.small, 3_150_000.0);
        assert_eq!(y.category_breakdown.large, 2_925_000.0);
        assert_eq!(y.category_breakdown.ev, 1_620_000.0);
    }

    proptest! {
        #[test]
        fn fleet_size_is_conserved(
            small in 0.0f64..=100.0,
            big in 0.0f64..=100.0,
            years in 1i32..15,
        ) {
            let p = CostParameters::with_rates(3.0, 2.0, small, big);
            for (i, y) in forecast(&p, 2024, years).iter().enumerate() {
                let i = i as f64;
                let fleet = (120.0 + 5.0 * i) + (45.0 + 2.0 * i);
                prop_assert_eq!(y.small_vehicles + y.large_vehicles + y.ev_vehicles, fleet);
            }
        }

        #[test]
        fn spending_monotonic_in_inflation(infl in 0.0f64..19.0, years in 2i32..10) {
            let lo = CostParameters::with_rates(infl, 2.5, 25.0, 15.0);
            let hi = CostParameters::with_rates(infl + 1.0, 2.5, 25.0, 15.0);
            let a = forecast(&lo, 2024, years);
            let b = forecast(&hi, 2024, years);
            let last = (years - 1) as usize;
            prop_assert!(b[last].total_spending > a[last].total_spending);
        }
    }
}
