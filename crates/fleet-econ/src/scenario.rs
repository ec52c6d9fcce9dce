//! Scenario results built on the forecast engine.

use chrono::Utc;
use fleet_core::{CostDriverAnalysis, ForecastResults, ScenarioParameters, YearlyForecast};
use tracing::debug;

use crate::forecast::forecast;

/// Share of total cost attributed to the EV transition.
pub const EV_TRANSITION_SHARE: f64 = 0.15;
/// Share of total cost attributed to the EV price premium.
pub const EV_PREMIUM_SHARE: f64 = 0.12;

/// Run the engine over `start_year..=end_year` and derive the scenario totals.
///
/// An inverted year range produces an empty breakdown and zero totals.
pub fn compute_results(parameters: &ScenarioParameters) -> ForecastResults {
    let cost = parameters.to_cost_parameters();
    let yearly_breakdown: Vec<YearlyForecast> =
        forecast(&cost, parameters.start_year, parameters.horizon())
            .iter()
            .map(|y| y.to_yearly())
            .collect();
    let total_cost: f64 = yearly_breakdown.iter().map(|y| y.total_spending).sum();
    debug!(
        start = parameters.start_year,
        end = parameters.end_year,
        total_cost,
        "computed scenario results"
    );
    ForecastResults {
        total_cost,
        ev_transition_impact: total_cost * EV_TRANSITION_SHARE,
        yearly_breakdown,
        cost_driver_analysis: CostDriverAnalysis {
            inflation: total_cost * parameters.inflation_rate / 100.0,
            tariffs: total_cost * parameters.tariff_rate / 100.0,
            ev_premium: total_cost * EV_PREMIUM_SHARE,
        },
        generated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::EvTransitionRates;
    use proptest::prelude::*;

    fn params(start: i32, end: i32) -> ScenarioParameters {
        ScenarioParameters {
            start_year: start,
            end_year: end,
            inflation_rate: 4.0,
            tariff_rate: 5.0,
            ev_transition_rates: EvTransitionRates {
                small_vehicles: 20.0,
                large_vehicles: 10.0,
            },
        }
    }

    #[test]
    fn covers_inclusive_year_range() {
        let r = compute_results(&params(2025, 2029));
        let years: Vec<i32> = r.yearly_breakdown.iter().map(|y| y.year).collect();
        assert_eq!(years, vec![2025, 2026, 2027, 2028, 2029]);
    }

    #[test]
    fn large_vehicle_ratio_is_honoured() {
        let mut p = params(2025, 2025);
        p.ev_transition_rates.small_vehicles = 0.0;
        let r = compute_results(&p);
        // 45 large vehicles at 10% -> 4 EVs
        assert_eq!(r.yearly_breakdown[0].ev_vehicles, 4.0);
    }

    #[test]
    fn drivers_are_flat_fractions_of_total() {
        let r = compute_results(&params(2025, 2027));
        let t = r.total_cost;
        assert_eq!(r.ev_transition_impact, t * 0.15);
        assert_eq!(r.cost_driver_analysis.inflation, t * 4.0 / 100.0);
        assert_eq!(r.cost_driver_analysis.tariffs, t * 5.0 / 100.0);
        assert_eq!(r.cost_driver_analysis.ev_premium, t * 0.12);
    }

    #[test]
    fn inverted_range_is_empty() {
        let r = compute_results(&params(2030, 2025));
        assert!(r.yearly_breakdown.is_empty());
        assert_eq!(r.total_cost, 0.0);
    }

    proptest! {
        #[test]
        fn total_is_sum_of_years(start in 2000i32..2100, len in 0i32..25) {
            let r = compute_results(&params(start, start + len));
            let sum: f64 = r.yearly_breakdown.iter().map(|y| y.total_spending).sum();
            prop_assert_eq!(r.total_cost, sum);
            prop_assert_eq!(r.yearly_breakdown.len() as i32, len + 1);
        }
    }
}
