#![deny(warnings)]

//! Economic models for fleetcast.
//!
//! This crate provides the pure computations behind the dashboard:
//! - The multi-year fleet spending forecast
//! - Scenario results and cost-driver attribution
//! - Price trends and replacement recommendations from price history

pub mod forecast;
pub mod scenario;
pub mod trends;

pub use forecast::{forecast, YearForecast};
pub use scenario::{compute_results, EV_PREMIUM_SHARE, EV_TRANSITION_SHARE};
pub use trends::{
    calculate_price_trend, project_price, recommend_replacement, PriceTrend, Recommendation,
    TrendDirection,
};
