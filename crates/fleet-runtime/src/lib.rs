#![deny(warnings)]

//! Application services for fleetcast: configuration, scenario management,
//! scenario comparison and the wiring that hands stores to each service.

pub mod comparison;
pub mod config;
pub mod context;
pub mod scenarios;

pub use comparison::{
    build_comparison, ComparisonRow, ComparisonSelection, ComparisonTable, SelectionError,
    MAX_COMPARED,
};
pub use config::{ConfigError, FleetConfig, CONFIG_ENV, DEFAULT_CONFIG_PATH, TOKEN_ENV};
pub use context::{AppContext, ContextError};
pub use scenarios::{ScenarioError, ScenarioService};
