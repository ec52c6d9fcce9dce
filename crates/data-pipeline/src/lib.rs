#![deny(warnings)]

//! Data-entry boundary for fleetcast: vehicle record normalization, the
//! data-quality validator with its auto-fix pass, and CSV import/export.

pub mod cleaning;
pub mod csv_io;
pub mod record;

pub use cleaning::{
    auto_fix, auto_fix_as_of, quality_score, validate_records, validate_records_as_of,
    AutoFixOutcome, CleaningReport, CleaningResult, IssueField, Severity, ValidationIssue,
};
pub use csv_io::{
    export_csv, import_categories, import_price_history, import_rows, import_vehicles, CsvError,
};
pub use record::VehicleRecord;
