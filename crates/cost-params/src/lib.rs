#![deny(warnings)]

//! Cost parameter store: current economic inputs, their history and revert.
//!
//! Parameters live behind a [`SettingsBackend`]: the remote settings
//! endpoints when a base URL is configured, otherwise the local key/value
//! store. [`ParameterStore`] layers the read-fallback and input validation
//! contract on top of whichever backend is in use.

pub mod backend;
pub mod http;
pub mod local;
pub mod store;

pub use backend::{ParamsError, SettingsBackend, SettingsSource};
pub use http::HttpSettingsBackend;
pub use local::LocalSettingsBackend;
pub use store::ParameterStore;
