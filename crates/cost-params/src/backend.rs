//! Backend contract for cost parameter storage.

use fleet_core::{CostParameterHistory, CostParameters, ValidationError};
use persistence::{KeyValueStore, StoreError};
use thiserror::Error;

use crate::http::HttpSettingsBackend;
use crate::local::LocalSettingsBackend;

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("settings service returned {status} for {url}")]
    Status { status: u16, url: String },
    #[error("invalid auth header: {0}")]
    InvalidHeader(String),
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    #[error("invalid parameters: {0}")]
    Invalid(#[from] ValidationError),
    #[error("history entry not found: {0}")]
    HistoryNotFound(String),
}

/// Where cost parameters are read from and written to.
#[allow(async_fn_in_trait)]
pub trait SettingsBackend {
    async fn fetch_current(&self) -> Result<CostParameters, ParamsError>;

    /// Replace all four rates; returns the stored parameters.
    async fn put_current(
        &self,
        params: &CostParameters,
        updated_by: &str,
    ) -> Result<CostParameters, ParamsError>;

    async fn fetch_history(&self) -> Result<Vec<CostParameterHistory>, ParamsError>;

    /// Restore the snapshot `history_id`; returns the restored parameters.
    async fn post_revert(&self, history_id: &str) -> Result<CostParameters, ParamsError>;
}

/// Backend chosen at startup from configuration.
#[derive(Clone, Debug)]
pub enum SettingsSource<S> {
    Remote(HttpSettingsBackend),
    Local(LocalSettingsBackend<S>),
}

impl<S: KeyValueStore> SettingsBackend for SettingsSource<S> {
    async fn fetch_current(&self) -> Result<CostParameters, ParamsError> {
        match self {
            SettingsSource::Remote(b) => b.fetch_current().await,
            SettingsSource::Local(b) => b.fetch_current().await,
        }
    }

    async fn put_current(
        &self,
        params: &CostParameters,
        updated_by: &str,
    ) -> Result<CostParameters, ParamsError> {
        match self {
            SettingsSource::Remote(b) => b.put_current(params, updated_by).await,
            SettingsSource::Local(b) => b.put_current(params, updated_by).await,
        }
    }

    async fn fetch_history(&self) -> Result<Vec<CostParameterHistory>, ParamsError> {
        match self {
            SettingsSource::Remote(b) => b.fetch_history().await,
            SettingsSource::Local(b) => b.fetch_history().await,
        }
    }

    async fn post_revert(&self, history_id: &str) -> Result<CostParameters, ParamsError> {
        match self {
            SettingsSource::Remote(b) => b.post_revert(history_id).await,
            SettingsSource::Local(b) => b.post_revert(history_id).await,
        }
    }
}
