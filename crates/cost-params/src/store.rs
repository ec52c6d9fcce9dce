//! The parameter store contract over a settings backend.

use fleet_core::{CostParameterHistory, CostParameters};
use tracing::warn;

use crate::backend::{ParamsError, SettingsBackend};

/// Reads never fail: any backend error yields the default parameters.
/// Writes validate first and surface every error.
#[derive(Clone, Debug)]
pub struct ParameterStore<B> {
    backend: B,
    updated_by: String,
}

impl<B: SettingsBackend> ParameterStore<B> {
    pub fn new(backend: B, updated_by: impl Into<String>) -> Self {
        Self {
            backend,
            updated_by: updated_by.into(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn get_current(&self) -> CostParameters {
        match self.backend.fetch_current().await {
            Ok(params) => params,
            Err(err) => {
                warn!(error = %err, "cost parameters unavailable, using defaults");
                CostParameters::default()
            }
        }
    }

    pub async fn update(&self, params: &CostParameters) -> Result<CostParameters, ParamsError> {
        params.validate()?;
        self.backend.put_current(params, &self.updated_by).await
    }

    pub async fn get_history(&self) -> Result<Vec<CostParameterHistory>, ParamsError> {
        self.backend.fetch_history().await
    }

    pub async fn revert(&self, history_id: &str) -> Result<CostParameters, ParamsError> {
        self.backend.post_revert(history_id).await
    }
}
