//! Cost parameters kept in the local key/value store.

use chrono::Utc;
use fleet_core::{CostParameterHistory, CostParameters};
use persistence::{keys, load_json, save_json, KeyValueStore};
use tracing::info;

use crate::backend::{ParamsError, SettingsBackend};

/// Current parameters under one key, the append-only history under another.
#[derive(Clone, Debug)]
pub struct LocalSettingsBackend<S> {
    store: S,
}

impl<S: KeyValueStore> LocalSettingsBackend<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    async fn history(&self) -> Result<Vec<CostParameterHistory>, ParamsError> {
        Ok(load_json(&self.store, keys::COST_PARAMETER_HISTORY)
            .await?
            .unwrap_or_default())
    }
}

impl<S: KeyValueStore> SettingsBackend for LocalSettingsBackend<S> {
    async fn fetch_current(&self) -> Result<CostParameters, ParamsError> {
        Ok(load_json(&self.store, keys::COST_PARAMETERS)
            .await?
            .unwrap_or_default())
    }

    async fn put_current(
        &self,
        params: &CostParameters,
        updated_by: &str,
    ) -> Result<CostParameters, ParamsError> {
        let entry = CostParameterHistory::snapshot(params, updated_by);
        let mut current = entry.parameters.clone();
        current.id = Some(entry.id.clone());

        let mut history = self.history().await?;
        history.push(entry);
        save_json(&self.store, keys::COST_PARAMETERS, &current).await?;
        save_json(&self.store, keys::COST_PARAMETER_HISTORY, &history).await?;
        info!(id = ?current.id, %updated_by, "cost parameters updated");
        Ok(current)
    }

    /// Newest first.
    async fn fetch_history(&self) -> Result<Vec<CostParameterHistory>, ParamsError> {
        let mut history = self.history().await?;
        history.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(history)
    }

    async fn post_revert(&self, history_id: &str) -> Result<CostParameters, ParamsError> {
        let mut history = self.history().await?;
        let now = Utc::now();
        let entry = history
            .iter_mut()
            .find(|h| h.id == history_id)
            .ok_or_else(|| ParamsError::HistoryNotFound(history_id.to_string()))?;
        entry.reverted_at = Some(now);

        let mut restored = entry.parameters.clone();
        restored.id = Some(entry.id.clone());
        restored.updated_at = Some(now);
        save_json(&self.store, keys::COST_PARAMETERS, &restored).await?;
        save_json(&self.store, keys::COST_PARAMETER_HISTORY, &history).await?;
        info!(history_id, "cost parameters reverted");
        Ok(restored)
    }
}
