//! Saved forecast scenarios and their runs.

use chrono::Utc;
use fleet_core::{generate_id, ForecastScenario, ScenarioParameters};
use fleet_econ::compute_results;
use persistence::{KeyValueStore, ScenarioRepository, StoreError};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ScenarioError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => ScenarioError::NotFound(id),
            other => ScenarioError::Store(other),
        }
    }
}

/// Scenario CRUD plus forecast runs, over any key/value store.
#[derive(Clone, Debug)]
pub struct ScenarioService<S> {
    repo: ScenarioRepository<S>,
}

impl<S: KeyValueStore> ScenarioService<S> {
    pub fn new(store: S) -> Self {
        Self {
            repo: ScenarioRepository::new(store),
        }
    }

    /// All saved scenarios; empty when storage cannot be read.
    pub async fn list(&self) -> Vec<ForecastScenario> {
        self.repo.list().await
    }

    pub async fn get(&self, id: &str) -> Result<ForecastScenario, ScenarioError> {
        Ok(self.repo.get(id).await?)
    }

    pub async fn create(
        &self,
        name: &str,
        description: &str,
        parameters: ScenarioParameters,
    ) -> Result<ForecastScenario, ScenarioError> {
        let scenario = self
            .repo
            .add(ForecastScenario::new(name, description, parameters))
            .await?;
        info!(id = %scenario.id, name = %scenario.name, "scenario created");
        Ok(scenario)
    }

    pub async fn update(
        &self,
        scenario: ForecastScenario,
    ) -> Result<ForecastScenario, ScenarioError> {
        Ok(self.repo.update(scenario).await?)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ScenarioError> {
        self.repo.delete(id).await?;
        info!(id, "scenario deleted");
        Ok(())
    }

    /// Copy `id` under a fresh id as "<name> (Copy)", without results.
    pub async fn duplicate(&self, id: &str) -> Result<ForecastScenario, ScenarioError> {
        let source = self.repo.get(id).await?;
        let now = Utc::now();
        let copy = ForecastScenario {
            id: generate_id(),
            name: format!("{} (Copy)", source.name),
            results: None,
            created_at: now,
            updated_at: now,
            ..source
        };
        Ok(self.repo.add(copy).await?)
    }

    /// Compute results for `id`, replacing any previous run, and persist them.
    pub async fn run_forecast(&self, id: &str) -> Result<ForecastScenario, ScenarioError> {
        let mut scenario = self.repo.get(id).await?;
        let results = compute_results(&scenario.parameters);
        info!(id, total_cost = results.total_cost, "scenario forecast run");
        scenario.results = Some(results);
        Ok(self.repo.update(scenario).await?)
    }
}
