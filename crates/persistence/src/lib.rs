#![deny(warnings)]

//! Persistence layer: key/value JSON blobs and typed record collections.
//!
//! Every persisted collection is a single JSON document stored under a
//! fixed key. Writes are last-writer-wins; there is no versioning of the
//! documents themselves.

pub mod memory;
pub mod repository;
pub mod sqlite;

use fleet_core::ValidationError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub use memory::MemoryStore;
pub use repository::{
    CategoryRepository, PriceHistoryRepository, Record, Repository, ScenarioRepository,
};
pub use sqlite::{default_sqlite_url, init_db, SqliteStore};

/// Fixed storage keys.
pub mod keys {
    pub const EQUIPMENT_CATEGORIES: &str = "fleet.equipmentCategories";
    pub const PRICE_HISTORY: &str = "fleet.priceHistory";
    pub const FORECAST_SCENARIOS: &str = "fleet.forecastScenarios";
    pub const COST_PARAMETERS: &str = "fleet.costParameters";
    pub const COST_PARAMETER_HISTORY: &str = "fleet.costParameterHistory";
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("invalid record: {0}")]
    Invalid(#[from] ValidationError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage unavailable")]
    Unavailable,
}

/// String key/value storage of JSON documents.
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Read and decode the document under `key`; `None` when absent.
pub async fn load_json<S, T>(store: &S, key: &str) -> Result<Option<T>, StoreError>
where
    S: KeyValueStore,
    T: DeserializeOwned,
{
    match store.get(key).await? {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

/// Encode `value` and store it under `key`, replacing any previous document.
pub async fn save_json<S, T>(store: &S, key: &str, value: &T) -> Result<(), StoreError>
where
    S: KeyValueStore,
    T: Serialize + ?Sized,
{
    let text = serde_json::to_string(value)?;
    store.set(key, &text).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::CostParameters;

    #[tokio::test]
    async fn json_helpers_roundtrip() {
        let store = MemoryStore::new();
        let missing: Option<CostParameters> =
            load_json(&store, keys::COST_PARAMETERS).await.unwrap();
        assert!(missing.is_none());

        save_json(&store, keys::COST_PARAMETERS, &CostParameters::default())
            .await
            .unwrap();
        let back: Option<CostParameters> = load_json(&store, keys::COST_PARAMETERS).await.unwrap();
        assert_eq!(back, Some(CostParameters::default()));
    }

    #[tokio::test]
    async fn corrupt_documents_are_errors() {
        let store = MemoryStore::new();
        store.set(keys::COST_PARAMETERS, "{not json").await.unwrap();
        let res: Result<Option<CostParameters>, _> = load_json(&store, keys::COST_PARAMETERS).await;
        assert!(matches!(res, Err(StoreError::Serialization(_))));
    }
}
