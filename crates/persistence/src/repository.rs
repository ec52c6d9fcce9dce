//! Typed collections of records persisted as one JSON array per key.

use std::marker::PhantomData;

use chrono::Utc;
use fleet_core::{
    default_categories, default_price_history, EquipmentCategory, ForecastScenario, ValidationError,
    VehiclePriceHistory,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{keys, load_json, save_json, KeyValueStore, StoreError};

/// A record that lives in a keyed JSON collection.
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Storage key of the collection.
    const KEY: &'static str;

    fn id(&self) -> &str;

    /// Stamp the modification time.
    fn touch(&mut self);

    fn validate(&self) -> Result<(), ValidationError>;

    /// Contents served while nothing has been saved under `KEY`.
    fn seed() -> Vec<Self> {
        Vec::new()
    }
}

impl Record for EquipmentCategory {
    const KEY: &'static str = keys::EQUIPMENT_CATEGORIES;

    fn id(&self) -> &str {
        &self.id
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn validate(&self) -> Result<(), ValidationError> {
        EquipmentCategory::validate(self)
    }

    fn seed() -> Vec<Self> {
        default_categories()
    }
}

impl Record for VehiclePriceHistory {
    const KEY: &'static str = keys::PRICE_HISTORY;

    fn id(&self) -> &str {
        &self.id
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn validate(&self) -> Result<(), ValidationError> {
        VehiclePriceHistory::validate(self)
    }

    fn seed() -> Vec<Self> {
        default_price_history()
    }
}

impl Record for ForecastScenario {
    const KEY: &'static str = keys::FORECAST_SCENARIOS;

    fn id(&self) -> &str {
        &self.id
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn validate(&self) -> Result<(), ValidationError> {
        ForecastScenario::validate(self)
    }
}

/// CRUD over one record collection in a key/value store.
///
/// Reads through `list` never fail: storage or decoding problems are logged
/// and an empty collection is returned. Every write propagates errors.
#[derive(Clone, Debug)]
pub struct Repository<T, S> {
    store: S,
    _record: PhantomData<fn() -> T>,
}

pub type CategoryRepository<S> = Repository<EquipmentCategory, S>;
pub type PriceHistoryRepository<S> = Repository<VehiclePriceHistory, S>;
pub type ScenarioRepository<S> = Repository<ForecastScenario, S>;

impl<T: Record, S: KeyValueStore> Repository<T, S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Strict load, errors propagated. The first load of an absent key
    /// stores the seed contents so their ids stay addressable.
    pub async fn load(&self) -> Result<Vec<T>, StoreError> {
        if let Some(records) = load_json(&self.store, T::KEY).await? {
            return Ok(records);
        }
        let seed = T::seed();
        if !seed.is_empty() {
            save_json(&self.store, T::KEY, &seed).await?;
            debug!(key = T::KEY, count = seed.len(), "stored seed collection");
        }
        Ok(seed)
    }

    pub async fn list(&self) -> Vec<T> {
        match self.load().await {
            Ok(records) => records,
            Err(e) => {
                warn!(key = T::KEY, error = %e, "failed to load records; using empty collection");
                Vec::new()
            }
        }
    }

    pub async fn get(&self, id: &str) -> Result<T, StoreError> {
        self.load()
            .await?
            .into_iter()
            .find(|r| r.id() == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Replace the whole collection.
    pub async fn save_all(&self, records: &[T]) -> Result<(), StoreError> {
        for r in records {
            r.validate()?;
        }
        save_json(&self.store, T::KEY, records).await?;
        debug!(key = T::KEY, count = records.len(), "saved collection");
        Ok(())
    }

    pub async fn add(&self, record: T) -> Result<T, StoreError> {
        record.validate()?;
        let mut records = self.load().await?;
        records.push(record.clone());
        save_json(&self.store, T::KEY, &records).await?;
        debug!(key = T::KEY, id = record.id(), "added record");
        Ok(record)
    }

    /// Replace the record with the same id, stamping its modification time.
    pub async fn update(&self, mut record: T) -> Result<T, StoreError> {
        record.validate()?;
        let mut records = self.load().await?;
        let slot = records
            .iter_mut()
            .find(|r| r.id() == record.id())
            .ok_or_else(|| StoreError::NotFound(record.id().to_string()))?;
        record.touch();
        *slot = record.clone();
        save_json(&self.store, T::KEY, &records).await?;
        Ok(record)
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut records = self.load().await?;
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        save_json(&self.store, T::KEY, &records).await?;
        debug!(key = T::KEY, id, "deleted record");
        Ok(())
    }
}

impl<S: KeyValueStore> Repository<VehiclePriceHistory, S> {
    /// Entries recorded for `category`, in stored order.
    pub async fn for_category(&self, category: &str) -> Vec<VehiclePriceHistory> {
        self.list()
            .await
            .into_iter()
            .filter(|p| p.category == category)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, SqliteStore};
    use fleet_core::CategoryType;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn categories_fall_back_to_samples() {
        let repo = CategoryRepository::new(MemoryStore::new());
        let names: Vec<String> = repo.list().await.into_iter().map(|c| c.name).collect();
        assert!(names.contains(&"Small Vehicle".to_string()));
    }

    #[tokio::test]
    async fn listed_sample_records_are_editable() {
        let store = MemoryStore::new();
        let repo = CategoryRepository::new(store.clone());
        let listed = repo.list().await;
        assert!(store.get(keys::EQUIPMENT_CATEGORIES).await.unwrap().is_some());

        let first = listed[0].clone();
        assert_eq!(repo.get(&first.id).await.unwrap().name, first.name);

        let mut edited = first.clone();
        edited.default_lifespan = 12;
        repo.update(edited).await.unwrap();
        assert_eq!(repo.get(&first.id).await.unwrap().default_lifespan, 12);

        repo.delete(&listed[1].id).await.unwrap();
        assert_eq!(repo.list().await.len(), listed.len() - 1);

        let prices = PriceHistoryRepository::new(store);
        let entry = prices.list().await[0].clone();
        prices.delete(&entry.id).await.unwrap();
        assert!(matches!(prices.get(&entry.id).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn read_failure_yields_empty_collection() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        let repo = CategoryRepository::new(store);
        assert!(repo.list().await.is_empty());
        assert!(repo.load().await.is_err());
    }

    #[tokio::test]
    async fn write_failure_propagates() {
        let store = MemoryStore::new();
        let repo = CategoryRepository::new(store.clone());
        store.set_unavailable(true);
        let res = repo
            .add(EquipmentCategory::new("Van", CategoryType::Vehicle, 7))
            .await;
        assert!(matches!(res, Err(StoreError::Unavailable)));
    }

    #[tokio::test]
    async fn crud_cycle() {
        let repo = CategoryRepository::new(MemoryStore::new());
        repo.save_all(&[]).await.unwrap();
        let van = repo
            .add(EquipmentCategory::new("Van", CategoryType::Vehicle, 7))
            .await
            .unwrap();
        assert_eq!(repo.list().await.len(), 1);

        let mut edited = van.clone();
        edited.default_lifespan = 9;
        let saved = repo.update(edited).await.unwrap();
        assert!(saved.updated_at >= van.updated_at);
        assert_eq!(repo.get(&van.id).await.unwrap().default_lifespan, 9);

        repo.delete(&van.id).await.unwrap();
        assert!(repo.list().await.is_empty());
        assert!(matches!(
            repo.delete(&van.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn invalid_records_are_rejected() {
        let repo = CategoryRepository::new(MemoryStore::new());
        let res = repo
            .add(EquipmentCategory::new("Van", CategoryType::Vehicle, 0))
            .await;
        assert!(matches!(
            res,
            Err(StoreError::Invalid(ValidationError::NonPositiveLifespan))
        ));
    }

    #[tokio::test]
    async fn update_of_unknown_record_is_not_found() {
        let repo = CategoryRepository::new(MemoryStore::new());
        let res = repo
            .update(EquipmentCategory::new("Ghost", CategoryType::Equipment, 3))
            .await;
        assert!(matches!(res, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn price_history_filters_by_category_on_sqlite() {
        let repo = PriceHistoryRepository::new(SqliteStore::in_memory().await.unwrap());
        repo.save_all(&[]).await.unwrap();
        repo.add(VehiclePriceHistory::new("Van", 2023, Decimal::new(40_000, 0), None, "dealer"))
            .await
            .unwrap();
        repo.add(VehiclePriceHistory::new("Truck", 2023, Decimal::new(90_000, 0), None, "dealer"))
            .await
            .unwrap();
        let vans = repo.for_category("Van").await;
        assert_eq!(vans.len(), 1);
        assert_eq!(vans[0].base_price, Decimal::new(40_000, 0));
    }

    #[tokio::test]
    async fn scenarios_start_empty() {
        let repo = ScenarioRepository::new(MemoryStore::new());
        assert!(repo.list().await.is_empty());
    }
}
