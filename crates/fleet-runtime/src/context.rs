//! Wires configuration and storage into the application services.

use cost_params::{
    HttpSettingsBackend, LocalSettingsBackend, ParameterStore, ParamsError, SettingsSource,
};
use fleet_econ::{calculate_price_trend, forecast, PriceTrend, YearForecast};
use persistence::{
    CategoryRepository, KeyValueStore, PriceHistoryRepository, SqliteStore, StoreError,
};
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, FleetConfig};
use crate::scenarios::ScenarioService;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Params(#[from] ParamsError),
}

/// Every service, sharing one store handle.
#[derive(Clone, Debug)]
pub struct AppContext<S> {
    pub config: FleetConfig,
    pub categories: CategoryRepository<S>,
    pub prices: PriceHistoryRepository<S>,
    pub scenarios: ScenarioService<S>,
    pub params: ParameterStore<SettingsSource<S>>,
}

impl AppContext<SqliteStore> {
    /// Open the configured database and build the services on it.
    pub async fn open(config: FleetConfig) -> Result<Self, ContextError> {
        config.validate()?;
        let store = SqliteStore::connect(&config.database_url).await?;
        Self::with_store(config, store)
    }
}

impl<S: KeyValueStore + Clone> AppContext<S> {
    pub fn with_store(config: FleetConfig, store: S) -> Result<Self, ContextError> {
        let source = match &config.settings_base_url {
            Some(base) => SettingsSource::Remote(HttpSettingsBackend::new(
                base,
                config.auth_token.clone(),
                config.request_timeout(),
            )?),
            None => SettingsSource::Local(LocalSettingsBackend::new(store.clone())),
        };
        info!(remote = config.settings_base_url.is_some(), "application context ready");
        Ok(Self {
            params: ParameterStore::new(source, config.updated_by.clone()),
            categories: CategoryRepository::new(store.clone()),
            prices: PriceHistoryRepository::new(store.clone()),
            scenarios: ScenarioService::new(store),
            config,
        })
    }

    /// Run the engine over the current cost parameters.
    pub async fn forecast(&self, start_year: i32, years: i32) -> Vec<YearForecast> {
        let params = self.params.get_current().await;
        forecast(&params, start_year, years)
    }

    pub async fn price_trend(&self, category: &str) -> PriceTrend {
        calculate_price_trend(&self.prices.list().await, category)
    }
}
