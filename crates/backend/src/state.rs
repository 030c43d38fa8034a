use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

use crate::dashboards::d402_realtime_sales::repository::SalesRepository;
use crate::dashboards::d402_realtime_sales::RealtimeSalesService;
use crate::shared::config::{resolve_path, Config};
use crate::shared::geo_lookup::GeoLookup;
use crate::shared::warehouse::bigquery::BigQueryClient;
use crate::shared::warehouse::WarehouseClient;
use crate::system::auth::PasswordGate;

/// Everything a request handler may touch, shared through axum `State`
#[derive(Clone)]
pub struct AppState {
    pub realtime_sales: Arc<RealtimeSalesService>,
    pub auth: Arc<PasswordGate>,
}

impl AppState {
    /// Build the application state against the configured warehouse
    ///
    /// A missing geo lookup file, an unusable warehouse configuration or a
    /// missing password are startup errors.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let client = BigQueryClient::from_config(&config.warehouse)
            .context("Cannot create warehouse client")?;
        Self::with_client(config, Arc::new(client))
    }

    /// Same as `from_config` with an explicit warehouse client
    pub fn with_client(config: Config, client: Arc<dyn WarehouseClient>) -> anyhow::Result<Self> {
        let geo_path = resolve_path(&config.dashboard.geo_lookup_path);
        let geo = GeoLookup::load(&geo_path)?;
        Self::assemble(config, client, geo)
    }

    pub(crate) fn assemble(
        config: Config,
        client: Arc<dyn WarehouseClient>,
        geo: GeoLookup,
    ) -> anyhow::Result<Self> {
        let auth = PasswordGate::from_config(&config.auth)?;

        let repository = SalesRepository::new(
            client,
            config.warehouse.project_id.clone(),
            config.warehouse.storefronts.clone(),
            config.dashboard.hour_bucketing,
            Duration::from_secs(config.dashboard.cache_ttl_secs),
        );
        let realtime_sales = RealtimeSalesService::new(
            repository,
            Arc::new(geo),
            config.dashboard.top_products_limit,
        );

        tracing::info!(
            "D402: {} storefronts in project {}, cache TTL {}s, {:?} hour buckets",
            config.warehouse.storefronts.len(),
            config.warehouse.project_id,
            config.dashboard.cache_ttl_secs,
            config.dashboard.hour_bucketing
        );

        Ok(Self {
            realtime_sales: Arc::new(realtime_sales),
            auth: Arc::new(auth),
        })
    }
}
