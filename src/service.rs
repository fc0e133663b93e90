//! Uniform request protocol for the city-keyed indicator endpoints
//!
//! Every category goes through the same three steps: resolve the city,
//! fetch the bundle through the fallback chain, shape the response. Adding a
//! category only means adding a variant, never another copy of this flow.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, instrument};

use crate::aggregator::{self, CategoryResponse};
use crate::cities::CityResolver;
use crate::config::UrbanSimConfig;
use crate::provider::{
    DataProvider, FallbackChain, IndicatorCategory, OpenMeteoProvider, ProviderError,
    StaticFallbackProvider,
};
use crate::{Result, UrbanSimError};

pub struct IndicatorService {
    resolver: CityResolver,
    chain: FallbackChain,
}

impl IndicatorService {
    pub fn new(resolver: CityResolver, chain: FallbackChain) -> Self {
        Self { resolver, chain }
    }

    /// Wire the resolver and provider chain described by `config`.
    ///
    /// Fails when a configured city has no fallback data, since such a city
    /// could be resolved but never served.
    pub fn from_config(config: &UrbanSimConfig) -> anyhow::Result<Self> {
        let resolver = CityResolver::from_config(&config.cities)?;

        let fallback = match &config.fallback.dataset_path {
            Some(path) => StaticFallbackProvider::from_path(path)?,
            None => StaticFallbackProvider::embedded()?,
        };
        for city in resolver.cities() {
            if !fallback.covers(&city.key) {
                return Err(UrbanSimError::config(format!(
                    "City '{}' has no fallback dataset",
                    city.key
                ))
                .into());
            }
        }

        let live: Option<Arc<dyn DataProvider>> = if config.live_data.enabled {
            let provider = OpenMeteoProvider::new(&config.live_data)
                .context("Failed to initialize the live data provider")?;
            info!("Live data enabled (Open-Meteo)");
            Some(Arc::new(provider))
        } else {
            info!("Live data disabled, serving the fallback dataset");
            None
        };

        let chain = FallbackChain::new(
            live,
            Arc::new(fallback),
            Duration::from_secs(u64::from(config.live_data.timeout_seconds)),
        );
        Ok(Self::new(resolver, chain))
    }

    pub fn resolver(&self) -> &CityResolver {
        &self.resolver
    }

    /// Resolve `city_input` and build the `category` response for it
    #[instrument(skip(self))]
    pub async fn build(
        &self,
        city_input: &str,
        category: IndicatorCategory,
    ) -> Result<CategoryResponse> {
        let city = self.resolver.resolve(city_input)?;

        let fetched = self
            .chain
            .fetch(category, city)
            .await
            .map_err(|e| match e {
                ProviderError::Unavailable(_) => {
                    UrbanSimError::not_servable(city_input, self.resolver.supported_names())
                }
                other => UrbanSimError::internal(other.to_string()),
            })?;

        aggregator::build(city, category, fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CityConfig;

    fn service() -> IndicatorService {
        IndicatorService::from_config(&UrbanSimConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_every_category_served_for_brasilia() {
        let service = service();
        for category in IndicatorCategory::ALL {
            let response = service.build("Brasília", category).await.unwrap();
            let value = serde_json::to_value(response).unwrap();
            assert_eq!(value["cidade"], "Brasília", "{category}");
        }
    }

    #[tokio::test]
    async fn test_every_category_rejects_unknown_city() {
        let service = service();
        for category in IndicatorCategory::ALL {
            let result = service.build("saopaulo", category).await;
            assert!(
                matches!(result, Err(UrbanSimError::NotServable { .. })),
                "{category}"
            );
        }
    }

    #[tokio::test]
    async fn test_aliases_give_identical_payloads() {
        let service = service();
        let a = service
            .build("brasilia", IndicatorCategory::Climate)
            .await
            .unwrap();
        let b = service
            .build("BRASÍLIA", IndicatorCategory::Climate)
            .await
            .unwrap();
        assert_eq!(
            serde_json::to_value(a).unwrap(),
            serde_json::to_value(b).unwrap()
        );
    }

    #[test]
    fn test_city_without_fallback_data_rejected() {
        let mut config = UrbanSimConfig::default();
        config.cities.insert(
            "goiania".to_string(),
            CityConfig {
                display_name: "Goiânia".to_string(),
                country_code: "BR".to_string(),
                latitude: -16.6869,
                longitude: -49.2648,
                aliases: vec![],
            },
        );
        let err = IndicatorService::from_config(&config).err().unwrap();
        assert!(err.to_string().contains("no fallback dataset"));
    }
}
