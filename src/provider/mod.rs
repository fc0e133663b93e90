//! Indicator data providers
//!
//! This module provides the seam between the API and its data sources:
//! - `DataProvider`: the interface every source implements
//! - `StaticFallbackProvider`: hand-curated bundles embedded in the binary
//! - `OpenMeteoProvider`: live weather and air quality from Open-Meteo
//! - `FallbackChain`: the policy that prefers live data when enabled and
//!   silently degrades to the static bundles otherwise

pub mod error;
pub mod fallback;
pub mod open_meteo;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::cities::City;
use crate::models::{
    ClimateSnapshot, FeedbackBundle, GreenResourcesBundle, HeatIslandBundle, MonitoringStation,
    PollutantReading, SanitationEnergyBundle, TrafficBundle, UrbanIndicators,
};

pub use error::{ProviderError, Result};
pub use fallback::{CityDataset, StaticFallbackProvider};
pub use open_meteo::OpenMeteoProvider;

/// City-keyed indicator categories served by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorCategory {
    Climate,
    Pollution,
    Stations,
    UrbanIndicators,
    Traffic,
    HeatIslands,
    GreenResources,
    SanitationEnergy,
    Feedback,
}

impl IndicatorCategory {
    pub const ALL: [IndicatorCategory; 9] = [
        IndicatorCategory::Climate,
        IndicatorCategory::Pollution,
        IndicatorCategory::Stations,
        IndicatorCategory::UrbanIndicators,
        IndicatorCategory::Traffic,
        IndicatorCategory::HeatIslands,
        IndicatorCategory::GreenResources,
        IndicatorCategory::SanitationEnergy,
        IndicatorCategory::Feedback,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorCategory::Climate => "clima",
            IndicatorCategory::Pollution => "poluicao",
            IndicatorCategory::Stations => "estacoes",
            IndicatorCategory::UrbanIndicators => "indicadores",
            IndicatorCategory::Traffic => "transito",
            IndicatorCategory::HeatIslands => "temperatura",
            IndicatorCategory::GreenResources => "recursos-naturais",
            IndicatorCategory::SanitationEnergy => "saneamento-energia",
            IndicatorCategory::Feedback => "feedback-populacao",
        }
    }
}

impl fmt::Display for IndicatorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category-specific payload returned by a provider
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorBundle {
    Climate(ClimateSnapshot),
    Pollution(Vec<PollutantReading>),
    Stations(Vec<MonitoringStation>),
    UrbanIndicators(UrbanIndicators),
    Traffic(TrafficBundle),
    HeatIslands(HeatIslandBundle),
    GreenResources(GreenResourcesBundle),
    SanitationEnergy(SanitationEnergyBundle),
    Feedback(FeedbackBundle),
}

impl IndicatorBundle {
    #[must_use]
    pub fn category(&self) -> IndicatorCategory {
        match self {
            IndicatorBundle::Climate(_) => IndicatorCategory::Climate,
            IndicatorBundle::Pollution(_) => IndicatorCategory::Pollution,
            IndicatorBundle::Stations(_) => IndicatorCategory::Stations,
            IndicatorBundle::UrbanIndicators(_) => IndicatorCategory::UrbanIndicators,
            IndicatorBundle::Traffic(_) => IndicatorCategory::Traffic,
            IndicatorBundle::HeatIslands(_) => IndicatorCategory::HeatIslands,
            IndicatorBundle::GreenResources(_) => IndicatorCategory::GreenResources,
            IndicatorBundle::SanitationEnergy(_) => IndicatorCategory::SanitationEnergy,
            IndicatorBundle::Feedback(_) => IndicatorCategory::Feedback,
        }
    }
}

/// Where a bundle came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataSource {
    #[serde(rename = "fallback")]
    Fallback,
    #[serde(rename = "open-meteo")]
    OpenMeteo,
}

/// A bundle tagged with its source
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedBundle {
    pub bundle: IndicatorBundle,
    pub source: DataSource,
}

/// A source of indicator bundles
#[async_trait]
pub trait DataProvider: Send + Sync {
    fn source(&self) -> DataSource;

    /// Whether this provider can serve `category` at all
    fn supports(&self, _category: IndicatorCategory) -> bool {
        true
    }

    async fn fetch(&self, category: IndicatorCategory, city: &City) -> Result<IndicatorBundle>;
}

/// Live-first provider chain that degrades to the static dataset.
///
/// Live data is only attempted when a live provider is configured. Any live
/// failure, including exceeding `timeout`, is logged and answered from the
/// fallback provider instead; callers never see it.
pub struct FallbackChain {
    live: Option<Arc<dyn DataProvider>>,
    fallback: Arc<dyn DataProvider>,
    timeout: Duration,
}

impl FallbackChain {
    pub fn new(
        live: Option<Arc<dyn DataProvider>>,
        fallback: Arc<dyn DataProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            live,
            fallback,
            timeout,
        }
    }

    #[must_use]
    pub fn live_enabled(&self) -> bool {
        self.live.is_some()
    }

    #[instrument(skip(self, city), fields(city = %city.key))]
    pub async fn fetch(&self, category: IndicatorCategory, city: &City) -> Result<FetchedBundle> {
        if let Some(live) = self.live.as_ref().filter(|p| p.supports(category)) {
            let outcome = tokio::time::timeout(self.timeout, live.fetch(category, city))
                .await
                .unwrap_or_else(|_| Err(ProviderError::Timeout(self.timeout)));

            match outcome {
                Ok(bundle) if bundle.category() == category => {
                    debug!("Serving {} for {} from live data", category, city.key);
                    return Ok(FetchedBundle {
                        bundle,
                        source: live.source(),
                    });
                }
                Ok(bundle) => {
                    warn!(
                        "Live provider answered {} with a {} bundle, using fallback",
                        category,
                        bundle.category()
                    );
                }
                Err(e) => {
                    warn!("Live data for {} unavailable ({}), using fallback", category, e);
                }
            }
        }

        let bundle = self.fallback.fetch(category, city).await?;
        Ok(FetchedBundle {
            bundle,
            source: self.fallback.source(),
        })
    }
}
