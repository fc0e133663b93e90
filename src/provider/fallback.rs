//! Static fallback dataset
//!
//! Hand-curated indicator bundles, embedded in the binary as JSON and
//! validated once at startup. This is the default source for every category
//! and the safety net whenever live data is disabled or failing.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::{DataProvider, DataSource, IndicatorBundle, IndicatorCategory, ProviderError};
use crate::cities::{City, CityKey};
use crate::models::{
    ClimateSnapshot, FeedbackBundle, GreenResourcesBundle, HeatIslandBundle, MonitoringStation,
    PollutantReading, SanitationEnergyBundle, TrafficBundle, UrbanIndicators,
};

const EMBEDDED_DATASET: &str = include_str!("fallback_dataset.json");

/// Every category bundle for one city
#[derive(Debug, Clone, Deserialize)]
pub struct CityDataset {
    #[serde(rename = "clima")]
    pub climate: ClimateSnapshot,
    #[serde(rename = "poluentes")]
    pub pollutants: Vec<PollutantReading>,
    #[serde(rename = "estacoes")]
    pub stations: Vec<MonitoringStation>,
    #[serde(rename = "indicadores_urbanos")]
    pub urban_indicators: UrbanIndicators,
    #[serde(rename = "transito")]
    pub traffic: TrafficBundle,
    #[serde(rename = "ilhas_calor")]
    pub heat_islands: HeatIslandBundle,
    #[serde(rename = "recursos_naturais")]
    pub green_resources: GreenResourcesBundle,
    #[serde(rename = "saneamento_energia")]
    pub sanitation_energy: SanitationEnergyBundle,
    #[serde(rename = "feedback_populacao")]
    pub feedback: FeedbackBundle,
}

impl CityDataset {
    /// Validate every record of the dataset
    pub fn validate(&self) -> crate::Result<()> {
        self.climate.validate()?;
        for reading in &self.pollutants {
            reading.validate()?;
        }
        for station in &self.stations {
            station.validate()?;
        }
        self.urban_indicators.validate()?;
        self.traffic.validate()?;
        self.heat_islands.validate()?;
        self.green_resources.validate()?;
        self.sanitation_energy.validate()?;
        self.feedback.validate()?;
        Ok(())
    }

    /// Bundle for one category
    #[must_use]
    pub fn bundle(&self, category: IndicatorCategory) -> IndicatorBundle {
        match category {
            IndicatorCategory::Climate => IndicatorBundle::Climate(self.climate.clone()),
            IndicatorCategory::Pollution => IndicatorBundle::Pollution(self.pollutants.clone()),
            IndicatorCategory::Stations => IndicatorBundle::Stations(self.stations.clone()),
            IndicatorCategory::UrbanIndicators => {
                IndicatorBundle::UrbanIndicators(self.urban_indicators.clone())
            }
            IndicatorCategory::Traffic => IndicatorBundle::Traffic(self.traffic.clone()),
            IndicatorCategory::HeatIslands => IndicatorBundle::HeatIslands(self.heat_islands.clone()),
            IndicatorCategory::GreenResources => {
                IndicatorBundle::GreenResources(self.green_resources.clone())
            }
            IndicatorCategory::SanitationEnergy => {
                IndicatorBundle::SanitationEnergy(self.sanitation_energy.clone())
            }
            IndicatorCategory::Feedback => IndicatorBundle::Feedback(self.feedback.clone()),
        }
    }
}

/// Provider serving the curated datasets
#[derive(Debug, Clone)]
pub struct StaticFallbackProvider {
    datasets: HashMap<CityKey, CityDataset>,
}

impl StaticFallbackProvider {
    /// Load the dataset compiled into the binary
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_DATASET).context("Embedded fallback dataset is invalid")
    }

    /// Load a dataset file with the same layout as the embedded one
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fallback dataset {}", path.display()))?;
        Self::from_json(&json)
            .with_context(|| format!("Fallback dataset {} is invalid", path.display()))
    }

    /// Parse and validate a `{city_key: dataset}` JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, CityDataset> =
            serde_json::from_str(json).context("Failed to parse fallback dataset")?;

        let mut datasets = HashMap::new();
        for (key, dataset) in raw {
            dataset
                .validate()
                .with_context(|| format!("Invalid fallback data for '{key}'"))?;
            debug!("Loaded fallback dataset for '{}'", key);
            datasets.insert(CityKey::new(&key), dataset);
        }

        info!("Fallback dataset covers {} cities", datasets.len());
        Ok(Self { datasets })
    }

    /// Whether the dataset has bundles for `key`
    #[must_use]
    pub fn covers(&self, key: &CityKey) -> bool {
        self.datasets.contains_key(key)
    }
}

#[async_trait]
impl DataProvider for StaticFallbackProvider {
    fn source(&self) -> DataSource {
        DataSource::Fallback
    }

    async fn fetch(
        &self,
        category: IndicatorCategory,
        city: &City,
    ) -> super::Result<IndicatorBundle> {
        self.datasets
            .get(&city.key)
            .map(|dataset| dataset.bundle(category))
            .ok_or_else(|| ProviderError::Unavailable(city.key.to_string()))
    }
}
