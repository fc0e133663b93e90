//! Response shaping for the city-keyed indicator categories
//!
//! Each category response wraps the provider bundle with the canonical city
//! name and whatever metadata the category carries (record counts, a fresh
//! timestamp, the data source). Values from the provider pass through
//! untouched.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cities::City;
use crate::models::{
    FeedbackBundle, GreenResourcesBundle, HeatIslandBundle, LatLon, MonitoringStation,
    PollutantReading, SanitationEnergyBundle, TrafficBundle, UrbanIndicators,
};
use crate::provider::{DataSource, FetchedBundle, IndicatorBundle, IndicatorCategory};
use crate::{Result, UrbanSimError};

#[derive(Debug, Clone, Serialize)]
pub struct ClimateResponse {
    pub cidade: String,
    pub temperatura: f64,
    pub umidade: f64,
    pub pressao: f64,
    pub vento: f64,
    pub descricao: String,
    pub coordenadas: LatLon,
    pub fonte: DataSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct PollutionResponse {
    pub cidade: String,
    pub poluentes: Vec<PollutantReading>,
    pub total_registros: usize,
    pub fonte: DataSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct StationsResponse {
    pub cidade: String,
    pub estacoes: Vec<MonitoringStation>,
    pub total_estacoes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UrbanIndicatorsResponse {
    pub cidade: String,
    #[serde(flatten)]
    pub indicators: UrbanIndicators,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrafficResponse {
    pub cidade: String,
    #[serde(flatten)]
    pub traffic: TrafficBundle,
    pub total_vias: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatIslandResponse {
    pub cidade: String,
    #[serde(flatten)]
    pub heat_islands: HeatIslandBundle,
    pub total_areas: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GreenResourcesResponse {
    pub cidade: String,
    #[serde(flatten)]
    pub resources: GreenResourcesBundle,
    pub total_areas_verdes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitationEnergyResponse {
    pub cidade: String,
    #[serde(flatten)]
    pub sanitation_energy: SanitationEnergyBundle,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackResponse {
    pub cidade: String,
    #[serde(flatten)]
    pub feedback: FeedbackBundle,
}

/// The response of any city-keyed category
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CategoryResponse {
    Climate(ClimateResponse),
    Pollution(PollutionResponse),
    Stations(StationsResponse),
    UrbanIndicators(UrbanIndicatorsResponse),
    Traffic(TrafficResponse),
    HeatIslands(HeatIslandResponse),
    GreenResources(GreenResourcesResponse),
    SanitationEnergy(SanitationEnergyResponse),
    Feedback(FeedbackResponse),
}

/// Shape `fetched` into the response for `category`.
///
/// A bundle of another category means a provider broke its contract and is
/// reported as an internal error.
pub fn build(
    city: &City,
    category: IndicatorCategory,
    fetched: FetchedBundle,
) -> Result<CategoryResponse> {
    let FetchedBundle { bundle, source } = fetched;
    if bundle.category() != category {
        return Err(UrbanSimError::internal(format!(
            "Requested {category} for {} but received {}",
            city.key,
            bundle.category()
        )));
    }

    let cidade = city.display_name.clone();
    let response = match bundle {
        IndicatorBundle::Climate(snapshot) => CategoryResponse::Climate(ClimateResponse {
            cidade,
            temperatura: snapshot.temperature_c,
            umidade: snapshot.humidity_pct,
            pressao: snapshot.pressure_hpa,
            vento: snapshot.wind_speed_ms,
            descricao: snapshot.description,
            coordenadas: snapshot.location.coordinates.into(),
            fonte: source,
        }),
        IndicatorBundle::Pollution(readings) => CategoryResponse::Pollution(PollutionResponse {
            cidade,
            total_registros: readings.len(),
            poluentes: readings,
            fonte: source,
        }),
        IndicatorBundle::Stations(stations) => CategoryResponse::Stations(StationsResponse {
            cidade,
            total_estacoes: stations.len(),
            estacoes: stations,
        }),
        IndicatorBundle::UrbanIndicators(indicators) => {
            CategoryResponse::UrbanIndicators(UrbanIndicatorsResponse { cidade, indicators })
        }
        IndicatorBundle::Traffic(traffic) => CategoryResponse::Traffic(TrafficResponse {
            cidade,
            total_vias: traffic.main_roads.len(),
            traffic,
            timestamp: Utc::now(),
        }),
        IndicatorBundle::HeatIslands(heat_islands) => {
            CategoryResponse::HeatIslands(HeatIslandResponse {
                cidade,
                total_areas: heat_islands.islands.len(),
                heat_islands,
                timestamp: Utc::now(),
            })
        }
        IndicatorBundle::GreenResources(resources) => {
            CategoryResponse::GreenResources(GreenResourcesResponse {
                cidade,
                total_areas_verdes: resources.green_areas.len(),
                resources,
            })
        }
        IndicatorBundle::SanitationEnergy(sanitation_energy) => {
            CategoryResponse::SanitationEnergy(SanitationEnergyResponse {
                cidade,
                sanitation_energy,
            })
        }
        IndicatorBundle::Feedback(feedback) => {
            CategoryResponse::Feedback(FeedbackResponse { cidade, feedback })
        }
    };

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cities::CityKey;
    use crate::provider::tests::brasilia;
    use crate::provider::{CityDataset, StaticFallbackProvider};
    use serde_json::{Value, json};

    fn dataset() -> CityDataset {
        let json = include_str!("provider/fallback_dataset.json");
        let mut raw: std::collections::BTreeMap<String, CityDataset> =
            serde_json::from_str(json).unwrap();
        raw.remove("brasilia").unwrap()
    }

    fn fetched(category: IndicatorCategory) -> FetchedBundle {
        FetchedBundle {
            bundle: dataset().bundle(category),
            source: DataSource::Fallback,
        }
    }

    fn shaped(category: IndicatorCategory) -> Value {
        let response = build(&brasilia(), category, fetched(category)).unwrap();
        serde_json::to_value(response).unwrap()
    }

    #[test]
    fn test_pollution_counts_records() {
        let value = shaped(IndicatorCategory::Pollution);
        assert_eq!(value["cidade"], "Brasília");
        assert_eq!(value["total_registros"], 2);
        assert_eq!(value["poluentes"].as_array().unwrap().len(), 2);
        assert_eq!(value["poluentes"][0]["parametro"], "pm25");
        assert_eq!(value["fonte"], "fallback");
    }

    #[test]
    fn test_climate_shape() {
        let value = shaped(IndicatorCategory::Climate);
        assert_eq!(value["cidade"], "Brasília");
        assert!(value["temperatura"].is_number());
        assert!(value["coordenadas"]["lat"].is_number());
        assert!(value["coordenadas"]["lon"].is_number());
        assert!(value.get("local").is_none());
    }

    #[test]
    fn test_traffic_is_flattened_and_stamped() {
        let value = shaped(IndicatorCategory::Traffic);
        let roads = value["principais_vias"].as_array().unwrap();
        assert_eq!(value["total_vias"], json!(roads.len()));
        assert!(value["nivel_congestionamento"].is_number());
        assert!(value["horario_pico"].is_boolean());
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_heat_island_counts_areas() {
        let value = shaped(IndicatorCategory::HeatIslands);
        let islands = value["ilhas_calor"].as_array().unwrap();
        assert_eq!(value["total_areas"], json!(islands.len()));
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_static_categories_have_no_timestamp() {
        for category in [
            IndicatorCategory::Stations,
            IndicatorCategory::UrbanIndicators,
            IndicatorCategory::GreenResources,
            IndicatorCategory::SanitationEnergy,
            IndicatorCategory::Feedback,
        ] {
            let value = shaped(category);
            assert_eq!(value["cidade"], "Brasília", "{category}");
            assert!(value.get("timestamp").is_none(), "{category}");
        }
    }

    #[test]
    fn test_values_pass_through_untouched() {
        let data = dataset();
        let value = shaped(IndicatorCategory::GreenResources);
        assert_eq!(value["cobertura_vegetal"], json!(data.green_resources.vegetation_cover));
        assert_eq!(
            value["total_areas_verdes"],
            json!(data.green_resources.green_areas.len())
        );
    }

    #[test]
    fn test_category_mismatch_is_internal() {
        let result = build(
            &brasilia(),
            IndicatorCategory::Traffic,
            fetched(IndicatorCategory::Climate),
        );
        assert!(matches!(result, Err(UrbanSimError::Internal { .. })));
    }

    #[tokio::test]
    async fn test_alias_independent_payload() {
        use crate::provider::DataProvider;

        let provider = StaticFallbackProvider::embedded().unwrap();
        let mut by_alias = brasilia();
        by_alias.key = CityKey::new("Brasília");

        let a = provider
            .fetch(IndicatorCategory::Feedback, &brasilia())
            .await
            .unwrap();
        let b = provider
            .fetch(IndicatorCategory::Feedback, &by_alias)
            .await
            .unwrap();
        let shape = |bundle| {
            let fetched = FetchedBundle {
                bundle,
                source: DataSource::Fallback,
            };
            serde_json::to_value(build(&brasilia(), IndicatorCategory::Feedback, fetched).unwrap())
                .unwrap()
        };
        assert_eq!(shape(a), shape(b));
    }
}
