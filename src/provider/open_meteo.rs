//! Live weather and air quality from the Open-Meteo APIs
//!
//! The city display name is geocoded first; the resulting coordinates are
//! then used for the forecast and air-quality lookups. No API key is needed.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::{DataProvider, DataSource, IndicatorBundle, IndicatorCategory, ProviderError, Result};
use crate::cities::City;
use crate::config::LiveDataConfig;
use crate::models::climate::weather_code_to_description;
use crate::models::{ClimateSnapshot, Coordinates, Location, Pollutant, PollutantReading};

const USER_AGENT: &str = concat!("urbansim/", env!("CARGO_PKG_VERSION"));
const AIR_QUALITY_UNIT: &str = "µg/m³";

/// Client for the Open-Meteo geocoding, forecast and air-quality APIs
pub struct OpenMeteoProvider {
    client: Client,
    timeout: Duration,
    geocoding_url: String,
    forecast_url: String,
    air_quality_url: String,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeoPlace>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeoPlace {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    country_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentWeather,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    pressure_msl: f64,
    wind_speed_10m: f64,
    weather_code: u8,
}

#[derive(Debug, Deserialize)]
struct AirQualityResponse {
    current: CurrentAirQuality,
}

#[derive(Debug, Deserialize)]
struct CurrentAirQuality {
    time: String,
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    ozone: Option<f64>,
    sulphur_dioxide: Option<f64>,
    nitrogen_dioxide: Option<f64>,
    carbon_monoxide: Option<f64>,
}

impl OpenMeteoProvider {
    pub fn new(config: &LiveDataConfig) -> Result<Self> {
        let timeout = Duration::from_secs(u64::from(config.timeout_seconds));
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::Upstream(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout,
            geocoding_url: config.geocoding_url.clone(),
            forecast_url: config.forecast_url.clone(),
            air_quality_url: config.air_quality_url.clone(),
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream(format!("{status}: {body}")));
        }

        response.json().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout)
            } else {
                ProviderError::Parse(format!("Unexpected Open-Meteo response: {e}"))
            }
        })
    }

    async fn geocode(&self, city: &City) -> Result<GeoPlace> {
        let url = format!(
            "{}?name={}&count=5&language=pt&format=json",
            self.geocoding_url,
            urlencoding::encode(&city.display_name)
        );
        let response: GeocodingResponse = self.get_json(&url).await?;
        let place = pick_place(response.results, &city.country_code)
            .ok_or_else(|| ProviderError::Upstream(format!("No geocoding match for {}", city.display_name)))?;

        debug!(
            "Geocoded {} to {} ({:.4}, {:.4})",
            city.display_name, place.name, place.latitude, place.longitude
        );
        Ok(place)
    }

    async fn current_weather(&self, city: &City) -> Result<ClimateSnapshot> {
        let place = self.geocode(city).await?;
        let url = format!(
            "{}?latitude={}&longitude={}&current=temperature_2m,relative_humidity_2m,pressure_msl,wind_speed_10m,weather_code&wind_speed_unit=ms",
            self.forecast_url, place.latitude, place.longitude
        );
        let response: ForecastResponse = self.get_json(&url).await?;
        climate_from_forecast(city, &place, response.current)
    }

    async fn current_air_quality(&self, city: &City) -> Result<Vec<PollutantReading>> {
        let place = self.geocode(city).await?;
        let url = format!(
            "{}?latitude={}&longitude={}&current=pm2_5,pm10,ozone,sulphur_dioxide,nitrogen_dioxide,carbon_monoxide",
            self.air_quality_url, place.latitude, place.longitude
        );
        let response: AirQualityResponse = self.get_json(&url).await?;
        readings_from_air_quality(city, &place, response.current)
    }
}

#[async_trait]
impl DataProvider for OpenMeteoProvider {
    fn source(&self) -> DataSource {
        DataSource::OpenMeteo
    }

    fn supports(&self, category: IndicatorCategory) -> bool {
        matches!(
            category,
            IndicatorCategory::Climate | IndicatorCategory::Pollution
        )
    }

    #[instrument(skip(self, city), fields(city = %city.key))]
    async fn fetch(&self, category: IndicatorCategory, city: &City) -> Result<IndicatorBundle> {
        let bundle = match category {
            IndicatorCategory::Climate => IndicatorBundle::Climate(self.current_weather(city).await?),
            IndicatorCategory::Pollution => {
                IndicatorBundle::Pollution(self.current_air_quality(city).await?)
            }
            other => return Err(ProviderError::Unsupported(other.to_string())),
        };
        info!("Fetched live {} for {}", category, city.display_name);
        Ok(bundle)
    }
}

/// First result in the city's country, else the first result
fn pick_place(results: Vec<GeoPlace>, country_code: &str) -> Option<GeoPlace> {
    let in_country = results.iter().position(|place| {
        place
            .country_code
            .as_deref()
            .is_some_and(|cc| cc.eq_ignore_ascii_case(country_code))
    });
    let index = in_country.unwrap_or(0);
    results.into_iter().nth(index)
}

fn climate_from_forecast(
    city: &City,
    place: &GeoPlace,
    current: CurrentWeather,
) -> Result<ClimateSnapshot> {
    let location = Location::with_country(
        city.display_name.clone(),
        city.country_code.clone(),
        place.latitude,
        place.longitude,
    )
    .map_err(|e| ProviderError::Parse(e.to_string()))?;

    let snapshot = ClimateSnapshot {
        location,
        temperature_c: current.temperature_2m,
        humidity_pct: current.relative_humidity_2m,
        pressure_hpa: current.pressure_msl,
        wind_speed_ms: current.wind_speed_10m,
        description: weather_code_to_description(current.weather_code).to_string(),
    };
    snapshot
        .validate()
        .map_err(|e| ProviderError::Parse(e.to_string()))?;
    Ok(snapshot)
}

fn readings_from_air_quality(
    city: &City,
    place: &GeoPlace,
    current: CurrentAirQuality,
) -> Result<Vec<PollutantReading>> {
    let observed_at = parse_observation_time(&current.time)?;
    let location = Coordinates::new(place.latitude, place.longitude)
        .map_err(|e| ProviderError::Parse(e.to_string()))?;

    let values = [
        (Pollutant::Pm25, current.pm2_5),
        (Pollutant::Pm10, current.pm10),
        (Pollutant::O3, current.ozone),
        (Pollutant::So2, current.sulphur_dioxide),
        (Pollutant::No2, current.nitrogen_dioxide),
        (Pollutant::Co, current.carbon_monoxide),
    ];

    let readings: Vec<PollutantReading> = values
        .into_iter()
        .filter_map(|(parameter, value)| {
            value.map(|value| PollutantReading {
                parameter,
                value,
                unit: AIR_QUALITY_UNIT.to_string(),
                station_name: city.display_name.clone(),
                location,
                observed_at,
            })
        })
        .collect();

    if readings.is_empty() {
        return Err(ProviderError::Parse(
            "Open-Meteo returned no pollutant values".to_string(),
        ));
    }
    for reading in &readings {
        reading
            .validate()
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
    }
    Ok(readings)
}

/// Open-Meteo reports `current.time` as GMT without an offset, e.g. `2025-10-04T12:00`
fn parse_observation_time(time: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M")
        .map(|naive| naive.and_utc())
        .map_err(|e| ProviderError::Parse(format!("Invalid observation time '{time}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::tests::brasilia;

    fn place() -> GeoPlace {
        GeoPlace {
            name: "Brasília".to_string(),
            latitude: -15.77972,
            longitude: -47.92972,
            country_code: Some("BR".to_string()),
        }
    }

    /// Accepts connections and never answers
    async fn silent_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });
        format!("http://{addr}/v1/forecast")
    }

    #[tokio::test]
    async fn test_client_timeout_reported_as_timeout() {
        let config = LiveDataConfig {
            enabled: true,
            timeout_seconds: 1,
            forecast_url: silent_server().await,
            ..LiveDataConfig::default()
        };
        let provider = OpenMeteoProvider::new(&config).unwrap();

        let result: Result<ForecastResponse> = provider.get_json(&config.forecast_url).await;
        match result {
            Err(ProviderError::Timeout(limit)) => assert_eq!(limit, Duration::from_secs(1)),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_pick_place_prefers_country() {
        let json = r#"{"results": [
            {"name": "Brasília", "latitude": -19.2, "longitude": -47.1, "country_code": "PT"},
            {"name": "Brasília", "latitude": -15.77972, "longitude": -47.92972, "country_code": "BR"}
        ]}"#;
        let response: GeocodingResponse = serde_json::from_str(json).unwrap();
        let place = pick_place(response.results, "br").unwrap();
        assert_eq!(place.latitude, -15.77972);
    }

    #[test]
    fn test_pick_place_without_results() {
        let response: GeocodingResponse = serde_json::from_str("{}").unwrap();
        assert!(pick_place(response.results, "BR").is_none());
    }

    #[test]
    fn test_forecast_mapping() {
        let json = r#"{
            "latitude": -15.75,
            "longitude": -47.875,
            "current": {
                "time": "2025-10-04T15:00",
                "interval": 900,
                "temperature_2m": 29.4,
                "relative_humidity_2m": 31,
                "pressure_msl": 1012.4,
                "wind_speed_10m": 3.2,
                "weather_code": 2
            }
        }"#;
        let response: ForecastResponse = serde_json::from_str(json).unwrap();
        let snapshot = climate_from_forecast(&brasilia(), &place(), response.current).unwrap();

        assert_eq!(snapshot.location.name, "Brasília");
        assert_eq!(snapshot.temperature_c, 29.4);
        assert_eq!(snapshot.humidity_pct, 31.0);
        assert_eq!(snapshot.pressure_hpa, 1012.4);
        assert_eq!(snapshot.description, "parcialmente nublado");
    }

    #[test]
    fn test_forecast_out_of_range_rejected() {
        let current = CurrentWeather {
            temperature_2m: 25.0,
            relative_humidity_2m: 140.0,
            pressure_msl: 1013.0,
            wind_speed_10m: 2.0,
            weather_code: 0,
        };
        let result = climate_from_forecast(&brasilia(), &place(), current);
        assert!(matches!(result, Err(ProviderError::Parse(_))));
    }

    #[test]
    fn test_air_quality_mapping_skips_missing_values() {
        let json = r#"{
            "current": {
                "time": "2025-10-04T15:00",
                "pm2_5": 9.8,
                "pm10": 14.1,
                "ozone": 61.0,
                "sulphur_dioxide": null,
                "nitrogen_dioxide": 4.3,
                "carbon_monoxide": 151.0
            }
        }"#;
        let response: AirQualityResponse = serde_json::from_str(json).unwrap();
        let readings = readings_from_air_quality(&brasilia(), &place(), response.current).unwrap();

        assert_eq!(readings.len(), 5);
        assert_eq!(readings[0].parameter, Pollutant::Pm25);
        assert_eq!(readings[0].value, 9.8);
        assert!(readings.iter().all(|r| r.parameter != Pollutant::So2));
        assert!(readings.iter().all(|r| r.unit == AIR_QUALITY_UNIT));
        assert_eq!(readings[0].observed_at.to_rfc3339(), "2025-10-04T15:00:00+00:00");
    }

    #[test]
    fn test_air_quality_without_values_rejected() {
        let current = CurrentAirQuality {
            time: "2025-10-04T15:00".to_string(),
            pm2_5: None,
            pm10: None,
            ozone: None,
            sulphur_dioxide: None,
            nitrogen_dioxide: None,
            carbon_monoxide: None,
        };
        assert!(readings_from_air_quality(&brasilia(), &place(), current).is_err());
    }

    #[test]
    fn test_invalid_observation_time() {
        assert!(parse_observation_time("yesterday").is_err());
    }

    #[test]
    fn test_supported_categories() {
        let provider = OpenMeteoProvider::new(&LiveDataConfig::default()).unwrap();
        assert!(provider.supports(IndicatorCategory::Climate));
        assert!(provider.supports(IndicatorCategory::Pollution));
        assert!(!provider.supports(IndicatorCategory::Traffic));
        assert!(!provider.supports(IndicatorCategory::Feedback));
    }

    #[tokio::test]
    async fn test_unsupported_category_reported() {
        let provider = OpenMeteoProvider::new(&LiveDataConfig::default()).unwrap();
        let result = provider
            .fetch(IndicatorCategory::HeatIslands, &brasilia())
            .await;
        assert!(matches!(result, Err(ProviderError::Unsupported(_))));
    }
}
