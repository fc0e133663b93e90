//! Configuration management for the urban simulator
//!
//! Handles loading configuration from a TOML file and environment variables,
//! and validates every setting before the server starts. The resulting
//! [`UrbanSimConfig`] is immutable and shared by all components.

use crate::UrbanSimError;
use crate::cities::normalize;
use crate::models::{Coordinates, Dimension};
use anyhow::{Context, Result};
use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "URBANSIM_CONFIG";

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrbanSimConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Live data source settings
    #[serde(default)]
    pub live_data: LiveDataConfig,
    /// Fallback dataset settings
    #[serde(default)]
    pub fallback: FallbackConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Servable cities keyed by canonical key
    #[serde(default = "default_cities")]
    pub cities: BTreeMap<String, CityConfig>,
    /// Area analysis scoring settings
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
    /// Maximum accepted request body size
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Directory with the dashboard frontend, served for unmatched paths
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
    /// Certificate and key, used when built with the `tls` feature
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Live weather and air quality source (Open-Meteo)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveDataConfig {
    /// Query the live source before falling back to the static dataset
    #[serde(default)]
    pub enabled: bool,
    /// Upper bound for a single live lookup, in seconds
    #[serde(default = "default_live_timeout")]
    pub timeout_seconds: u32,
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,
    #[serde(default = "default_air_quality_url")]
    pub air_quality_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// JSON dataset replacing the embedded one
    #[serde(default)]
    pub dataset_path: Option<PathBuf>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty, compact or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// A servable city and the aliases that resolve to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityConfig {
    pub display_name: String,
    pub country_code: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Area analysis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_radius")]
    pub default_radius_m: f64,
    #[serde(default = "default_max_radius")]
    pub max_radius_m: f64,
    /// Scores at or above this value are strengths
    #[serde(default = "default_strength_threshold")]
    pub strength_threshold: f64,
    /// Scores below this value are weaknesses
    #[serde(default = "default_weakness_threshold")]
    pub weakness_threshold: f64,
    /// Amplitude of the deterministic local-variation term
    #[serde(default = "default_jitter")]
    pub jitter: f64,
    /// Deployment salt for the local-variation term
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub weights: DimensionWeights,
}

/// Weighting table of the composite sustainability score.
///
/// | dimension                  | default |
/// |----------------------------|---------|
/// | building density           | 0.15    |
/// | green area coverage        | 0.20    |
/// | transport accessibility    | 0.15    |
/// | air quality                | 0.20    |
/// | urban noise                | 0.10    |
/// | sanitation infrastructure  | 0.20    |
///
/// Weights must be non-negative and sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionWeights {
    #[serde(default = "default_weight_building_density")]
    pub building_density: f64,
    #[serde(default = "default_weight_green_area")]
    pub green_area: f64,
    #[serde(default = "default_weight_transport_access")]
    pub transport_access: f64,
    #[serde(default = "default_weight_air_quality")]
    pub air_quality: f64,
    #[serde(default = "default_weight_urban_noise")]
    pub urban_noise: f64,
    #[serde(default = "default_weight_sanitation")]
    pub sanitation: f64,
}

impl DimensionWeights {
    /// Weight assigned to `dimension`
    #[must_use]
    pub fn weight(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::BuildingDensity => self.building_density,
            Dimension::GreenArea => self.green_area,
            Dimension::TransportAccess => self.transport_access,
            Dimension::AirQuality => self.air_quality,
            Dimension::UrbanNoise => self.urban_noise,
            Dimension::Sanitation => self.sanitation,
        }
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        Dimension::ALL.iter().map(|d| self.weight(*d)).sum()
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout() -> u32 {
    30
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

fn default_live_timeout() -> u32 {
    5
}

fn default_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com/v1/search".to_string()
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_air_quality_url() -> String {
    "https://air-quality-api.open-meteo.com/v1/air-quality".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_cities() -> BTreeMap<String, CityConfig> {
    BTreeMap::from([(
        "brasilia".to_string(),
        CityConfig {
            display_name: "Brasília".to_string(),
            country_code: "BR".to_string(),
            latitude: -15.8267,
            longitude: -47.9218,
            aliases: vec![
                "brasília".to_string(),
                "brasilia".to_string(),
                "bsb".to_string(),
            ],
        },
    )])
}

fn default_radius() -> f64 {
    1000.0
}

fn default_max_radius() -> f64 {
    50_000.0
}

fn default_strength_threshold() -> f64 {
    70.0
}

fn default_weakness_threshold() -> f64 {
    40.0
}

fn default_jitter() -> f64 {
    6.0
}

fn default_weight_building_density() -> f64 {
    0.15
}

fn default_weight_green_area() -> f64 {
    0.20
}

fn default_weight_transport_access() -> f64 {
    0.15
}

fn default_weight_air_quality() -> f64 {
    0.20
}

fn default_weight_urban_noise() -> f64 {
    0.10
}

fn default_weight_sanitation() -> f64 {
    0.20
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
            static_dir: None,
            tls: None,
        }
    }
}

impl Default for LiveDataConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_seconds: default_live_timeout(),
            geocoding_url: default_geocoding_url(),
            forecast_url: default_forecast_url(),
            air_quality_url: default_air_quality_url(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_radius_m: default_radius(),
            max_radius_m: default_max_radius(),
            strength_threshold: default_strength_threshold(),
            weakness_threshold: default_weakness_threshold(),
            jitter: default_jitter(),
            seed: 0,
            weights: DimensionWeights::default(),
        }
    }
}

impl Default for DimensionWeights {
    fn default() -> Self {
        Self {
            building_density: default_weight_building_density(),
            green_area: default_weight_green_area(),
            transport_access: default_weight_transport_access(),
            air_quality: default_weight_air_quality(),
            urban_noise: default_weight_urban_noise(),
            sanitation: default_weight_sanitation(),
        }
    }
}

impl Default for UrbanSimConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            live_data: LiveDataConfig::default(),
            fallback: FallbackConfig::default(),
            logging: LoggingConfig::default(),
            cities: default_cities(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl UrbanSimConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| PathBuf::from("config.toml"));

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. URBANSIM_LIVE_DATA__ENABLED=true
        builder = builder.add_source(
            Environment::with_prefix("URBANSIM")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: UrbanSimConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
        if self.server.request_timeout_seconds == 0 {
            self.server.request_timeout_seconds = default_request_timeout();
        }
        if self.server.max_body_bytes == 0 {
            self.server.max_body_bytes = default_max_body_bytes();
        }
        if self.live_data.timeout_seconds == 0 {
            self.live_data.timeout_seconds = default_live_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.cities.is_empty() {
            self.cities = default_cities();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_cities()?;
        self.validate_analysis()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.server.request_timeout_seconds > 300 {
            return Err(UrbanSimError::config("Request timeout cannot exceed 300 seconds").into());
        }

        if !(1..=5).contains(&self.live_data.timeout_seconds) {
            return Err(UrbanSimError::config(
                "Live data timeout must be between 1 and 5 seconds",
            )
            .into());
        }

        if self.server.max_body_bytes > 10 * 1024 * 1024 {
            return Err(UrbanSimError::config("Maximum body size cannot exceed 10 MB").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(UrbanSimError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "compact", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(UrbanSimError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("geocoding_url", &self.live_data.geocoding_url),
            ("forecast_url", &self.live_data.forecast_url),
            ("air_quality_url", &self.live_data.air_quality_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(UrbanSimError::config(format!(
                    "Live data {name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Validate the servable city table
    fn validate_cities(&self) -> Result<()> {
        if self.cities.is_empty() {
            return Err(UrbanSimError::config("At least one city must be configured").into());
        }

        let mut owners: HashMap<String, &str> = HashMap::new();
        for (key, city) in &self.cities {
            if normalize(key).is_empty() {
                return Err(UrbanSimError::config("City keys cannot be empty").into());
            }
            if city.display_name.trim().is_empty() {
                return Err(
                    UrbanSimError::config(format!("City '{key}' needs a display name")).into(),
                );
            }
            Coordinates::new(city.latitude, city.longitude).map_err(|e| {
                UrbanSimError::config(format!("City '{key}' has invalid coordinates: {e}"))
            })?;

            let names = std::iter::once(key.as_str())
                .chain(std::iter::once(city.display_name.as_str()))
                .chain(city.aliases.iter().map(String::as_str));
            for name in names {
                let normalized = normalize(name);
                if normalized.is_empty() {
                    continue;
                }
                match owners.get(&normalized) {
                    Some(owner) if *owner != key.as_str() => {
                        return Err(UrbanSimError::config(format!(
                            "Alias '{name}' is claimed by both '{owner}' and '{key}'"
                        ))
                        .into());
                    }
                    _ => {
                        owners.insert(normalized, key.as_str());
                    }
                }
            }
        }

        Ok(())
    }

    /// Validate scoring weights, thresholds and radius bounds
    fn validate_analysis(&self) -> Result<()> {
        let analysis = &self.analysis;

        for dimension in Dimension::ALL {
            let weight = analysis.weights.weight(dimension);
            if !weight.is_finite() || weight < 0.0 {
                return Err(UrbanSimError::config(format!(
                    "Weight for '{dimension}' must be a non-negative number"
                ))
                .into());
            }
        }

        let total = analysis.weights.total();
        if (total - 1.0).abs() > 1e-6 {
            return Err(UrbanSimError::config(format!(
                "Analysis weights must sum to 1.0, got {total}"
            ))
            .into());
        }

        let in_scale = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
        if !in_scale(analysis.strength_threshold) || !in_scale(analysis.weakness_threshold) {
            return Err(UrbanSimError::config("Analysis thresholds must be within [0, 100]").into());
        }
        if analysis.weakness_threshold >= analysis.strength_threshold {
            return Err(UrbanSimError::config(
                "Weakness threshold must be lower than the strength threshold",
            )
            .into());
        }

        if !analysis.jitter.is_finite() || !(0.0..=25.0).contains(&analysis.jitter) {
            return Err(UrbanSimError::config("Analysis jitter must be within [0, 25]").into());
        }

        if !analysis.max_radius_m.is_finite() || analysis.max_radius_m <= 0.0 {
            return Err(UrbanSimError::config("Maximum radius must be positive").into());
        }
        if !analysis.default_radius_m.is_finite()
            || analysis.default_radius_m <= 0.0
            || analysis.default_radius_m > analysis.max_radius_m
        {
            return Err(UrbanSimError::config(
                "Default radius must be positive and not exceed the maximum radius",
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_default_config() {
        let config = UrbanSimConfig::default();
        assert_eq!(config.server.port, 5000);
        assert!(!config.live_data.enabled);
        assert_eq!(config.live_data.timeout_seconds, 5);
        assert_eq!(config.logging.level, "info");
        assert!(config.cities.contains_key("brasilia"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let weights = DimensionWeights::default();
        assert!((weights.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = UrbanSimConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_live_timeout_bounded() {
        let mut config = UrbanSimConfig::default();
        config.live_data.timeout_seconds = 30;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("between 1 and 5"));
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut config = UrbanSimConfig::default();
        config.analysis.weights.green_area = 0.5;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("sum to 1.0"));
    }

    #[test]
    fn test_thresholds_must_not_overlap() {
        let mut config = UrbanSimConfig::default();
        config.analysis.weakness_threshold = 80.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_alias_claimed_by_two_cities() {
        let mut config = UrbanSimConfig::default();
        config.cities.insert(
            "planaltina".to_string(),
            CityConfig {
                display_name: "Planaltina".to_string(),
                country_code: "BR".to_string(),
                latitude: -15.62,
                longitude: -47.65,
                aliases: vec!["BSB".to_string()],
            },
        );
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("claimed by both"));
    }

    #[test]
    fn test_invalid_city_coordinates() {
        let mut config = UrbanSimConfig::default();
        if let Some(city) = config.cities.get_mut("brasilia") {
            city.latitude = -150.0;
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_defaults_repairs_empty_values() {
        let mut config = UrbanSimConfig::default();
        config.logging.level.clear();
        config.cities.clear();
        config.live_data.timeout_seconds = 0;
        config.apply_defaults();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.live_data.timeout_seconds, 5);
        assert!(config.cities.contains_key("brasilia"));
    }

    #[test]
    fn test_load_from_toml_file() {
        let path = std::env::temp_dir().join(format!("urbansim-config-{}.toml", std::process::id()));
        {
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(
                file,
                r#"
[server]
port = 8080

[live_data]
enabled = true
timeout_seconds = 3

[analysis]
strength_threshold = 75.0

[cities.goiania]
display_name = "Goiânia"
country_code = "BR"
latitude = -16.6869
longitude = -49.2648
aliases = ["goiania", "goiânia"]
"#
            )
            .unwrap();
        }

        let config = UrbanSimConfig::load_from_path(Some(path.clone())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.server.port, 8080);
        assert!(config.live_data.enabled);
        assert_eq!(config.live_data.timeout_seconds, 3);
        assert_eq!(config.analysis.strength_threshold, 75.0);
        assert_eq!(config.analysis.weakness_threshold, 40.0);
        assert!(config.cities.contains_key("goiania"));
    }
}
