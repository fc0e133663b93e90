//! Current weather snapshot for a city

use serde::{Deserialize, Serialize};

use super::Location;
use crate::Result;
use crate::models::indicators::check_range;

/// Current weather conditions at a location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ClimateSnapshot {
    /// Where the observation applies
    #[serde(rename = "local")]
    pub location: Location,
    /// Temperature in Celsius
    #[serde(rename = "temperatura")]
    pub temperature_c: f64,
    /// Relative humidity percentage (0-100)
    #[serde(rename = "umidade")]
    pub humidity_pct: f64,
    /// Sea-level atmospheric pressure in hPa
    #[serde(rename = "pressao")]
    pub pressure_hpa: f64,
    /// Wind speed in m/s
    #[serde(rename = "vento")]
    pub wind_speed_ms: f64,
    /// Human-readable description of the conditions
    #[serde(rename = "descricao")]
    pub description: String,
}

impl ClimateSnapshot {
    pub fn validate(&self) -> Result<()> {
        self.location.coordinates.validate("clima.local")?;
        check_range("clima.umidade", self.humidity_pct, 0.0, 100.0)?;
        check_range("clima.temperatura", self.temperature_c, -90.0, 60.0)?;
        check_range("clima.pressao", self.pressure_hpa, 800.0, 1100.0)?;
        check_range("clima.vento", self.wind_speed_ms, 0.0, 120.0)?;
        Ok(())
    }
}

/// Map a WMO weather code to a Portuguese description
#[must_use]
pub fn weather_code_to_description(code: u8) -> &'static str {
    match code {
        0 => "céu limpo",
        1 => "predominantemente limpo",
        2 => "parcialmente nublado",
        3 => "nublado",
        45 | 48 => "nevoeiro",
        51 | 53 | 55 => "garoa",
        56 | 57 => "garoa congelante",
        61 => "chuva fraca",
        63 => "chuva moderada",
        65 => "chuva forte",
        66 | 67 => "chuva congelante",
        71 | 73 | 75 | 77 => "neve",
        80 | 81 => "pancadas de chuva",
        82 => "pancadas de chuva violentas",
        85 | 86 => "pancadas de neve",
        95 => "trovoada",
        96 | 99 => "trovoada com granizo",
        _ => "condição desconhecida",
    }
}
