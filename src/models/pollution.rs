//! Air quality readings and monitoring stations

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Coordinates;
use crate::{Result, UrbanSimError};

/// Measured air pollutant
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Pollutant {
    Pm25,
    Pm10,
    O3,
    So2,
    No2,
    Co,
}

impl Pollutant {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "pm25",
            Pollutant::Pm10 => "pm10",
            Pollutant::O3 => "o3",
            Pollutant::So2 => "so2",
            Pollutant::No2 => "no2",
            Pollutant::Co => "co",
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single pollutant measurement
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PollutantReading {
    #[serde(rename = "parametro")]
    pub parameter: Pollutant,
    #[serde(rename = "valor")]
    pub value: f64,
    #[serde(rename = "unidade")]
    pub unit: String,
    /// Name of the station that produced the reading
    #[serde(rename = "localizacao")]
    pub station_name: String,
    #[serde(rename = "coordenadas")]
    pub location: Coordinates,
    #[serde(rename = "ultima_atualizacao")]
    pub observed_at: DateTime<Utc>,
}

impl PollutantReading {
    pub fn validate(&self) -> Result<()> {
        self.location.validate("poluentes.coordenadas")?;
        if !self.value.is_finite() || self.value < 0.0 {
            return Err(UrbanSimError::validation(
                "poluentes.valor",
                format!("{} reading must be a non-negative number", self.parameter),
            ));
        }
        Ok(())
    }
}

/// An air quality monitoring station
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MonitoringStation {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "cidade")]
    pub city: String,
    #[serde(rename = "pais")]
    pub country: String,
    #[serde(rename = "coordenadas")]
    pub location: Coordinates,
    #[serde(rename = "parametros", with = "parameter_list")]
    pub supported_parameters: BTreeSet<Pollutant>,
    #[serde(rename = "contagem_medicoes")]
    pub measurement_count: u64,
}

impl MonitoringStation {
    pub fn validate(&self) -> Result<()> {
        self.location.validate("estacoes.coordenadas")
    }
}

/// Parameters travel as `[{"name": "pm25"}, ...]`
mod parameter_list {
    use std::collections::BTreeSet;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Pollutant;

    #[derive(Serialize, Deserialize)]
    struct ParameterRef {
        name: Pollutant,
    }

    pub fn serialize<S: Serializer>(
        parameters: &BTreeSet<Pollutant>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        parameters
            .iter()
            .map(|name| ParameterRef { name: *name })
            .collect::<Vec<_>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeSet<Pollutant>, D::Error> {
        let refs = Vec::<ParameterRef>::deserialize(deserializer)?;
        Ok(refs.into_iter().map(|r| r.name).collect())
    }
}
