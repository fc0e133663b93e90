//! Area analysis request and result records

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Coordinates, location::serialize_lat_lon};
use crate::{Result, UrbanSimError};

/// Sub-indicator dimensions scored by the area analysis.
///
/// Every dimension is oriented so that 100 is the most sustainable value:
/// for building density and urban noise a high score means low pressure.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    #[serde(rename = "densidade_construcao")]
    BuildingDensity,
    #[serde(rename = "areas_verdes")]
    GreenArea,
    #[serde(rename = "acessibilidade_transporte")]
    TransportAccess,
    #[serde(rename = "qualidade_ar")]
    AirQuality,
    #[serde(rename = "ruido_urbano")]
    UrbanNoise,
    #[serde(rename = "infraestrutura_saneamento")]
    Sanitation,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::BuildingDensity,
        Dimension::GreenArea,
        Dimension::TransportAccess,
        Dimension::AirQuality,
        Dimension::UrbanNoise,
        Dimension::Sanitation,
    ];

    /// Wire key of the dimension
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Dimension::BuildingDensity => "densidade_construcao",
            Dimension::GreenArea => "areas_verdes",
            Dimension::TransportAccess => "acessibilidade_transporte",
            Dimension::AirQuality => "qualidade_ar",
            Dimension::UrbanNoise => "ruido_urbano",
            Dimension::Sanitation => "infraestrutura_saneamento",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A validated request to analyse the area around a point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaAnalysisRequest {
    pub center: Coordinates,
    pub radius_m: f64,
}

impl AreaAnalysisRequest {
    /// Build a request, rejecting invalid coordinates or radius
    pub fn new(center: Coordinates, radius_m: f64) -> Result<Self> {
        let request = Self { center, radius_m };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<()> {
        self.center.validate("coordenadas")?;
        if !self.radius_m.is_finite() || self.radius_m <= 0.0 {
            return Err(UrbanSimError::validation(
                "raio",
                format!("radius must be a positive number of meters, got {}", self.radius_m),
            ));
        }
        Ok(())
    }

    /// Human description of the analysed area, e.g. `Raio de 500m`
    #[must_use]
    pub fn describe(&self) -> String {
        if self.radius_m.fract() == 0.0 {
            format!("Raio de {:.0}m", self.radius_m)
        } else {
            format!("Raio de {}m", self.radius_m)
        }
    }
}

/// Outcome of an area analysis
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct AreaAnalysisResult {
    #[serde(rename = "area_analisada")]
    pub area_description: String,
    #[serde(rename = "coordenadas_centro", serialize_with = "serialize_lat_lon")]
    pub center: Coordinates,
    /// Closest known district, when the point lies near one
    #[serde(rename = "zona_referencia")]
    pub reference_zone: Option<String>,
    #[serde(rename = "indicadores")]
    pub sub_indicators: BTreeMap<Dimension, f64>,
    #[serde(rename = "pontos_fortes")]
    pub strengths: Vec<String>,
    #[serde(rename = "pontos_fracos")]
    pub weaknesses: Vec<String>,
    #[serde(rename = "recomendacoes")]
    pub recommendations: Vec<String>,
    #[serde(rename = "score_sustentabilidade")]
    pub composite_score: f64,
    #[serde(rename = "timestamp")]
    pub computed_at: DateTime<Utc>,
}
