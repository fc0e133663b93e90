//! Fixed-shape indicator records for each city-level category
//!
//! Field names follow the public wire format, so the same records are read
//! from the fallback dataset and written into API responses.

use serde::{Deserialize, Serialize};

use crate::{Result, UrbanSimError};

/// Reject values that are non-finite or outside `[min, max]`
pub(crate) fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(UrbanSimError::validation(
            field,
            format!("{value} outside [{min}, {max}]"),
        ));
    }
    Ok(())
}

/// Reject values outside the 0-100 index scale
pub(crate) fn check_index(field: &str, value: f64) -> Result<()> {
    check_range(field, value, 0.0, 100.0)
}

/// Consolidated urban indicators
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UrbanIndicators {
    #[serde(rename = "indicadores")]
    pub scores: UrbanScores,
    #[serde(rename = "recomendacoes")]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UrbanScores {
    /// Qualitative air quality label
    #[serde(rename = "qualidade_ar")]
    pub air_quality: String,
    #[serde(rename = "indice_poluicao")]
    pub pollution_index: f64,
    /// Inhabitants per km²
    #[serde(rename = "densidade_populacional")]
    pub population_density: f64,
    /// Green area in m² per inhabitant
    #[serde(rename = "area_verde_per_capita")]
    pub green_area_per_capita: f64,
    #[serde(rename = "transporte_publico")]
    pub public_transport: f64,
    #[serde(rename = "infraestrutura_cicloviaria")]
    pub cycling_infrastructure: f64,
}

impl UrbanIndicators {
    pub fn validate(&self) -> Result<()> {
        check_index("indicadores.indice_poluicao", self.scores.pollution_index)?;
        check_index("indicadores.transporte_publico", self.scores.public_transport)?;
        check_index(
            "indicadores.infraestrutura_cicloviaria",
            self.scores.cycling_infrastructure,
        )?;
        check_range(
            "indicadores.densidade_populacional",
            self.scores.population_density,
            0.0,
            f64::MAX,
        )?;
        check_range(
            "indicadores.area_verde_per_capita",
            self.scores.green_area_per_capita,
            0.0,
            f64::MAX,
        )
    }
}

/// Traffic congestion overview
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TrafficBundle {
    /// Overall congestion, 0-100%
    #[serde(rename = "nivel_congestionamento")]
    pub congestion_level: f64,
    #[serde(rename = "principais_vias")]
    pub main_roads: Vec<RoadStatus>,
    #[serde(rename = "horario_pico")]
    pub rush_hour: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RoadStatus {
    #[serde(rename = "via")]
    pub road: String,
    #[serde(rename = "congestionamento")]
    pub congestion: f64,
    /// Average speed in km/h
    #[serde(rename = "velocidade_media")]
    pub average_speed_kmh: f64,
}

impl TrafficBundle {
    pub fn validate(&self) -> Result<()> {
        check_index("transito.nivel_congestionamento", self.congestion_level)?;
        for road in &self.main_roads {
            check_index("transito.principais_vias.congestionamento", road.congestion)?;
            check_range(
                "transito.principais_vias.velocidade_media",
                road.average_speed_kmh,
                0.0,
                200.0,
            )?;
        }
        Ok(())
    }
}

/// Urban heat island survey
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HeatIslandBundle {
    #[serde(rename = "ilhas_calor")]
    pub islands: Vec<HeatIsland>,
    /// Mean city temperature in Celsius
    #[serde(rename = "temp_media")]
    pub mean_temperature_c: f64,
    #[serde(rename = "recomendacoes")]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HeatIsland {
    pub area: String,
    /// Temperature excess over the city mean, in Celsius
    #[serde(rename = "temp_diff")]
    pub temperature_excess_c: f64,
    /// Dominant surface cover
    #[serde(rename = "cobertura")]
    pub surface: String,
    /// Vegetation cover, 0-100%
    #[serde(rename = "vegetacao")]
    pub vegetation_pct: f64,
}

impl HeatIslandBundle {
    pub fn validate(&self) -> Result<()> {
        for island in &self.islands {
            check_index("ilhas_calor.vegetacao", island.vegetation_pct)?;
            check_range("ilhas_calor.temp_diff", island.temperature_excess_c, -20.0, 20.0)?;
        }
        Ok(())
    }
}

/// Green areas and water resources
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GreenResourcesBundle {
    #[serde(rename = "areas_verdes")]
    pub green_areas: Vec<GreenArea>,
    /// Vegetation cover, 0-100%
    #[serde(rename = "cobertura_vegetal")]
    pub vegetation_cover: f64,
    #[serde(rename = "qualidade_ar")]
    pub air_quality: String,
    #[serde(rename = "recursos_hidricos")]
    pub water_resources: Vec<WaterResource>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GreenArea {
    #[serde(rename = "nome")]
    pub name: String,
    pub area_ha: f64,
    #[serde(rename = "tipo")]
    pub kind: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WaterResource {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "capacidade")]
    pub capacity: String,
    #[serde(rename = "uso")]
    pub usage: String,
}

impl GreenResourcesBundle {
    pub fn validate(&self) -> Result<()> {
        check_index("recursos_naturais.cobertura_vegetal", self.vegetation_cover)?;
        for area in &self.green_areas {
            check_range("areas_verdes.area_ha", area.area_ha, 0.0, f64::MAX)?;
        }
        Ok(())
    }
}

/// Sanitation coverage and energy mix
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SanitationEnergyBundle {
    #[serde(rename = "saneamento")]
    pub sanitation: Sanitation,
    #[serde(rename = "energia")]
    pub energy: Energy,
    #[serde(rename = "recomendacoes")]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Sanitation {
    #[serde(rename = "cobertura_agua")]
    pub water_coverage: f64,
    #[serde(rename = "cobertura_esgoto")]
    pub sewage_coverage: f64,
    #[serde(rename = "tratamento_esgoto")]
    pub sewage_treatment: f64,
    #[serde(rename = "coleta_seletiva")]
    pub selective_collection: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Energy {
    /// kWh per inhabitant per year
    #[serde(rename = "consumo_per_capita")]
    pub consumption_per_capita_kwh: f64,
    #[serde(rename = "fontes_renovaveis")]
    pub renewable_share: f64,
    #[serde(rename = "eficiencia_energetica")]
    pub efficiency: f64,
    #[serde(rename = "distribuicao")]
    pub distribution: Vec<ShareEntry>,
}

/// One slice of a percentage breakdown
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ShareEntry {
    #[serde(rename = "tipo")]
    pub label: String,
    #[serde(rename = "percentual")]
    pub percent: f64,
}

impl SanitationEnergyBundle {
    pub fn validate(&self) -> Result<()> {
        let s = &self.sanitation;
        check_index("saneamento.cobertura_agua", s.water_coverage)?;
        check_index("saneamento.cobertura_esgoto", s.sewage_coverage)?;
        check_index("saneamento.tratamento_esgoto", s.sewage_treatment)?;
        check_index("saneamento.coleta_seletiva", s.selective_collection)?;
        check_index("energia.fontes_renovaveis", self.energy.renewable_share)?;
        check_index("energia.eficiencia_energetica", self.energy.efficiency)?;
        check_range(
            "energia.consumo_per_capita",
            self.energy.consumption_per_capita_kwh,
            0.0,
            f64::MAX,
        )?;
        for entry in &self.energy.distribution {
            check_index("energia.distribuicao.percentual", entry.percent)?;
        }
        Ok(())
    }
}

/// Citizen survey results
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FeedbackBundle {
    #[serde(rename = "pesquisa")]
    pub survey: Survey,
    #[serde(rename = "reclamacoes_frequentes")]
    pub frequent_complaints: Vec<Complaint>,
    #[serde(rename = "sugestoes")]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Survey {
    #[serde(rename = "satisfacao_geral")]
    pub overall_satisfaction: f64,
    #[serde(rename = "qualidade_vida")]
    pub quality_of_life: f64,
    #[serde(rename = "transporte_publico")]
    pub public_transport: f64,
    #[serde(rename = "areas_verdes")]
    pub green_areas: f64,
    #[serde(rename = "seguranca")]
    pub safety: f64,
    #[serde(rename = "saneamento")]
    pub sanitation: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Complaint {
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "percentual")]
    pub percent: f64,
}

impl FeedbackBundle {
    pub fn validate(&self) -> Result<()> {
        let s = &self.survey;
        for (field, value) in [
            ("pesquisa.satisfacao_geral", s.overall_satisfaction),
            ("pesquisa.qualidade_vida", s.quality_of_life),
            ("pesquisa.transporte_publico", s.public_transport),
            ("pesquisa.areas_verdes", s.green_areas),
            ("pesquisa.seguranca", s.safety),
            ("pesquisa.saneamento", s.sanitation),
        ] {
            check_index(field, value)?;
        }
        for complaint in &self.frequent_complaints {
            check_index("reclamacoes_frequentes.percentual", complaint.percent)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(0.0, true)]
    #[case(100.0, true)]
    #[case(100.5, false)]
    #[case(-0.1, false)]
    #[case(f64::NAN, false)]
    fn test_check_index(#[case] value: f64, #[case] ok: bool) {
        assert_eq!(check_index("x", value).is_ok(), ok);
    }

    #[test]
    fn test_traffic_wire_keys() {
        let traffic = TrafficBundle {
            congestion_level: 65.0,
            main_roads: vec![RoadStatus {
                road: "W3 Sul".to_string(),
                congestion: 80.0,
                average_speed_kmh: 20.0,
            }],
            rush_hour: true,
        };
        let value = serde_json::to_value(&traffic).unwrap();
        assert_eq!(value["nivel_congestionamento"], json!(65.0));
        assert_eq!(value["principais_vias"][0]["via"], json!("W3 Sul"));
        assert_eq!(value["horario_pico"], json!(true));
    }

    #[test]
    fn test_traffic_rejects_congestion_above_scale() {
        let traffic = TrafficBundle {
            congestion_level: 120.0,
            main_roads: vec![],
            rush_hour: false,
        };
        assert!(traffic.validate().is_err());
    }

    #[test]
    fn test_survey_rejects_out_of_scale_answer() {
        let feedback: FeedbackBundle = serde_json::from_value(json!({
            "pesquisa": {
                "satisfacao_geral": 72, "qualidade_vida": 68, "transporte_publico": 55,
                "areas_verdes": 180, "seguranca": 65, "saneamento": 75
            },
            "reclamacoes_frequentes": [],
            "sugestoes": []
        }))
        .unwrap();

        match feedback.validate() {
            Err(UrbanSimError::Validation { field, .. }) => {
                assert_eq!(field, "pesquisa.areas_verdes");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
