//! Canned texts for the classification and the recommendations

use crate::models::Dimension;

/// Returned when no dimension is weak
pub const MAINTENANCE_RECOMMENDATION: &str =
    "Manter as políticas atuais e monitorar os indicadores periodicamente";

/// Label listed under `pontos_fortes`
#[must_use]
pub fn strength_label(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::BuildingDensity => "Densidade construtiva equilibrada",
        Dimension::GreenArea => "Boa cobertura vegetal",
        Dimension::TransportAccess => "Boa acessibilidade a transporte",
        Dimension::AirQuality => "Boa qualidade do ar",
        Dimension::UrbanNoise => "Baixo nível de ruído urbano",
        Dimension::Sanitation => "Boa infraestrutura de saneamento",
    }
}

/// Label listed under `pontos_fracos`
#[must_use]
pub fn weakness_label(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::BuildingDensity => "Densidade construtiva elevada",
        Dimension::GreenArea => "Baixa cobertura vegetal",
        Dimension::TransportAccess => "Acessibilidade limitada a transporte",
        Dimension::AirQuality => "Qualidade do ar comprometida",
        Dimension::UrbanNoise => "Ruído urbano elevado",
        Dimension::Sanitation => "Infraestrutura de saneamento deficiente",
    }
}

/// Recommendations for a weak dimension
#[must_use]
pub fn recommendations(dimension: Dimension) -> &'static [&'static str] {
    match dimension {
        Dimension::BuildingDensity => &[
            "Melhorar ventilação natural",
            "Limitar novas construções de alta densidade",
        ],
        Dimension::GreenArea => &[
            "Implementar mais áreas verdes",
            "Ampliar a arborização urbana",
        ],
        Dimension::TransportAccess => &[
            "Ampliar a oferta de transporte público",
            "Expandir a rede de ciclovias",
        ],
        Dimension::AirQuality => &[
            "Otimizar fluxo de tráfego",
            "Ampliar a arborização urbana",
        ],
        Dimension::UrbanNoise => &[
            "Otimizar fluxo de tráfego",
            "Implantar barreiras acústicas em vias de grande circulação",
        ],
        Dimension::Sanitation => &[
            "Expandir a rede de coleta e tratamento de esgoto",
            "Ampliar a coleta seletiva",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_dimension_has_recommendations() {
        for dimension in Dimension::ALL {
            assert!(!recommendations(dimension).is_empty());
        }
    }

    #[test]
    fn test_labels_are_distinct() {
        let labels: HashSet<&str> = Dimension::ALL
            .into_iter()
            .flat_map(|d| [strength_label(d), weakness_label(d)])
            .collect();
        assert_eq!(labels.len(), Dimension::ALL.len() * 2);
    }
}
