//! Area analysis scoring engine
//!
//! Scores the area around a point on six sustainability dimensions, combines
//! them into a weighted composite and turns weak dimensions into
//! recommendations.

pub mod estimator;
pub mod rules;

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, instrument};

use crate::config::AnalysisConfig;
use crate::models::{AreaAnalysisRequest, AreaAnalysisResult, Dimension};
use crate::{Result, UrbanSimError};

pub use estimator::{DimensionEstimator, Estimate, ReferenceZone, ReferenceZoneEstimator};

pub struct AreaAnalyzer {
    estimator: Box<dyn DimensionEstimator>,
    config: AnalysisConfig,
}

impl AreaAnalyzer {
    pub fn new(config: AnalysisConfig, estimator: Box<dyn DimensionEstimator>) -> Self {
        Self { estimator, config }
    }

    /// Analyzer over the Federal District reference zones
    pub fn from_config(config: &AnalysisConfig) -> Self {
        let estimator = ReferenceZoneEstimator::brasilia(config.jitter, config.seed);
        Self::new(config.clone(), Box::new(estimator))
    }

    /// Radius used when the caller gives none
    #[must_use]
    pub fn default_radius_m(&self) -> f64 {
        self.config.default_radius_m
    }

    #[instrument(skip(self), fields(lat = request.center.latitude, lon = request.center.longitude))]
    pub fn analyze(&self, request: &AreaAnalysisRequest) -> Result<AreaAnalysisResult> {
        request.validate()?;
        if request.radius_m > self.config.max_radius_m {
            return Err(UrbanSimError::validation(
                "raio",
                format!(
                    "radius cannot exceed {} meters, got {}",
                    self.config.max_radius_m, request.radius_m
                ),
            ));
        }

        let estimate = self.estimator.estimate(request);
        let scores = checked_scores(estimate.scores)?;

        let composite_score = self.composite(&scores)?;

        let mut strengths = Vec::new();
        let mut weaknesses = Vec::new();
        let mut recommendations: Vec<String> = Vec::new();
        for dimension in Dimension::ALL {
            let score = scores[&dimension];
            if score >= self.config.strength_threshold {
                strengths.push(rules::strength_label(dimension).to_string());
            } else if score < self.config.weakness_threshold {
                weaknesses.push(rules::weakness_label(dimension).to_string());
                for text in rules::recommendations(dimension) {
                    if !recommendations.iter().any(|r| r == text) {
                        recommendations.push((*text).to_string());
                    }
                }
            }
        }
        if recommendations.is_empty() {
            recommendations.push(rules::MAINTENANCE_RECOMMENDATION.to_string());
        }

        debug!(
            "Composite {:.1} with {} strengths and {} weaknesses",
            composite_score,
            strengths.len(),
            weaknesses.len()
        );

        Ok(AreaAnalysisResult {
            area_description: request.describe(),
            center: request.center,
            reference_zone: estimate.reference_zone,
            sub_indicators: scores,
            strengths,
            weaknesses,
            recommendations,
            composite_score,
            computed_at: Utc::now(),
        })
    }

    /// Weighted mean of the sub-indicators.
    ///
    /// Validated weights sum to 1 within a small tolerance, so this equals
    /// the configured weighted sum while staying inside [0, 100].
    fn composite(&self, scores: &BTreeMap<Dimension, f64>) -> Result<f64> {
        let weights = &self.config.weights;
        let total = weights.total();
        if !total.is_finite() || total <= 0.0 {
            return Err(UrbanSimError::internal(format!(
                "Analysis weights sum to {total}"
            )));
        }

        let weighted = Dimension::ALL
            .iter()
            .map(|d| weights.weight(*d) * scores[d])
            .sum::<f64>();
        Ok((weighted / total).clamp(0.0, 100.0))
    }
}

/// Every dimension present, finite and within [0, 100]
fn checked_scores(scores: BTreeMap<Dimension, f64>) -> Result<BTreeMap<Dimension, f64>> {
    for dimension in Dimension::ALL {
        match scores.get(&dimension) {
            Some(score) if score.is_finite() && (0.0..=100.0).contains(score) => {}
            Some(score) => {
                return Err(UrbanSimError::internal(format!(
                    "Estimator produced {score} for {dimension}"
                )));
            }
            None => {
                return Err(UrbanSimError::internal(format!(
                    "Estimator produced no score for {dimension}"
                )));
            }
        }
    }
    Ok(scores)
}
