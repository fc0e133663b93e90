//! Per-dimension score estimation for an arbitrary point
//!
//! Without a live spatial dataset the scores are derived from a table of
//! reference zones (Federal District administrative regions) with known
//! per-dimension profiles. The estimate is a pure function of the point,
//! the radius and the configuration.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use tracing::debug;

use crate::models::{AreaAnalysisRequest, Coordinates, Dimension};

/// Distance at which a zone's profile has faded to `1/e` of its influence
const ZONE_FADE_KM: f64 = 30.0;
/// Radius at which the regional mean and the local blend weigh the same
const SMOOTHING_RADIUS_M: f64 = 5000.0;
/// Profile of a point far away from every reference zone
const BASELINE_SCORE: f64 = 50.0;
/// Floor for the blending distance, so a point on a zone center stays finite
const MIN_BLEND_DISTANCE_KM: f64 = 0.05;

/// Scores for every dimension plus the zone they were anchored on
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub scores: BTreeMap<Dimension, f64>,
    pub reference_zone: Option<String>,
}

/// Produces the 0-100 sub-indicator scores for a request
pub trait DimensionEstimator: Send + Sync {
    fn estimate(&self, request: &AreaAnalysisRequest) -> Estimate;
}

/// A district with a known sustainability profile
#[derive(Debug, Clone)]
pub struct ReferenceZone {
    pub name: &'static str,
    pub center: (f64, f64),
    /// Scores in [`Dimension::ALL`] order
    pub profile: [f64; 6],
}

/// Administrative regions of the Federal District.
///
/// Profiles follow [`Dimension::ALL`]: building density (100 = sparse),
/// green area, transport access, air quality, urban noise (100 = quiet),
/// sanitation.
pub const BRASILIA_ZONES: &[ReferenceZone] = &[
    ReferenceZone {
        name: "Plano Piloto",
        center: (-15.7939, -47.8828),
        profile: [58.0, 82.0, 86.0, 68.0, 52.0, 96.0],
    },
    ReferenceZone {
        name: "Lago Sul",
        center: (-15.8436, -47.8736),
        profile: [90.0, 88.0, 38.0, 84.0, 86.0, 93.0],
    },
    ReferenceZone {
        name: "Águas Claras",
        center: (-15.8400, -48.0261),
        profile: [18.0, 34.0, 78.0, 58.0, 42.0, 91.0],
    },
    ReferenceZone {
        name: "Taguatinga",
        center: (-15.8333, -48.0564),
        profile: [34.0, 38.0, 72.0, 54.0, 36.0, 86.0],
    },
    ReferenceZone {
        name: "Ceilândia",
        center: (-15.8190, -48.1083),
        profile: [30.0, 26.0, 62.0, 50.0, 34.0, 76.0],
    },
    ReferenceZone {
        name: "Samambaia",
        center: (-15.8769, -48.0853),
        profile: [42.0, 30.0, 58.0, 55.0, 46.0, 70.0],
    },
    ReferenceZone {
        name: "Gama",
        center: (-16.0194, -48.0650),
        profile: [56.0, 50.0, 48.0, 70.0, 60.0, 79.0],
    },
    ReferenceZone {
        name: "Sobradinho",
        center: (-15.6533, -47.7911),
        profile: [66.0, 62.0, 44.0, 76.0, 70.0, 74.0],
    },
    ReferenceZone {
        name: "Planaltina",
        center: (-15.6214, -47.6483),
        profile: [62.0, 46.0, 34.0, 73.0, 66.0, 61.0],
    },
];

fn distance_km(a: &Coordinates, (latitude, longitude): (f64, f64)) -> f64 {
    haversine::distance(
        haversine::Location {
            latitude: a.latitude,
            longitude: a.longitude,
        },
        haversine::Location {
            latitude,
            longitude,
        },
        haversine::Units::Kilometers,
    )
}

/// Stable seed from the quantized request and the deployment salt
fn variation_seed(request: &AreaAnalysisRequest, salt: u64) -> u64 {
    let lat = (request.center.latitude * 1e4).round() as i64 as u64;
    let lon = (request.center.longitude * 1e4).round() as i64 as u64;
    let radius = request.radius_m.round() as u64;

    salt ^ lat.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ lon.rotate_left(21).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
        ^ radius.rotate_left(42).wrapping_mul(0x1656_67B1_9E37_79F9)
}

/// Inverse-square-distance blend of zone profiles.
///
/// The blend fades toward a neutral baseline as the nearest zone gets
/// farther away, then toward the regional mean as the radius grows. A
/// seeded local-variation term keeps neighbouring points apart.
pub struct ReferenceZoneEstimator {
    zones: Vec<ReferenceZone>,
    regional_mean: [f64; 6],
    jitter: f64,
    seed: u64,
}

impl ReferenceZoneEstimator {
    pub fn new(zones: Vec<ReferenceZone>, jitter: f64, seed: u64) -> Self {
        let mut regional_mean = [BASELINE_SCORE; 6];
        if !zones.is_empty() {
            for (i, mean) in regional_mean.iter_mut().enumerate() {
                *mean = zones.iter().map(|z| z.profile[i]).sum::<f64>() / zones.len() as f64;
            }
        }
        Self {
            zones,
            regional_mean,
            jitter,
            seed,
        }
    }

    /// Estimator over the Federal District zones
    pub fn brasilia(jitter: f64, seed: u64) -> Self {
        Self::new(BRASILIA_ZONES.to_vec(), jitter, seed)
    }

    fn blend(&self, center: &Coordinates) -> ([f64; 6], Option<(&ReferenceZone, f64)>) {
        let mut nearest: Option<(&ReferenceZone, f64)> = None;
        let mut weighted = [0.0; 6];
        let mut total_weight = 0.0;

        for zone in &self.zones {
            let d = distance_km(center, zone.center);
            if nearest.is_none_or(|(_, best)| d < best) {
                nearest = Some((zone, d));
            }
            let w = 1.0 / d.max(MIN_BLEND_DISTANCE_KM).powi(2);
            for (acc, score) in weighted.iter_mut().zip(zone.profile) {
                *acc += w * score;
            }
            total_weight += w;
        }

        let Some((_, d_min)) = nearest else {
            return ([BASELINE_SCORE; 6], None);
        };

        let proximity = (-d_min / ZONE_FADE_KM).exp();
        let mut local = [0.0; 6];
        for (value, acc) in local.iter_mut().zip(weighted) {
            let idw = acc / total_weight;
            *value = BASELINE_SCORE + (idw - BASELINE_SCORE) * proximity;
        }
        (local, nearest)
    }
}

impl DimensionEstimator for ReferenceZoneEstimator {
    fn estimate(&self, request: &AreaAnalysisRequest) -> Estimate {
        let (local, nearest) = self.blend(&request.center);
        let smoothing = request.radius_m / (request.radius_m + SMOOTHING_RADIUS_M);
        let mut rng = StdRng::seed_from_u64(variation_seed(request, self.seed));

        let mut scores = BTreeMap::new();
        for (i, dimension) in Dimension::ALL.into_iter().enumerate() {
            let mut value = local[i] * (1.0 - smoothing) + self.regional_mean[i] * smoothing;
            if self.jitter > 0.0 {
                value += rng.random_range(-self.jitter..=self.jitter);
            }
            let value = (value.clamp(0.0, 100.0) * 10.0).round() / 10.0;
            scores.insert(dimension, value);
        }

        let reference_zone = nearest
            .filter(|(_, d)| *d <= ZONE_FADE_KM)
            .map(|(zone, _)| zone.name.to_string());

        debug!(
            "Estimated {} around {} (zone: {:?})",
            request.describe(),
            request.center.format(),
            reference_zone
        );

        Estimate {
            scores,
            reference_zone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn request(lat: f64, lon: f64, radius: f64) -> AreaAnalysisRequest {
        AreaAnalysisRequest::new(Coordinates::new(lat, lon).unwrap(), radius).unwrap()
    }

    #[test]
    fn test_identical_requests_identical_scores() {
        let estimator = ReferenceZoneEstimator::brasilia(6.0, 0);
        let a = estimator.estimate(&request(-15.8, -47.9, 500.0));
        let b = estimator.estimate(&request(-15.8, -47.9, 500.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_points_differ() {
        let estimator = ReferenceZoneEstimator::brasilia(6.0, 0);
        let plano = estimator.estimate(&request(-15.7939, -47.8828, 500.0));
        let ceilandia = estimator.estimate(&request(-15.8190, -48.1083, 500.0));
        assert_ne!(plano.scores, ceilandia.scores);
    }

    #[test]
    fn test_seed_changes_variation() {
        let a = ReferenceZoneEstimator::brasilia(6.0, 1).estimate(&request(-15.8, -47.9, 500.0));
        let b = ReferenceZoneEstimator::brasilia(6.0, 2).estimate(&request(-15.8, -47.9, 500.0));
        assert_ne!(a.scores, b.scores);
    }

    #[rstest]
    #[case(-15.8, -47.9, 500.0)]
    #[case(-15.8190, -48.1083, 10.0)]
    #[case(90.0, 180.0, 50_000.0)]
    #[case(-90.0, -180.0, 1.0)]
    #[case(0.0, 0.0, 1000.0)]
    fn test_scores_in_range_and_rounded(#[case] lat: f64, #[case] lon: f64, #[case] radius: f64) {
        let estimator = ReferenceZoneEstimator::brasilia(25.0, 7);
        let estimate = estimator.estimate(&request(lat, lon, radius));
        assert_eq!(estimate.scores.len(), Dimension::ALL.len());
        for score in estimate.scores.values() {
            assert!((0.0..=100.0).contains(score));
            assert!(((score * 10.0).round() - score * 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zone_profile_dominates_at_its_center() {
        let estimator = ReferenceZoneEstimator::brasilia(0.0, 0);
        let estimate = estimator.estimate(&request(-15.8436, -47.8736, 1.0));
        assert_eq!(estimate.reference_zone.as_deref(), Some("Lago Sul"));
        let green = estimate.scores[&Dimension::GreenArea];
        assert!((green - 88.0).abs() < 1.0, "green area was {green}");
    }

    #[test]
    fn test_far_points_have_no_reference_zone() {
        let estimator = ReferenceZoneEstimator::brasilia(0.0, 0);
        let estimate = estimator.estimate(&request(-23.5505, -46.6333, 1000.0));
        assert!(estimate.reference_zone.is_none());
        for score in estimate.scores.values() {
            assert!((score - BASELINE_SCORE).abs() < 10.0);
        }
    }

    #[test]
    fn test_large_radius_tends_to_regional_mean() {
        let estimator = ReferenceZoneEstimator::brasilia(0.0, 0);
        let small = estimator.estimate(&request(-15.8436, -47.8736, 10.0));
        let large = estimator.estimate(&request(-15.8436, -47.8736, 50_000.0));
        let mean = estimator.regional_mean[1];
        let green_small = small.scores[&Dimension::GreenArea];
        let green_large = large.scores[&Dimension::GreenArea];
        assert!((green_large - mean).abs() < (green_small - mean).abs());
    }

    #[test]
    fn test_empty_zone_table_uses_baseline() {
        let estimator = ReferenceZoneEstimator::new(Vec::new(), 0.0, 0);
        let estimate = estimator.estimate(&request(-15.8, -47.9, 500.0));
        assert!(estimate.reference_zone.is_none());
        assert!(estimate.scores.values().all(|s| *s == BASELINE_SCORE));
    }
}
