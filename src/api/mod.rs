//! HTTP routes of the urban simulator API

use std::sync::Arc;

use axum::{
    Router,
    extract::{OriginalUri, Path, State, rejection::JsonRejection},
    http::{StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::{MethodRouter, get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error};

use crate::analysis::AreaAnalyzer;
use crate::config::UrbanSimConfig;
use crate::maps::{self, TileLayer};
use crate::models::{AreaAnalysisRequest, AreaAnalysisResult, Coordinates};
use crate::provider::IndicatorCategory;
use crate::service::IndicatorService;
use crate::{UrbanSimError, VERSION};

const SERVICE_MESSAGE: &str = "API do Simulador Urbano - NASA Space Apps";

/// Shared, immutable application state
pub struct AppState {
    pub indicators: IndicatorService,
    pub analyzer: AreaAnalyzer,
}

impl AppState {
    pub fn from_config(config: &UrbanSimConfig) -> anyhow::Result<Self> {
        Ok(Self {
            indicators: IndicatorService::from_config(config)?,
            analyzer: AreaAnalyzer::from_config(&config.analysis),
        })
    }
}

#[derive(Serialize)]
pub struct Liveness {
    pub message: &'static str,
    pub status: &'static str,
    pub versao: &'static str,
    pub cidades_suportadas: Vec<String>,
}

/// Body of `POST /api/analise-area`.
///
/// Fields are kept loose so a bad field is reported by name.
#[derive(Debug, Deserialize)]
pub struct AreaAnalysisPayload {
    #[serde(default)]
    pub coordenadas: Option<Value>,
    #[serde(default)]
    pub raio: Option<Value>,
}

impl IntoResponse for UrbanSimError {
    fn into_response(self) -> Response {
        let status = match &self {
            UrbanSimError::NotServable { .. } | UrbanSimError::UnknownRoute { .. } => {
                StatusCode::NOT_FOUND
            }
            UrbanSimError::Validation { .. } => StatusCode::BAD_REQUEST,
            UrbanSimError::Config { .. }
            | UrbanSimError::Internal { .. }
            | UrbanSimError::Io { .. } => {
                error!("Request failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.user_message() }))).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let mut api = Router::new()
        .route("/mapas/{tipo}", get(get_tile_layer))
        .route("/analise-area", post(analyze_area));
    for category in IndicatorCategory::ALL {
        let path = format!("/{}/{{cidade}}", category.as_str());
        api = api.route(&path, indicator_route(category));
    }
    let api = api.fallback(unknown_api_route);

    Router::new()
        .route("/", get(liveness))
        .nest("/api", api)
        .with_state(state)
}

/// `GET /api/{category}/{cidade}` for one indicator category
fn indicator_route(category: IndicatorCategory) -> MethodRouter<Arc<AppState>> {
    get(
        move |State(state): State<Arc<AppState>>, Path(cidade): Path<String>| async move {
            state.indicators.build(&cidade, category).await.map(Json)
        },
    )
}

/// JSON 404 for unmatched `/api` paths.
///
/// An indicator path with an empty city segment is reported like any other
/// unservable city.
async fn unknown_api_route(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    OriginalUri(original): OriginalUri,
) -> UrbanSimError {
    let mut segments = uri.path().trim_matches('/').split('/');
    let category = segments.next().unwrap_or_default();
    let city = segments.next().unwrap_or_default();
    let is_indicator = IndicatorCategory::ALL
        .iter()
        .any(|c| c.as_str() == category);

    if is_indicator && city.is_empty() && segments.next().is_none() {
        UrbanSimError::not_servable("", state.indicators.resolver().supported_names())
    } else {
        UrbanSimError::unknown_route(original.path())
    }
}

async fn liveness(State(state): State<Arc<AppState>>) -> Json<Liveness> {
    Json(Liveness {
        message: SERVICE_MESSAGE,
        status: "online",
        versao: VERSION,
        cidades_suportadas: state.indicators.resolver().supported_names(),
    })
}

async fn get_tile_layer(Path(tipo): Path<String>) -> Json<TileLayer> {
    Json(maps::tile_layer(&tipo))
}

async fn analyze_area(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AreaAnalysisPayload>, JsonRejection>,
) -> Result<Json<AreaAnalysisResult>, UrbanSimError> {
    let Json(payload) =
        payload.map_err(|rejection| UrbanSimError::validation("body", rejection.body_text()))?;
    let request = parse_analysis_request(payload, state.analyzer.default_radius_m())?;
    debug!("Analysing {} around {}", request.describe(), request.center.format());
    state.analyzer.analyze(&request).map(Json)
}

fn parse_analysis_request(
    payload: AreaAnalysisPayload,
    default_radius_m: f64,
) -> Result<AreaAnalysisRequest, UrbanSimError> {
    let center = match payload.coordenadas {
        None | Some(Value::Null) => {
            return Err(UrbanSimError::validation(
                "coordenadas",
                "missing center coordinates",
            ));
        }
        Some(value) => serde_json::from_value::<Coordinates>(value)
            .map_err(|e| UrbanSimError::validation("coordenadas", e.to_string()))?,
    };

    let radius_m = match payload.raio {
        None | Some(Value::Null) => default_radius_m,
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| UrbanSimError::validation("raio", "radius is not a number"))?,
        Some(other) => {
            return Err(UrbanSimError::validation(
                "raio",
                format!("radius must be a number, got {other}"),
            ));
        }
    };

    AreaAnalysisRequest::new(center, radius_m)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(value: Value) -> AreaAnalysisPayload {
        serde_json::from_value(value).unwrap()
    }

    fn field_of(result: Result<AreaAnalysisRequest, UrbanSimError>) -> String {
        match result {
            Err(UrbanSimError::Validation { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_short_keys() {
        let request = parse_analysis_request(
            payload(json!({"coordenadas": {"lat": -15.8, "lon": -47.9}, "raio": 500})),
            1000.0,
        )
        .unwrap();
        assert_eq!(request.center.latitude, -15.8);
        assert_eq!(request.radius_m, 500.0);
    }

    #[test]
    fn test_parse_long_keys_and_default_radius() {
        let request = parse_analysis_request(
            payload(json!({"coordenadas": {"latitude": -15.8, "longitude": -47.9}})),
            1000.0,
        )
        .unwrap();
        assert_eq!(request.radius_m, 1000.0);
    }

    #[test]
    fn test_missing_coordinates_named() {
        let result = parse_analysis_request(payload(json!({"raio": 500})), 1000.0);
        assert_eq!(field_of(result), "coordenadas");
    }

    #[test]
    fn test_out_of_range_latitude_named() {
        let result = parse_analysis_request(
            payload(json!({"coordenadas": {"lat": 95.0, "lon": -47.9}, "raio": 500})),
            1000.0,
        );
        assert_eq!(field_of(result), "coordenadas.lat");
    }

    #[test]
    fn test_non_numeric_radius_named() {
        let result = parse_analysis_request(
            payload(json!({"coordenadas": {"lat": -15.8, "lon": -47.9}, "raio": "grande"})),
            1000.0,
        );
        assert_eq!(field_of(result), "raio");
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (
                UrbanSimError::not_servable("saopaulo", vec!["Brasília".to_string()]),
                StatusCode::NOT_FOUND,
            ),
            (
                UrbanSimError::unknown_route("/api/desconhecido"),
                StatusCode::NOT_FOUND,
            ),
            (
                UrbanSimError::validation("raio", "negative"),
                StatusCode::BAD_REQUEST,
            ),
            (
                UrbanSimError::internal("estimator broke"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
