//! `urbansim` - Urban simulator API
//!
//! This library provides city-level urban indicators (climate, air quality,
//! traffic, heat islands, green resources, sanitation and citizen feedback)
//! for a configured set of cities, and a sustainability analysis for the
//! area around any point.

pub mod aggregator;
pub mod analysis;
pub mod api;
pub mod cities;
pub mod config;
pub mod error;
pub mod logging;
pub mod maps;
pub mod models;
pub mod provider;
pub mod service;
pub mod web;

// Re-export core types for public API
pub use analysis::AreaAnalyzer;
pub use api::AppState;
pub use cities::{City, CityKey, CityResolver};
pub use config::UrbanSimConfig;
pub use error::UrbanSimError;
pub use models::{AreaAnalysisRequest, AreaAnalysisResult, Coordinates, Dimension};
pub use provider::{DataProvider, FallbackChain, IndicatorCategory};
pub use service::IndicatorService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, UrbanSimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
