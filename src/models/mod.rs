//! Data models for the urban simulator
//!
//! This module contains the typed records served by the API, organized by concern:
//! - Location: geographic coordinates and named places
//! - Climate: current weather snapshots
//! - Pollution: pollutant readings and monitoring stations
//! - Indicators: fixed-shape category bundles (traffic, heat islands, ...)
//! - Analysis: area analysis requests and results

pub mod analysis;
pub mod climate;
pub mod indicators;
pub mod location;
pub mod pollution;

// Re-export all public types for convenient access
pub use analysis::{AreaAnalysisRequest, AreaAnalysisResult, Dimension};
pub use climate::ClimateSnapshot;
pub use indicators::{
    FeedbackBundle, GreenResourcesBundle, HeatIslandBundle, SanitationEnergyBundle, TrafficBundle,
    UrbanIndicators,
};
pub use location::{Coordinates, LatLon, Location};
pub use pollution::{MonitoringStation, Pollutant, PollutantReading};
