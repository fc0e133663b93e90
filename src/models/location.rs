//! Location model for geographic coordinates and metadata

use serde::{Deserialize, Serialize, Serializer};

use crate::{Result, UrbanSimError};

/// Geographic point in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in decimal degrees
    #[serde(alias = "lat")]
    pub latitude: f64,
    /// Longitude in decimal degrees
    #[serde(alias = "lon", alias = "lng")]
    pub longitude: f64,
}

impl Coordinates {
    /// Create validated coordinates
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let coordinates = Self {
            latitude,
            longitude,
        };
        coordinates.validate("coordenadas")?;
        Ok(coordinates)
    }

    /// Check the latitude/longitude ranges, naming `field` in the error
    pub fn validate(&self, field: &str) -> Result<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(UrbanSimError::validation(
                format!("{field}.lat"),
                format!("latitude {} outside [-90, 90]", self.latitude),
            ));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(UrbanSimError::validation(
                format!("{field}.lon"),
                format!("longitude {} outside [-180, 180]", self.longitude),
            ));
        }
        Ok(())
    }

    /// Format as a coordinate string
    #[must_use]
    pub fn format(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Short `{lat, lon}` form used by the climate and area-analysis payloads
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl From<Coordinates> for LatLon {
    fn from(coordinates: Coordinates) -> Self {
        Self {
            lat: coordinates.latitude,
            lon: coordinates.longitude,
        }
    }
}

/// Serialize [`Coordinates`] in the short `{lat, lon}` form
pub fn serialize_lat_lon<S: Serializer>(
    coordinates: &Coordinates,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    LatLon::from(*coordinates).serialize(serializer)
}

/// A named place
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Location name (city, district, station)
    pub name: String,
    /// Country code (ISO 3166-1 alpha-2)
    pub country_code: Option<String>,
    /// Position of the place
    pub coordinates: Coordinates,
}

impl Location {
    /// Create a validated location
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            country_code: None,
            coordinates: Coordinates::new(latitude, longitude)?,
        })
    }

    /// Create a validated location with country
    pub fn with_country(
        name: impl Into<String>,
        country_code: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Result<Self> {
        let mut location = Self::new(name, latitude, longitude)?;
        location.country_code = Some(country_code.into());
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_location_with_country() {
        let location = Location::with_country("Brasília", "BR", -15.8267, -47.9218).unwrap();
        assert_eq!(location.country_code.as_deref(), Some("BR"));
        assert_eq!(location.coordinates.format(), "-15.8267, -47.9218");
    }

    #[rstest]
    #[case(91.0, 0.0, "coordenadas.lat")]
    #[case(-90.5, 0.0, "coordenadas.lat")]
    #[case(f64::NAN, 0.0, "coordenadas.lat")]
    #[case(0.0, 180.1, "coordenadas.lon")]
    #[case(0.0, f64::INFINITY, "coordenadas.lon")]
    fn test_invalid_coordinates(#[case] lat: f64, #[case] lon: f64, #[case] field: &str) {
        match Coordinates::new(lat, lon) {
            Err(UrbanSimError::Validation { field: f, .. }) => assert_eq!(f, field),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_short_and_long_keys_deserialize() {
        let short: Coordinates = serde_json::from_str(r#"{"lat": -15.8, "lon": -47.9}"#).unwrap();
        let long: Coordinates =
            serde_json::from_str(r#"{"latitude": -15.8, "longitude": -47.9}"#).unwrap();
        assert_eq!(short, long);
    }
}
