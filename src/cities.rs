//! City resolution
//!
//! Maps free-text city identifiers ("Brasília", "BRASILIA", " bsb ") onto the
//! canonical keys of the configured city table. The same normalization is
//! applied to configured aliases and to incoming requests.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::config::CityConfig;
use crate::models::Coordinates;
use crate::{Result, UrbanSimError};

/// Normalized identifier of a servable city
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CityKey(String);

impl CityKey {
    pub fn new(key: &str) -> Self {
        Self(normalize(key))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A resolved, servable city
#[derive(Debug, Clone, PartialEq)]
pub struct City {
    pub key: CityKey,
    pub display_name: String,
    pub country_code: String,
    pub center: Coordinates,
}

/// Fold a Latin letter with diacritics onto its base letter
fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// Normalizes a city identifier.
///
/// The pipeline:
/// 1. Lowercase
/// 2. Fold diacritics (`í` -> `i`, `ç` -> `c`, ...)
/// 3. Treat `-`, `_` and `.` as word separators
/// 4. Collapse whitespace and trim
#[must_use]
pub fn normalize(input: &str) -> String {
    let folded: String = input
        .to_lowercase()
        .chars()
        .map(fold_diacritic)
        .map(|c| if matches!(c, '-' | '_' | '.') { ' ' } else { c })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves city identifiers against the configured city table
#[derive(Debug, Clone)]
pub struct CityResolver {
    cities: BTreeMap<CityKey, City>,
    aliases: HashMap<String, CityKey>,
}

impl CityResolver {
    /// Build the resolver from the `cities` configuration table
    pub fn from_config(table: &BTreeMap<String, CityConfig>) -> Result<Self> {
        let mut cities = BTreeMap::new();
        let mut aliases = HashMap::new();

        for (key, city) in table {
            let canonical = CityKey::new(key);
            let center = Coordinates::new(city.latitude, city.longitude)?;

            let names = std::iter::once(key.as_str())
                .chain(std::iter::once(city.display_name.as_str()))
                .chain(city.aliases.iter().map(String::as_str));
            for name in names {
                let alias = normalize(name);
                if alias.is_empty() {
                    continue;
                }
                if let Some(owner) = aliases.get(&alias) {
                    if owner != &canonical {
                        return Err(UrbanSimError::config(format!(
                            "Alias '{name}' is claimed by both '{owner}' and '{canonical}'"
                        )));
                    }
                }
                aliases.insert(alias, canonical.clone());
            }

            cities.insert(
                canonical.clone(),
                City {
                    key: canonical,
                    display_name: city.display_name.clone(),
                    country_code: city.country_code.clone(),
                    center,
                },
            );
        }

        Ok(Self { cities, aliases })
    }

    /// Resolve free text to a servable city
    pub fn resolve(&self, input: &str) -> Result<&City> {
        let alias = normalize(input);
        let city = self
            .aliases
            .get(&alias)
            .and_then(|key| self.cities.get(key));

        match city {
            Some(city) => {
                debug!("Resolved city input '{}' to '{}'", input, city.key);
                Ok(city)
            }
            None => {
                debug!("City input '{}' is not servable", input);
                Err(UrbanSimError::not_servable(input, self.supported_names()))
            }
        }
    }

    /// Display names of every servable city
    #[must_use]
    pub fn supported_names(&self) -> Vec<String> {
        self.cities
            .values()
            .map(|city| city.display_name.clone())
            .collect()
    }

    pub fn cities(&self) -> impl Iterator<Item = &City> {
        self.cities.values()
    }
}
