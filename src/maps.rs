//! Base-map tile layers offered to the dashboard

use serde::Serialize;

/// A tile layer as consumed by Leaflet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileLayer {
    pub url: &'static str,
    pub attribution: &'static str,
}

const OPEN_STREET_MAP: TileLayer = TileLayer {
    url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
    attribution: "OpenStreetMap",
};

const OPEN_TOPO_MAP: TileLayer = TileLayer {
    url: "https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png",
    attribution: "OpenTopoMap",
};

/// Layer names and their tiles; the last entry is the default
pub const TILE_LAYERS: &[(&str, TileLayer)] = &[
    ("satelite", OPEN_TOPO_MAP),
    ("transito", OPEN_STREET_MAP),
    ("terreno", OPEN_TOPO_MAP),
    ("padrao", OPEN_STREET_MAP),
];

pub const DEFAULT_LAYER: &str = "padrao";

/// Layer named `kind`, or the default layer for unknown names
#[must_use]
pub fn tile_layer(kind: &str) -> TileLayer {
    let kind = kind.trim().to_lowercase();
    TILE_LAYERS
        .iter()
        .find(|(name, _)| *name == kind)
        .or_else(|| TILE_LAYERS.iter().find(|(name, _)| *name == DEFAULT_LAYER))
        .map_or(OPEN_STREET_MAP, |(_, layer)| *layer)
}
