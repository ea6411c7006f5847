//! Basemap descriptors: plain configuration mappings describing tile
//! services, convertible into tile layers by the model crate.
//!
//! Time-aware services put a `%s` date placeholder in their url; it is
//! resolved against an explicit day or "yesterday" at materialization time.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

/// Plain description of a tile service.
///
/// Unknown input keys are tolerated and ignored, mirroring how descriptor
/// catalogs grow fields over time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Basemap {
    pub url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub attribution: String,
    #[serde(default = "default_min_zoom")]
    pub min_zoom: i64,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: i64,
}

fn default_min_zoom() -> i64 {
    1
}

fn default_max_zoom() -> i64 {
    19
}

impl Basemap {
    /// Parses a descriptor from a plain JSON mapping.
    pub fn from_value(value: serde_json::Value) -> Result<Basemap, CatalogError> {
        serde_json::from_value(value).map_err(|e| CatalogError::Invalid(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    Invalid(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Invalid(msg) => write!(f, "invalid basemap descriptor: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// Tile date selector for time-aware services.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Day {
    /// The current date minus one day, resolved at materialization time.
    #[default]
    Yesterday,
    /// Explicit `YYYY-MM-DD` date.
    On(String),
}

impl Day {
    pub fn resolve(&self) -> String {
        match self {
            Day::Yesterday => {
                let yesterday = Utc::now().date_naive() - Duration::days(1);
                yesterday.format("%Y-%m-%d").to_string()
            }
            Day::On(date) => date.clone(),
        }
    }
}

/// Substitutes the `%s` date placeholder, if the url carries one.
pub fn resolve_url(url: &str, day: &Day) -> String {
    if url.contains("%s") {
        url.replace("%s", &day.resolve())
    } else {
        url.to_string()
    }
}

pub fn open_street_map_mapnik() -> Basemap {
    Basemap {
        url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
        name: "OpenStreetMap.Mapnik".to_string(),
        attribution: "Map data (c) OpenStreetMap contributors".to_string(),
        min_zoom: 1,
        max_zoom: 19,
    }
}

pub fn open_topo_map() -> Basemap {
    Basemap {
        url: "https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png".to_string(),
        name: "OpenTopoMap".to_string(),
        attribution: "Map data (c) OpenStreetMap contributors, SRTM; style (c) OpenTopoMap"
            .to_string(),
        min_zoom: 1,
        max_zoom: 17,
    }
}

pub fn nasa_gibs_modis_terra_true_color() -> Basemap {
    Basemap {
        url: "https://gibs.earthdata.nasa.gov/wmts/epsg3857/best/MODIS_Terra_CorrectedReflectance_TrueColor/default/%s/GoogleMapsCompatible_Level9/{z}/{y}/{x}.jpg".to_string(),
        name: "NASAGIBS.ModisTerraTrueColorCR".to_string(),
        attribution: "Imagery provided by NASA EOSDIS GIBS".to_string(),
        min_zoom: 1,
        max_zoom: 9,
    }
}

#[cfg(test)]
mod tests {
    use super::{Basemap, Day, nasa_gibs_modis_terra_true_color, resolve_url};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn placeholder_resolves_against_explicit_day() {
        let url = "https://x/%s/{z}/{x}/{y}.png";
        assert_eq!(
            resolve_url(url, &Day::On("2020-01-01".to_string())),
            "https://x/2020-01-01/{z}/{x}/{y}.png"
        );
    }

    #[test]
    fn url_without_placeholder_is_untouched() {
        let url = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
        assert_eq!(resolve_url(url, &Day::default()), url);
    }

    #[test]
    fn yesterday_resolves_to_a_date() {
        let day = Day::Yesterday.resolve();
        assert_eq!(day.len(), 10);
        assert_eq!(day.matches('-').count(), 2);
    }

    #[test]
    fn descriptor_parses_with_defaults_and_extra_keys() {
        let basemap = Basemap::from_value(json!({
            "url": "https://x/{z}/{x}/{y}.png",
            "name": "X",
            "html_attribution": "ignored",
        }))
        .unwrap();
        assert_eq!(basemap.min_zoom, 1);
        assert_eq!(basemap.max_zoom, 19);
        assert_eq!(basemap.attribution, "");
    }

    #[test]
    fn descriptor_without_url_is_invalid() {
        assert!(Basemap::from_value(json!({"name": "X"})).is_err());
    }

    #[test]
    fn builtin_gibs_descriptor_is_time_aware() {
        assert!(nasa_gibs_modis_terra_true_color().url.contains("%s"));
    }
}
