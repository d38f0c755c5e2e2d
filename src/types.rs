use geo::{MultiPolygon, Point};
use geojson::JsonObject;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct County {
    pub name: Option<String>,
    pub population: Option<f64>,
    /// Geometry exactly as received, echoed back in the rendered layer
    pub geometry: Option<geojson::Geometry>,
    // None unless the input was a Polygon or MultiPolygon
    pub shape: Option<MultiPolygon<f64>>,
    pub properties: JsonObject,
}

#[derive(Debug, Clone)]
pub struct School {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub geometry: Option<geojson::Geometry>,
    // None unless the input was a Point
    pub location: Option<Point<f64>>,
    pub properties: JsonObject,
}

/// Derived per-county numbers, attached to a county without touching it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SchoolMetrics {
    pub school_count: u32,
    pub schools_per_capita: f64,
}

#[derive(Debug, Clone)]
pub struct DecoratedCounty<'a> {
    pub county: &'a County,
    pub metrics: SchoolMetrics,
}

/// Which derived number drives a map's colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    SchoolCount,
    SchoolsPerCapita,
}

impl Metric {
    pub fn value(&self, metrics: &SchoolMetrics) -> f64 {
        match self {
            Metric::SchoolCount => metrics.school_count as f64,
            Metric::SchoolsPerCapita => metrics.schools_per_capita,
        }
    }
}
