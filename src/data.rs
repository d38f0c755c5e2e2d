use crate::config::InputConfig;
use crate::error::LoadError;
use crate::types::{County, School};
use geo::{MultiPolygon, Point};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, Value};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

pub const COUNTY_NAME: &str = "Name";
pub const COUNTY_POPULATION: &str = "population";
pub const SCHOOL_NAME: &str = "Institution_Name_Line1";
pub const SCHOOL_ADDRESS: &str = "Mail_Address_Line1";
pub const SCHOOL_CITY: &str = "Mail_City";

/// Where an input document lives.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Path(PathBuf),
    Url(String),
}

impl Source {
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Source::Url(location.to_string())
        } else {
            Source::Path(PathBuf::from(location))
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Path(path) => write!(f, "{}", path.display()),
            Source::Url(url) => f.write_str(url),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Datasets {
    pub counties: Vec<County>,
    pub schools: Vec<School>,
}

/// Fetch both documents concurrently. Either failure fails the whole load.
pub async fn load_datasets(input: &InputConfig) -> Result<Datasets, LoadError> {
    let timeout = input.fetch_timeout_secs.map(Duration::from_secs);
    let county_source = Source::parse(&input.counties);
    let school_source = Source::parse(&input.schools);

    info!(counties = %county_source, schools = %school_source, "Loading GeoJSON inputs");

    let (county_fc, school_fc) = tokio::try_join!(
        fetch_collection(&county_source, timeout),
        fetch_collection(&school_source, timeout),
    )?;

    let counties: Vec<County> = county_fc.features.into_iter().map(county_from_feature).collect();
    let schools: Vec<School> = school_fc.features.into_iter().map(school_from_feature).collect();

    info!(counties = counties.len(), schools = schools.len(), "Loaded features");

    Ok(Datasets { counties, schools })
}

async fn fetch_collection(
    source: &Source,
    timeout: Option<Duration>,
) -> Result<FeatureCollection, LoadError> {
    let fetch = fetch_bytes(source);
    let bytes = match timeout {
        Some(limit) => tokio::time::timeout(limit, fetch)
            .await
            .map_err(|_| LoadError::Timeout(source.to_string()))??,
        None => fetch.await?,
    };
    parse_collection(&bytes, &source.to_string())
}

async fn fetch_bytes(source: &Source) -> Result<Vec<u8>, LoadError> {
    match source {
        Source::Path(path) => tokio::fs::read(path).await.map_err(|e| LoadError::Io {
            path: path.display().to_string(),
            source: e,
        }),
        Source::Url(url) => {
            let response = reqwest::get(url).await?.error_for_status()?;
            Ok(response.bytes().await?.to_vec())
        }
    }
}

pub fn parse_collection(bytes: &[u8], source_name: &str) -> Result<FeatureCollection, LoadError> {
    let geojson = GeoJson::from_reader(bytes).map_err(|e| LoadError::Parse {
        source_name: source_name.to_string(),
        source: e,
    })?;

    match geojson {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        _ => Err(LoadError::NotFeatureCollection(source_name.to_string())),
    }
}

pub fn county_from_feature(feature: Feature) -> County {
    let properties = feature.properties.unwrap_or_default();
    let shape = feature.geometry.as_ref().and_then(|g| polygon_shape(&g.value));

    County {
        name: string_property(&properties, COUNTY_NAME),
        population: number_property(&properties, COUNTY_POPULATION),
        geometry: feature.geometry,
        shape,
        properties,
    }
}

pub fn school_from_feature(feature: Feature) -> School {
    let properties = feature.properties.unwrap_or_default();
    let location = feature.geometry.as_ref().and_then(|g| point_location(&g.value));

    School {
        name: string_property(&properties, SCHOOL_NAME),
        address: string_property(&properties, SCHOOL_ADDRESS),
        city: string_property(&properties, SCHOOL_CITY),
        geometry: feature.geometry,
        location,
        properties,
    }
}

fn to_geo(value: &Value) -> Option<geo::Geometry<f64>> {
    match geo::Geometry::<f64>::try_from(value.clone()) {
        Ok(g) => Some(g),
        Err(e) => {
            debug!("Skipping unconvertible geometry: {:?}", e);
            None
        }
    }
}

fn polygon_shape(value: &Value) -> Option<MultiPolygon<f64>> {
    match value {
        Value::Polygon(_) | Value::MultiPolygon(_) => match to_geo(value)? {
            geo::Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p])),
            geo::Geometry::MultiPolygon(mp) => Some(mp),
            _ => None,
        },
        _ => None,
    }
}

fn point_location(value: &Value) -> Option<Point<f64>> {
    match value {
        Value::Point(_) => match to_geo(value)? {
            geo::Geometry::Point(p) => Some(p),
            _ => None,
        },
        _ => None,
    }
}

// Empty strings count as missing so placeholders kick in
fn string_property(properties: &JsonObject, key: &str) -> Option<String> {
    match properties.get(key)? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_property(properties: &JsonObject, key: &str) -> Option<f64> {
    let value = match properties.get(key)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}
