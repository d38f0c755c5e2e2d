use crate::classify::BreakpointTable;
use crate::config::{AppConfig, MapConfig};
use crate::html::INDEX_HTML;
use crate::legend::{build_legend, Legend};
use crate::types::{County, DecoratedCounty, Metric, School, SchoolMetrics};
use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, JsonObject};
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

// Placeholders for missing properties
pub const UNNAMED_COUNTY: &str = "Unnamed County";
pub const UNNAMED_SCHOOL: &str = "Unnamed School";
pub const NO_ADDRESS: &str = "No Address";
pub const NO_CITY: &str = "No City";
pub const NO_POPULATION: &str = "N/A";

const COUNTY_STROKE: &str = "#000";
const COUNTY_STROKE_WEIGHT: f64 = 1.0;
const COUNTY_FILL_OPACITY: f64 = 0.7;

const MARKER_RADIUS: f64 = 2.0;
const MARKER_FILL: &str = "#ff7800";

/// Leaflet path options for a county polygon.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStyle {
    pub color: String,
    pub weight: f64,
    pub fill_color: String,
    pub fill_opacity: f64,
}

/// Leaflet circle-marker options for a school.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerStyle {
    pub radius: f64,
    pub fill_color: String,
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
    pub fill_opacity: f64,
}

impl MarkerStyle {
    pub fn school(fill_opacity: f64) -> Self {
        Self {
            radius: MARKER_RADIUS,
            fill_color: MARKER_FILL.to_string(),
            color: COUNTY_STROKE.to_string(),
            weight: 1.0,
            opacity: 1.0,
            fill_opacity,
        }
    }
}

/// Text shown in a school popup when a mailing field is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct SchoolPlaceholders {
    pub address: String,
    pub city: String,
}

impl Default for SchoolPlaceholders {
    fn default() -> Self {
        Self {
            address: NO_ADDRESS.to_string(),
            city: NO_CITY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileLayer {
    pub url: String,
    pub attribution: String,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

/// Everything a page needs to draw one map. Built once per view and owned
/// by the caller; nothing is kept in module state.
#[derive(Debug, Clone)]
pub struct MapView {
    pub id: String,
    pub title: String,
    pub center: [f64; 2],
    pub zoom: u8,
    pub tiles: TileLayer,
    pub legend_position: String,
    pub counties: FeatureCollection,
    pub schools: FeatureCollection,
    pub legend: Legend,
}

/// Entry of `maps.json`, the index the page reads before fetching layers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSummary<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub center: [f64; 2],
    pub zoom: u8,
    pub tiles: &'a TileLayer,
    pub legend_position: &'a str,
}

impl MapView {
    pub fn summary(&self) -> ViewSummary<'_> {
        ViewSummary {
            id: &self.id,
            title: &self.title,
            center: self.center,
            zoom: self.zoom,
            tiles: &self.tiles,
            legend_position: &self.legend_position,
        }
    }
}

pub fn build_view(
    config: &AppConfig,
    map: &MapConfig,
    counties: &[DecoratedCounty<'_>],
    schools: &[School],
) -> Result<MapView> {
    let table = map.table()?;
    let marker = MarkerStyle::school(map.marker_fill_opacity);
    let placeholders = map.school_placeholders();

    let county_features = counties
        .iter()
        .map(|d| county_feature(d, map.metric, &table))
        .collect();

    // Only schools with a usable point get a marker
    let school_features = schools
        .iter()
        .filter(|s| s.location.is_some())
        .map(|s| school_feature(s, &marker, &placeholders, &config.display.state_suffix))
        .collect();

    Ok(MapView {
        id: map.id.clone(),
        title: map.title.clone(),
        center: map.center,
        zoom: map.zoom,
        tiles: TileLayer {
            url: config.tiles.url.clone(),
            attribution: config.tiles.attribution.clone(),
            min_zoom: config.tiles.min_zoom,
            max_zoom: config.tiles.max_zoom,
        },
        legend_position: config.display.legend_position.clone(),
        counties: collection(county_features),
        schools: collection(school_features),
        legend: build_legend(&map.title, &table, map.legend_style()),
    })
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn county_style(table: &BreakpointTable, metric: Metric, metrics: &SchoolMetrics) -> PathStyle {
    PathStyle {
        color: COUNTY_STROKE.to_string(),
        weight: COUNTY_STROKE_WEIGHT,
        fill_color: table.classify(metric.value(metrics)).to_string(),
        fill_opacity: COUNTY_FILL_OPACITY,
    }
}

pub fn county_popup(county: &County, metrics: &SchoolMetrics, metric: Metric) -> String {
    let suffix = match metric {
        Metric::SchoolCount => "county",
        Metric::SchoolsPerCapita => "County",
    };
    let heading = match &county.name {
        Some(name) => format!("{} {}", escape_html(name), suffix),
        None => UNNAMED_COUNTY.to_string(),
    };
    match metric {
        Metric::SchoolCount => format!(
            "<strong>{}</strong><br>Schools: {}",
            heading, metrics.school_count
        ),
        Metric::SchoolsPerCapita => {
            let population = county
                .population
                .map(format_population)
                .unwrap_or_else(|| NO_POPULATION.to_string());
            format!(
                "<strong>{}</strong><br>Schools: {}<br>Population: {}<br>Pop. per school: {}",
                heading,
                metrics.school_count,
                population,
                population_per_school(county.population, metrics.school_count)
            )
        }
    }
}

fn population_per_school(population: Option<f64>, school_count: u32) -> String {
    if school_count == 0 {
        return "0".to_string();
    }
    match population {
        // round() takes halves up, where {:.0} would round them to even
        Some(p) => format!("{:.0}", (p / school_count as f64).round()),
        None => NO_POPULATION.to_string(),
    }
}

fn format_population(population: f64) -> String {
    if population.fract() == 0.0 {
        format!("{:.0}", population)
    } else {
        population.to_string()
    }
}

pub fn school_popup(school: &School, placeholders: &SchoolPlaceholders, state_suffix: &str) -> String {
    format!(
        "<strong>{}</strong><br>{}<br>{}, {}",
        escape_html(school.name.as_deref().unwrap_or(UNNAMED_SCHOOL)),
        escape_html(school.address.as_deref().unwrap_or(placeholders.address.as_str())),
        escape_html(school.city.as_deref().unwrap_or(placeholders.city.as_str())),
        escape_html(state_suffix)
    )
}

pub fn county_feature(decorated: &DecoratedCounty<'_>, metric: Metric, table: &BreakpointTable) -> Feature {
    let county = decorated.county;
    let metrics = &decorated.metrics;

    let mut properties: JsonObject = county.properties.clone();
    properties.insert("schoolCount".to_string(), metrics.school_count.into());
    properties.insert(
        "schoolsPerCapita".to_string(),
        serde_json::json!(metrics.schools_per_capita),
    );
    properties.insert(
        "style".to_string(),
        serde_json::json!(county_style(table, metric, metrics)),
    );
    properties.insert(
        "popup".to_string(),
        county_popup(county, metrics, metric).into(),
    );

    Feature {
        bbox: None,
        geometry: county.geometry.clone(),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

pub fn school_feature(
    school: &School,
    marker: &MarkerStyle,
    placeholders: &SchoolPlaceholders,
    state_suffix: &str,
) -> Feature {
    let mut properties: JsonObject = school.properties.clone();
    properties.insert("marker".to_string(), serde_json::json!(marker));
    properties.insert("popup".to_string(), school_popup(school, placeholders, state_suffix).into());

    Feature {
        bbox: None,
        geometry: school.geometry.clone(),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Write the static bundle: index.html, maps.json and one folder per view
/// with counties.geojson, schools.geojson and legend.html.
pub fn write_bundle(output_dir: &Path, views: &[MapView]) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    for view in views {
        let view_dir = output_dir.join(&view.id);
        fs::create_dir_all(&view_dir)
            .with_context(|| format!("Failed to create view directory: {:?}", view_dir))?;

        write_json(&view_dir.join("counties.geojson"), &view.counties)?;
        write_json(&view_dir.join("schools.geojson"), &view.schools)?;
        fs::write(view_dir.join("legend.html"), view.legend.to_html())
            .with_context(|| format!("Failed to write legend for {}", view.id))?;

        info!(
            view = %view.id,
            counties = view.counties.features.len(),
            schools = view.schools.features.len(),
            "Wrote map view"
        );
    }

    let summaries: Vec<ViewSummary<'_>> = views.iter().map(MapView::summary).collect();
    write_json(&output_dir.join("maps.json"), &summaries)?;
    fs::write(output_dir.join("index.html"), INDEX_HTML).context("Failed to write index.html")?;

    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    serde_json::to_writer(BufWriter::new(file), value)
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::tests::table;
    use crate::config::tests::SAMPLE;
    use crate::data::tests::{sample_counties, sample_schools};
    use crate::processing::aggregate;

    fn metrics(school_count: u32, schools_per_capita: f64) -> SchoolMetrics {
        SchoolMetrics {
            school_count,
            schools_per_capita,
        }
    }

    #[test]
    fn county_style_uses_classifier_color() {
        let t = table(&[15.0, 30.0, 60.0, 80.0]);
        let style = county_style(&t, Metric::SchoolCount, &metrics(70, 0.0));
        assert_eq!(
            style,
            PathStyle {
                color: "#000".to_string(),
                weight: 1.0,
                fill_color: "#e6550d".to_string(),
                fill_opacity: 0.7,
            }
        );
        let json = serde_json::to_value(&style).unwrap();
        assert_eq!(json["fillColor"], "#e6550d");
        assert_eq!(json["fillOpacity"], 0.7);
    }

    #[test]
    fn per_capita_popup_lists_population_per_school() {
        let counties = sample_counties();
        let popup = county_popup(&counties[0], &metrics(3, 0.00003), Metric::SchoolsPerCapita);
        assert_eq!(
            popup,
            "<strong>Alpha County</strong><br>Schools: 3<br>Population: 100000<br>Pop. per school: 33333"
        );

        let nameless = &counties[3];
        let popup = county_popup(nameless, &metrics(0, 0.0), Metric::SchoolsPerCapita);
        assert!(popup.starts_with("<strong>Unnamed County</strong>"));
        assert!(popup.contains("Population: N/A"));
        assert!(popup.ends_with("Pop. per school: 0"));
    }

    #[test]
    fn population_per_school_rounds_halves_up() {
        let mut county = sample_counties().remove(0);
        county.population = Some(100001.0);
        let popup = county_popup(&county, &metrics(2, 0.00002), Metric::SchoolsPerCapita);
        assert!(popup.ends_with("Pop. per school: 50001"), "{popup}");
    }

    #[test]
    fn count_popup_heading_is_lowercase() {
        let counties = sample_counties();
        assert_eq!(
            county_popup(&counties[0], &metrics(3, 0.00003), Metric::SchoolCount),
            "<strong>Alpha county</strong><br>Schools: 3"
        );
    }

    #[test]
    fn school_popup_fills_placeholders() {
        let schools = sample_schools();
        let defaults = SchoolPlaceholders::default();
        assert_eq!(
            school_popup(&schools[0], &defaults, "OR"),
            "<strong>North High</strong><br>1 Main St<br>Salem, OR"
        );
        assert_eq!(
            school_popup(&schools[2], &defaults, "OR"),
            "<strong>Unnamed School</strong><br>No Address<br>No City, OR"
        );

        let na = SchoolPlaceholders {
            address: "N/A".to_string(),
            city: "N/A".to_string(),
        };
        assert_eq!(
            school_popup(&schools[2], &na, "OR"),
            "<strong>Unnamed School</strong><br>N/A<br>N/A, OR"
        );
    }

    #[test]
    fn popups_escape_markup() {
        let mut school = sample_schools().remove(0);
        school.name = Some("<b>A & B</b>".to_string());
        assert!(school_popup(&school, &SchoolPlaceholders::default(), "OR").contains("&lt;b&gt;A &amp; B&lt;/b&gt;"));
    }

    #[test]
    fn view_carries_decorated_layers() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        let counties = sample_counties();
        let schools = sample_schools();
        let decorated = aggregate(&counties, &schools);

        let view = build_view(&config, &config.maps[0], &decorated, &schools).unwrap();
        assert_eq!(view.id, "map");
        assert_eq!(view.counties.features.len(), 4);
        // the LineString school is dropped
        assert_eq!(view.schools.features.len(), 4);
        assert_eq!(view.legend.rows.len(), 5);

        let alpha = view.counties.features[0].properties.as_ref().unwrap();
        assert_eq!(alpha["schoolCount"], 3);
        assert_eq!(alpha["style"]["fillColor"], "#feedde");
        assert_eq!(alpha["Name"], "Alpha");

        let marker = &view.schools.features[0].properties.as_ref().unwrap()["marker"];
        assert_eq!(marker["fillColor"], "#ff7800");
        assert_eq!(marker["fillOpacity"], 0.8);

        // the per-capita map fills missing mailing fields with N/A
        let per_capita = build_view(&config, &config.maps[1], &decorated, &schools).unwrap();
        let popup = per_capita.schools.features[2].properties.as_ref().unwrap()["popup"]
            .as_str()
            .unwrap();
        assert_eq!(popup, "<strong>Unnamed School</strong><br>N/A<br>N/A, OR");
    }

    #[test]
    fn bundle_layout() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        let counties = sample_counties();
        let schools = sample_schools();
        let decorated = aggregate(&counties, &schools);
        let views: Vec<MapView> = config
            .maps
            .iter()
            .map(|m| build_view(&config, m, &decorated, &schools).unwrap())
            .collect();

        let dir = std::env::temp_dir().join(format!("school-choropleth-bundle-{}", std::process::id()));
        write_bundle(&dir, &views).unwrap();

        for file in ["index.html", "maps.json", "map/counties.geojson", "map2/schools.geojson", "map2/legend.html"] {
            assert!(dir.join(file).is_file(), "missing {file}");
        }
        let index: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join("maps.json")).unwrap()).unwrap();
        assert_eq!(index[1]["id"], "map2");
        assert_eq!(index[1]["legendPosition"], "bottomright");
        assert_eq!(index[0]["tiles"]["maxZoom"], 12);

        fs::remove_dir_all(&dir).ok();
    }
}
