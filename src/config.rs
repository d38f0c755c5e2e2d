use crate::classify::BreakpointTable;
use crate::legend::LegendStyle;
use crate::render::SchoolPlaceholders;
use crate::types::Metric;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    pub tiles: TileConfig,
    pub output: OutputConfig,
    pub server: ServerConfig,
    pub maps: Vec<MapConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// County polygons, a path or an http(s) URL
    pub counties: String,
    /// School points, a path or an http(s) URL
    pub schools: String,
    /// Unset means a fetch may wait forever
    pub fetch_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    /// Appended to the city line of school popups
    pub state_suffix: String,
    pub legend_position: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            state_suffix: "OR".to_string(),
            legend_position: "bottomright".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TileConfig {
    pub url: String,
    pub attribution: String,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MapConfig {
    /// Element id of the map container, also the bundle sub-directory
    pub id: String,
    pub title: String,
    pub metric: Metric,
    /// [lat, lon]
    pub center: [f64; 2],
    pub zoom: u8,
    pub breaks: Vec<f64>,
    pub colors: Vec<String>,
    #[serde(default = "default_marker_opacity")]
    pub marker_fill_opacity: f64,
    /// School popup text for a missing address; "No Address" when unset
    pub missing_address: Option<String>,
    /// School popup text for a missing city; "No City" when unset
    pub missing_city: Option<String>,
}

fn default_marker_opacity() -> f64 {
    0.8
}

impl MapConfig {
    pub fn table(&self) -> Result<BreakpointTable> {
        BreakpointTable::new(self.breaks.clone(), self.colors.clone())
            .with_context(|| format!("Invalid breakpoint table for map '{}'", self.id))
    }

    pub fn school_placeholders(&self) -> SchoolPlaceholders {
        let defaults = SchoolPlaceholders::default();
        SchoolPlaceholders {
            address: self.missing_address.clone().unwrap_or(defaults.address),
            city: self.missing_city.clone().unwrap_or(defaults.city),
        }
    }

    pub fn legend_style(&self) -> LegendStyle {
        match self.metric {
            Metric::SchoolCount => LegendStyle::Range,
            Metric::SchoolsPerCapita => LegendStyle::PeoplePerSchool,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .with_context(|| "Failed to parse TOML configuration")?;

        // Reject bad tables up front rather than halfway through rendering
        for map in &config.maps {
            map.table()?;
        }
        Ok(config)
    }
}
