use crate::config::AppConfig;
use crate::data::{load_datasets, Datasets};
use crate::processing::aggregate;
use crate::render::{build_view, MapView};
use anyhow::Result;
use tracing::{error, info};

/// Load inputs once and build every configured view from them.
///
/// A failed load is logged and yields no views, the same outcome as a blank
/// page. Only configuration problems come back as errors.
pub async fn build_map_views(config: &AppConfig) -> Result<Vec<MapView>> {
    let datasets = match load_datasets(&config.input).await {
        Ok(datasets) => datasets,
        Err(e) => {
            error!("Error loading data: {}", e);
            return Ok(Vec::new());
        }
    };

    views_from_datasets(config, &datasets)
}

pub fn views_from_datasets(config: &AppConfig, datasets: &Datasets) -> Result<Vec<MapView>> {
    let decorated = aggregate(&datasets.counties, &datasets.schools);

    config
        .maps
        .iter()
        .map(|map| {
            info!(view = %map.id, metric = ?map.metric, "Building map view");
            build_view(config, map, &decorated, &datasets.schools)
        })
        .collect()
}
