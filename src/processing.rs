use crate::types::{County, DecoratedCounty, School, SchoolMetrics};
use geo::{Intersects, Point};
use rayon::prelude::*;
use tracing::info;

/// Stand-in population for counties with a missing, zero or invalid count.
/// Keeps the rate finite, at the cost of inflating it for those counties.
pub const POPULATION_FALLBACK: f64 = 1.0;

pub fn aggregate<'a>(counties: &'a [County], schools: &[School]) -> Vec<DecoratedCounty<'a>> {
    // Non-point schools never reach the spatial test
    let points: Vec<Point<f64>> = schools.iter().filter_map(|s| s.location).collect();

    info!(
        "Counting {} schools across {} counties...",
        points.len(),
        counties.len()
    );

    counties
        .par_iter()
        .map(|county| DecoratedCounty {
            county,
            metrics: metrics_for_county(county, &points),
        })
        .collect()
}

fn metrics_for_county(county: &County, points: &[Point<f64>]) -> SchoolMetrics {
    let school_count = match &county.shape {
        // Intersects counts points on the boundary as inside
        Some(shape) => points.iter().filter(|p| p.intersects(shape)).count() as u32,
        None => 0,
    };

    SchoolMetrics {
        school_count,
        schools_per_capita: school_count as f64 / effective_population(county.population),
    }
}

pub fn effective_population(population: Option<f64>) -> f64 {
    match population {
        Some(p) if p.is_finite() && p > 0.0 => p,
        _ => POPULATION_FALLBACK,
    }
}
