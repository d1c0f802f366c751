//! Generators for synthetic legends and polygons.
//!
//! These create predictable, verifiable data so tests can check that the
//! n-th legend entry lines up with the n-th style rule and swatch.

use forecast_common::{Feature, FeatureCollection, Geometry, Legend, LegendEntry};
use serde_json::json;

/// Creates a legend with `count` entries keyed "1", "2", ...
///
/// Entry `i` (zero-based) is labelled `Problem {i+1}` and described as
/// `Description {i+1}`.
///
/// # Example
///
/// ```
/// use test_utils::generate_legend;
///
/// let legend = generate_legend(3);
/// assert_eq!(legend.len(), 3);
/// assert_eq!(legend.keys().next(), Some("1"));
/// ```
pub fn generate_legend(count: usize) -> Legend {
    (1..=count)
        .map(|n| {
            (
                n.to_string(),
                LegendEntry::new(format!("Problem {n}"), format!("Description {n}")),
            )
        })
        .collect()
}

/// Creates a closed, counter-clockwise square ring polygon.
///
/// The lower-left corner sits at (`x`, `y`); sides are `size` long.
pub fn square_polygon(x: f64, y: f64, size: f64) -> Geometry {
    Geometry::polygon(vec![vec![
        vec![x, y],
        vec![x + size, y],
        vec![x + size, y + size],
        vec![x, y + size],
        vec![x, y],
    ]])
}

/// Creates a WGS84 collection with one square per problem id.
pub fn generate_collection(problem_ids: &[&str]) -> FeatureCollection {
    problem_ids
        .iter()
        .enumerate()
        .fold(FeatureCollection::new(), |fc, (i, id)| {
            let geometry = square_polygon(5.0 + i as f64, 60.0, 0.5);
            fc.with_feature(Feature::new(Some(geometry)).with_property("problem_id", json!(id)))
        })
}
