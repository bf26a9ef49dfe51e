//! Well-known-text serialisation of planar polygons.
//!
//! Coordinates are written with the shortest round-trip representation of
//! each `f64` and always keep a fractional part (`11.0`, not `11`). One
//! polygon is written as `POLYGON((x y, ...), (...))`, several as
//! `MULTIPOLYGON(((...)), ((...)))` and none as `MULTIPOLYGON EMPTY`.

use geo_types::{LineString, MultiPolygon, Polygon};
use itertools::Itertools;


pub fn polygon_to_wkt(polygon: &Polygon<f64>) -> String {
    format!("POLYGON{}", rings_text(polygon))
}

pub fn multi_polygon_to_wkt(multi: &MultiPolygon<f64>) -> String {
    polygons_to_wkt(&multi.0)
}

/// Writes a list of polygons as `POLYGON` when there is exactly one and as
/// `MULTIPOLYGON` otherwise. Polygon and ring order are kept as given.
pub fn polygons_to_wkt(polygons: &[Polygon<f64>]) -> String {
    match polygons {
        [] => "MULTIPOLYGON EMPTY".to_string(),
        [polygon] => polygon_to_wkt(polygon),
        _ => format!(
            "MULTIPOLYGON({})",
            polygons.iter().map(rings_text).join(", ")
        ),
    }
}

pub(crate) fn coord_text(c: geo_types::Coord<f64>) -> String {
    format!("{:?} {:?}", c.x, c.y)
}

fn ring_text(ring: &LineString<f64>) -> String {
    format!("({})", ring.0.iter().map(|c| coord_text(*c)).join(", "))
}

fn rings_text(polygon: &Polygon<f64>) -> String {
    let rings = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(ring_text)
        .join(", ");
    format!("({})", rings)
}
