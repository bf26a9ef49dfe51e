//! Output sinks.
//!
//! All tables are plain text with `; ` separated columns and a header row,
//! so that they can be loaded as delimited text layers in a GIS. Rows are
//! written in the order they are given.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use geo_types::{LineString, Polygon};
use serde_json::{json, Value};

use crate::error::Result;
use crate::merge::MergedRegion;
use crate::polygon::AssembledSurface;
use crate::underpass::UnderpassCandidate;


/// Name of the underpass table for a given tolerance, e.g.
/// `underpass_obj_eps_1e-8.wkt`.
pub fn underpass_file_name(eps: f64) -> String {
    format!("underpass_obj_eps_{:e}.wkt", eps)
}

/// Writes one `uuid; geom` row per surface.
pub fn write_surface_table<'a>(
    path: &Path,
    surfaces: impl Iterator<Item = &'a AssembledSurface>,
) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "uuid; geom")?;
    for surface in surfaces {
        writeln!(writer, "{}; {}", surface.surface_id, surface.wkt)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes one `uuid; geom` row per merged city object region.
pub fn write_region_table(path: &Path, regions: &[(String, MergedRegion)]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "uuid; geom")?;
    for (id, region) in regions {
        writeln!(writer, "{}; {}", id, region.wkt())?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the underpass candidates with their area difference and both
/// merged geometries.
pub fn write_underpass_table(
    path: &Path,
    candidates: &[UnderpassCandidate],
    roofs: &[(String, MergedRegion)],
    grounds: &[(String, MergedRegion)],
) -> Result<()> {
    let roofs: HashMap<&str, &MergedRegion> =
        roofs.iter().map(|(id, r)| (id.as_str(), r)).collect();
    let grounds: HashMap<&str, &MergedRegion> =
        grounds.iter().map(|(id, r)| (id.as_str(), r)).collect();

    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "uuid; diff; roof_geom; ground_geom")?;
    for candidate in candidates {
        let geom = |regions: &HashMap<&str, &MergedRegion>| {
            regions
                .get(candidate.id.as_str())
                .map(|r| r.wkt())
                .unwrap_or_default()
        };
        writeln!(
            writer,
            "{}; {:?}; {}; {}",
            candidate.id,
            candidate.diff,
            geom(&roofs),
            geom(&grounds)
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes one city object id per line.
pub fn write_id_list(path: &Path, ids: &[String]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for id in ids {
        writeln!(writer, "{}", id)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes merged regions as a GeoJSON feature collection with `uuid` and
/// `area` properties, tagged with the given planar CRS.
pub fn write_geojson(
    path: &Path,
    regions: &[(String, MergedRegion)],
    crs: &str,
) -> Result<()> {
    let features: Vec<Value> = regions
        .iter()
        .map(|(id, region)| {
            json!({
                "type": "Feature",
                "properties": {"uuid": id, "area": region.area},
                "geometry": geometry_json(region),
            })
        })
        .collect();

    let collection = json!({
        "type": "FeatureCollection",
        "crs": {"type": "name", "properties": {"name": crs_urn(crs)}},
        "features": features,
    });

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, &collection).map_err(std::io::Error::from)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn crs_urn(crs: &str) -> String {
    match crs.split_once(':') {
        Some((authority, code)) => format!("urn:ogc:def:crs:{}::{}", authority, code),
        None => crs.to_string(),
    }
}

fn geometry_json(region: &MergedRegion) -> Value {
    let ring = |ring: &LineString<f64>| -> Value {
        ring.0.iter().map(|c| json!([c.x, c.y])).collect()
    };
    let polygon = |polygon: &Polygon<f64>| -> Value {
        std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .map(ring)
            .collect()
    };

    match region.geometry.0.as_slice() {
        [single] => json!({"type": "Polygon", "coordinates": polygon(single)}),
        parts => json!({
            "type": "MultiPolygon",
            "coordinates": parts.iter().map(polygon).collect::<Vec<_>>(),
        }),
    }
}
