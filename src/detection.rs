//! Underpass detection over a whole city model.
//!
//! This module ties the pipeline stages together. For every city object it
//! classifies the roof-like and ground-like surfaces of the selected
//! geometry, resolves their boundaries to coordinates, assembles polygons
//! and merges them into one region per role. The merged areas are then
//! compared to find underpasses.
//!
//! City objects are independent of each other, so they are processed in
//! parallel with rayon. Results are collected in document order, which is
//! the order every output is written in.
//!
//! Geometry errors that only concern one object (an unsupported geometry
//! type, arrays at the wrong nesting depth) skip that object and are
//! reported at the end. Any other error aborts the run.

use std::path::Path;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::boundary::materialize;
use crate::citymodel::{CityModel, CityObject, Geometry, SurfaceRole};
use crate::error::Result;
use crate::merge::{merge_surfaces, MergedRegion};
use crate::output;
use crate::polygon::{assemble, AssembledSurface};
use crate::settings::Settings;
use crate::surfaces::classify_surfaces;
use crate::underpass::{classify_underpasses, Classification};
use crate::vertices::VertexTable;

#[cfg(test)]
mod tests {

    use super::*;
    use crate::error::Error;
    use crate::settings::load_default_config;

    fn settings() -> Settings {
        let mut settings = load_default_config().unwrap();
        settings.progress = false;
        settings
    }

    fn model(doc: &str) -> CityModel {
        CityModel::from_reader(doc.as_bytes()).unwrap()
    }

    #[test]
    fn unsupported_object_is_skipped() {
        let doc = r#"{
            "CityObjects": {
                "instance": {"geometry": [{
                    "type": "GeometryInstance",
                    "boundaries": [0],
                    "semantics": {"surfaces": [{"type": "RoofSurface"}], "values": [0]}
                }]},
                "empty": {"geometry": []},
                "flat": {"geometry": [{
                    "type": "MultiSurface",
                    "boundaries": [[[0, 1, 2, 3]], [[0, 1, 2, 3]]],
                    "semantics": {
                        "surfaces": [
                            {"type": "RoofSurface", "id": "r"},
                            {"type": "GroundSurface", "id": "g"}
                        ],
                        "values": [0, 1]
                    }
                }]}
            },
            "vertices": [[0, 0, 0], [1, 0, 0], [1, 1, 0], [0, 1, 0]]
        }"#;
        let mut detection = Detection::new(model(doc), settings());
        let result = detection.solve().unwrap();

        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].id, "instance");
        assert_eq!(result.roof.regions.len(), 1);
        assert_eq!(result.ground.regions.len(), 1);
        assert!(result.classification.underpasses.is_empty());
        assert!(result.classification.roof_only.is_empty());
    }

    #[test]
    fn unresolved_vertex_aborts() {
        let doc = r#"{
            "CityObjects": {
                "b": {"geometry": [{
                    "type": "MultiSurface",
                    "boundaries": [[[0, 1, 7]]],
                    "semantics": {"surfaces": [{"type": "RoofSurface", "id": "r"}], "values": [0]}
                }]}
            },
            "vertices": [[0, 0, 0], [1, 0, 0]]
        }"#;
        let mut detection = Detection::new(model(doc), settings());
        let err = detection.solve().unwrap_err();
        assert!(matches!(err, Error::UnresolvedVertexIndex { index: 7, .. }));
    }

    #[test]
    fn writeup_before_solve_does_nothing() {
        let detection = Detection::new(
            model(r#"{"CityObjects": {}, "vertices": []}"#),
            settings(),
        );
        assert!(detection.result.is_none());
        detection.writeup().unwrap();
    }
}

/// Surfaces and merged regions for one role set, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleOutcome {
    /// Every classified surface, grouped by city object.
    pub surfaces: Vec<AssembledSurface>,
    /// One merged region per city object that has surfaces of this role.
    pub regions: Vec<(String, MergedRegion)>,
}

/// A city object left out of the analysis because of a geometry error.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedObject {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionResult {
    pub roof: RoleOutcome,
    pub ground: RoleOutcome,
    pub classification: Classification,
    pub skipped: Vec<SkippedObject>,
}

/// Underpass detection on one city model.
#[derive(Debug)]
pub struct Detection {
    pub model: CityModel,
    pub settings: Settings,
    pub result: Option<DetectionResult>,
}

/// Per-object result for one role set.
#[derive(Debug, Default)]
struct ObjectRole {
    surfaces: Vec<AssembledSurface>,
    region: Option<MergedRegion>,
}

#[derive(Debug)]
enum ObjectOutcome {
    Processed { roof: ObjectRole, ground: ObjectRole },
    Skipped(String),
}

impl Detection {
    pub fn new(model: CityModel, settings: Settings) -> Self {
        Self {
            model,
            settings,
            result: None,
        }
    }

    /// Reads the city model at `path`.
    pub fn from_file(path: impl AsRef<Path>, settings: Settings) -> Result<Self> {
        let start = Instant::now();
        let model = CityModel::from_file(path.as_ref())?;
        info!(
            path = %path.as_ref().display(),
            objects = model.city_objects.len(),
            vertices = model.vertices.len(),
            elapsed = ?start.elapsed(),
            "loaded city model"
        );
        Ok(Self::new(model, settings))
    }

    /// Runs the whole pipeline and stores the result.
    pub fn solve(&mut self) -> Result<&DetectionResult> {
        let start = Instant::now();
        let table = VertexTable::from_model(&self.model)?;
        let settings = &self.settings;

        let pb = if settings.progress {
            ProgressBar::new(self.model.city_objects.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] {bar:40.green/blue} {pos:>7}/{len:7} {msg}",
        ) {
            pb.set_style(style.progress_chars("█▇▆▅▄▃▂▁"));
        }
        pb.set_message("city objects");

        let outcomes = self
            .model
            .city_objects
            .par_iter()
            .map(|(id, object)| {
                let outcome = process_object(id, object, &table, settings);
                pb.inc(1);
                outcome.map(|outcome| (id, outcome))
            })
            .collect::<Result<Vec<_>>>()?;

        pb.finish_and_clear();

        let mut result = DetectionResult::default();
        for (id, outcome) in outcomes {
            match outcome {
                ObjectOutcome::Processed { roof, ground } => {
                    collect_role(&mut result.roof, id, roof);
                    collect_role(&mut result.ground, id, ground);
                }
                ObjectOutcome::Skipped(reason) => result.skipped.push(SkippedObject {
                    id: id.clone(),
                    reason,
                }),
            }
        }

        result.classification =
            classify_underpasses(&result.roof.regions, &result.ground.regions, settings.eps);

        info!(
            roof_regions = result.roof.regions.len(),
            ground_regions = result.ground.regions.len(),
            underpasses = result.classification.underpasses.len(),
            roof_only = result.classification.roof_only.len(),
            skipped = result.skipped.len(),
            elapsed = ?start.elapsed(),
            "detection finished"
        );

        Ok(self.result.insert(result))
    }

    /// Writes every output file into the configured output directory.
    pub fn writeup(&self) -> Result<()> {
        let Some(result) = &self.result else {
            warn!("nothing to write, detection has not been run");
            return Ok(());
        };
        let dir = &self.settings.output_dir;
        std::fs::create_dir_all(dir)?;

        if self.settings.write_surfaces {
            output::write_surface_table(
                &dir.join("roof_pre_union.wkt"),
                result.roof.surfaces.iter(),
            )?;
            output::write_surface_table(
                &dir.join("ground_pre_union.wkt"),
                result.ground.surfaces.iter(),
            )?;
        }

        output::write_region_table(&dir.join("roof_union.wkt"), &result.roof.regions)?;
        output::write_region_table(&dir.join("ground_union.wkt"), &result.ground.regions)?;

        let underpass_path = dir.join(output::underpass_file_name(self.settings.eps));
        output::write_underpass_table(
            &underpass_path,
            &result.classification.underpasses,
            &result.roof.regions,
            &result.ground.regions,
        )?;
        output::write_id_list(
            &dir.join("roof_only_obj.txt"),
            &result.classification.roof_only,
        )?;

        if self.settings.write_geojson {
            output::write_geojson(
                &dir.join("roof_union.geojson"),
                &result.roof.regions,
                &self.settings.crs,
            )?;
            output::write_geojson(
                &dir.join("ground_union.geojson"),
                &result.ground.regions,
                &self.settings.crs,
            )?;
        }

        info!(dir = %dir.display(), "results written");
        Ok(())
    }
}

fn collect_role(outcome: &mut RoleOutcome, id: &str, role: ObjectRole) {
    outcome.surfaces.extend(role.surfaces);
    if let Some(region) = role.region {
        outcome.regions.push((id.to_string(), region));
    }
}

fn process_object(
    id: &str,
    object: &CityObject,
    table: &VertexTable,
    settings: &Settings,
) -> Result<ObjectOutcome> {
    let Some(geometry) = object.select_geometry(settings.lod.as_deref()) else {
        debug!(object = %id, "no geometry to analyse");
        return Ok(ObjectOutcome::Processed {
            roof: ObjectRole::default(),
            ground: ObjectRole::default(),
        });
    };

    let roles = process_role(
        id,
        geometry,
        &settings.roof_roles,
        table,
        settings.clip_factor,
    )
    .and_then(|roof| {
        process_role(
            id,
            geometry,
            &settings.ground_roles,
            table,
            settings.clip_factor,
        )
        .map(|ground| (roof, ground))
    });

    match roles {
        Ok((roof, ground)) => Ok(ObjectOutcome::Processed { roof, ground }),
        Err(err) if err.is_local() => {
            warn!(object = %id, "skipping city object: {}", err);
            Ok(ObjectOutcome::Skipped(err.to_string()))
        }
        Err(err) => Err(err),
    }
}

fn process_role(
    id: &str,
    geometry: &Geometry,
    roles: &[SurfaceRole],
    table: &VertexTable,
    clip_factor: f64,
) -> Result<ObjectRole> {
    let surfaces = classify_surfaces(id, geometry, roles)?
        .into_iter()
        .map(|surface| {
            let coords = materialize(&surface.surface_id, &surface.faces, table)?;
            Ok(assemble(&surface.surface_id, coords))
        })
        .collect::<Result<Vec<_>>>()?;

    let region = merge_surfaces(&surfaces, clip_factor);

    Ok(ObjectRole { surfaces, region })
}
