//! Semantic surface classification.
//!
//! Given one geometry of a city object and a set of semantic roles, this
//! module collects the surfaces whose role is in the set, in the order of
//! the semantic surface descriptors, together with the faces assigned to
//! each of them through the semantic value array.
//!
//! For a `Solid`, only the outer shell (shell 0) is considered: its faces
//! and its semantic values. `MultiSurface` and `CompositeSurface` geometries
//! use the flat face list directly.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::boundary::{IndexBoundary, IndexFace};
use crate::citymodel::{Geometry, GeometryType, SurfaceRole};
use crate::error::{Error, Result};


/// A semantic surface together with the faces assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceFaces {
    pub surface_id: String,
    pub faces: IndexBoundary,
}

/// Collects the surfaces of `geometry` whose role is in `roles`.
///
/// The result keeps the order of the semantic surface descriptors. Each
/// surface receives, in face order, every face whose semantic value points
/// at it. Faces without semantics (`null`) and faces of other roles are
/// ignored.
pub fn classify_surfaces(
    object_id: &str,
    geometry: &Geometry,
    roles: &[SurfaceRole],
) -> Result<Vec<SurfaceFaces>> {
    let geometry_type = geometry.geometry_type(object_id)?;
    let Some(semantics) = &geometry.semantics else {
        return Ok(Vec::new());
    };

    // descriptor index -> position in `surfaces`
    let mut slots = HashMap::new();
    let mut surfaces = Vec::new();
    for (index, descriptor) in semantics.surfaces.iter().enumerate() {
        if !roles.contains(&descriptor.role) {
            continue;
        }
        let surface_id = descriptor
            .id
            .clone()
            .unwrap_or_else(|| format!("{}_{}", object_id, index));
        slots.insert(index, surfaces.len());
        surfaces.push(SurfaceFaces {
            surface_id,
            faces: Vec::new(),
        });
    }

    if surfaces.is_empty() {
        return Ok(surfaces);
    }

    let (faces, values) = outer_faces(
        object_id,
        geometry_type,
        &geometry.boundaries,
        &semantics.values,
    )?;

    for (face_index, value) in values.iter().enumerate() {
        let Some(slot) = value.and_then(|v| slots.get(&v)) else {
            continue;
        };
        let face = faces.get(face_index).ok_or_else(|| {
            Error::malformed(
                object_id,
                format!(
                    "semantic value given for face {} but the geometry has {} face(s)",
                    face_index,
                    faces.len()
                ),
            )
        })?;
        surfaces[*slot].faces.push(face.clone());
    }

    Ok(surfaces)
}

/// Decodes the faces and per-face semantic values at the nesting depth
/// the geometry type demands.
fn outer_faces(
    object_id: &str,
    geometry_type: GeometryType,
    boundaries: &Value,
    values: &Value,
) -> Result<(Vec<IndexFace>, Vec<Option<usize>>)> {
    match geometry_type {
        GeometryType::Solid => {
            let shells: Vec<Vec<IndexFace>> = decode(object_id, "boundaries", boundaries)?;
            let values: Option<Vec<Vec<Option<usize>>>> =
                decode(object_id, "semantic values", values)?;
            let faces = shells
                .into_iter()
                .next()
                .ok_or_else(|| Error::malformed(object_id, "solid has no shell"))?;
            let values = values.and_then(|v| v.into_iter().next()).unwrap_or_default();
            Ok((faces, values))
        }
        GeometryType::MultiSurface | GeometryType::CompositeSurface => {
            let faces: Vec<IndexFace> = decode(object_id, "boundaries", boundaries)?;
            let values: Option<Vec<Option<usize>>> =
                decode(object_id, "semantic values", values)?;
            Ok((faces, values.unwrap_or_default()))
        }
    }
}

fn decode<T: DeserializeOwned>(object_id: &str, what: &str, value: &Value) -> Result<T> {
    T::deserialize(value).map_err(|e| Error::malformed(object_id, format!("{}: {}", what, e)))
}
