//! CityJSON input document.
//!
//! Only the parts of a CityJSON file that underpass detection needs are
//! deserialized: the city objects (in document order), the global affine
//! transform and the quantized vertex table. Boundary and semantic value
//! arrays are kept as raw JSON, because their nesting depth depends on the
//! geometry type and is only decoded once the type has been checked.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{Error, Result};


/// A CityJSON city model.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CityModel {
    /// City objects, in the order they appear in the document.
    #[serde(rename = "CityObjects", deserialize_with = "ordered_objects")]
    pub city_objects: Vec<(String, CityObject)>,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub vertices: Vec<Vec<f64>>,
}

impl CityModel {
    /// Reads a city model from a CityJSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::MissingInputFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file)).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_reader(reader: impl Read) -> serde_json::Result<Self> {
        serde_json::from_reader(reader)
    }
}

/// Global affine transform applied to the quantized vertices.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Transform {
    pub scale: [f64; 3],
    pub translate: [f64; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: [1.0, 1.0, 1.0],
            translate: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CityObject {
    #[serde(default)]
    pub geometry: Vec<Geometry>,
}

impl CityObject {
    /// Picks the geometry to analyse: the first one, or the first one with
    /// a matching level of detail if `lod` is given.
    pub fn select_geometry(&self, lod: Option<&str>) -> Option<&Geometry> {
        match lod {
            None => self.geometry.first(),
            Some(lod) => self
                .geometry
                .iter()
                .find(|g| g.lod_text().as_deref() == Some(lod)),
        }
    }
}

/// One geometry representation of a city object.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub lod: Option<Value>,
    #[serde(default)]
    pub boundaries: Value,
    #[serde(default)]
    pub semantics: Option<Semantics>,
}

impl Geometry {
    pub fn geometry_type(&self, object: &str) -> Result<GeometryType> {
        match self.kind.as_str() {
            "Solid" => Ok(GeometryType::Solid),
            "MultiSurface" => Ok(GeometryType::MultiSurface),
            "CompositeSurface" => Ok(GeometryType::CompositeSurface),
            other => Err(Error::UnsupportedGeometryType {
                object: object.to_string(),
                kind: other.to_string(),
            }),
        }
    }

    /// The level of detail as text; CityJSON allows both `"2.2"` and `2`.
    pub fn lod_text(&self) -> Option<String> {
        match self.lod.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Geometry encodings understood by the surface classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryType {
    /// solid -> shell -> ring -> vertex index
    Solid,
    /// face -> ring -> vertex index
    MultiSurface,
    /// face -> ring -> vertex index
    CompositeSurface,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Semantics {
    #[serde(default)]
    pub values: Value,
    #[serde(default)]
    pub surfaces: Vec<SemanticSurface>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SemanticSurface {
    #[serde(rename = "type")]
    pub role: SurfaceRole,
    #[serde(default)]
    pub id: Option<String>,
}

/// Semantic role of a surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum SurfaceRole {
    Roof,
    OuterFloor,
    Ground,
    OuterCeiling,
    Other(String),
}

impl From<&str> for SurfaceRole {
    fn from(tag: &str) -> Self {
        match tag {
            "RoofSurface" => SurfaceRole::Roof,
            "OuterFloorSurface" => SurfaceRole::OuterFloor,
            "GroundSurface" => SurfaceRole::Ground,
            "OuterCeilingSurface" => SurfaceRole::OuterCeiling,
            other => SurfaceRole::Other(other.to_string()),
        }
    }
}

impl From<String> for SurfaceRole {
    fn from(tag: String) -> Self {
        SurfaceRole::from(tag.as_str())
    }
}

impl fmt::Display for SurfaceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceRole::Roof => write!(f, "RoofSurface"),
            SurfaceRole::OuterFloor => write!(f, "OuterFloorSurface"),
            SurfaceRole::Ground => write!(f, "GroundSurface"),
            SurfaceRole::OuterCeiling => write!(f, "OuterCeilingSurface"),
            SurfaceRole::Other(tag) => write!(f, "{}", tag),
        }
    }
}

fn ordered_objects<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<(String, CityObject)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ObjectsVisitor;

    impl<'de> Visitor<'de> for ObjectsVisitor {
        type Value = Vec<(String, CityObject)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of city object ids to city objects")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut objects = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((id, object)) = map.next_entry::<String, CityObject>()? {
                objects.push((id, object));
            }
            Ok(objects)
        }
    }

    deserializer.deserialize_map(ObjectsVisitor)
}
