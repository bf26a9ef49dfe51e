use geo_types::Coord;

use crate::citymodel::CityModel;
use crate::error::{Error, Result};


/// Lookup table from vertex index to real-valued planar coordinates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VertexTable {
    coords: Vec<Coord<f64>>,
}

impl VertexTable {
    /// Resolves the vertex table of a city model with its own transform.
    pub fn from_model(model: &CityModel) -> Result<Self> {
        let t = &model.transform;
        resolve_vertices(
            [t.scale[0], t.scale[1]],
            [t.translate[0], t.translate[1]],
            &model.vertices,
        )
    }

    pub fn get(&self, index: usize) -> Option<Coord<f64>> {
        self.coords.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

/// Applies `raw * scale + translate` per axis to every vertex.
/// The z component, if any, is dropped.
pub fn resolve_vertices(
    scale: [f64; 2],
    translate: [f64; 2],
    vertices: &[Vec<f64>],
) -> Result<VertexTable> {
    let coords = vertices
        .iter()
        .enumerate()
        .map(|(index, raw)| match raw.as_slice() {
            [x, y, ..] => Ok(Coord {
                x: x * scale[0] + translate[0],
                y: y * scale[1] + translate[1],
            }),
            _ => Err(Error::MalformedVertex {
                index,
                len: raw.len(),
            }),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(VertexTable { coords })
}
