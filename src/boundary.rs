//! Boundary nesting types and the substitution of vertex indices by
//! coordinates.

use geo_types::Coord;

use crate::error::{Error, Result};
use crate::vertices::VertexTable;


/// A ring of vertex indices.
pub type IndexRing = Vec<usize>;
/// Rings of one face; the first ring is the outer boundary, the rest are holes.
pub type IndexFace = Vec<IndexRing>;
/// All faces assigned to one semantic surface.
pub type IndexBoundary = Vec<IndexFace>;

pub type CoordRing = Vec<Coord<f64>>;
pub type CoordFace = Vec<CoordRing>;
pub type CoordBoundary = Vec<CoordFace>;

/// Replaces every vertex index of a surface boundary with its coordinate.
pub fn materialize(
    surface_id: &str,
    boundary: &IndexBoundary,
    table: &VertexTable,
) -> Result<CoordBoundary> {
    boundary
        .iter()
        .map(|face| {
            face.iter()
                .map(|ring| {
                    ring.iter()
                        .map(|&index| {
                            table.get(index).ok_or_else(|| Error::UnresolvedVertexIndex {
                                surface: surface_id.to_string(),
                                index,
                            })
                        })
                        .collect::<Result<CoordRing>>()
                })
                .collect::<Result<CoordFace>>()
        })
        .collect()
}
