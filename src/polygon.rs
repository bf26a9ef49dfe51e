use geo::Area;
use geo_types::{LineString, Polygon};

use crate::boundary::{CoordBoundary, CoordRing};
use crate::wkt;

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_relative_eq;
    use geo_types::Coord;

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    fn square(x0: f64, y0: f64, size: f64) -> CoordRing {
        vec![
            c(x0, y0),
            c(x0 + size, y0),
            c(x0 + size, y0 + size),
            c(x0, y0 + size),
        ]
    }

    #[test]
    fn closing_is_idempotent() {
        let open = square(0.0, 0.0, 2.0);
        let mut closed = open.clone();
        closed.push(closed[0]);

        let from_open = assemble("s", vec![vec![open]]);
        let from_closed = assemble("s", vec![vec![closed]]);
        assert_eq!(from_open.wkt, from_closed.wkt);
        assert_eq!(
            from_open.wkt,
            "POLYGON((0.0 0.0, 2.0 0.0, 2.0 2.0, 0.0 2.0, 0.0 0.0))"
        );
    }

    #[test]
    fn several_faces_make_a_multipolygon() {
        let surface = assemble(
            "s",
            vec![
                vec![square(0.0, 0.0, 1.0)],
                vec![square(5.0, 5.0, 1.0), square(5.25, 5.25, 0.5)],
            ],
        );
        assert_eq!(surface.polygons.len(), 2);
        assert_eq!(
            surface.wkt,
            "MULTIPOLYGON(((0.0 0.0, 1.0 0.0, 1.0 1.0, 0.0 1.0, 0.0 0.0)), \
             ((5.0 5.0, 6.0 5.0, 6.0 6.0, 5.0 6.0, 5.0 5.0), \
             (5.25 5.25, 5.75 5.25, 5.75 5.75, 5.25 5.75, 5.25 5.25)))"
        );
        // hole is subtracted
        assert_relative_eq!(surface.area(), 1.0 + 1.0 - 0.25);
    }

    #[test]
    fn assembling_twice_is_byte_identical() {
        let boundary = vec![vec![square(3.0, 1.0, 0.1)], vec![square(0.0, 0.0, 7.0)]];
        assert_eq!(
            assemble("s", boundary.clone()).wkt,
            assemble("s", boundary).wkt
        );
    }

    #[test]
    fn surface_without_faces_is_empty() {
        let surface = assemble("s", vec![]);
        assert!(surface.is_empty());
        assert_eq!(surface.wkt, "MULTIPOLYGON EMPTY");
        assert_eq!(surface.area(), 0.0);
    }
}

/// Polygon geometry of one semantic surface and its text form.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledSurface {
    pub surface_id: String,
    /// One polygon per face, in face order.
    pub polygons: Vec<Polygon<f64>>,
    pub wkt: String,
}

impl AssembledSurface {
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Sum of the unsigned face areas, holes excluded.
    pub fn area(&self) -> f64 {
        self.polygons.iter().map(|p| p.unsigned_area()).sum()
    }
}

/// Appends the first position to a ring whose last position differs from it.
pub fn close_ring(ring: &mut CoordRing) {
    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if first != last {
            ring.push(*first);
        }
    }
}

/// Turns a materialized surface into polygons, one per face, closing every
/// ring. The first ring of a face is its exterior, the others are holes.
/// Faces without rings are dropped.
pub fn assemble(surface_id: &str, boundary: CoordBoundary) -> AssembledSurface {
    let polygons: Vec<Polygon<f64>> = boundary
        .into_iter()
        .filter(|face| !face.is_empty())
        .map(|face| {
            let mut rings = face.into_iter().map(|mut ring| {
                close_ring(&mut ring);
                LineString(ring)
            });
            // non-empty, checked above
            let exterior = rings.next().unwrap_or_else(|| LineString(Vec::new()));
            Polygon::new(exterior, rings.collect())
        })
        .collect();

    let wkt = wkt::polygons_to_wkt(&polygons);

    AssembledSurface {
        surface_id: surface_id.to_string(),
        polygons,
        wkt,
    }
}
