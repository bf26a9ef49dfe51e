use geo::{orient::Direction, Area, CoordsIter, Orient, Translate};
use geo_clipper::Clipper;
use geo_types::{Coord, MultiPolygon, Polygon};

use crate::config::CLIP_RANGE;
use crate::polygon::AssembledSurface;
use crate::wkt;

#[cfg(test)]
mod tests {

    use super::*;
    use crate::config::CLIP_FACTOR;
    use crate::polygon::assemble;
    use crate::underpass::classify_underpasses;
    use approx::assert_relative_eq;

    fn rect(id: &str, x0: f64, y0: f64, w: f64, h: f64) -> AssembledSurface {
        let ring = vec![
            Coord { x: x0, y: y0 },
            Coord { x: x0 + w, y: y0 },
            Coord { x: x0 + w, y: y0 + h },
            Coord { x: x0, y: y0 + h },
        ];
        assemble(id, vec![vec![ring]])
    }

    #[test]
    fn no_surfaces_no_region() {
        assert!(merge_surfaces(&[], CLIP_FACTOR).is_none());
        let empty = assemble("e", vec![]);
        assert!(merge_surfaces(&[empty], CLIP_FACTOR).is_none());
    }

    #[test]
    fn single_surface_is_taken_verbatim() {
        let a = rect("a", 85000.5, 447000.25, 2.0, 3.0);
        let region = merge_surfaces(&[a.clone()], CLIP_FACTOR).unwrap();
        assert_eq!(region.geometry.0, a.polygons);
        assert_eq!(region.wkt(), a.wkt);
        assert_relative_eq!(region.area, 6.0);
    }

    #[test]
    fn disjoint_surfaces_add_up() {
        let a = rect("a", 0.0, 0.0, 2.0, 2.0);
        let b = rect("b", 10.0, 0.0, 3.0, 1.0);
        let region = merge_surfaces(&[a.clone(), b.clone()], CLIP_FACTOR).unwrap();
        assert_eq!(region.geometry.0.len(), 2);
        assert_relative_eq!(region.area, a.area() + b.area(), max_relative = 1e-9);
    }

    #[test]
    fn duplicate_surface_is_not_counted_twice() {
        let a = rect("a", 3.0, 4.0, 2.0, 2.0);
        let b = rect("b", 3.0, 4.0, 2.0, 2.0);
        let region = merge_surfaces(&[a, b], CLIP_FACTOR).unwrap();
        assert_relative_eq!(region.area, 4.0, max_relative = 1e-9);
    }

    #[test]
    fn overlap_is_netted_out() {
        let a = rect("a", 0.0, 0.0, 2.0, 2.0);
        let b = rect("b", 1.0, 1.0, 2.0, 2.0);
        let region = merge_surfaces(&[a, b], CLIP_FACTOR).unwrap();
        assert_eq!(region.geometry.0.len(), 1);
        assert_relative_eq!(region.area, 7.0, max_relative = 1e-9);
    }

    #[test]
    fn adjacent_surfaces_coalesce() {
        let a = rect("a", 0.0, 0.0, 1.0, 1.0);
        let b = rect("b", 1.0, 0.0, 1.0, 1.0);
        let region = merge_surfaces(&[a, b], CLIP_FACTOR).unwrap();
        assert_eq!(region.geometry.0.len(), 1);
        assert_relative_eq!(region.area, 2.0, max_relative = 1e-9);
    }

    #[test]
    fn union_area_is_order_independent() {
        let a = rect("a", 0.0, 0.0, 4.0, 1.0);
        let b = rect("b", 3.0, 0.0, 1.0, 5.0);
        let c = rect("c", 2.0, 4.0, 6.0, 2.0);
        let abc = merge_surfaces(&[a.clone(), b.clone(), c.clone()], CLIP_FACTOR).unwrap();
        let cab = merge_surfaces(&[c, a, b], CLIP_FACTOR).unwrap();
        assert_relative_eq!(abc.area, cab.area, max_relative = 1e-9);
        assert_relative_eq!(abc.area, 4.0 + 5.0 + 12.0 - 2.0, max_relative = 1e-9);
    }

    #[test]
    fn clockwise_input_unions_like_counter_clockwise() {
        let cw = assemble(
            "cw",
            vec![vec![vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 0.0, y: 2.0 },
                Coord { x: 2.0, y: 2.0 },
                Coord { x: 2.0, y: 0.0 },
            ]]],
        );
        let ccw = rect("ccw", 1.0, 0.0, 2.0, 2.0);
        let region = merge_surfaces(&[cw, ccw], CLIP_FACTOR).unwrap();
        assert_relative_eq!(region.area, 6.0, max_relative = 1e-9);
    }

    #[test]
    fn split_roof_matches_footprint_at_fine_resolution() {
        let corners = [
            Coord { x: 85000.1234567, y: 447000.7654321 },
            Coord { x: 85012.3456789, y: 447003.1111111 },
            Coord { x: 85009.8765432, y: 447014.2222222 },
            Coord { x: 84998.7654321, y: 447010.3333333 },
        ];
        let ground = assemble("ground", vec![vec![corners.to_vec()]]);
        let west = assemble("west", vec![vec![vec![corners[0], corners[1], corners[2]]]]);
        let east = assemble("east", vec![vec![vec![corners[0], corners[2], corners[3]]]]);

        let roof = merge_surfaces(&[west, east], CLIP_FACTOR).unwrap();
        let footprint = merge_surfaces(&[ground], CLIP_FACTOR).unwrap();
        assert!((roof.area - footprint.area).abs() < 1e-9);

        let roofs = vec![("house".to_string(), roof)];
        let grounds = vec![("house".to_string(), footprint)];
        let result = classify_underpasses(&roofs, &grounds, crate::config::DEFAULT_EPS);
        assert!(result.underpasses.is_empty());
    }

    #[test]
    fn merged_geometry_stays_in_place() {
        let a = rect("a", 85000.0, 447000.0, 2.0, 2.0);
        let b = rect("b", 85001.0, 447000.0, 2.0, 2.0);
        let region = merge_surfaces(&[a, b], CLIP_FACTOR).unwrap();
        let xs: Vec<f64> = region.geometry.coords_iter().map(|c| c.x).collect();
        assert_relative_eq!(xs.iter().cloned().fold(f64::INFINITY, f64::min), 85000.0);
        assert_relative_eq!(xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max), 85003.0);
        assert_relative_eq!(region.area, 6.0, max_relative = 1e-9);
    }
}

/// The union of all same-role surfaces of one city object.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRegion {
    pub geometry: MultiPolygon<f64>,
    pub area: f64,
}

impl MergedRegion {
    pub fn wkt(&self) -> String {
        wkt::multi_polygon_to_wkt(&self.geometry)
    }
}

/// Merges the surfaces of one city object into a single region.
///
/// Surfaces without faces are ignored. No remaining surface gives no
/// region. A single surface is used as it is, its area being the sum of
/// its face areas. Several surfaces are unioned, so overlapping parts are
/// only counted once.
///
/// The union runs on the clipper's integer grid. Coordinates are taken
/// relative to the first vertex and scaled by the largest power of two that
/// keeps them inside `CLIP_RANGE`, but never by less than `clip_factor`.
/// The area is measured before moving the result back into place.
pub fn merge_surfaces(surfaces: &[AssembledSurface], clip_factor: f64) -> Option<MergedRegion> {
    let surfaces: Vec<&AssembledSurface> = surfaces.iter().filter(|s| !s.is_empty()).collect();

    match surfaces.as_slice() {
        [] => None,
        [surface] => Some(MergedRegion {
            geometry: MultiPolygon(surface.polygons.clone()),
            area: surface.area(),
        }),
        _ => {
            let polygons: Vec<&Polygon<f64>> =
                surfaces.iter().flat_map(|s| s.polygons.iter()).collect();
            let origin = polygons
                .iter()
                .find_map(|p| p.exterior().0.first().copied())
                .unwrap_or(Coord { x: 0.0, y: 0.0 });

            // clipper fills with the non-zero rule, so holes must wind
            // against their shell
            let local: Vec<Polygon<f64>> = polygons
                .iter()
                .map(|p| p.translate(-origin.x, -origin.y).orient(Direction::Default))
                .collect();

            let factor = grid_factor(&local, clip_factor);
            let merged = local
                .iter()
                .fold(MultiPolygon(Vec::new()), |acc, polygon| acc.union(polygon, factor));

            let area = merged.unsigned_area();
            let geometry = merged.translate(origin.x, origin.y);
            Some(MergedRegion { geometry, area })
        }
    }
}

/// Finest power-of-two scaling that keeps every coordinate of `polygons`
/// within `CLIP_RANGE`, bounded below by `clip_factor`.
fn grid_factor(polygons: &[Polygon<f64>], clip_factor: f64) -> f64 {
    let extent = polygons
        .iter()
        .flat_map(|p| p.coords_iter())
        .fold(0.0_f64, |m, c| m.max(c.x.abs()).max(c.y.abs()));

    if extent <= 0.0 {
        return clip_factor;
    }
    let exponent = (CLIP_RANGE / extent).log2().floor();
    2.0_f64.powf(exponent).max(clip_factor)
}
