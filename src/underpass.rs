use std::collections::HashMap;

use crate::merge::MergedRegion;

#[cfg(test)]
mod tests {

    use super::*;
    use crate::config::DEFAULT_EPS;
    use geo_types::MultiPolygon;

    fn region(area: f64) -> MergedRegion {
        MergedRegion {
            geometry: MultiPolygon(Vec::new()),
            area,
        }
    }

    fn regions(entries: &[(&str, f64)]) -> Vec<(String, MergedRegion)> {
        entries
            .iter()
            .map(|(id, area)| (id.to_string(), region(*area)))
            .collect()
    }

    #[test]
    fn tolerance_is_strict() {
        let roofs = regions(&[("equal", 1e-8), ("above", 1.1e-8)]);
        let grounds = regions(&[("equal", 0.0), ("above", 0.0)]);

        let result = classify_underpasses(&roofs, &grounds, DEFAULT_EPS);
        let ids: Vec<&str> = result.underpasses.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["above"]);
        assert!(result.roof_only.is_empty());
    }

    #[test]
    fn missing_ground_is_reported_separately() {
        let roofs = regions(&[("b1", 10.0), ("b2", 4.0)]);
        let grounds = regions(&[("b1", 4.0)]);

        let result = classify_underpasses(&roofs, &grounds, DEFAULT_EPS);
        assert_eq!(result.underpasses, vec![UnderpassCandidate {
            id: "b1".to_string(),
            diff: 6.0,
        }]);
        assert_eq!(result.roof_only, vec!["b2".to_string()]);
    }

    #[test]
    fn roof_order_is_kept() {
        let roofs = regions(&[("c", 5.0), ("a", 5.0), ("b", 5.0), ("d", 5.0)]);
        let grounds = regions(&[("a", 1.0), ("b", 5.0), ("c", 2.0), ("d", 6.0)]);

        let result = classify_underpasses(&roofs, &grounds, 0.5);
        let ids: Vec<&str> = result.underpasses.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[test]
    fn ground_only_objects_are_ignored() {
        let roofs = regions(&[]);
        let grounds = regions(&[("g", 3.0)]);
        let result = classify_underpasses(&roofs, &grounds, DEFAULT_EPS);
        assert!(result.underpasses.is_empty());
        assert!(result.roof_only.is_empty());
    }
}

/// A city object whose roof area exceeds its ground area by more than the
/// tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct UnderpassCandidate {
    pub id: String,
    /// roof area - ground area
    pub diff: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Classification {
    /// Underpass candidates, in roof-region order.
    pub underpasses: Vec<UnderpassCandidate>,
    /// Objects with a roof region but no ground region, in roof-region order.
    pub roof_only: Vec<String>,
}

/// Compares the merged roof and ground areas of every object that has a
/// roof region. An object is an underpass candidate when
/// `roof - ground > eps`. Objects without a ground region are not compared;
/// they end up in `roof_only`.
pub fn classify_underpasses(
    roofs: &[(String, MergedRegion)],
    grounds: &[(String, MergedRegion)],
    eps: f64,
) -> Classification {
    let ground_areas: HashMap<&str, f64> = grounds
        .iter()
        .map(|(id, region)| (id.as_str(), region.area))
        .collect();

    let mut result = Classification::default();
    for (id, roof) in roofs {
        match ground_areas.get(id.as_str()) {
            Some(ground_area) => {
                let diff = roof.area - ground_area;
                if diff > eps {
                    result.underpasses.push(UnderpassCandidate {
                        id: id.clone(),
                        diff,
                    });
                }
            }
            None => result.roof_only.push(id.clone()),
        }
    }
    result
}
