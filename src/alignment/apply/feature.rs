use super::remap;
use crate::data::model::{Feature, FeatureMap};
use crate::transform::Transform;

/// Transform a whole feature map, depth first, then restore the top-level rt
/// order and the range cache.
pub(crate) fn transform_feature_map<T: Transform>(map: &mut FeatureMap, trafo: &T) -> usize {
    let mut extrapolated = 0;
    for feature in &mut map.features {
        transform_feature(feature, trafo, &mut extrapolated);
    }
    for id in &mut map.unassigned_peptide_identifications {
        remap(&mut id.rt, trafo, &mut extrapolated);
    }
    map.sort_by_rt();
    map.update_ranges();
    extrapolated
}

/// Moves the feature, its hulls, identifications and subordinates.
///
/// Hull points keep their winding order; only their rt component changes.
/// Subordinate lists keep their relative order.
fn transform_feature<T: Transform>(feature: &mut Feature, trafo: &T, extrapolated: &mut usize) {
    remap(&mut feature.rt, trafo, extrapolated);

    for hull in &mut feature.convex_hulls {
        for point in &mut hull.points {
            remap(&mut point.rt, trafo, extrapolated);
        }
    }
    for id in &mut feature.peptide_identifications {
        remap(&mut id.rt, trafo, extrapolated);
    }
    for sub in &mut feature.subordinates {
        transform_feature(sub, trafo, extrapolated);
    }
}
