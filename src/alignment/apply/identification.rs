use super::remap;
use crate::data::model::PeptideIdentification;
use crate::transform::Transform;

/// Transform each identification in place. Insertion order is meaningful and
/// is never changed.
pub(crate) fn transform_identifications<T: Transform>(
    ids: &mut [PeptideIdentification],
    trafo: &T,
) -> usize {
    let mut extrapolated = 0;
    for id in ids {
        remap(&mut id.rt, trafo, &mut extrapolated);
    }
    extrapolated
}
