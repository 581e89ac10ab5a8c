use super::remap;
use crate::data::model::Experiment;
use crate::transform::Transform;

/// Transform every spectrum of one run, then restore rt order and the range
/// cache. Returns the number of extrapolated retention times.
pub(crate) fn transform_experiment<T: Transform>(exp: &mut Experiment, trafo: &T) -> usize {
    let mut extrapolated = 0;
    for spectrum in &mut exp.spectra {
        remap(&mut spectrum.rt, trafo, &mut extrapolated);
    }
    // The transformation need not be monotonic.
    exp.sort_spectra();
    exp.update_ranges();
    extrapolated
}
