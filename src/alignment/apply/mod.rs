//! Appliers: walk one collection and move every retention time through its
//! paired transformation.
//!
//! ```text
//!  collections[i] ──┐
//!                   ├─► applier ─► remap every rt ─► re-sort (if ordered) ─► ranges
//!  trafos[i] ───────┘
//! ```

mod experiment;
mod feature;
mod identification;

use log::debug;
use rayon::prelude::*;

use super::AlignmentError;
use crate::data::model::{Experiment, FeatureMap, PeptideIdentification};
use crate::transform::Transform;

pub(crate) use experiment::transform_experiment;
pub(crate) use feature::transform_feature_map;
pub(crate) use identification::transform_identifications;

/// Apply `trafos[i]` to `maps[i]` for every run.
///
/// Spectra are re-sorted by their new retention time.
pub fn apply_to_experiments<T>(maps: &mut [Experiment], trafos: &[T]) -> Result<(), AlignmentError>
where
    T: Transform + Sync,
{
    dispatch(maps, trafos, false, "experiment", transform_experiment)
}

/// Apply `trafos[i]` to `maps[i]`, including subordinate features, convex
/// hulls and attached identifications. Top-level features are re-sorted.
pub fn apply_to_feature_maps<T>(maps: &mut [FeatureMap], trafos: &[T]) -> Result<(), AlignmentError>
where
    T: Transform + Sync,
{
    dispatch(maps, trafos, false, "feature map", transform_feature_map)
}

/// Apply `trafos[i]` to every identification of run `i`. Order is kept.
pub fn apply_to_identifications<T>(
    runs: &mut [Vec<PeptideIdentification>],
    trafos: &[T],
) -> Result<(), AlignmentError>
where
    T: Transform + Sync,
{
    dispatch(runs, trafos, false, "identification run", |ids, t| {
        transform_identifications(ids, t)
    })
}

pub(crate) fn check_sizes(collections: usize, transformations: usize) -> Result<(), AlignmentError> {
    if collections != transformations {
        return Err(AlignmentError::SizeMismatch {
            collections,
            transformations,
        });
    }
    Ok(())
}

/// Validate sizes, then run `apply_one` on every (collection, transformation)
/// pair. Nothing is mutated when the sizes differ.
pub(crate) fn dispatch<C, T, F>(
    collections: &mut [C],
    trafos: &[T],
    parallel: bool,
    kind: &str,
    apply_one: F,
) -> Result<(), AlignmentError>
where
    C: Send,
    T: Transform + Sync,
    F: Fn(&mut C, &T) -> usize + Sync,
{
    check_sizes(collections.len(), trafos.len())?;

    let run = |(index, (collection, trafo)): (usize, (&mut C, &T))| {
        let extrapolated = apply_one(collection, trafo);
        if extrapolated > 0 {
            debug!("{kind} {index}: {extrapolated} retention times extrapolated outside the transformation domain");
        }
    };

    if parallel {
        collections
            .par_iter_mut()
            .zip(trafos.par_iter())
            .enumerate()
            .for_each(run);
    } else {
        collections.iter_mut().zip(trafos).enumerate().for_each(run);
    }
    Ok(())
}

/// Replace `rt` with its image, counting boundary extrapolations.
fn remap<T: Transform>(rt: &mut f64, trafo: &T, extrapolated: &mut usize) {
    let eval = trafo.evaluate(*rt);
    *rt = eval.value;
    if eval.extrapolated {
        *extrapolated += 1;
    }
}
