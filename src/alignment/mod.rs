//! Map alignment layer.
//!
//! Architecture:
//! ```text
//!   AlgorithmRegistry ── "apply_given_trafo" ──► ApplyGivenTransformation
//!                                                     │  (given trafos from a
//!                                                     │   TransformationProvider)
//!                                                     ▼
//!                              apply_to_{experiments, feature_maps, identifications}
//! ```

pub mod apply;
mod error;
mod given;
mod provider;
mod registry;

pub use apply::{apply_to_experiments, apply_to_feature_maps, apply_to_identifications};
pub use error::AlignmentError;
pub use given::ApplyGivenTransformation;
pub use provider::TransformationProvider;
pub use registry::{AlgorithmRegistry, AlignmentOptions, Constructor};

use crate::data::model::{Experiment, FeatureMap, PeptideIdentification};
use crate::transform::Transformation;

/// An alignment algorithm, with one entry point per collection shape.
///
/// Each method corrects the runs in place and returns the transformation that
/// was applied to each run, index-aligned with the input.
pub trait MapAlignment: Send {
    /// Product name under which the algorithm is registered.
    fn name(&self) -> &'static str;

    fn align_experiments(
        &self,
        maps: &mut [Experiment],
    ) -> Result<Vec<Transformation>, AlignmentError>;

    fn align_feature_maps(
        &self,
        maps: &mut [FeatureMap],
    ) -> Result<Vec<Transformation>, AlignmentError>;

    fn align_identifications(
        &self,
        runs: &mut [Vec<PeptideIdentification>],
    ) -> Result<Vec<Transformation>, AlignmentError>;
}
