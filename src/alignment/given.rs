use log::{debug, info};

use super::apply::{self, dispatch};
use super::{AlignmentError, AlignmentOptions, MapAlignment, TransformationProvider};
use crate::data::model::{Experiment, FeatureMap, PeptideIdentification};
use crate::transform::Transformation;

/// Alignment that fits nothing: it applies transformations computed elsewhere.
///
/// Owns its own copy of the transformations. Not `Clone`; duplicate the set
/// explicitly through [`transformations`](Self::transformations).
#[derive(Debug, Default)]
pub struct ApplyGivenTransformation {
    given: Vec<Transformation>,
    parallel: bool,
}

impl ApplyGivenTransformation {
    pub const PRODUCT_NAME: &'static str = "apply_given_trafo";

    pub fn new(trafos: &[Transformation]) -> Self {
        ApplyGivenTransformation {
            given: trafos.to_vec(),
            parallel: false,
        }
    }

    /// Process independent runs on the rayon thread pool.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Registry constructor.
    pub fn create(
        provider: &dyn TransformationProvider,
        options: AlignmentOptions,
    ) -> Result<Box<dyn MapAlignment>, AlignmentError> {
        let mut algorithm = ApplyGivenTransformation::default().with_parallelism(options.parallel);
        algorithm.load_transformations(provider)?;
        Ok(Box::new(algorithm))
    }

    /// Replace the given transformations with a copy of `trafos`.
    pub fn set_transformations(&mut self, trafos: &[Transformation]) {
        self.given = trafos.to_vec();
    }

    pub fn transformations(&self) -> &[Transformation] {
        &self.given
    }

    pub fn transformations_mut(&mut self) -> &mut Vec<Transformation> {
        &mut self.given
    }

    /// Replace the given transformations with those of `provider`. On error the
    /// previous set is kept.
    pub fn load_transformations(
        &mut self,
        provider: &dyn TransformationProvider,
    ) -> Result<(), AlignmentError> {
        let trafos = provider
            .load_transformations()
            .map_err(AlignmentError::Provider)?;
        info!("Loaded {} given transformations", trafos.len());
        self.given = trafos;
        Ok(())
    }

    fn applied(&self, kind: &str, n: usize) -> Vec<Transformation> {
        debug!("Applied given transformations to {n} {kind}");
        self.given.clone()
    }
}

impl MapAlignment for ApplyGivenTransformation {
    fn name(&self) -> &'static str {
        Self::PRODUCT_NAME
    }

    fn align_experiments(
        &self,
        maps: &mut [Experiment],
    ) -> Result<Vec<Transformation>, AlignmentError> {
        dispatch(
            maps,
            &self.given,
            self.parallel,
            "experiment",
            apply::transform_experiment,
        )?;
        Ok(self.applied("experiments", maps.len()))
    }

    fn align_feature_maps(
        &self,
        maps: &mut [FeatureMap],
    ) -> Result<Vec<Transformation>, AlignmentError> {
        dispatch(
            maps,
            &self.given,
            self.parallel,
            "feature map",
            apply::transform_feature_map,
        )?;
        Ok(self.applied("feature maps", maps.len()))
    }

    fn align_identifications(
        &self,
        runs: &mut [Vec<PeptideIdentification>],
    ) -> Result<Vec<Transformation>, AlignmentError> {
        dispatch(
            runs,
            &self.given,
            self.parallel,
            "identification run",
            |ids, t| apply::transform_identifications(ids, t),
        )?;
        Ok(self.applied("identification runs", runs.len()))
    }
}
