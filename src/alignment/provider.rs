use anyhow::Result;

use crate::transform::Transformation;

/// Source of the transformations an aligner applies, e.g. files named on the
/// command line. One transformation per input run, in run order.
pub trait TransformationProvider {
    fn load_transformations(&self) -> Result<Vec<Transformation>>;
}

impl TransformationProvider for Vec<Transformation> {
    fn load_transformations(&self) -> Result<Vec<Transformation>> {
        Ok(self.clone())
    }
}
