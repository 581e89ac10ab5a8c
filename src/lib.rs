//! Apply precomputed retention-time transformations to LC-MS runs.
//!
//! ```no_run
//! use rusty_align::alignment::apply_to_experiments;
//! use rusty_align::data::model::{Experiment, Spectrum};
//! use rusty_align::transform::Transformation;
//!
//! let mut runs = vec![Experiment::from_spectra(vec![Spectrum::at(61.0), Spectrum::at(62.5)])];
//! apply_to_experiments(&mut runs, &[Transformation::shift(-1.0)])?;
//! # Ok::<(), rusty_align::alignment::AlignmentError>(())
//! ```

pub mod alignment;
pub mod data;
pub mod transform;
