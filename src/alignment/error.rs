use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlignmentError {
    /// Raised before any collection is touched.
    #[error("got {collections} collections but {transformations} transformations")]
    SizeMismatch {
        collections: usize,
        transformations: usize,
    },

    #[error("unknown alignment algorithm '{name}' (known: {known})")]
    UnknownAlgorithm { name: String, known: String },

    #[error("failed to load transformations: {0:#}")]
    Provider(anyhow::Error),
}
