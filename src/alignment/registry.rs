use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::{AlignmentError, ApplyGivenTransformation, MapAlignment, TransformationProvider};

/// Settings shared by every algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlignmentOptions {
    /// Process independent runs on the rayon thread pool.
    pub parallel: bool,
}

/// Builds an algorithm, loading whatever transformations it needs from the
/// provider.
pub type Constructor = fn(
    &dyn TransformationProvider,
    AlignmentOptions,
) -> Result<Box<dyn MapAlignment>, AlignmentError>;

/// Product name → constructor.
pub struct AlgorithmRegistry {
    constructors: BTreeMap<&'static str, Constructor>,
}

static GLOBAL: OnceLock<AlgorithmRegistry> = OnceLock::new();

impl AlgorithmRegistry {
    pub fn empty() -> Self {
        AlgorithmRegistry {
            constructors: BTreeMap::new(),
        }
    }

    /// Registry with every algorithm this crate ships.
    pub fn with_builtin() -> Self {
        let mut registry = AlgorithmRegistry::empty();
        registry.register(
            ApplyGivenTransformation::PRODUCT_NAME,
            ApplyGivenTransformation::create,
        );
        registry
    }

    /// Process-wide registry, built on first use.
    pub fn global() -> &'static AlgorithmRegistry {
        GLOBAL.get_or_init(AlgorithmRegistry::with_builtin)
    }

    /// Register `constructor` under `name`, replacing any earlier entry.
    pub fn register(&mut self, name: &'static str, constructor: Constructor) {
        self.constructors.insert(name, constructor);
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.constructors.keys().copied()
    }

    pub fn create(
        &self,
        name: &str,
        provider: &dyn TransformationProvider,
        options: AlignmentOptions,
    ) -> Result<Box<dyn MapAlignment>, AlignmentError> {
        let constructor =
            self.constructors
                .get(name)
                .ok_or_else(|| AlignmentError::UnknownAlgorithm {
                    name: name.to_string(),
                    known: self.names().collect::<Vec<_>>().join(", "),
                })?;
        constructor(provider, options)
    }
}
