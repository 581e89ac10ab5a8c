use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MetadataValue – a single opaque annotation value
// ---------------------------------------------------------------------------

/// A dynamically-typed annotation value carried by spectra and features.
///
/// Deserialized untagged, so a JSON string always becomes `String`; `Date`
/// is only produced by loaders that know the column type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date string kept as text for simplicity.
    Date(String),
    Null,
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v:.4}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Date(d) => write!(f, "{d}"),
            MetadataValue::Null => write!(f, "<null>"),
        }
    }
}

pub type Metadata = BTreeMap<String, MetadataValue>;

// ---------------------------------------------------------------------------
// RtRange – cached retention-time extent of a collection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RtRange {
    pub min: f64,
    pub max: f64,
}

impl RtRange {
    /// Smallest range covering every value, or `None` for an empty iterator.
    pub fn covering(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |acc, rt| match acc {
            None => Some(RtRange { min: rt, max: rt }),
            Some(r) => Some(RtRange {
                min: r.min.min(rt),
                max: r.max.max(rt),
            }),
        })
    }
}

// ---------------------------------------------------------------------------
// Spectrum / Experiment – the scan-level collection
// ---------------------------------------------------------------------------

/// A single scan. Only `rt` takes part in alignment; the rest is payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    /// Retention time in seconds.
    pub rt: f64,
    #[serde(default = "default_ms_level")]
    pub ms_level: u8,
    /// m/z axis.
    #[serde(default)]
    pub mz: Vec<f64>,
    /// Intensity axis – same length as `mz`.
    #[serde(default)]
    pub intensity: Vec<f64>,
    #[serde(default)]
    pub metadata: Metadata,
}

fn default_ms_level() -> u8 {
    1
}

impl Spectrum {
    /// An MS1 scan at `rt` without peaks.
    pub fn at(rt: f64) -> Self {
        Spectrum {
            rt,
            ms_level: 1,
            mz: Vec::new(),
            intensity: Vec::new(),
            metadata: Metadata::new(),
        }
    }
}

/// One LC-MS run: spectra kept in ascending retention-time order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub spectra: Vec<Spectrum>,
    #[serde(skip)]
    rt_range: Option<RtRange>,
}

impl Experiment {
    /// Wrap spectra as given and compute the range cache.
    pub fn from_spectra(spectra: Vec<Spectrum>) -> Self {
        let mut exp = Experiment {
            spectra,
            rt_range: None,
        };
        exp.update_ranges();
        exp
    }

    /// Stable sort by retention time.
    pub fn sort_spectra(&mut self) {
        self.spectra.sort_by(|a, b| a.rt.total_cmp(&b.rt));
    }

    pub fn update_ranges(&mut self) {
        self.rt_range = RtRange::covering(self.spectra.iter().map(|s| s.rt));
    }

    /// Cached retention-time extent, as of the last `update_ranges`.
    pub fn rt_range(&self) -> Option<RtRange> {
        self.rt_range
    }

    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Identifications
// ---------------------------------------------------------------------------

/// A candidate peptide for an identification, in ranked order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeptideHit {
    pub sequence: String,
    pub score: f64,
    #[serde(default)]
    pub charge: i32,
}

/// Identification of one precursor; carries the retention time it was
/// observed at and its ranked hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeptideIdentification {
    pub rt: f64,
    pub mz: f64,
    #[serde(default)]
    pub hits: Vec<PeptideHit>,
}

impl PeptideIdentification {
    pub fn at(rt: f64, mz: f64) -> Self {
        PeptideIdentification {
            rt,
            mz,
            hits: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Features
// ---------------------------------------------------------------------------

/// A vertex of a convex hull. Only `rt` is a transformable coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HullPoint {
    pub rt: f64,
    pub mz: f64,
}

/// Outline of one mass trace. Point order is the polygon winding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvexHull {
    pub points: Vec<HullPoint>,
}

impl ConvexHull {
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        ConvexHull {
            points: points
                .into_iter()
                .map(|(rt, mz)| HullPoint { rt, mz })
                .collect(),
        }
    }
}

/// A quantified feature, possibly grouping subordinate features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub rt: f64,
    pub mz: f64,
    #[serde(default)]
    pub intensity: f64,
    #[serde(default)]
    pub charge: i32,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub convex_hulls: Vec<ConvexHull>,
    /// Nested features, e.g. isotope traces. Not ordered by `rt`.
    #[serde(default)]
    pub subordinates: Vec<Feature>,
    #[serde(default)]
    pub peptide_identifications: Vec<PeptideIdentification>,
}

impl Feature {
    pub fn at(rt: f64, mz: f64) -> Self {
        Feature {
            rt,
            mz,
            intensity: 0.0,
            charge: 0,
            metadata: Metadata::new(),
            convex_hulls: Vec::new(),
            subordinates: Vec::new(),
            peptide_identifications: Vec::new(),
        }
    }
}

/// All features detected in one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureMap {
    pub features: Vec<Feature>,
    /// Identifications that could not be assigned to any feature.
    #[serde(default)]
    pub unassigned_peptide_identifications: Vec<PeptideIdentification>,
    #[serde(skip)]
    rt_range: Option<RtRange>,
}

impl FeatureMap {
    pub fn from_features(features: Vec<Feature>) -> Self {
        let mut map = FeatureMap {
            features,
            unassigned_peptide_identifications: Vec::new(),
            rt_range: None,
        };
        map.update_ranges();
        map
    }

    /// Stable sort of the top-level features by retention time.
    /// Subordinates are left alone.
    pub fn sort_by_rt(&mut self) {
        self.features.sort_by(|a, b| a.rt.total_cmp(&b.rt));
    }

    /// Range over top-level feature positions.
    pub fn update_ranges(&mut self) {
        self.rt_range = RtRange::covering(self.features.iter().map(|f| f.rt));
    }

    pub fn rt_range(&self) -> Option<RtRange> {
        self.rt_range
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
