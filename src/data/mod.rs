//! Data layer: run-level collections and their file formats.
//!
//! Architecture:
//! ```text
//!  .parquet / .json            .json / .csv
//!        │                          │
//!        ▼                          ▼
//!   ┌──────────┐            ┌──────────────────┐
//!   │  loader   │            │ loader (trafos)   │
//!   └──────────┘            └──────────────────┘
//!        │                          │
//!        ▼                          ▼
//!   ┌─────────────────────────────────────────┐
//!   │ Experiment / FeatureMap / identifications│ ◄── alignment::apply
//!   └─────────────────────────────────────────┘
//! ```

pub mod loader;
pub mod model;
