//! Analytic stages of the sap evaluation pipeline
//!
//! Each stage is implemented in its own module, leaf-first in
//! dependency order: ratios, classification, delta, cross-leaf signal,
//! system aggregation, trend.

pub mod classify;
pub mod delta;
pub mod ratios;
pub mod signal;
pub mod system;
pub mod trend;

// Re-export the stage entry points and their result types
pub use classify::{classify, Direction, Status, StatusResult};
pub use delta::{delta, Delta, DeltaDirection};
pub use ratios::{compute_ratios, DerivedRatios};
pub use signal::{signal, LeafSignal, SignalKind};
pub use system::{aggregate_systems, Confidence, Issue, IssueValues, StatusMaps, SystemStatus};
pub use trend::{trend, TrendDirection, TrendResult};
