//! Core record types and consistency checks for window-size sweep results.
//!
//! A sweep evaluates one behavior classifier under several window sizes with
//! leave-one-out cross-validation over (video, identity) test cases. This
//! crate models the tables extracted from the sweep's text output:
//!
//! - [`VideoResult`]: one per-video evaluation row (seven metrics).
//! - [`SummaryStats`]: reported per-window aggregates, each optional.
//! - [`FeatureImportance`]: ranked feature-importance entries.
//! - [`SweepMetadata`]: run-level counts derived during parsing.
//!
//! Validation ([`validate_sweep`]) checks row counts, per-window test-case
//! sets, data integrity, and reported-versus-recomputed aggregates. The
//! [`analysis`] module derives the statistics a report renders.
//!
//! # Example
//!
//! ```
//! use window_sweep_core::*;
//!
//! let tables = SweepTables {
//!     videos: vec![
//!         VideoResult::new(5, 1, "vidA.mp4", Some(0), [0.80; 7]),
//!         VideoResult::new(10, 1, "vidA.mp4", Some(0), [0.90; 7]),
//!     ],
//!     ..SweepTables::default()
//! };
//!
//! let report = validate_sweep(&tables, &ValidationOptions::default());
//! assert!(report.video_sets.passed);
//! // No summary statistics were supplied to cross-check.
//! assert!(!report.aggregates.passed);
//! ```

pub mod analysis;
pub mod stats;
mod types;
mod validate;

pub use analysis::{BestWindow, BoxPlotStats, SweepAnalysis, VideoPerformance};
pub use types::*;
pub use validate::{
    AggregateCheck, DEFAULT_TOLERANCE, IntegrityCheck, RowCountCheck, TableKind, ValidationIssue,
    ValidationOptions, ValidationReport, VideoSetCheck, check_aggregates, check_integrity,
    check_row_counts, check_video_sets, validate_sweep,
};
