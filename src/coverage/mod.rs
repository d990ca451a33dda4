/*! Coverage tracking

Keeps track of which source lines were used by accepted records, so that unused material
can be reported and exported for a follow-up pass.
!*/
mod policy;
mod tracker;

pub use policy::{CoveragePolicy, KeyOnly, TokenOverlap};
pub use tracker::{CoverageReport, CoverageTracker};
