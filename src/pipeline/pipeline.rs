//! Pipeline trait.
use crate::error::Error;

/// A runnable pipeline, generic over what a run returns (usually a summary).
pub trait Pipeline<T> {
    /// version reported when a run starts
    fn version() -> &'static str;
    fn run(&self) -> Result<T, Error>;
}
