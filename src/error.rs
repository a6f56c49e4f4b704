//! The error taxonomy surfaced to callers.

use thiserror::Error;

/// Everything that can go wrong building a [`crate::registry::Registry`]
/// or driving a codec call through one.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarshalError {
    /// Null/empty inputs, a destination too small for the next
    /// write, or (at `Registry::new` time) a configuration defect:
    /// a duplicate id, an unresolvable nested dataset reference, or
    /// a variable-length sentinel not preceded by a qualifying
    /// small-integer element.
    #[error("parameter error: {0}")]
    Parameter(String),

    /// A ComId or nested dataset-reference could not be resolved
    /// against the registry at call time.
    #[error("unknown dataset or ComId: {0}")]
    UnknownDataset(u32),

    /// Recursion depth exceeded the cap of [`crate::MAX_RECURSION_DEPTH`].
    #[error("recursion depth exceeded {0} levels")]
    RecursionLimit(u8),

    /// On decode or size estimation, the wire cursor overshot the
    /// declared wire length: a schema/source size mismatch.
    #[error("wire cursor overran the source buffer")]
    Marshalling,
}
