//! Error types returned by the library.
//!
//! Most public APIs return [`crate::Result`], which uses [`Error`] as the error
//! type. The variants provide access to more specific error categories when
//! needed. Runner failures ([`RunFailure`]) are deliberately *not* part of
//! [`Error`]: they are the bug signals the harness records and continues past.

use std::io;

use thiserror::Error;

use crate::cfg::BlockId;

/// Convenient result alias for the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top level error surfaced by the library APIs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Errors raised by structured-CFG queries and mutation primitives.
    #[error(transparent)]
    Cfg(#[from] CfgError),

    /// Errors raised while generating CFGs or directions.
    #[error(transparent)]
    Generate(#[from] GenerateError),

    /// Errors raised while emitting source from a CFG.
    #[error(transparent)]
    Emit(#[from] EmitError),

    /// I/O failures when reading or writing harness artifacts.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Serialization failures for CFG records, directions, or bug reports.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Errors raised by structured-CFG queries and mutation primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CfgError {
    /// No block carries the `EntryBlock` attribute.
    #[error("no entry block is marked in the CFG")]
    NoEntry,

    /// More than one block carries the `EntryBlock` attribute.
    #[error("more than one entry block is marked (found {count})")]
    AmbiguousEntry {
        /// Number of blocks marked as entry.
        count: usize,
    },

    /// A query or mutation referenced a block that does not exist.
    #[error("unknown block {block}")]
    UnknownBlock {
        /// The missing block.
        block: BlockId,
    },

    /// A header block has no `Merge` attribute.
    #[error("block {block} has no merge attribute")]
    NoMerge {
        /// The header in question.
        block: BlockId,
    },

    /// An attribute was set twice on the same block.
    #[error("attribute {attribute:?} already present on block {block}")]
    DuplicateAttribute {
        /// The block carrying the attribute.
        block: BlockId,
        /// Name of the duplicated attribute.
        attribute: &'static str,
    },

    /// An edge removal referenced an edge that does not exist.
    #[error("no edge from {from} to {to}")]
    UnknownEdge {
        /// Edge source.
        from: BlockId,
        /// Edge destination.
        to: BlockId,
    },

    /// Self-loops are rejected at construction time.
    #[error("self-loop on block {block} is not allowed")]
    SelfLoop {
        /// The offending block.
        block: BlockId,
    },

    /// An edge-index lookup was out of range for the block's out-degree.
    #[error("edge index {index} out of range for block {block} (out-degree {out_degree})")]
    EdgeIndexOutOfRange {
        /// The branching block.
        block: BlockId,
        /// The requested edge index.
        index: usize,
        /// The block's actual out-degree.
        out_degree: usize,
    },

    /// The directions vector ran out before the traversal reached an exit.
    #[error("directions exhausted at block {block} after {consumed} values")]
    DirectionsExhausted {
        /// Block at which the next direction was needed.
        block: BlockId,
        /// Number of directions consumed so far.
        consumed: usize,
    },

    /// A structural invariant does not hold.
    #[error("invalid CFG: {reason}")]
    Invalid {
        /// Human-readable description of the violated invariant.
        reason: String,
    },
}

/// Errors raised while generating CFGs or directions vectors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum GenerateError {
    /// The batch generator failed to find a new distinct CFG in time.
    ///
    /// Non-fatal: callers keep whatever was collected before the timeout.
    #[error("no new distinct CFG found within {budget_secs} s (collected {collected})")]
    GenerationTimeout {
        /// Budget that elapsed without progress, in seconds.
        budget_secs: u64,
        /// Number of distinct CFGs collected before the timeout.
        collected: usize,
    },

    /// Directions sampling failed to reach an exit within the retry budget.
    #[error("failed to sample a terminating directions vector (max length {max_length}, {attempts} attempts)")]
    NoTerminatingPath {
        /// Maximum directions length per attempt.
        max_length: usize,
        /// Number of attempts made.
        attempts: usize,
    },

    /// The generator configuration enables no construct at all.
    #[error("generator configuration enables no construct")]
    NoConstructEnabled,

    /// A CFG query failed during generation; indicates a generator bug.
    #[error(transparent)]
    Cfg(#[from] CfgError),
}

/// Errors raised while emitting source from a CFG.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum EmitError {
    /// The CFG or configuration requests something the target cannot express.
    #[error("unsupported feature for {language}: {feature}")]
    UnsupportedFeature {
        /// Human-readable target name.
        language: &'static str,
        /// The unsupported feature.
        feature: String,
    },

    /// A block was emitted twice; indicates a traversal bug.
    #[error("block {block} emitted more than once")]
    DuplicateEmission {
        /// The block emitted twice.
        block: BlockId,
    },

    /// The emission mode requires a directions vector and none was supplied.
    #[error("{code_type} emission requires a directions vector")]
    MissingDirections {
        /// The mode that needed the directions.
        code_type: &'static str,
    },

    /// A CFG query failed during emission.
    #[error(transparent)]
    Cfg(#[from] CfgError),
}

/// Failure kinds reported by the external program runner.
///
/// These are the signals the whole tool exists to find. The harness records
/// each one as a bug report and continues the campaign; they never abort it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RunFailure {
    /// The target toolchain rejected the emitted program.
    #[error("compilation failed: {detail}")]
    Compile {
        /// Stderr or diagnostic output of the compiler.
        detail: String,
    },

    /// The compiled program crashed or exited abnormally.
    #[error("runtime failure: {detail}")]
    Runtime {
        /// Stderr or diagnostic output of the runtime.
        detail: String,
    },

    /// The child process exceeded its per-invocation timeout.
    #[error("timed out after {timeout_secs} s: {command}")]
    Timeout {
        /// The command that was killed.
        command: String,
        /// The timeout that elapsed, in seconds.
        timeout_secs: u64,
    },

    /// The observed path differs from the oracle's prediction.
    #[error("path mismatch: expected {expected:?}, observed {observed:?}")]
    PathMismatch {
        /// The oracle's predicted block sequence.
        expected: Vec<u32>,
        /// The block sequence the program reported.
        observed: Vec<u32>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cfg_error_messages_name_the_block() {
        let err = CfgError::NoMerge {
            block: BlockId::new(7),
        };
        assert_eq!(err.to_string(), "block b7 has no merge attribute");

        let err = CfgError::SelfLoop {
            block: BlockId::new(3),
        };
        assert!(err.to_string().contains("b3"));
    }

    #[test]
    fn run_failure_is_not_convertible_to_error() {
        // RunFailure deliberately has no From impl into Error; this test just
        // pins the display shape the bug reports rely on.
        let failure = RunFailure::PathMismatch {
            expected: vec![1, 2, 4],
            observed: vec![1, 3, 4],
        };
        let text = failure.to_string();
        assert!(text.contains("expected"));
        assert!(text.contains("observed"));
    }
}
