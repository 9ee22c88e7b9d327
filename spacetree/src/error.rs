//! Module containing the universal error type
use thiserror::Error;

/// Universal error type for `spacetree`
#[derive(Error, Debug)]
pub enum Error {
    /// Node has not been evaluated
    #[error("node has not been evaluated")]
    Unevaluated,

    /// Primitive was constructed with a negative length
    #[error("primitive length {0} is negative")]
    NegativeLength(f64),

    /// Thread pool must contain at least one thread
    #[error("thread pool must contain at least one thread")]
    EmptyThreadPool,

    /// Worker threads could not be started
    #[error("could not build thread pool: {0}")]
    ThreadPoolBuild(#[from] rayon::ThreadPoolBuildError),

    /// A job queued on the thread pool panicked
    #[error("job panicked in thread pool: {0}")]
    JobPanicked(String),

    /// Thread pool has been terminated
    #[error("thread pool has been terminated")]
    PoolTerminated,

    /// Grid sampler must place at least one sample on each axis
    #[error("grid sampler needs at least one sample per axis (got {0})")]
    BadSampleCount(usize),

    /// Structured grid axis does not contain enough points
    #[error("grid axis {axis} has {points} points; at least 2 are needed")]
    BadGridSize {
        /// Axis index
        axis: usize,
        /// Number of points requested along that axis
        points: usize,
    },

    /// Structured grid axis has an inverted range
    #[error("structured grid axis {axis} has min {min} larger than max {max}")]
    BadDomain {
        /// Axis index
        axis: usize,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// Lookup table is inconsistent with the primitive it describes
    #[error("bad lookup table: {0}")]
    BadTable(&'static str),

    /// IO error; see inner code for details
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}
