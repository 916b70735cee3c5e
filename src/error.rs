//! Error types for the paged-merge crate.
//!
//! Caller-supplied source errors are carried through untouched as the
//! [`std::error::Error::source`] of [`MergeError::Source`].

/// Error type returned by caller-supplied page sources.
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while merging paginated sources.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// A source returned data that contradicts the configured sort order.
    #[error("ordering violation: {0}")]
    OrderingViolation(String),

    /// A caller-supplied page fetch failed.
    #[error("source {index} failed: {source}")]
    Source {
        /// Index of the failing source.
        index: usize,
        /// The error returned by the source, unchanged.
        #[source]
        source: SourceError,
    },

    /// A source index outside `0..source_count` was requested.
    #[error("unknown source index: {0}")]
    UnknownSource(usize),

    /// An injected state snapshot or cursor token could not be used.
    #[error("state error: {0}")]
    State(String),

    /// Invalid merge configuration.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, MergeError>;
