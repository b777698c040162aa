//! Watch Index Error Hierarchy
//!
//! Defines the error types for the indexed resource store, categorized by
//! the layer that raises them: configuration, field-path evaluation,
//! indexing, storage and watch coordination.

use std::time::Duration;

use config::ConfigError;
use tokio::task::JoinError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

/// Error type returned by consumer callbacks. The core only logs it.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration loading and deserialization failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Semantically invalid configuration, fatal for the constructor
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Malformed field-path expression
    #[error(transparent)]
    Path(#[from] PathError),

    /// Filter / key extraction failures
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Store operation failures
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Watch coordination failures
    #[error(transparent)]
    Watch(#[from] WatchError),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

/// Field-path expression errors, raised when parsing an expression or when
/// navigating a resource with one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("empty field path")]
    Empty,

    #[error("empty segment at offset {offset} in `{expression}`")]
    EmptySegment { expression: String, offset: usize },

    #[error("unterminated bracket or quote in `{expression}`")]
    Unterminated { expression: String },

    #[error("invalid bracket selector `{selector}` in `{expression}`")]
    InvalidSelector { expression: String, selector: String },

    #[error("unexpected character `{found}` at offset {offset} in `{expression}`")]
    UnexpectedChar {
        expression: String,
        offset: usize,
        found: char,
    },

    /// A scalar leaf was reached while segments remain
    #[error("cannot navigate into scalar at segment `{segment}`")]
    NotNavigable { segment: String },
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Indexer was configured without any index-by expression
    #[error("at least one index-by expression is required")]
    NoIndexExpressions,

    /// Expression failed validation at construction time
    #[error("invalid expression `{expression}`: {source}")]
    InvalidExpression {
        expression: String,
        #[source]
        source: PathError,
    },

    /// Ignore-field pattern could not be applied
    #[error("failed to filter `{pattern}`: {source}")]
    Filter {
        pattern: String,
        #[source]
        source: PathError,
    },

    /// Key expression matched nothing; index keys are required
    #[error("expression `{expression}` matched no value")]
    NoMatch { expression: String },
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Operation requires exactly the configured number of keys
    #[error("expected {expected} index keys, got {actual}")]
    KeyCount { expected: usize, actual: usize },

    /// Lookup supplied more keys than the store is indexed by
    #[error("store is indexed by {max} keys, got {actual}")]
    TooManyKeys { max: usize, actual: usize },

    /// Resource body could not be fetched for a tracked reference
    #[error("failed to fetch {resource}: {source}")]
    Fetch {
        resource: String,
        #[source]
        source: FetchError,
    },

    /// Fetched body could not be filtered before caching
    #[error("failed to filter fetched {resource}: {source}")]
    PostFetchFilter {
        resource: String,
        #[source]
        source: IndexError,
    },
}

/// Errors surfaced by a [`crate::ResourceFetcher`].
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("fetch client error: {0}")]
    Client(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The event source stopped delivering before the watcher was stopped
    #[error("event source closed")]
    SourceClosed,

    /// `start` called on a watcher that has already been stopped
    #[error("watcher already stopped")]
    AlreadyStopped,

    /// Debounce timers need a tokio runtime captured at construction
    #[error("no tokio runtime available: {0}")]
    NoRuntime(String),

    #[error("Background task failed: {0}")]
    TaskFailed(#[from] JoinError),
}

// ============== Conversion Implementations ============== //
impl From<JoinError> for Error {
    fn from(err: JoinError) -> Self {
        WatchError::TaskFailed(err).into()
    }
}
