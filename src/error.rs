use thiserror::Error;

/// Result alias for `commune`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by graph construction, clustering and the spill path.
///
/// Every variant is fatal for the invocation that produced it; nothing is
/// retried internally.
#[derive(Debug, Error)]
pub enum Error {
    /// Graph or neighbor input is structurally invalid.
    #[error("malformed graph: {message}")]
    MalformedGraph {
        /// Human-readable explanation.
        message: String,
    },

    /// Configuration rejected before any computation started.
    #[error("invalid configuration '{name}': {message}")]
    Configuration {
        /// Option name.
        name: &'static str,
        /// Human-readable explanation.
        message: String,
    },

    /// No restart produced a partition (timeouts, worker pool failure).
    #[error("optimization failed: {0}")]
    Optimization(String),

    /// The out-of-process optimizer failed or produced unusable output.
    #[error("external optimizer failed: {message}")]
    ExternalProcess {
        /// Human-readable explanation.
        message: String,
    },

    /// I/O error while reading or writing spill files.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedGraph {
            message: message.into(),
        }
    }

    pub(crate) fn config(name: &'static str, message: impl Into<String>) -> Self {
        Error::Configuration {
            name,
            message: message.into(),
        }
    }

    pub(crate) fn external(message: impl Into<String>) -> Self {
        Error::ExternalProcess {
            message: message.into(),
        }
    }
}
