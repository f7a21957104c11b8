//! HTNA errors

use htna_dom::DomError;

/// Result type for HTNA operations
pub type Result<T> = std::result::Result<T, HtnaError>;

/// HTNA errors
#[derive(Debug, thiserror::Error)]
pub enum HtnaError {
    /// Tag already registered, here or in the host registry
    #[error("\"{0}\" element already defined")]
    DuplicateDefinition(String),

    /// Programmatic instantiation of an unregistered tag
    #[error("no definition registered for \"{0}\"")]
    MissingDefinition(String),

    /// Tag is not a valid custom element name
    #[error("invalid custom element name: \"{0}\"")]
    InvalidName(String),

    #[error("unknown property: {0}")]
    UnknownProperty(String),

    #[error("property {0} has no setter")]
    ReadOnlyProperty(String),

    /// Event waiter was cancelled before the event fired
    #[error("wait for event '{0}' was cancelled")]
    EventCancelled(String),

    #[error("timed out waiting for event '{0}'")]
    EventTimeout(String),

    /// Selector matched no element
    #[error("no element matches selector: {0}")]
    NoMatch(String),

    /// Options document could not be decoded
    #[error("invalid options: {0}")]
    InvalidOptions(#[from] serde_json::Error),

    #[error(transparent)]
    Dom(#[from] DomError),
}

impl From<HtnaError> for DomError {
    fn from(err: HtnaError) -> Self {
        match err {
            HtnaError::Dom(err) => err,
            other => DomError::Constructor(other.to_string()),
        }
    }
}
