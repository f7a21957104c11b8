//! DOM errors

use crate::NodeId;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node id does not exist in the arena
    #[error("node {0:?} not found")]
    NotFound(NodeId),

    /// Operation needs an element node
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),

    /// Inserting a node would create a cycle or the parent cannot hold children
    #[error("hierarchy request error")]
    HierarchyRequest,

    /// Node is not a child of the given parent
    #[error("node {0:?} is not a child of the given parent")]
    NotAChild(NodeId),

    /// Host already carries a shadow root
    #[error("element {0:?} already has a shadow root")]
    ShadowRootExists(NodeId),

    /// Selector text could not be parsed
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    /// Custom element registry failure
    #[error(transparent)]
    CustomElement(#[from] CustomElementError),

    /// A custom element constructor failed outside the DOM layer
    #[error("custom element constructor failed: {0}")]
    Constructor(String),
}

/// Custom element errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CustomElementError {
    #[error("invalid custom element name: {0}")]
    InvalidName(String),

    #[error("element already defined: {0}")]
    AlreadyDefined(String),

    #[error("cannot extend element: {0}")]
    InvalidExtends(String),
}
