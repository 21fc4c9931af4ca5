//! Error types for Horizon Bridge.

use crate::property::ValueSource;

/// The main error type for Horizon Bridge core operations.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Property-related error.
    #[error("Property error: {0}")]
    Property(#[from] PropertyError),
    /// Tree-related error.
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),
}

/// Errors raised by the property system.
///
/// Registration errors are configuration bugs: they surface once, when the
/// descriptor table is built, never while styling a tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    /// A property with this name is already registered on the owning type.
    #[error("Property '{name}' is already registered on '{owner}'")]
    DuplicateRegistration {
        /// The owning type name.
        owner: &'static str,
        /// The duplicated property name.
        name: String,
    },
    /// Another descriptor already claims this CSS name.
    #[error("CSS property '{name}' is already registered")]
    DuplicateCssName {
        /// The duplicated CSS name.
        name: String,
    },
    /// The property id does not belong to this registry.
    #[error("Unknown property '{name}'")]
    UnknownProperty {
        /// Name or id of the unknown property.
        name: String,
    },
    /// The value type does not match the descriptor's declared type.
    #[error("Property '{property}' type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// The property name.
        property: String,
        /// The declared type name.
        expected: &'static str,
        /// The type name of the offered value.
        got: &'static str,
    },
    /// The descriptor's capabilities do not include this value source.
    #[error("Property '{property}' does not accept {tier:?} values")]
    UnsupportedSource {
        /// The property name.
        property: String,
        /// The rejected value source.
        tier: ValueSource,
    },
    /// Text conversion or coercion rejected the value.
    #[error("Invalid value for property '{property}': {message}")]
    InvalidValue {
        /// The property name.
        property: String,
        /// Converter message.
        message: String,
    },
    /// A shorthand targets a longhand it may not write.
    #[error("Shorthand '{shorthand}' cannot write '{longhand}': {reason}")]
    InvalidLonghand {
        /// The shorthand name.
        shorthand: String,
        /// Name or id of the rejected longhand.
        longhand: String,
        /// Why the longhand was rejected.
        reason: &'static str,
    },
    /// The descriptor has no text converter.
    #[error("Property '{property}' cannot be set from text")]
    NoConverter {
        /// The property name.
        property: String,
    },
}

impl PropertyError {
    /// Create a value error.
    pub fn invalid_value(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            property: property.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by view tree operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The node id is invalid or the node has been destroyed.
    #[error("Invalid or destroyed node")]
    InvalidNode,
    /// Attempted to make a node its own ancestor.
    #[error("Cannot attach a node to itself or to one of its descendants")]
    CircularParentage,
    /// The node already has a parent; detach it first.
    #[error("Node is already attached to a parent")]
    AlreadyAttached,
    /// `resume_native_updates` was called without a matching suspend.
    #[error("Native updates resumed more times than they were suspended")]
    UnbalancedResume,
}

/// A specialized Result type for Horizon Bridge core operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
