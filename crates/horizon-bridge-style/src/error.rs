//! Error types for the styling system.

use horizon_bridge_core::{BridgeError, PropertyError, TreeError};

/// Result type alias for style operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the styling system.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A selector joins sequences with a combinator the engine does not
    /// support.
    #[error("Unsupported combinator '{combinator}' in selector '{selector}'")]
    UnsupportedCombinator { selector: String, combinator: String },

    /// A declaration names a CSS property no descriptor is registered for.
    ///
    /// Only raised when the scope is configured to reject unknown properties.
    #[error("Unknown CSS property '{name}'")]
    UnknownProperty { name: String },

    /// Error from the view tree or property system.
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl Error {
    /// Create an unsupported combinator error.
    pub fn unsupported_combinator(
        selector: impl Into<String>,
        combinator: impl Into<String>,
    ) -> Self {
        Self::UnsupportedCombinator {
            selector: selector.into(),
            combinator: combinator.into(),
        }
    }

    /// Create an unknown property error.
    pub fn unknown_property(name: impl Into<String>) -> Self {
        Self::UnknownProperty { name: name.into() }
    }

    /// The underlying property error, if this error came from a property
    /// write or conversion.
    pub fn as_property_error(&self) -> Option<&PropertyError> {
        match self {
            Self::Bridge(BridgeError::Property(err)) => Some(err),
            _ => None,
        }
    }
}

impl From<PropertyError> for Error {
    fn from(err: PropertyError) -> Self {
        Self::Bridge(err.into())
    }
}

impl From<TreeError> for Error {
    fn from(err: TreeError) -> Self {
        Self::Bridge(err.into())
    }
}
