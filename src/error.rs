//! Error types for library misuse.
//!
//! Validation problems found in SCIM payloads are never reported through
//! these types; they are collected into [`crate::issues::ValidationIssues`]
//! instead. `ScimError` covers API misuse: the caller passed something the
//! library cannot work with, and the call fails fast.

/// Error returned when the library API is misused.
#[derive(Debug, thiserror::Error)]
pub enum ScimError {
    /// A token that is not a valid SCIM attribute name.
    #[error("'{0}' is not a valid attribute name")]
    InvalidAttrName(String),

    /// A token that is not a valid SCIM schema URI.
    #[error("'{0}' is not a valid schema URI")]
    InvalidSchemaUri(String),

    /// A string that is not a valid attribute representation
    /// (`[uri:]attr[.sub]`).
    #[error("'{0}' is not a valid attribute representation")]
    InvalidAttrRep(String),

    /// A schema URI that is not known to the registry.
    #[error("unknown schema '{0}'")]
    UnknownSchema(String),

    /// A filter expression that does not conform to the RFC 7644 grammar.
    #[error("invalid filter expression: {0}")]
    InvalidFilter(String),

    /// A patch path expression that does not conform to the RFC 7644 grammar.
    #[error("invalid path expression: {0}")]
    InvalidPath(String),

    /// Two attributes with the same (case-insensitive) name in one schema.
    #[error("duplicate attribute '{attribute}' in schema '{schema}'")]
    DuplicateAttribute { schema: String, attribute: String },

    /// An extension registered twice on the same resource schema.
    #[error("extension '{extension}' already registered in resource '{resource}'")]
    DuplicateExtension { resource: String, extension: String },

    /// A resource name registered with two different endpoints.
    #[error("resource '{resource}' already registered for endpoint '{endpoint}'")]
    ConflictingResource { resource: String, endpoint: String },

    /// Configuration that does not satisfy its own invariants, e.g. bulk
    /// support without operation limits.
    #[error("invalid service provider configuration: {0}")]
    InvalidConfiguration(String),

    /// An operation that the service provider configuration does not allow.
    #[error("operation not supported: {0}")]
    UnsupportedOperation(String),

    /// A sorter or filter referred to an attribute no relevant schema defines.
    #[error("attribute '{0}' does not exist in the schema or its extensions")]
    NoSuchAttribute(String),

    /// Internal invariant violation. Indicates a bug in this library.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result alias used across the crate for fallible API calls.
pub type ScimResult<T> = Result<T, ScimError>;

impl ScimError {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_offending_input() {
        let err = ScimError::InvalidAttrName("2fast".into());
        assert!(err.to_string().contains("2fast"));

        let err = ScimError::DuplicateAttribute {
            schema: "urn:my:schema".into(),
            attribute: "userName".into(),
        };
        assert!(err.to_string().contains("userName"));
        assert!(err.to_string().contains("urn:my:schema"));
    }
}
