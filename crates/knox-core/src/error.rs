//! Error types for `knox-core`.
//!
//! Closed enumerations with structured context fields. The snake_case tag
//! exposed by `kind` is stable — the CLI prints it in failure reports and
//! scripts match on it.

use knox_api::ApiError;

/// Errors from the path expression model.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// The string does not match the six-segment grammar.
    #[error("malformed path expression: {path}")]
    Malformed { path: String },

    /// A discrete segment value was empty.
    #[error("path segment '{field}' must not be empty")]
    EmptySegment { field: &'static str },
}

impl PathError {
    /// Stable classification tag.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Malformed { .. } => "malformed_path",
            Self::EmptySegment { .. } => "empty_segment",
        }
    }
}

/// Errors from the credential resolver.
#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    /// Required identifying fields are missing.
    #[error("invalid parameters provided")]
    InvalidParameters,

    /// The credential value fails the type predicate.
    #[error("a credential value must be provided")]
    InvalidValue,

    /// The supplied path string fails grammar validation.
    #[error("invalid path provided: {path}")]
    InvalidPath { path: String },

    /// A path failed to decompose after (or without) validation.
    #[error(transparent)]
    MalformedPath(#[from] PathError),

    /// The calling user could not be found.
    #[error("could not find the user")]
    UserNotFound,

    /// No organization with the queried name exists.
    #[error("unknown org: {name}")]
    OrgNotFound { name: String },

    /// No project with the queried name exists in the org.
    #[error("unknown project: {name}")]
    ProjectNotFound { name: String },

    /// The registry client failed; passed through unreinterpreted.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CredentialsError {
    /// Stable classification tag for failure reports.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::InvalidParameters => "invalid_parameters",
            Self::InvalidValue => "invalid_value",
            Self::InvalidPath { .. } => "invalid_path",
            Self::MalformedPath(_) => "malformed_path",
            Self::UserNotFound => "user_not_found",
            Self::OrgNotFound { .. } => "org_not_found",
            Self::ProjectNotFound { .. } => "project_not_found",
            Self::Api(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable_tags() {
        assert_eq!(CredentialsError::InvalidParameters.kind(), "invalid_parameters");
        assert_eq!(CredentialsError::UserNotFound.kind(), "user_not_found");
        assert_eq!(
            CredentialsError::OrgNotFound {
                name: "acme".to_owned()
            }
            .kind(),
            "org_not_found"
        );
        assert_eq!(
            CredentialsError::MalformedPath(PathError::EmptySegment { field: "org" }).kind(),
            "malformed_path"
        );
    }

    #[test]
    fn api_errors_keep_their_own_tag() {
        let err = CredentialsError::Api(ApiError::Timeout);
        assert_eq!(err.kind(), "timeout");
    }
}
