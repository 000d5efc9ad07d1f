//! Credential path expressions.
//!
//! A credential lives at a fixed-depth location in the registry namespace:
//!
//! ```text
//! /<org>/<project>/<environment>/<service>/<identity>/<instance>
//! ```
//!
//! Exactly six segments, leading slash, every segment non-empty. Segment
//! values carry no escaping, so a `/` inside a value is indistinguishable
//! from a separator; [`PathExp::from_parts`] rejects such values.

use std::fmt;

use crate::error::PathError;

/// Segment count of a canonical path expression.
const SEGMENTS: usize = 6;

/// A parsed credential path expression.
///
/// Immutable once constructed. `Display` re-serializes to the canonical
/// string form, which round-trips through [`PathExp::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExp {
    /// Organization name.
    pub org: String,
    /// Project name within the org.
    pub project: String,
    /// Environment name (e.g. `development`).
    pub environment: String,
    /// Service name.
    pub service: String,
    /// User-identifying segment (username).
    pub identity: String,
    /// Instance discriminator; `"1"` for single-instance deployments.
    pub instance: String,
}

impl PathExp {
    /// Check whether `raw` matches the path grammar.
    ///
    /// Never panics; a non-matching string is a normal `false`.
    #[must_use]
    pub fn validate(raw: &str) -> bool {
        split(raw).is_some()
    }

    /// Decompose a raw path string into its six fields.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Malformed`] for any string [`PathExp::validate`]
    /// rejects.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let segs = split(raw).ok_or_else(|| PathError::Malformed {
            path: raw.to_owned(),
        })?;
        Ok(Self {
            org: segs[0].to_owned(),
            project: segs[1].to_owned(),
            environment: segs[2].to_owned(),
            service: segs[3].to_owned(),
            identity: segs[4].to_owned(),
            instance: segs[5].to_owned(),
        })
    }

    /// Assemble an expression from discrete segment values.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::EmptySegment`] for an empty value and
    /// [`PathError::Malformed`] for a value containing `/`.
    pub fn from_parts(
        org: &str,
        project: &str,
        environment: &str,
        service: &str,
        identity: &str,
        instance: &str,
    ) -> Result<Self, PathError> {
        let fields = [
            ("org", org),
            ("project", project),
            ("environment", environment),
            ("service", service),
            ("identity", identity),
            ("instance", instance),
        ];
        for (field, value) in fields {
            if value.is_empty() {
                return Err(PathError::EmptySegment { field });
            }
            if value.contains('/') {
                return Err(PathError::Malformed {
                    path: value.to_owned(),
                });
            }
        }
        Ok(Self {
            org: org.to_owned(),
            project: project.to_owned(),
            environment: environment.to_owned(),
            service: service.to_owned(),
            identity: identity.to_owned(),
            instance: instance.to_owned(),
        })
    }
}

impl fmt::Display for PathExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/{}/{}/{}/{}/{}/{}",
            self.org, self.project, self.environment, self.service, self.identity, self.instance
        )
    }
}

/// Split a raw path into exactly [`SEGMENTS`] non-empty segments, or `None`.
fn split(raw: &str) -> Option<[&str; SEGMENTS]> {
    let rest = raw.strip_prefix('/')?;
    let mut parts = rest.split('/');
    let segs = [
        parts.next()?,
        parts.next()?,
        parts.next()?,
        parts.next()?,
        parts.next()?,
        parts.next()?,
    ];
    if parts.next().is_some() || segs.iter().any(|s| s.is_empty()) {
        return None;
    }
    Some(segs)
}
