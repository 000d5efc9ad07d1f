//! Wire types for the knox registry API.

use serde::{Deserialize, Serialize};

/// The authenticated user, as returned by `GET /v1/users/self`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Registry-assigned user id.
    pub id: String,
    /// Login name — the user-identifying segment of credential paths.
    pub username: String,
    /// Display name.
    pub name: String,
    /// Account email address.
    pub email: String,
}

/// An organization record from name lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgRecord {
    /// Registry-assigned org id.
    pub id: String,
    /// Unique org name.
    pub name: String,
}

/// A project record from name lookups scoped to an org.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Registry-assigned project id.
    pub id: String,
    /// Project name, unique within its org.
    pub name: String,
    /// Owning org id.
    pub org_id: String,
}

/// A stored credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Registry-assigned credential id.
    pub id: String,
    /// Credential name (e.g. `DATABASE_URL`).
    pub name: String,
    /// Owning project id.
    pub project_id: String,
    /// Owning org id.
    pub org_id: String,
    /// Canonical path expression the credential lives at.
    pub pathexp: String,
    /// Stored value in canonical string form.
    pub value: String,
}

/// Payload for `POST /v1/credentials`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialCreate {
    /// Credential name.
    pub name: String,
    /// Resolved project id.
    pub project_id: String,
    /// Resolved org id.
    pub org_id: String,
    /// Canonical path expression.
    pub pathexp: String,
    /// Value in canonical string form.
    pub value: String,
}

// ── Internal API response envelopes ──────────────────────────────────

#[derive(Deserialize)]
pub(crate) struct OrgsResponse {
    pub orgs: Vec<OrgRecord>,
}

#[derive(Deserialize)]
pub(crate) struct ProjectsResponse {
    pub projects: Vec<ProjectRecord>,
}

#[derive(Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub error: Option<String>,
}
