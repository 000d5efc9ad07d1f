//! Client for the knox credentials registry.
//!
//! Exposes the registry's remote boundary — user identity, org and project
//! lookups, credential reads and writes, and email verification — as the
//! [`RegistryApi`] trait, with [`HttpRegistry`] as the production HTTP
//! implementation. Consumers that orchestrate these calls (the resolver in
//! `knox-core`) take `&dyn RegistryApi`, so tests can swap in a recording
//! mock without a running registry.
//!
//! Retry with backoff, request timeouts, and auth-header plumbing all live
//! here; callers above this crate never retry.
//!
//! # Example
//!
//! ```rust,no_run
//! use knox_api::{HttpRegistry, RegistryApi};
//!
//! # async fn example() -> Result<(), knox_api::ApiError> {
//! let registry = HttpRegistry::new(std::env::var("KNOX_TOKEN").unwrap_or_default())?;
//! if let Some(user) = registry.self_user().await? {
//!     println!("logged in as {}", user.username);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod types;

pub use error::ApiError;
pub use types::{CredentialCreate, CredentialRecord, OrgRecord, ProjectRecord, UserRecord};

use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://registry.knox.dev";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_RETRIES: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// The remote registry boundary consumed by the credential resolver.
///
/// Name lookups (`orgs_by_name`, `projects_by_name`) return the registry's
/// plural list form as-is; single-entity lookups map the registry's
/// not-found response to `Ok(None)`. Implementations must be safe to share
/// across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait RegistryApi: Send + Sync {
    /// Fetch the authenticated user's own record.
    ///
    /// Returns `Ok(None)` if the registry has no record for the session.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    async fn self_user(&self) -> Result<Option<UserRecord>, ApiError>;

    /// Look up organizations by exact name.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    async fn orgs_by_name(&self, name: &str) -> Result<Vec<OrgRecord>, ApiError>;

    /// Look up projects by exact name, scoped to an organization id.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    async fn projects_by_name(
        &self,
        org_id: &str,
        name: &str,
    ) -> Result<Vec<ProjectRecord>, ApiError>;

    /// Fetch the credential stored at a canonical path expression.
    ///
    /// Returns `Ok(None)` when nothing is stored at the path — absence is a
    /// normal result, not an error.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails.
    async fn credential_by_path(&self, path: &str) -> Result<Option<CredentialRecord>, ApiError>;

    /// Store a new credential.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or the registry rejects
    /// the payload.
    async fn credential_create(
        &self,
        create: &CredentialCreate,
    ) -> Result<CredentialRecord, ApiError>;

    /// Submit an email verification code for the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or the code is rejected.
    async fn verify_email(&self, code: &str) -> Result<(), ApiError>;
}

/// Configuration for [`HttpRegistry`].
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Session or service token.
    pub token: String,
    /// Registry base URL. Default: `https://registry.knox.dev`.
    pub base_url: String,
    /// Request timeout. Default: 10 seconds.
    pub timeout: Duration,
    /// Max retry attempts for retryable failures. Default: 3.
    pub max_retries: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// HTTP implementation of [`RegistryApi`] over the registry's REST API.
pub struct HttpRegistry {
    token: String,
    base_url: String,
    max_retries: u32,
    client: reqwest::Client,
}
