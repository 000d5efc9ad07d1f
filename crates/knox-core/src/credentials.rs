//! Credential resolution.
//!
//! Turns either an explicit path expression or a set of discrete identifying
//! parameters into registry calls. Both operations are linear pipelines:
//! validate parameters, gather the calling user and the org in parallel,
//! resolve any dependent records, then issue a single credential call.
//! Nothing here retries, and no state is shared between invocations, so
//! callers may run resolver operations concurrently.

use knox_api::{CredentialCreate, CredentialRecord, OrgRecord, RegistryApi, UserRecord};
use tracing::debug;

use crate::cpath::PathExp;
use crate::error::CredentialsError;
use crate::value::CredentialValue;

/// Identifying parameters for a resolver operation.
///
/// Empty strings mean "not provided". The `"1"` instance default is applied
/// by the command layer, not here.
#[derive(Debug, Clone, Default)]
pub struct CredentialParams {
    /// Credential name (create only).
    pub name: String,
    /// Full path expression; `None` or empty means not provided.
    pub path: Option<String>,
    /// Organization name.
    pub org: String,
    /// Project name.
    pub project: String,
    /// Service name.
    pub service: String,
    /// Environment name.
    pub environment: String,
    /// Instance discriminator.
    pub instance: String,
}

/// Remote-resolved identifiers gathered during one operation.
///
/// Dropped when the operation completes; never persisted.
struct ResolutionContext {
    user: UserRecord,
    org: OrgRecord,
}

/// Look up a credential by its resolved path.
///
/// The path is built from the discrete parameters and the resolved org
/// record's name. A credential the registry does not know is a normal
/// `Ok(None)`, not an error.
///
/// # Errors
///
/// Returns [`CredentialsError::InvalidParameters`] (before any remote call)
/// when a required field is empty, [`CredentialsError::UserNotFound`] /
/// [`CredentialsError::OrgNotFound`] when resolution fails, and passes
/// registry client errors through unchanged.
pub async fn get(
    api: &dyn RegistryApi,
    params: &CredentialParams,
) -> Result<Option<CredentialRecord>, CredentialsError> {
    if params.project.is_empty()
        || params.service.is_empty()
        || params.environment.is_empty()
        || params.instance.is_empty()
        || params.org.is_empty()
    {
        return Err(CredentialsError::InvalidParameters);
    }

    let ctx = resolve_user_and_org(api, &params.org).await?;

    let path = PathExp::from_parts(
        &ctx.org.name,
        &params.project,
        &params.environment,
        &params.service,
        &ctx.user.username,
        &params.instance,
    )?;

    debug!(path = %path, "credential lookup");
    Ok(api.credential_by_path(&path.to_string()).await?)
}

/// Create a credential at the resolved path.
///
/// Accepts either a full path expression or the complete set of discrete
/// parameters. When a path is given it supplies the org/project names and
/// the final `pathexp`; otherwise the path is assembled from the raw
/// parameters plus the resolved username.
///
/// # Errors
///
/// Returns [`CredentialsError::InvalidValue`], then
/// [`CredentialsError::InvalidParameters`], then
/// [`CredentialsError::InvalidPath`] for precondition failures, all before
/// any remote call. Resolution failures surface as
/// [`CredentialsError::UserNotFound`] / [`CredentialsError::OrgNotFound`] /
/// [`CredentialsError::ProjectNotFound`]; registry client errors pass
/// through unchanged.
pub async fn create(
    api: &dyn RegistryApi,
    params: &CredentialParams,
    value: &CredentialValue,
) -> Result<CredentialRecord, CredentialsError> {
    if !value.is_defined() {
        return Err(CredentialsError::InvalidValue);
    }

    let raw_path = params.path.as_deref().filter(|p| !p.is_empty());

    let discrete_complete = !params.org.is_empty()
        && !params.project.is_empty()
        && !params.service.is_empty()
        && !params.environment.is_empty()
        && !params.instance.is_empty();

    if params.name.is_empty() || (raw_path.is_none() && !discrete_complete) {
        return Err(CredentialsError::InvalidParameters);
    }

    let parsed = match raw_path {
        Some(raw) => {
            if !PathExp::validate(raw) {
                return Err(CredentialsError::InvalidPath {
                    path: raw.to_owned(),
                });
            }
            Some(PathExp::parse(raw)?)
        }
        None => None,
    };

    let org_name = parsed.as_ref().map_or(params.org.as_str(), |p| p.org.as_str());
    let project_name = parsed
        .as_ref()
        .map_or(params.project.as_str(), |p| p.project.as_str());

    let ctx = resolve_user_and_org(api, org_name).await?;

    let project = first_match(api.projects_by_name(&ctx.org.id, project_name).await?)
        .ok_or_else(|| CredentialsError::ProjectNotFound {
            name: project_name.to_owned(),
        })?;

    let pathexp = match &parsed {
        Some(expr) => expr.to_string(),
        // Assembled default paths keep the raw org/instance params as given.
        None => PathExp::from_parts(
            &params.org,
            &params.project,
            &params.environment,
            &params.service,
            &ctx.user.username,
            &params.instance,
        )?
        .to_string(),
    };

    let body = CredentialCreate {
        name: params.name.clone(),
        project_id: project.id,
        org_id: ctx.org.id,
        pathexp,
        value: value.to_string(),
    };

    debug!(name = %body.name, pathexp = %body.pathexp, "credential create");
    Ok(api.credential_create(&body).await?)
}

/// Fetch the calling user and the org by name, in parallel.
async fn resolve_user_and_org(
    api: &dyn RegistryApi,
    org_name: &str,
) -> Result<ResolutionContext, CredentialsError> {
    let (user, orgs) = tokio::try_join!(api.self_user(), api.orgs_by_name(org_name))?;

    let user = user.ok_or(CredentialsError::UserNotFound)?;
    let org = first_match(orgs).ok_or_else(|| CredentialsError::OrgNotFound {
        name: org_name.to_owned(),
    })?;

    debug!(user = %user.username, org = %org.name, "resolved user and org");
    Ok(ResolutionContext { user, org })
}

/// First element of a registry list response, if any.
///
/// Name lookups can in principle match more than once; the resolver keeps
/// the long-standing convention of taking the first and ignoring the rest.
fn first_match<T>(items: Vec<T>) -> Option<T> {
    items.into_iter().next()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use knox_api::{ApiError, ProjectRecord};

    use super::*;

    /// One recorded registry call.
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        SelfUser,
        OrgsByName(String),
        ProjectsByName { org_id: String, name: String },
        CredentialByPath(String),
        CredentialCreate(CredentialCreate),
        VerifyEmail(String),
    }

    /// Canned-response registry that records every call.
    #[derive(Default)]
    struct MockRegistry {
        user: Option<UserRecord>,
        orgs: Vec<OrgRecord>,
        projects: Vec<ProjectRecord>,
        credential: Option<CredentialRecord>,
        calls: Mutex<Vec<Call>>,
    }

    impl MockRegistry {
        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl RegistryApi for MockRegistry {
        async fn self_user(&self) -> Result<Option<UserRecord>, ApiError> {
            self.record(Call::SelfUser);
            Ok(self.user.clone())
        }

        async fn orgs_by_name(&self, name: &str) -> Result<Vec<OrgRecord>, ApiError> {
            self.record(Call::OrgsByName(name.to_owned()));
            Ok(self.orgs.clone())
        }

        async fn projects_by_name(
            &self,
            org_id: &str,
            name: &str,
        ) -> Result<Vec<ProjectRecord>, ApiError> {
            self.record(Call::ProjectsByName {
                org_id: org_id.to_owned(),
                name: name.to_owned(),
            });
            Ok(self.projects.clone())
        }

        async fn credential_by_path(
            &self,
            path: &str,
        ) -> Result<Option<CredentialRecord>, ApiError> {
            self.record(Call::CredentialByPath(path.to_owned()));
            Ok(self.credential.clone())
        }

        async fn credential_create(
            &self,
            create: &CredentialCreate,
        ) -> Result<CredentialRecord, ApiError> {
            self.record(Call::CredentialCreate(create.clone()));
            Ok(CredentialRecord {
                id: "cred-1".to_owned(),
                name: create.name.clone(),
                project_id: create.project_id.clone(),
                org_id: create.org_id.clone(),
                pathexp: create.pathexp.clone(),
                value: create.value.clone(),
            })
        }

        async fn verify_email(&self, code: &str) -> Result<(), ApiError> {
            self.record(Call::VerifyEmail(code.to_owned()));
            Ok(())
        }
    }

    /// Registry where every call fails with a 503.
    struct FailingRegistry;

    fn unavailable() -> ApiError {
        ApiError::Api {
            status: 503,
            kind: None,
            message: "service unavailable".to_owned(),
        }
    }

    #[async_trait::async_trait]
    impl RegistryApi for FailingRegistry {
        async fn self_user(&self) -> Result<Option<UserRecord>, ApiError> {
            Err(unavailable())
        }

        async fn orgs_by_name(&self, _name: &str) -> Result<Vec<OrgRecord>, ApiError> {
            Err(unavailable())
        }

        async fn projects_by_name(
            &self,
            _org_id: &str,
            _name: &str,
        ) -> Result<Vec<ProjectRecord>, ApiError> {
            Err(unavailable())
        }

        async fn credential_by_path(
            &self,
            _path: &str,
        ) -> Result<Option<CredentialRecord>, ApiError> {
            Err(unavailable())
        }

        async fn credential_create(
            &self,
            _create: &CredentialCreate,
        ) -> Result<CredentialRecord, ApiError> {
            Err(unavailable())
        }

        async fn verify_email(&self, _code: &str) -> Result<(), ApiError> {
            Err(unavailable())
        }
    }

    fn alice() -> UserRecord {
        UserRecord {
            id: "user-1".to_owned(),
            username: "alice".to_owned(),
            name: "Alice Example".to_owned(),
            email: "alice@example.com".to_owned(),
        }
    }

    fn acme(name: &str) -> OrgRecord {
        OrgRecord {
            id: "org-1".to_owned(),
            name: name.to_owned(),
        }
    }

    fn proj() -> ProjectRecord {
        ProjectRecord {
            id: "proj-2".to_owned(),
            name: "proj".to_owned(),
            org_id: "org-1".to_owned(),
        }
    }

    fn discrete_params() -> CredentialParams {
        CredentialParams {
            org: "acme".to_owned(),
            project: "proj".to_owned(),
            service: "svc".to_owned(),
            environment: "env".to_owned(),
            instance: "1".to_owned(),
            ..CredentialParams::default()
        }
    }

    fn populated_mock() -> MockRegistry {
        MockRegistry {
            user: Some(alice()),
            orgs: vec![acme("acme")],
            projects: vec![proj()],
            ..MockRegistry::default()
        }
    }

    #[tokio::test]
    async fn get_with_empty_params_fails_before_any_call() {
        let mock = populated_mock();
        let result = get(&mock, &CredentialParams::default()).await;
        assert!(matches!(result, Err(CredentialsError::InvalidParameters)));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn get_with_one_missing_field_fails_before_any_call() {
        let mock = populated_mock();
        let params = CredentialParams {
            service: String::new(),
            ..discrete_params()
        };
        let result = get(&mock, &params).await;
        assert!(matches!(result, Err(CredentialsError::InvalidParameters)));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn get_builds_path_from_resolved_org_name() {
        // The registry canonicalizes the org name; the lookup path must use
        // the resolved form, not the queried parameter.
        let mock = MockRegistry {
            orgs: vec![acme("acme-prod")],
            ..populated_mock()
        };
        let result = get(&mock, &discrete_params()).await.unwrap();
        assert!(result.is_none());
        assert!(
            mock.calls()
                .contains(&Call::CredentialByPath("/acme-prod/proj/env/svc/alice/1".to_owned()))
        );
    }

    #[tokio::test]
    async fn get_with_unknown_org_never_asks_for_credentials() {
        let mock = MockRegistry {
            orgs: Vec::new(),
            ..populated_mock()
        };
        let result = get(&mock, &discrete_params()).await;
        assert!(
            matches!(result, Err(CredentialsError::OrgNotFound { name }) if name == "acme")
        );
        assert!(
            mock.calls()
                .iter()
                .all(|c| !matches!(c, Call::CredentialByPath(_)))
        );
    }

    #[tokio::test]
    async fn get_with_missing_user_fails() {
        let mock = MockRegistry {
            user: None,
            ..populated_mock()
        };
        let result = get(&mock, &discrete_params()).await;
        assert!(matches!(result, Err(CredentialsError::UserNotFound)));
    }

    #[tokio::test]
    async fn get_treats_unknown_credential_as_none() {
        let mock = populated_mock();
        let result = get(&mock, &discrete_params()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn get_twice_yields_identical_records() {
        let record = CredentialRecord {
            id: "cred-1".to_owned(),
            name: "KEY".to_owned(),
            project_id: "proj-2".to_owned(),
            org_id: "org-1".to_owned(),
            pathexp: "/acme/proj/env/svc/alice/1".to_owned(),
            value: "secret".to_owned(),
        };
        let mock = MockRegistry {
            credential: Some(record.clone()),
            ..populated_mock()
        };

        let first = get(&mock, &discrete_params()).await.unwrap();
        let second = get(&mock, &discrete_params()).await.unwrap();
        assert_eq!(first, Some(record));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn get_passes_registry_failures_through() {
        let result = get(&FailingRegistry, &discrete_params()).await;
        assert!(matches!(result, Err(CredentialsError::Api(_))));
    }

    #[tokio::test]
    async fn create_with_undefined_value_fails_before_any_call() {
        let mock = populated_mock();
        let params = CredentialParams {
            name: "KEY".to_owned(),
            ..discrete_params()
        };
        let result = create(&mock, &params, &CredentialValue::Undefined).await;
        assert!(matches!(result, Err(CredentialsError::InvalidValue)));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn create_without_name_fails_before_any_call() {
        let mock = populated_mock();
        let params = CredentialParams {
            path: Some("/acme/proj/env/svc/alice/1".to_owned()),
            ..CredentialParams::default()
        };
        let result = create(&mock, &params, &CredentialValue::parse("secret")).await;
        assert!(matches!(result, Err(CredentialsError::InvalidParameters)));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn create_with_incomplete_discrete_params_fails() {
        let mock = populated_mock();
        let params = CredentialParams {
            name: "KEY".to_owned(),
            service: String::new(),
            ..discrete_params()
        };
        let result = create(&mock, &params, &CredentialValue::parse("secret")).await;
        assert!(matches!(result, Err(CredentialsError::InvalidParameters)));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn create_treats_empty_path_as_absent() {
        let mock = populated_mock();
        let params = CredentialParams {
            name: "KEY".to_owned(),
            path: Some(String::new()),
            ..CredentialParams::default()
        };
        let result = create(&mock, &params, &CredentialValue::parse("secret")).await;
        assert!(matches!(result, Err(CredentialsError::InvalidParameters)));
    }

    #[tokio::test]
    async fn create_with_malformed_path_fails_validation() {
        let mock = populated_mock();
        let params = CredentialParams {
            name: "KEY".to_owned(),
            path: Some("/acme/proj".to_owned()),
            ..CredentialParams::default()
        };
        let result = create(&mock, &params, &CredentialValue::parse("secret")).await;
        assert!(
            matches!(result, Err(CredentialsError::InvalidPath { path }) if path == "/acme/proj")
        );
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn create_with_path_submits_exact_payload() {
        let mock = populated_mock();
        let params = CredentialParams {
            name: "KEY".to_owned(),
            path: Some("/acme/proj/env/svc/alice/1".to_owned()),
            ..CredentialParams::default()
        };

        let record = create(&mock, &params, &CredentialValue::parse("secret"))
            .await
            .unwrap();
        assert_eq!(record.pathexp, "/acme/proj/env/svc/alice/1");

        let calls = mock.calls();
        assert!(calls.contains(&Call::ProjectsByName {
            org_id: "org-1".to_owned(),
            name: "proj".to_owned(),
        }));

        let expected = Call::CredentialCreate(CredentialCreate {
            name: "KEY".to_owned(),
            project_id: "proj-2".to_owned(),
            org_id: "org-1".to_owned(),
            pathexp: "/acme/proj/env/svc/alice/1".to_owned(),
            value: "secret".to_owned(),
        });
        assert!(calls.contains(&expected));
        assert_eq!(
            calls
                .iter()
                .filter(|c| matches!(c, Call::CredentialCreate(_)))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn create_with_unknown_project_reports_name() {
        let mock = MockRegistry {
            projects: Vec::new(),
            ..populated_mock()
        };
        let params = CredentialParams {
            name: "KEY".to_owned(),
            path: Some("/acme/proj/env/svc/alice/1".to_owned()),
            ..CredentialParams::default()
        };
        let result = create(&mock, &params, &CredentialValue::parse("secret")).await;
        assert!(
            matches!(result, Err(CredentialsError::ProjectNotFound { name }) if name == "proj")
        );
        assert!(
            mock.calls()
                .iter()
                .all(|c| !matches!(c, Call::CredentialCreate(_)))
        );
    }

    #[tokio::test]
    async fn default_path_uses_raw_org_param() {
        // Long-standing behavior: without an explicit path expression the
        // submitted pathexp keeps the raw org parameter even though the org
        // record was resolved (`get` uses the resolved name instead).
        let mock = MockRegistry {
            orgs: vec![acme("acme-prod")],
            ..populated_mock()
        };
        let params = CredentialParams {
            name: "KEY".to_owned(),
            ..discrete_params()
        };

        let record = create(&mock, &params, &CredentialValue::parse("secret"))
            .await
            .unwrap();
        assert_eq!(record.pathexp, "/acme/proj/env/svc/alice/1");
        assert_eq!(record.org_id, "org-1");
    }

    #[tokio::test]
    async fn create_passes_registry_failures_through() {
        let params = CredentialParams {
            name: "KEY".to_owned(),
            ..discrete_params()
        };
        let result = create(&FailingRegistry, &params, &CredentialValue::parse("x")).await;
        assert!(matches!(result, Err(CredentialsError::Api(_))));
    }
}
