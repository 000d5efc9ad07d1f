//! `HttpRegistry` implementation.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::types::{
    ApiErrorBody, CredentialCreate, CredentialRecord, OrgRecord, OrgsResponse, ProjectRecord,
    ProjectsResponse, UserRecord,
};
use crate::{
    DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT, HttpRegistry, RETRY_BASE_DELAY,
    RegistryApi, RegistryConfig,
};

impl HttpRegistry {
    /// Create a new client with just a token. Reads other config from env vars.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the token is empty.
    pub fn new(token: String) -> Result<Self, ApiError> {
        Self::with_config(RegistryConfig {
            token,
            ..Default::default()
        })
    }

    /// Create a new client with full configuration.
    ///
    /// Empty fields fall back to `KNOX_TOKEN` / `KNOX_REGISTRY` env vars and
    /// then to the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if no token can be resolved.
    #[allow(clippy::needless_pass_by_value)]
    pub fn with_config(cfg: RegistryConfig) -> Result<Self, ApiError> {
        let token = first_non_empty(&[
            &cfg.token,
            &std::env::var("KNOX_TOKEN").unwrap_or_default(),
        ]);
        if token.is_empty() {
            return Err(ApiError::Config(
                "missing registry token (set KNOX_TOKEN or pass a token explicitly)".to_owned(),
            ));
        }

        let base_url = first_non_empty(&[
            &cfg.base_url,
            &std::env::var("KNOX_REGISTRY").unwrap_or_default(),
            DEFAULT_BASE_URL,
        ])
        .trim_end_matches('/')
        .to_owned();

        let timeout = if cfg.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            cfg.timeout
        };

        let max_retries = if cfg.max_retries == 0 {
            DEFAULT_MAX_RETRIES
        } else {
            cfg.max_retries
        };

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("knox/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            token,
            base_url,
            max_retries,
            client,
        })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let url = format!("{}/v1{path}", self.base_url);
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            let mut req = match method {
                "POST" => self.client.post(&url),
                "PUT" => self.client.put(&url),
                "DELETE" => self.client.delete(&url),
                _ => self.client.get(&url),
            };

            req = req.header("Authorization", format!("Bearer {}", self.token));

            if let Some(ref b) = body {
                req = req.json(b);
            }

            match req.send().await {
                Ok(resp) => {
                    let status = resp.status();

                    if status.is_success() {
                        let text = resp.text().await.map_err(ApiError::Network)?;
                        if text.is_empty() {
                            // 204-style responses deserialize a default.
                            return serde_json::from_str("{}").map_err(ApiError::Json);
                        }
                        return serde_json::from_str(&text).map_err(ApiError::Json);
                    }

                    // Parse the error body for a classification tag and message.
                    let error_text = resp.text().await.unwrap_or_default();
                    let parsed = serde_json::from_str::<ApiErrorBody>(&error_text).ok();
                    let kind = parsed.as_ref().and_then(|b| b.kind.clone());
                    let message = parsed
                        .and_then(|b| b.error)
                        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

                    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                        return Err(ApiError::Auth(message));
                    }

                    last_err = Some(ApiError::Api {
                        status: status.as_u16(),
                        kind,
                        message,
                    });

                    if attempt < self.max_retries && is_retryable(status) {
                        sleep_with_jitter(attempt).await;
                        continue;
                    }
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_err = Some(ApiError::Timeout);
                    } else {
                        last_err = Some(ApiError::Network(e));
                    }

                    if attempt < self.max_retries {
                        sleep_with_jitter(attempt).await;
                        continue;
                    }
                }
            }

            break;
        }

        Err(last_err.unwrap_or(ApiError::Api {
            status: 0,
            kind: None,
            message: "unknown error".to_owned(),
        }))
    }
}

#[async_trait::async_trait]
impl RegistryApi for HttpRegistry {
    async fn self_user(&self) -> Result<Option<UserRecord>, ApiError> {
        match self.request::<UserRecord>("GET", "/users/self", None).await {
            Ok(user) => Ok(Some(user)),
            Err(ApiError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn orgs_by_name(&self, name: &str) -> Result<Vec<OrgRecord>, ApiError> {
        let path = format!("/orgs?name={}", urlencoding::encode(name));
        let resp = self.request::<OrgsResponse>("GET", &path, None).await?;
        Ok(resp.orgs)
    }

    async fn projects_by_name(
        &self,
        org_id: &str,
        name: &str,
    ) -> Result<Vec<ProjectRecord>, ApiError> {
        let path = format!(
            "/projects?org_id={}&name={}",
            urlencoding::encode(org_id),
            urlencoding::encode(name)
        );
        let resp = self.request::<ProjectsResponse>("GET", &path, None).await?;
        Ok(resp.projects)
    }

    async fn credential_by_path(&self, path: &str) -> Result<Option<CredentialRecord>, ApiError> {
        let url_path = format!("/credentials?path={}", urlencoding::encode(path));
        match self
            .request::<CredentialRecord>("GET", &url_path, None)
            .await
        {
            Ok(record) => Ok(Some(record)),
            Err(ApiError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn credential_create(
        &self,
        create: &CredentialCreate,
    ) -> Result<CredentialRecord, ApiError> {
        let body = serde_json::to_value(create).map_err(ApiError::Json)?;
        self.request("POST", "/credentials", Some(body)).await
    }

    async fn verify_email(&self, code: &str) -> Result<(), ApiError> {
        let body = serde_json::json!({ "code": code });
        self.request::<serde_json::Value>("POST", "/users/verify", Some(body))
            .await?;
        Ok(())
    }
}

fn is_retryable(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

async fn sleep_with_jitter(attempt: u32) {
    // RETRY_BASE_DELAY is 500ms, max attempt ~3, so values stay small.
    #[allow(clippy::cast_possible_truncation)]
    let base = (RETRY_BASE_DELAY.as_millis() as u64).saturating_mul(2u64.saturating_pow(attempt));
    #[allow(clippy::cast_precision_loss)]
    let base_f = base as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let jitter = (base_f * 0.3 * rand_f64()) as u64;
    tokio::time::sleep(Duration::from_millis(base.saturating_add(jitter))).await;
}

/// Simple pseudo-random f64 in [0, 1) using system time.
fn rand_f64() -> f64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    f64::from(nanos % 1000) / 1000.0
}

fn first_non_empty(vals: &[&str]) -> String {
    for v in vals {
        if !v.is_empty() {
            return (*v).to_owned();
        }
    }
    String::new()
}
