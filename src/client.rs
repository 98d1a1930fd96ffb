//! HTTP client for the coastwatch API.

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::sync::RwLock;
use url::Url;

use crate::logging::{log, obj, v_str, Domain, Level};
use crate::model::{HazardReport, NewReport, Role, User};
use crate::offline::{ReportSink, SubmitError};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Non-success response from the API.
#[derive(Debug, thiserror::Error)]
#[error("{message} ({status})")]
pub struct StatusError {
    pub status: u16,
    pub message: String,
}

impl StatusError {
    /// True when retrying the same request cannot succeed. Expired sessions,
    /// timeouts and rate limits are excluded since they clear on their own.
    pub fn is_permanent(&self) -> bool {
        (400..500).contains(&self.status) && !matches!(self.status, 401 | 408 | 429)
    }
}

pub struct ApiClient {
    client: Client,
    base: Url,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(base: &str) -> Result<Self> {
        let mut base = Url::parse(base).with_context(|| format!("invalid base url {}", base))?;
        // `Url::join` replaces the last segment unless the path ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base,
            token: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base.join(path).with_context(|| format!("joining {}", path))
    }

    async fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.token.read().await.clone();
        let token = token.ok_or_else(|| anyhow!("not logged in"))?;
        Ok(req.bearer_auth(token))
    }

    async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json().await?);
        }
        let message = resp
            .json::<ErrorBody>()
            .await
            .map(|b| b.error)
            .unwrap_or_else(|_| status.to_string());
        Err(StatusError { status: status.as_u16(), message }.into())
    }

    pub async fn register(&self, name: &str, email: &str, password: &str, role: Role) -> Result<User> {
        let resp = self
            .client
            .post(self.url("auth/register")?)
            .json(&json!({ "name": name, "email": email, "password": password, "role": role }))
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Logs in and keeps the bearer token for later calls.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let resp = self
            .client
            .post(self.url("auth/login")?)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let login: LoginResponse = Self::decode(resp).await?;
        *self.token.write().await = Some(login.token.clone());
        log(Level::Info, Domain::Auth, "client_login", obj(&[("email", v_str(&login.email))]));
        Ok(login)
    }

    pub async fn logout(&self) {
        *self.token.write().await = None;
    }

    pub async fn submit_report(&self, report: &NewReport) -> Result<HazardReport> {
        let req = self.authorized(self.client.post(self.url("reports")?)).await?;
        Self::decode(req.json(report).send().await?).await
    }

    /// Lists reports, narrowed by `(dimension, value)` pairs and `q`.
    pub async fn list_reports(&self, params: &[(&str, &str)]) -> Result<Vec<HazardReport>> {
        let mut url = self.url("reports")?;
        url.query_pairs_mut().extend_pairs(params);
        let req = self.authorized(self.client.get(url)).await?;
        Self::decode(req.send().await?).await
    }
}

#[async_trait::async_trait]
impl ReportSink for ApiClient {
    async fn submit(&self, report: &NewReport) -> Result<HazardReport, SubmitError> {
        let err = match self.submit_report(report).await {
            Ok(created) => return Ok(created),
            Err(err) => err,
        };
        let refused = err
            .downcast_ref::<StatusError>()
            .filter(|s| s.is_permanent())
            .map(|s| s.to_string());
        Err(match refused {
            Some(reason) => SubmitError::Rejected(reason),
            None => SubmitError::Unavailable(err),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_join_keeps_base_path() {
        let client = ApiClient::new("http://localhost:5000/api/").unwrap();
        assert_eq!(client.url("reports").unwrap().as_str(), "http://localhost:5000/api/reports");

        let client = ApiClient::new("http://localhost:5000/api").unwrap();
        assert_eq!(client.url("reports").unwrap().as_str(), "http://localhost:5000/api/reports");
        assert_eq!(client.url("auth/login").unwrap().as_str(), "http://localhost:5000/api/auth/login");

        let client = ApiClient::new("http://localhost:5000").unwrap();
        assert_eq!(client.url("reports").unwrap().as_str(), "http://localhost:5000/reports");
        assert!(ApiClient::new("not a url").is_err());
    }

    #[test]
    fn test_status_error_permanence() {
        let status = |status| StatusError { status, message: "x".into() };
        assert!(status(400).is_permanent());
        assert!(status(403).is_permanent());
        assert!(status(409).is_permanent());
        assert!(!status(401).is_permanent());
        assert!(!status(429).is_permanent());
        assert!(!status(500).is_permanent());
        assert!(!status(503).is_permanent());
        assert_eq!(status(400).to_string(), "x (400)");
    }

    #[tokio::test]
    async fn test_requires_login_before_authorized_calls() {
        let client = ApiClient::new("http://127.0.0.1:9/").unwrap();
        let err = client.list_reports(&[]).await.unwrap_err();
        assert!(err.to_string().contains("not logged in"));
    }
}
