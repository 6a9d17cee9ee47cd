use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use super::domain::NewWaitlistEntry;
use super::gateway::{GatewayKind, InsertOutcome, WaitlistGateway};
use crate::config::BackendConfig;

/// Postgres SQLSTATE for `unique_violation`.
pub const UNIQUE_VIOLATION_CODE: &str = "23505";

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid backend url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("backend access key is not a valid header value")]
    InvalidKey,
    #[error("unable to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Error body returned by PostgREST.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// Inserts into the hosted waitlist table through its PostgREST endpoint.
#[derive(Debug, Clone)]
pub struct SupabaseGateway {
    http: Client,
    endpoint: Url,
}

impl SupabaseGateway {
    pub fn from_config(config: &BackendConfig) -> Result<Self, GatewayError> {
        let base = config.url.trim_end_matches('/');
        let raw_endpoint = format!("{base}/rest/v1/{}", config.table);
        let endpoint = Url::parse(&raw_endpoint).map_err(|source| GatewayError::InvalidUrl {
            url: config.url.clone(),
            source,
        })?;

        let mut headers = HeaderMap::new();
        let mut api_key =
            HeaderValue::from_str(&config.anon_key).map_err(|_| GatewayError::InvalidKey)?;
        api_key.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.anon_key))
            .map_err(|_| GatewayError::InvalidKey)?;
        bearer.set_sensitive(true);
        headers.insert("apikey", api_key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert("prefer", HeaderValue::from_static("return=minimal"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl WaitlistGateway for SupabaseGateway {
    async fn insert(&self, email: &str) -> InsertOutcome {
        let rows = [NewWaitlistEntry { email }];
        let response = match self
            .http
            .post(self.endpoint.clone())
            .json(&rows)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "waitlist insert request failed");
                return InsertOutcome::OtherFailure(String::new());
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!(%status, "waitlist insert accepted");
            return InsertOutcome::Success;
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => {
                warn!(%status, error = %err, "unable to read waitlist error body");
                return InsertOutcome::OtherFailure(String::new());
            }
        };

        classify_error(status, &body)
    }

    fn kind(&self) -> GatewayKind {
        GatewayKind::Remote
    }
}

fn classify_error(status: reqwest::StatusCode, body: &[u8]) -> InsertOutcome {
    let error: PostgrestError = match serde_json::from_slice(body) {
        Ok(error) => error,
        Err(_) => {
            warn!(%status, "waitlist insert failed with an unreadable error body");
            return InsertOutcome::OtherFailure(String::new());
        }
    };

    if error.code.as_deref() == Some(UNIQUE_VIOLATION_CODE) {
        debug!(%status, "waitlist insert rejected as duplicate");
        return InsertOutcome::DuplicateConflict;
    }

    warn!(
        %status,
        code = error.code.as_deref().unwrap_or("-"),
        details = error.details.as_deref().unwrap_or("-"),
        "waitlist insert rejected by backend"
    );
    InsertOutcome::OtherFailure(error.message.unwrap_or_default())
}
