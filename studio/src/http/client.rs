//! HTTP client implementation

use openapi_client::ApiResponse;
use reqwest::{header, Client, Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::app::options::ClientOptions;
use crate::errors::StudioError;
use crate::utils::generate_uuid;

/// Header carrying the impersonated user id
pub const IMPERSONATE_HEADER: &str = "X-Impersonate-User";

/// HTTP client for backend communication
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<SecretString>,
    impersonate_user: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(options: &ClientOptions) -> Result<Self, StudioError> {
        let client = Client::builder().timeout(options.request_timeout).build()?;

        Ok(Self {
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            token: options.token.clone(),
            impersonate_user: options.impersonate_user.clone(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bearer token, if configured
    pub fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request_id = generate_uuid();
        debug!(%request_id, "{} {}", method, url);

        let mut request = self
            .client
            .request(method, &url)
            .header("X-Request-ID", request_id);

        if let Some(token) = &self.token {
            request = request.header(
                header::AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            );
        }
        if let Some(user) = &self.impersonate_user {
            request = request.header(IMPERSONATE_HEADER, user);
        }

        request
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<Option<T>, StudioError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        decode_envelope(status.as_u16(), &body).inspect_err(|e| {
            error!("Request to {} failed: {}", path, e);
        })
    }

    async fn send_required<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<T, StudioError> {
        self.send(request, path)
            .await?
            .ok_or_else(|| StudioError::EmptyResponse(path.to_string()))
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, StudioError> {
        self.send_required(self.request(Method::GET, path), path).await
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, StudioError> {
        self.send_required(self.request(Method::POST, path).json(body), path)
            .await
    }

    /// Make a POST request with an empty JSON object body
    pub async fn post_command<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, StudioError> {
        let body = serde_json::Value::Object(serde_json::Map::new());
        self.send(self.request(Method::POST, path).json(&body), path)
            .await
    }

    /// POST a raw JSON document as the request body
    pub async fn post_raw<T: DeserializeOwned>(&self, path: &str, raw: String) -> Result<T, StudioError> {
        let request = self
            .request(Method::POST, path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(raw);
        self.send_required(request, path).await
    }

    /// Make a PUT request
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, StudioError> {
        self.send_required(self.request(Method::PUT, path).json(body), path)
            .await
    }

    /// Make a DELETE request, ignoring any returned data
    pub async fn delete(&self, path: &str) -> Result<(), StudioError> {
        let _: Option<serde_json::Value> = self.send(self.request(Method::DELETE, path), path).await?;
        Ok(())
    }

    /// GET a binary payload. Only the HTTP status is checked; no envelope.
    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, StudioError> {
        let response = self.request(Method::GET, path).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("HTTP GET {} failed: {} - {}", path, status, body);
            return Err(StudioError::StatusError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Join path segments into an API path, percent-encoding each one so that
/// `/`, `?` and `#` inside an id or name stay part of that segment
pub fn api_path(segments: &[&str]) -> Result<String, StudioError> {
    let mut url = Url::parse("http://localhost/").map_err(|e| StudioError::Internal(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| StudioError::Internal("cannot build API path".to_string()))?
        .clear()
        .extend(segments);
    Ok(url.path().to_string())
}

/// Decode a response body wrapped in the backend envelope.
///
/// A non-zero `code` is an application error even on HTTP 200. A body that
/// isn't an envelope is reported with the HTTP status when that status is a
/// failure, and as a JSON error otherwise.
pub fn decode_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<Option<T>, StudioError> {
    let success = (200..300).contains(&status);

    let envelope: ApiResponse<T> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) if success => return Err(e.into()),
        Err(_) => {
            return Err(StudioError::StatusError {
                status,
                body: body.to_string(),
            })
        }
    };

    if !envelope.is_success() {
        return Err(StudioError::ApiError {
            code: envelope.code,
            message: envelope.failure_message(),
        });
    }
    if !success {
        return Err(StudioError::StatusError {
            status,
            body: envelope.message,
        });
    }

    Ok(envelope.data)
}
