//! HTTP client for the LunarChat backend

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use lunarchat_core::auth::UserRole;
use lunarchat_core::config::RemoteConfig;
use lunarchat_core::report::{AnalysisMode, AnalysisReport};
use lunarchat_core::session::ImageHandle;

use crate::base::{
    Authenticator, ImageUploader, RemoteError, RemoteResult, SampleAnalyzer, UploadedImage,
};

/// Login response from the backend auth route
#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
}

/// reqwest-backed implementation of all three boundary traits.
///
/// A bearer token obtained at login is attached to every later request.
pub struct LunarApiClient {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl LunarApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> RemoteResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            token: RwLock::new(None),
        })
    }

    pub fn from_config(config: &RemoteConfig) -> RemoteResult<Self> {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn endpoint(mode: AnalysisMode) -> &'static str {
        match mode {
            AnalysisMode::Soil => "/api/analyze",
            AnalysisMode::Lunar => "/api/lunar",
        }
    }

    async fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token.read().await.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Map non-2xx responses to an API error carrying the body text
    async fn ensure_ok(response: Response) -> RemoteResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        let message = if message.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            message
        };
        Err(RemoteError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ImageUploader for LunarApiClient {
    async fn upload(&self, filename: &str, bytes: Bytes) -> RemoteResult<UploadedImage> {
        debug!(filename, size = bytes.len(), "uploading image");

        let part = Part::bytes(bytes.to_vec()).file_name(filename.to_string());
        let form = Form::new().part("file", part);

        let request = self.client.post(self.url("/api/upload")).multipart(form);
        let response = self.authorized(request).await.send().await?;
        let response = Self::ensure_ok(response).await?;

        let uploaded: UploadedImage = response.json().await?;
        debug!(handle = %uploaded.handle, "image uploaded");
        Ok(uploaded)
    }
}

#[async_trait]
impl SampleAnalyzer for LunarApiClient {
    async fn analyze(
        &self,
        handle: &ImageHandle,
        mode: AnalysisMode,
    ) -> RemoteResult<AnalysisReport> {
        debug!(%handle, %mode, "requesting analysis");

        let request = self
            .client
            .post(self.url(Self::endpoint(mode)))
            .json(&serde_json::json!({ "imageId": handle }));
        let response = self.authorized(request).await.send().await?;
        let response = Self::ensure_ok(response).await?;

        let report: AnalysisReport = response.json().await?;
        Ok(report)
    }
}

#[async_trait]
impl Authenticator for LunarApiClient {
    async fn login(&self, username: &str, password: &str, role: UserRole) -> bool {
        debug!(username, ?role, "logging in");

        let request = self.client.post(self.url("/auth/login")).json(&serde_json::json!({
            "username_or_email": username,
            "password": password,
        }));

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(username, error = %e, "login request failed");
                return false;
            }
        };

        if !response.status().is_success() {
            warn!(username, status = %response.status(), "login rejected");
            return false;
        }

        match response.json::<LoginResponse>().await {
            Ok(login) => {
                *self.token.write().await = Some(login.access_token);
                true
            }
            Err(e) => {
                warn!(username, error = %e, "malformed login response");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> LunarApiClient {
        LunarApiClient::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_upload_parses_handle_and_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "img-123",
                "url": "https://cdn.example/img-123.png",
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let uploaded = client
            .upload("rock.png", Bytes::from_static(b"\x89PNG"))
            .await
            .unwrap();

        assert_eq!(uploaded.handle.as_str(), "img-123");
        assert_eq!(uploaded.serving_url, "https://cdn.example/img-123.png");
    }

    #[tokio::test]
    async fn test_upload_failure_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(ResponseTemplate::new(503).set_body_string("storage offline"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .upload("rock.png", Bytes::from_static(b"\x89PNG"))
            .await
            .unwrap_err();

        match err {
            RemoteError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "storage offline");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_analyze_routes_by_mode() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "soilType": "Loamy Sand",
                "composition": { "Silica": "High" },
                "habitability": { "summary": "Challenging", "details": "Low nutrients." },
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/lunar"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sampleType": "Lunar Regolith (Basalt)",
                "composition": { "Iron (Fe)": "Medium" },
                "habitability": { "summary": "Inhospitable", "details": "No water." },
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let handle = ImageHandle::new("img-123");

        let soil = client.analyze(&handle, AnalysisMode::Soil).await.unwrap();
        assert_eq!(soil.sample_type, "Loamy Sand");

        let lunar = client.analyze(&handle, AnalysisMode::Lunar).await.unwrap();
        assert_eq!(lunar.sample_type, "Lunar Regolith (Basalt)");
    }

    #[tokio::test]
    async fn test_login_stores_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "token-abc",
                "token_type": "bearer",
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .and(header("authorization", "Bearer token-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "img-1",
                "url": "https://cdn.example/img-1.png",
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(client.login("selene", "hunter2", UserRole::User).await);

        // the token from login must be attached to the upload
        client
            .upload("rock.png", Bytes::from_static(b"\x89PNG"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_login_rejection_resolves_false() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(!client.login("selene", "wrong", UserRole::User).await);
    }
}
