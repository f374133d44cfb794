//! REST client for the lab backend

use crate::errors::{DashboardError, Result};
use crate::model::{
    ActionResponse, CreateStackRequest, ImageScanResponse, ScanHistoryResponse, SonarReport,
    Stack, StatusResponse, TrivyReport, YamlResponse,
};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Thin typed wrapper over the backend REST surface. One method per
/// endpoint; the controller owns classification of `success:false`
/// bodies.
///
/// The HTTP status line is deliberately not inspected: outcome bodies
/// are decoded whatever the status, so an error page that isn't JSON
/// surfaces as a decode failure and a well-formed failure body as an
/// application failure.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("lab-dashboard/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(DashboardError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn stacks(&self) -> Result<Vec<Stack>> {
        self.get_json("/api/stacks").await
    }

    pub async fn status(&self) -> Result<StatusResponse> {
        self.get_json("/api/status").await
    }

    pub async fn create_stack(&self, request: &CreateStackRequest) -> Result<ActionResponse> {
        self.post_json("/api/create-stack", request).await
    }

    pub async fn deploy(&self, stack: &str) -> Result<ActionResponse> {
        self.post_json("/api/deploy", &serde_json::json!({ "stack": stack }))
            .await
    }

    pub async fn remove(&self, stack: &str) -> Result<ActionResponse> {
        self.post_json("/api/remove", &serde_json::json!({ "stack": stack }))
            .await
    }

    pub async fn stack_yaml(&self, stack: &str) -> Result<YamlResponse> {
        self.get_json(&format!("/api/stack-yaml/{}", stack)).await
    }

    pub async fn update_stack(&self, stack: &str, yaml: &str) -> Result<ActionResponse> {
        self.post_json(
            "/api/update-stack",
            &serde_json::json!({ "stack": stack, "yaml": yaml }),
        )
        .await
    }

    pub async fn sonarqube(&self) -> Result<SonarReport> {
        self.get_json("/api/security/sonarqube").await
    }

    pub async fn trivy(&self) -> Result<TrivyReport> {
        self.get_json("/api/security/trivy").await
    }

    pub async fn trivy_scan(&self) -> Result<ActionResponse> {
        self.post_bare("/api/security/trivy/scan").await
    }

    pub async fn scan_image(&self, image: &str) -> Result<ImageScanResponse> {
        self.post_json(
            "/api/security/trivy/scan-image",
            &serde_json::json!({ "image": image }),
        )
        .await
    }

    pub async fn scan_history(&self) -> Result<ScanHistoryResponse> {
        self.get_json("/api/security/history").await
    }

    pub async fn lab_start(&self) -> Result<ActionResponse> {
        self.post_bare("/api/lab/start").await
    }

    pub async fn lab_destroy(&self) -> Result<ActionResponse> {
        self.post_bare("/api/lab/destroy").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        Ok(response.json::<T>().await?)
    }

    async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(path);
        debug!("POST {}", url);
        let response = self.client.post(&url).json(body).send().await?;
        Ok(response.json::<T>().await?)
    }

    /// POST without a body, for the lab lifecycle and scan triggers.
    async fn post_bare<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!("POST {}", url);
        let response = self.client.post(&url).send().await?;
        Ok(response.json::<T>().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
