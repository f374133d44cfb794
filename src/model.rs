//! Wire types for the lab backend REST surface

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A stack definition known to the backend, not necessarily running.
/// Replaced wholesale on every fetch, never patched.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Stack {
    pub name: String,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub ports: Vec<u16>,
}

/// A stack currently active on the backend. `services` is a count
/// here, not a list.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RunningStack {
    pub name: String,
    #[serde(default)]
    pub services: u32,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub ports: Vec<u16>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub running_stacks: Vec<RunningStack>,
}

/// Outcome body shared by all mutating endpoints.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    // Create-stack extras
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<PortAssignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jenkins: Option<JenkinsPipelineResult>,
}

/// Ports and URL assigned by the backend when a stack is created.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortAssignment {
    pub container_port: u16,
    pub public_port: u16,
    pub url: String,
}

/// Result of the pipeline provisioning a create-stack may trigger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JenkinsPipelineResult {
    #[serde(default)]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `POST /api/create-stack`. The backend expects camelCase
/// keys; `enableCICD` is the one key that doesn't follow the pattern.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStackRequest {
    pub name: String,
    pub image: String,
    pub network: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check: Option<String>,
    pub use_traefik: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traefik_domain: Option<String>,
    pub env_vars: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_database: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseOptions>,
    #[serde(rename = "enableCICD", skip_serializing_if = "Option::is_none")]
    pub enable_cicd: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cicd: Option<CicdOptions>,
}

pub const DEFAULT_STACK_NETWORK: &str = "devops-network";

impl CreateStackRequest {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            network: DEFAULT_STACK_NETWORK.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseOptions {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub user: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CicdOptions {
    pub git_clone_url: String,
    pub git_branch: String,
    pub build_command: String,
    pub dockerfile_path: String,
    pub docker_registry: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct YamlResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaml: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// SonarQube-shaped quality report. Counters default to zero when the
/// backend omits them.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SonarReport {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub bugs: u64,
    #[serde(default)]
    pub vulnerabilities: u64,
    #[serde(default)]
    pub code_smells: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_gate: Option<String>,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Trivy-shaped vulnerability summary.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TrivyReport {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub critical: u64,
    #[serde(default)]
    pub high: u64,
    #[serde(default)]
    pub medium: u64,
    #[serde(default)]
    pub low: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_scan: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TrivyReport {
    pub fn total(&self) -> u64 {
        self.critical + self.high + self.medium + self.low
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ImageScanResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<ImageScanResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ImageScanResult {
    #[serde(default)]
    pub critical: u64,
    #[serde(default)]
    pub high: u64,
    #[serde(default)]
    pub medium: u64,
    #[serde(default)]
    pub low: u64,
    #[serde(default)]
    pub vulnerabilities: Vec<Vulnerability>,
}

impl ImageScanResult {
    pub fn total(&self) -> u64 {
        self.critical + self.high + self.medium + self.low
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Vulnerability {
    pub id: String,
    pub severity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_version: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScanHistoryResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub scans: Vec<ScanRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanRecord {
    /// `"sonar"` for quality scans; anything else is an image scan.
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}
