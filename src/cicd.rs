//! CI/CD panel data
//!
//! Entirely hardcoded — a placeholder integration point until the
//! backend proxies a real Jenkins. No network call is made.

use crate::view::{BuildRow, CicdMetricsView, CicdView, JobRow, PanelStatus, Tone};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildState {
    Success,
    Running,
    Failed,
}

impl BuildState {
    pub fn tone(self) -> Tone {
        match self {
            BuildState::Success => Tone::Success,
            BuildState::Running => Tone::Warning,
            BuildState::Failed => Tone::Danger,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BuildState::Success => "Success",
            BuildState::Running => "Running",
            BuildState::Failed => "Failed",
        }
    }
}

#[derive(Clone, Debug)]
pub struct JenkinsJob {
    pub name: &'static str,
    pub state: BuildState,
    pub last_build: &'static str,
}

#[derive(Clone, Debug)]
pub struct RecentBuild {
    pub name: &'static str,
    pub state: BuildState,
    pub time: &'static str,
    pub duration: &'static str,
}

/// Fixture average until real build telemetry exists.
const AVG_BUILD_TIME: &str = "2.5m";

pub fn jenkins_jobs() -> Vec<JenkinsJob> {
    vec![
        JenkinsJob {
            name: "build-frontend",
            state: BuildState::Success,
            last_build: "2m ago",
        },
        JenkinsJob {
            name: "build-backend",
            state: BuildState::Success,
            last_build: "5m ago",
        },
        JenkinsJob {
            name: "deploy-production",
            state: BuildState::Running,
            last_build: "now",
        },
    ]
}

pub fn recent_builds() -> Vec<RecentBuild> {
    vec![
        RecentBuild {
            name: "build-frontend #42",
            state: BuildState::Success,
            time: "2m ago",
            duration: "1m 30s",
        },
        RecentBuild {
            name: "build-backend #38",
            state: BuildState::Success,
            time: "5m ago",
            duration: "2m 15s",
        },
        RecentBuild {
            name: "deploy-staging #15",
            state: BuildState::Running,
            time: "now",
            duration: "30s",
        },
        RecentBuild {
            name: "test-e2e #127",
            state: BuildState::Failed,
            time: "10m ago",
            duration: "5m 00s",
        },
        RecentBuild {
            name: "build-api #89",
            state: BuildState::Success,
            time: "15m ago",
            duration: "1m 45s",
        },
    ]
}

pub fn derive_metrics(jobs: &[JenkinsJob]) -> CicdMetricsView {
    CicdMetricsView {
        successful_builds: jobs
            .iter()
            .filter(|job| job.state == BuildState::Success)
            .count(),
        failed_builds: jobs
            .iter()
            .filter(|job| job.state == BuildState::Failed)
            .count(),
        active_pipelines: jobs
            .iter()
            .filter(|job| job.state == BuildState::Running)
            .count(),
        avg_build_time: AVG_BUILD_TIME.to_string(),
    }
}

/// Assemble the full CI/CD panel view from the fixtures.
pub fn panel_snapshot() -> CicdView {
    let jobs = jenkins_jobs();
    let metrics = derive_metrics(&jobs);

    CicdView {
        status: PanelStatus::Online,
        jobs: jobs
            .iter()
            .map(|job| JobRow {
                name: job.name.to_string(),
                detail: job.last_build.to_string(),
                tone: job.state.tone(),
            })
            .collect(),
        builds: recent_builds()
            .iter()
            .map(|build| BuildRow {
                name: build.name.to_string(),
                state: build.state.label().to_string(),
                tone: build.state.tone(),
                time: build.time.to_string(),
                duration: build.duration.to_string(),
            })
            .collect(),
        metrics,
    }
}

/// Form input for the mocked create-pipeline flow.
#[derive(Clone, Debug, Default)]
pub struct PipelineSpec {
    pub name: String,
    pub repository: String,
    pub branch: String,
    pub build_script: String,
}

impl PipelineSpec {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() || self.repository.trim().is_empty() {
            return Err("pipeline name and repository are required".to_string());
        }
        Ok(())
    }
}
