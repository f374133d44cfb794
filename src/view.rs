//! Client-local render state
//!
//! Every panel the front-end paints is modelled as a value here, and
//! every value is replaced wholesale on refresh, never patched. The
//! controller owns one `ViewState`; renders are last-write-wins since
//! each panel has a single target.

use crate::model::{RunningStack, Stack};
use chrono::{DateTime, Utc};

/// Display emphasis of a rendered value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Success,
    Warning,
    Danger,
    Info,
    Neutral,
}

/// Connection indicator shown in a panel header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelStatus {
    Connecting,
    Online,
    Offline,
    Scanning,
    ScanComplete,
    Error,
}

/// One label/value line inside a panel.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricRow {
    pub label: String,
    pub value: String,
    pub tone: Tone,
}

impl MetricRow {
    pub fn new(label: impl Into<String>, value: impl Into<String>, tone: Tone) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            tone,
        }
    }
}

/// Uppercase the first character for display, the way stack names are
/// shown on cards.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Reachable-link label: URLs lose their scheme, bare ports become
/// `localhost:{port}`.
fn link_labels(urls: &[String], ports: &[u16]) -> Vec<String> {
    let mut links: Vec<String> = urls
        .iter()
        .map(|url| {
            url.strip_prefix("http://")
                .or_else(|| url.strip_prefix("https://"))
                .unwrap_or(url)
                .to_string()
        })
        .collect();
    links.extend(ports.iter().map(|port| format!("localhost:{}", port)));
    links
}

/// Card for one available stack.
#[derive(Clone, Debug, PartialEq)]
pub struct StackCard {
    pub name: String,
    pub display_name: String,
    pub service_tags: Vec<String>,
    pub links: Vec<String>,
}

impl From<&Stack> for StackCard {
    fn from(stack: &Stack) -> Self {
        Self {
            name: stack.name.clone(),
            display_name: capitalize_first(&stack.name),
            service_tags: stack.services.clone(),
            links: link_labels(&stack.urls, &stack.ports),
        }
    }
}

/// Available-stacks list render state.
#[derive(Clone, Debug, PartialEq)]
pub enum StackListView {
    Loading,
    Empty,
    Cards(Vec<StackCard>),
}

impl StackListView {
    pub fn from_stacks(stacks: &[Stack]) -> Self {
        if stacks.is_empty() {
            StackListView::Empty
        } else {
            StackListView::Cards(stacks.iter().map(StackCard::from).collect())
        }
    }

    pub fn card_count(&self) -> usize {
        match self {
            StackListView::Cards(cards) => cards.len(),
            _ => 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ActiveStackRow {
    pub name: String,
    pub display_name: String,
    pub services_running: u32,
    pub links: Vec<String>,
}

impl From<&RunningStack> for ActiveStackRow {
    fn from(stack: &RunningStack) -> Self {
        Self {
            name: stack.name.clone(),
            display_name: capitalize_first(&stack.name),
            services_running: stack.services,
            links: link_labels(&stack.urls, &stack.ports),
        }
    }
}

/// Running-stacks panel render state. `Unreachable` is distinct from
/// `Empty` so a dead backend never reads as "zero running stacks".
#[derive(Clone, Debug, PartialEq)]
pub enum ActiveStacksView {
    Loading,
    Empty,
    Unreachable,
    Stacks(Vec<ActiveStackRow>),
}

impl ActiveStacksView {
    pub fn from_running(stacks: &[RunningStack]) -> Self {
        if stacks.is_empty() {
            ActiveStacksView::Empty
        } else {
            ActiveStacksView::Stacks(stacks.iter().map(ActiveStackRow::from).collect())
        }
    }
}

/// Headline metric cards plus the active/available split behind the
/// status chart.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetricsView {
    pub total_stacks: usize,
    pub active_stacks: usize,
    pub total_services: usize,
}

impl MetricsView {
    /// (active, inactive) slices of the status ring.
    pub fn chart_split(&self) -> (usize, usize) {
        (
            self.active_stacks,
            self.total_stacks.saturating_sub(self.active_stacks),
        )
    }
}

/// Generic security panel: header status plus metric rows.
#[derive(Clone, Debug, PartialEq)]
pub struct SecurityPanel {
    pub status: PanelStatus,
    pub rows: Vec<MetricRow>,
    pub projects: Vec<String>,
    pub message: Option<String>,
}

impl SecurityPanel {
    pub fn connecting() -> Self {
        Self {
            status: PanelStatus::Connecting,
            rows: Vec::new(),
            projects: Vec::new(),
            message: None,
        }
    }

    pub fn offline(message: impl Into<String>) -> Self {
        Self {
            status: PanelStatus::Offline,
            rows: Vec::new(),
            projects: Vec::new(),
            message: Some(message.into()),
        }
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            status: PanelStatus::Error,
            rows: Vec::new(),
            projects: Vec::new(),
            message: Some(message.into()),
        }
    }

    pub fn row(&self, label: &str) -> Option<&MetricRow> {
        self.rows.iter().find(|row| row.label == label)
    }
}

/// One listed vulnerability in an image scan result.
#[derive(Clone, Debug, PartialEq)]
pub struct VulnerabilityRow {
    pub id: String,
    pub severity: String,
    pub tone: Tone,
    pub title: String,
    pub description: String,
    pub fix: Option<String>,
}

/// Rendered result of a named image scan.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageScanView {
    pub image: String,
    pub verdict: String,
    pub verdict_tone: Tone,
    pub rows: Vec<MetricRow>,
    pub vulnerabilities: Vec<VulnerabilityRow>,
    /// Count of findings beyond the listed ones.
    pub truncated: usize,
}

/// Trivy panel render state.
#[derive(Clone, Debug, PartialEq)]
pub enum TrivyView {
    /// Empty state, awaiting a scan.
    Waiting,
    /// An image scan is in flight.
    Scanning { image: String },
    /// Periodic vulnerability summary.
    Summary(SecurityPanel),
    /// Finished image scan.
    ScanResult(ImageScanView),
    /// Backend offline or scan failed.
    Offline { message: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct HistoryRow {
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub summary: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum HistoryView {
    Loading,
    Empty,
    Unavailable,
    Entries(Vec<HistoryRow>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct JobRow {
    pub name: String,
    pub detail: String,
    pub tone: Tone,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BuildRow {
    pub name: String,
    pub state: String,
    pub tone: Tone,
    pub time: String,
    pub duration: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CicdMetricsView {
    pub successful_builds: usize,
    pub failed_builds: usize,
    pub active_pipelines: usize,
    pub avg_build_time: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CicdView {
    pub status: PanelStatus,
    pub jobs: Vec<JobRow>,
    pub builds: Vec<BuildRow>,
    pub metrics: CicdMetricsView,
}

impl Default for CicdView {
    fn default() -> Self {
        Self {
            status: PanelStatus::Connecting,
            jobs: Vec::new(),
            builds: Vec::new(),
            metrics: CicdMetricsView::default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SidebarView {
    pub collapsed: bool,
}

/// The whole client-side render state. One instance lives behind the
/// controller's lock; panels are swapped as units.
#[derive(Clone, Debug)]
pub struct ViewState {
    pub available: StackListView,
    pub active: ActiveStacksView,
    pub metrics: MetricsView,
    pub sonarqube: SecurityPanel,
    pub trivy: TrivyView,
    pub history: HistoryView,
    pub cicd: CicdView,
    pub sidebar: SidebarView,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            available: StackListView::Loading,
            active: ActiveStacksView::Loading,
            metrics: MetricsView::default(),
            sonarqube: SecurityPanel::connecting(),
            trivy: TrivyView::Waiting,
            history: HistoryView::Loading,
            cicd: CicdView::default(),
            sidebar: SidebarView::default(),
        }
    }
}
