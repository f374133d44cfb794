//! Security panel mappings
//!
//! Pure translation from SonarQube/Trivy-shaped reports to panel
//! render state: tone thresholds, scan verdicts, and the truncated
//! vulnerability listing.

use crate::model::{ImageScanResult, SonarReport, TrivyReport, Vulnerability};
use crate::view::{
    ImageScanView, MetricRow, PanelStatus, SecurityPanel, Tone, TrivyView, VulnerabilityRow,
};

/// Listing cap for scan findings; the remainder becomes a "+N more"
/// tail.
pub const MAX_LISTED_VULNERABILITIES: usize = 10;

/// Images the quick-scan shortcut buttons offer, the lab's own
/// service images.
pub const QUICK_SCAN_PRESETS: &[&str] = &[
    "nginx:latest",
    "jenkins/jenkins:lts",
    "sonarqube:latest",
    "portainer/portainer-ce:latest",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Unknown,
}

impl From<&str> for Severity {
    fn from(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "CRITICAL" => Severity::Critical,
            "HIGH" => Severity::High,
            "MEDIUM" => Severity::Medium,
            "LOW" => Severity::Low,
            _ => Severity::Unknown,
        }
    }
}

impl Severity {
    pub fn tone(self) -> Tone {
        match self {
            Severity::Critical => Tone::Danger,
            Severity::High => Tone::Warning,
            Severity::Medium => Tone::Info,
            Severity::Low => Tone::Success,
            Severity::Unknown => Tone::Neutral,
        }
    }
}

/// Map a quality report to its panel. Zero counts read as healthy;
/// any vulnerability escalates past any bug.
pub fn sonar_panel(report: &SonarReport) -> SecurityPanel {
    if !report.success {
        return SecurityPanel::offline(
            report
                .error
                .clone()
                .unwrap_or_else(|| "Could not connect to SonarQube".to_string()),
        );
    }

    let bugs_tone = if report.bugs > 0 {
        Tone::Warning
    } else {
        Tone::Success
    };
    let vulns_tone = if report.vulnerabilities > 0 {
        Tone::Danger
    } else {
        Tone::Success
    };
    let coverage = report
        .coverage
        .map(|c| format!("{}%", c))
        .unwrap_or_else(|| "N/A".to_string());
    let gate = report.quality_gate.as_deref().unwrap_or("N/A");
    let gate_tone = if gate == "OK" {
        Tone::Success
    } else {
        Tone::Danger
    };

    SecurityPanel {
        status: PanelStatus::Online,
        rows: vec![
            MetricRow::new("Bugs", report.bugs.to_string(), bugs_tone),
            MetricRow::new(
                "Vulnerabilities",
                report.vulnerabilities.to_string(),
                vulns_tone,
            ),
            MetricRow::new("Code smells", report.code_smells.to_string(), Tone::Neutral),
            MetricRow::new("Coverage", coverage, Tone::Neutral),
            MetricRow::new("Quality gate", gate, gate_tone),
        ],
        projects: report.projects.clone(),
        message: None,
    }
}

/// Map a periodic vulnerability summary to the Trivy panel.
pub fn trivy_summary(report: &TrivyReport) -> TrivyView {
    if !report.success {
        return TrivyView::Offline {
            message: report
                .error
                .clone()
                .unwrap_or_else(|| "Could not connect to Trivy".to_string()),
        };
    }

    let mut rows = severity_rows(report.critical, report.high, report.medium, report.low);
    if let Some(last_scan) = report.last_scan {
        rows.push(MetricRow::new(
            "Last scan",
            last_scan.format("%Y-%m-%d %H:%M:%S").to_string(),
            Tone::Neutral,
        ));
    }

    TrivyView::Summary(SecurityPanel {
        status: PanelStatus::Online,
        rows,
        projects: Vec::new(),
        message: None,
    })
}

/// Overall verdict for a finished scan, driven by the worst severity
/// present.
pub fn scan_verdict(critical: u64, high: u64, medium: u64) -> (&'static str, Tone) {
    if critical > 0 {
        ("Critical", Tone::Danger)
    } else if high > 0 {
        ("Attention", Tone::Warning)
    } else if medium > 0 {
        ("Review", Tone::Info)
    } else {
        ("Secure", Tone::Success)
    }
}

/// Render a finished image scan: severity rows, verdict, and the
/// capped finding list.
pub fn image_scan_view(image: &str, result: &ImageScanResult) -> ImageScanView {
    let (verdict, verdict_tone) = scan_verdict(result.critical, result.high, result.medium);

    let vulnerabilities: Vec<VulnerabilityRow> = result
        .vulnerabilities
        .iter()
        .take(MAX_LISTED_VULNERABILITIES)
        .map(vulnerability_row)
        .collect();
    let truncated = result
        .vulnerabilities
        .len()
        .saturating_sub(MAX_LISTED_VULNERABILITIES);

    ImageScanView {
        image: image.to_string(),
        verdict: verdict.to_string(),
        verdict_tone,
        rows: severity_rows(result.critical, result.high, result.medium, result.low),
        vulnerabilities,
        truncated,
    }
}

/// Image names come from free-form input; only emptiness is rejected
/// client-side, the backend owns the rest.
pub fn validate_image_name(input: &str) -> Result<String, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("Docker image name is required".to_string());
    }
    Ok(trimmed.to_string())
}

fn severity_rows(critical: u64, high: u64, medium: u64, low: u64) -> Vec<MetricRow> {
    vec![
        MetricRow::new("Critical", critical.to_string(), Tone::Danger),
        MetricRow::new("High", high.to_string(), Tone::Warning),
        MetricRow::new("Medium", medium.to_string(), Tone::Info),
        MetricRow::new("Low", low.to_string(), Tone::Success),
        MetricRow::new(
            "Total",
            (critical + high + medium + low).to_string(),
            Tone::Neutral,
        ),
    ]
}

fn vulnerability_row(vuln: &Vulnerability) -> VulnerabilityRow {
    let severity = Severity::from(vuln.severity.as_str());
    VulnerabilityRow {
        id: vuln.id.clone(),
        severity: vuln.severity.clone(),
        tone: severity.tone(),
        title: vuln.title.clone().unwrap_or_else(|| vuln.id.clone()),
        description: vuln
            .description
            .clone()
            .unwrap_or_else(|| "No description".to_string()),
        fix: vuln.fixed_version.clone(),
    }
}
