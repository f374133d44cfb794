//! Dashboard sync controller
//!
//! Owns the client-local view of the lab and keeps it converged with
//! the backend: pull-based polling for status and metrics, immediate
//! re-fetch after user-triggered mutations, and the screen-scoped
//! security poller. All state that was ambient in earlier dashboard
//! iterations (pending confirmation, editing session, terminal,
//! timers) lives on this one context object.

use crate::api::ApiClient;
use crate::cicd::{self, PipelineSpec};
use crate::config::Config;
use crate::console::ActivityConsole;
use crate::errors::{DashboardError, Result};
use crate::model::CreateStackRequest;
use crate::prefs::{PrefsStore, UiPrefs, sidebar_collapsed_for};
use crate::security;
use crate::terminal::{ConnectionType, TerminalSession};
use crate::view::{
    ActiveStacksView, HistoryRow, HistoryView, MetricsView, SecurityPanel, StackListView,
    TrivyView, ViewState,
};
use futures::future;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Identity of a mutating action. Busy-tracking is keyed by this, so
/// an in-flight deploy blocks a second deploy but not a removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    CreateStack,
    Deploy,
    Remove,
    UpdateStack,
    StartLab,
    DestroyLab,
}

impl ActionKind {
    fn label(self) -> &'static str {
        match self {
            ActionKind::CreateStack => "Stack creation",
            ActionKind::Deploy => "Deploy",
            ActionKind::Remove => "Removal",
            ActionKind::UpdateStack => "Stack update",
            ActionKind::StartLab => "Lab startup",
            ActionKind::DestroyLab => "Lab teardown",
        }
    }
}

/// Navigable screens of the dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    Stacks,
    Security,
    Cicd,
    Console,
}

/// Action staged behind a confirmation dialog.
#[derive(Clone, Debug, PartialEq)]
pub enum PendingAction {
    Deploy { stack: String },
    Remove { stack: String },
    StartLab,
    DestroyLab,
    TrivyScan,
}

/// What the confirmation dialog should say.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfirmPrompt {
    pub title: String,
    pub message: String,
}

/// Clears the action's busy flag on every exit path.
struct BusyGuard {
    kind: ActionKind,
    flags: Arc<Mutex<HashSet<ActionKind>>>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        if let Ok(mut flags) = self.flags.lock() {
            flags.remove(&self.kind);
        }
    }
}

pub struct DashboardController {
    config: Config,
    api: ApiClient,
    view: RwLock<ViewState>,
    console: ActivityConsole,
    prefs: PrefsStore,
    busy: Arc<Mutex<HashSet<ActionKind>>>,
    pending: Mutex<Option<PendingAction>>,
    editing_stack: Mutex<Option<String>>,
    terminal: Mutex<Option<TerminalSession>>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
    security_task: Mutex<Option<JoinHandle<()>>>,
    current_screen: Mutex<Screen>,
}

impl DashboardController {
    pub fn new(config: Config) -> Result<Self> {
        config.validate().map_err(DashboardError::Config)?;

        let api = ApiClient::new(config.backend_url.clone(), config.http_timeout)?;
        let prefs = match &config.prefs_path {
            Some(path) => PrefsStore::new(path.clone()),
            None => PrefsStore::new(PrefsStore::default_path()?),
        };

        Ok(Self {
            config,
            api,
            view: RwLock::new(ViewState::default()),
            console: ActivityConsole::default(),
            prefs,
            busy: Arc::new(Mutex::new(HashSet::new())),
            pending: Mutex::new(None),
            editing_stack: Mutex::new(None),
            terminal: Mutex::new(None),
            poll_task: Mutex::new(None),
            security_task: Mutex::new(None),
            current_screen: Mutex::new(Screen::Dashboard),
        })
    }

    /// Initial load plus the recurring status/metrics poller. The
    /// poller handle is owned here; `shutdown` clears it exactly once.
    pub async fn start(self: &Arc<Self>) {
        info!(
            "Starting dashboard controller against {}",
            self.api.base_url()
        );

        self.load_sidebar_state().await;
        self.load_available_stacks().await;
        self.refresh_status().await;
        self.update_metrics().await;

        let controller = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut tick = interval(controller.config.status_poll_interval);
            // The immediate first tick; startup already refreshed
            tick.tick().await;
            loop {
                tick.tick().await;
                controller.refresh_status().await;
                controller.update_metrics().await;
            }
        });

        let mut slot = self.poll_task.lock().unwrap();
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    pub async fn shutdown(&self) {
        self.exit_security_screen();

        let handle = self.poll_task.lock().unwrap().take();
        if let Some(handle) = handle {
            handle.abort();
            info!("Dashboard controller shut down");
        }
    }

    pub fn polling_active(&self) -> bool {
        self.poll_task
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Snapshot of the whole render state.
    pub async fn view(&self) -> ViewState {
        self.view.read().await.clone()
    }

    pub fn console(&self) -> &ActivityConsole {
        &self.console
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_busy(&self, kind: ActionKind) -> bool {
        self.busy.lock().unwrap().contains(&kind)
    }

    // ----- stack list / status sync -----

    /// Fetch the available stacks and replace the card list. Failure
    /// leaves the prior render untouched and surfaces on the console.
    pub async fn load_available_stacks(&self) {
        match self.api.stacks().await {
            Ok(stacks) => {
                self.view.write().await.available = StackListView::from_stacks(&stacks);
            }
            Err(err) => {
                error!("Failed to load available stacks: {}", err);
                self.console
                    .error(format!("Failed to load available stacks: {}", err))
                    .await;
            }
        }
    }

    /// Fetch the running stacks. An unreachable backend renders its
    /// own state so it never reads as "zero running stacks".
    pub async fn refresh_status(&self) {
        match self.api.status().await {
            Ok(status) => {
                self.view.write().await.active =
                    ActiveStacksView::from_running(&status.running_stacks);
            }
            Err(err) => {
                warn!("Status refresh failed: {}", err);
                self.view.write().await.active = ActiveStacksView::Unreachable;
            }
        }
    }

    /// Recompute the headline metric cards from a paired fetch of both
    /// endpoints. A failed cycle keeps the previous numbers.
    pub async fn update_metrics(&self) {
        let (stacks, status) = future::join(self.api.stacks(), self.api.status()).await;

        match (stacks, status) {
            (Ok(stacks), Ok(status)) => {
                self.view.write().await.metrics = MetricsView {
                    total_stacks: stacks.len(),
                    active_stacks: status.running_stacks.len(),
                    total_services: stacks.iter().map(|stack| stack.services.len()).sum(),
                };
            }
            (Err(err), _) | (_, Err(err)) => {
                warn!("Metrics refresh failed: {}", err);
            }
        }
    }

    /// Re-fetch both lists exactly once each after a successful
    /// mutation; the metrics panel converges on the next poll tick.
    async fn reconverge(&self) {
        self.load_available_stacks().await;
        self.refresh_status().await;
    }

    // ----- screen navigation -----

    /// Navigate between screens, running each screen's enter/exit
    /// hooks: leaving security stops its poller, entering it starts
    /// one, CI/CD refreshes its panel, and the console screen resets
    /// the terminal.
    pub async fn switch_screen(self: &Arc<Self>, screen: Screen) {
        let previous = {
            let mut current = self.current_screen.lock().unwrap();
            let previous = *current;
            *current = screen;
            previous
        };

        if previous == Screen::Security && screen != Screen::Security {
            self.exit_security_screen();
        }

        match screen {
            Screen::Security => self.enter_security_screen().await,
            Screen::Cicd => self.enter_cicd_screen().await,
            Screen::Console => self.enter_console_screen(),
            Screen::Dashboard | Screen::Stacks => {}
        }
    }

    pub fn current_screen(&self) -> Screen {
        *self.current_screen.lock().unwrap()
    }

    // ----- confirmation staging -----

    pub fn request_deploy(&self, stack: &str) -> ConfirmPrompt {
        self.stage(PendingAction::Deploy {
            stack: stack.to_string(),
        });
        ConfirmPrompt {
            title: "Deploy stack".to_string(),
            message: format!("Deploy the stack \"{}\"?", stack),
        }
    }

    pub fn request_remove(&self, stack: &str) -> ConfirmPrompt {
        self.stage(PendingAction::Remove {
            stack: stack.to_string(),
        });
        ConfirmPrompt {
            title: "Remove stack".to_string(),
            message: format!(
                "Remove the stack \"{}\"? This stops all of its services and deletes the YAML file.",
                stack
            ),
        }
    }

    pub fn request_start_lab(&self) -> ConfirmPrompt {
        self.stage(PendingAction::StartLab);
        ConfirmPrompt {
            title: "Start full lab".to_string(),
            message: "Start the whole lab environment? This can take a few minutes.".to_string(),
        }
    }

    pub fn request_destroy_lab(&self) -> ConfirmPrompt {
        self.stage(PendingAction::DestroyLab);
        ConfirmPrompt {
            title: "Destroy lab".to_string(),
            message:
                "WARNING: this destroys the whole lab environment, including all stacks and volumes. Continue?"
                    .to_string(),
        }
    }

    pub fn request_trivy_scan(&self) -> ConfirmPrompt {
        self.stage(PendingAction::TrivyScan);
        ConfirmPrompt {
            title: "Start vulnerability scan".to_string(),
            message: "Start a vulnerability scan? This can take a few minutes.".to_string(),
        }
    }

    fn stage(&self, action: PendingAction) {
        *self.pending.lock().unwrap() = Some(action);
    }

    pub fn pending_action(&self) -> Option<PendingAction> {
        self.pending.lock().unwrap().clone()
    }

    pub fn cancel_pending(&self) {
        *self.pending.lock().unwrap() = None;
    }

    /// Run whatever is staged. A confirm with nothing staged is a
    /// no-op.
    pub async fn confirm_pending(&self) {
        let action = self.pending.lock().unwrap().take();
        match action {
            Some(PendingAction::Deploy { stack }) => self.deploy_stack(&stack).await,
            Some(PendingAction::Remove { stack }) => self.remove_stack(&stack).await,
            Some(PendingAction::StartLab) => self.start_lab().await,
            Some(PendingAction::DestroyLab) => self.destroy_lab().await,
            Some(PendingAction::TrivyScan) => self.start_trivy_scan().await,
            None => {}
        }
    }

    // ----- mutating actions -----

    #[instrument(skip(self))]
    pub async fn deploy_stack(&self, stack: &str) {
        let Some(_busy) = self.begin(ActionKind::Deploy).await else {
            return;
        };
        let action_id = Uuid::new_v4();
        info!(action_id = %action_id, stack, "Deploy requested");
        self.console
            .info(format!("Deploying stack \"{}\"...", stack))
            .await;

        match self.api.deploy(stack).await {
            Ok(response) if response.success => {
                self.console
                    .success(format!("Stack \"{}\" deployed", stack))
                    .await;
                if let Some(output) = response.output {
                    self.console.info(output).await;
                }
                self.reconverge().await;
            }
            Ok(response) => {
                let reason = failure_reason(&response.error);
                warn!(action_id = %action_id, stack, "Deploy rejected by backend: {}", reason);
                self.console
                    .warning(format!("Failed to deploy stack \"{}\": {}", stack, reason))
                    .await;
            }
            Err(err) => {
                error!(action_id = %action_id, stack, "Deploy request failed: {}", err);
                self.console
                    .error(format!("Failed to reach the backend: {}", err))
                    .await;
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn remove_stack(&self, stack: &str) {
        let Some(_busy) = self.begin(ActionKind::Remove).await else {
            return;
        };
        let action_id = Uuid::new_v4();
        info!(action_id = %action_id, stack, "Removal requested");
        self.console
            .warning(format!("Removing stack \"{}\"...", stack))
            .await;

        match self.api.remove(stack).await {
            Ok(response) if response.success => {
                self.console
                    .success(format!("Stack \"{}\" removed", stack))
                    .await;
                if let Some(output) = response.output {
                    self.console.info(output).await;
                }
                self.reconverge().await;
            }
            Ok(response) => {
                let reason = failure_reason(&response.error);
                warn!(action_id = %action_id, stack, "Removal rejected by backend: {}", reason);
                self.console
                    .warning(format!("Failed to remove stack \"{}\": {}", stack, reason))
                    .await;
            }
            Err(err) => {
                error!(action_id = %action_id, stack, "Removal request failed: {}", err);
                self.console
                    .error(format!("Failed to reach the backend: {}", err))
                    .await;
            }
        }
    }

    pub async fn create_stack(&self, request: CreateStackRequest) {
        let Some(_busy) = self.begin(ActionKind::CreateStack).await else {
            return;
        };
        let action_id = Uuid::new_v4();
        info!(action_id = %action_id, stack = %request.name, "Stack creation requested");
        self.console
            .info(format!("Creating new stack \"{}\"...", request.name))
            .await;

        match self.api.create_stack(&request).await {
            Ok(response) if response.success => {
                self.console
                    .success(format!(
                        "Stack \"{}\" created and deployed",
                        request.name
                    ))
                    .await;
                if let Some(file) = response.file {
                    self.console.info(format!("File created: {}", file)).await;
                }
                if let Some(ports) = response.info {
                    self.console
                        .info(format!("Container port: {}", ports.container_port))
                        .await;
                    self.console
                        .info(format!("Public port: {}", ports.public_port))
                        .await;
                    self.console
                        .success(format!("Available at: {}", ports.url))
                        .await;
                }
                if let Some(deploy_output) = response.deploy_output {
                    self.console
                        .info(format!("Deploy: {}", deploy_output))
                        .await;
                }
                if let Some(jenkins) = response.jenkins {
                    if jenkins.success {
                        if let Some(job) = jenkins.job_name {
                            self.console
                                .success(format!("Jenkins pipeline created: {}", job))
                                .await;
                        }
                        if let Some(url) = jenkins.job_url {
                            self.console
                                .info(format!("Pipeline available at: {}", url))
                                .await;
                        }
                    } else {
                        self.console
                            .warning(format!(
                                "Jenkins warning: {}",
                                failure_reason(&jenkins.error)
                            ))
                            .await;
                    }
                }
                self.reconverge().await;
            }
            Ok(response) => {
                let reason = failure_reason(&response.error);
                warn!(action_id = %action_id, stack = %request.name, "Stack creation rejected: {}", reason);
                self.console
                    .warning(format!(
                        "Failed to create stack \"{}\": {}",
                        request.name, reason
                    ))
                    .await;
            }
            Err(err) => {
                error!(action_id = %action_id, stack = %request.name, "Stack creation failed: {}", err);
                self.console
                    .error(format!("Failed to reach the backend: {}", err))
                    .await;
            }
        }
    }

    // ----- YAML editing session -----

    /// Load a stack's YAML and open an editing session for it. Returns
    /// the content for the editor; failures surface on the console.
    pub async fn open_yaml_editor(&self, stack: &str) -> Option<String> {
        match self.api.stack_yaml(stack).await {
            Ok(response) if response.success => match response.yaml {
                Some(yaml) => {
                    *self.editing_stack.lock().unwrap() = Some(stack.to_string());
                    Some(yaml)
                }
                None => {
                    self.console
                        .warning(format!(
                            "Failed to load YAML for \"{}\": empty response",
                            stack
                        ))
                        .await;
                    None
                }
            },
            Ok(response) => {
                self.console
                    .warning(format!(
                        "Failed to load YAML for \"{}\": {}",
                        stack,
                        failure_reason(&response.error)
                    ))
                    .await;
                None
            }
            Err(err) => {
                self.console
                    .error(format!("Failed to load YAML for \"{}\": {}", stack, err))
                    .await;
                None
            }
        }
    }

    pub fn editing_stack(&self) -> Option<String> {
        self.editing_stack.lock().unwrap().clone()
    }

    pub fn close_yaml_editor(&self) {
        *self.editing_stack.lock().unwrap() = None;
    }

    /// Save the edited YAML and redeploy the stack under edit. The
    /// editor stays open on failure so nothing typed is lost.
    pub async fn save_and_deploy_yaml(&self, yaml: &str) {
        let stack = self.editing_stack.lock().unwrap().clone();
        let Some(stack) = stack else {
            self.console.error("No stack selected for editing").await;
            return;
        };

        let Some(_busy) = self.begin(ActionKind::UpdateStack).await else {
            return;
        };
        let action_id = Uuid::new_v4();
        info!(action_id = %action_id, stack = %stack, "Stack update requested");
        self.console
            .info(format!("Saving and redeploying stack \"{}\"...", stack))
            .await;

        match self.api.update_stack(&stack, yaml).await {
            Ok(response) if response.success => {
                self.console
                    .success(format!("Stack \"{}\" updated and redeployed", stack))
                    .await;
                if let Some(output) = response.output {
                    self.console.info(output).await;
                }
                self.close_yaml_editor();
                self.reconverge().await;
            }
            Ok(response) => {
                let reason = failure_reason(&response.error);
                warn!(action_id = %action_id, stack = %stack, "Stack update rejected: {}", reason);
                self.console
                    .warning(format!("Failed to update stack \"{}\": {}", stack, reason))
                    .await;
            }
            Err(err) => {
                error!(action_id = %action_id, stack = %stack, "Stack update failed: {}", err);
                self.console
                    .error(format!("Failed to reach the backend: {}", err))
                    .await;
            }
        }
    }

    // ----- lab lifecycle -----

    pub async fn start_lab(&self) {
        let Some(_busy) = self.begin(ActionKind::StartLab).await else {
            return;
        };
        self.console
            .info("Starting the full lab... this can take a few minutes")
            .await;

        match self.api.lab_start().await {
            Ok(response) if response.success => {
                self.console.success("Lab started").await;
                if let Some(output) = response.output {
                    self.console.info(output).await;
                }
                self.reconverge().await;
            }
            Ok(response) => {
                let reason = failure_reason(&response.error);
                warn!("Lab startup rejected: {}", reason);
                self.console
                    .warning(format!("Failed to start the lab: {}", reason))
                    .await;
            }
            Err(err) => {
                error!("Lab startup failed: {}", err);
                self.console
                    .error(format!("Failed to reach the backend: {}", err))
                    .await;
            }
        }
    }

    pub async fn destroy_lab(&self) {
        let Some(_busy) = self.begin(ActionKind::DestroyLab).await else {
            return;
        };
        self.console
            .warning("Destroying the lab... this stops everything")
            .await;

        match self.api.lab_destroy().await {
            Ok(response) if response.success => {
                self.console.success("Lab destroyed").await;
                if let Some(output) = response.output {
                    self.console.info(output).await;
                }
                self.reconverge().await;
            }
            Ok(response) => {
                let reason = failure_reason(&response.error);
                warn!("Lab teardown rejected: {}", reason);
                self.console
                    .warning(format!("Failed to destroy the lab: {}", reason))
                    .await;
            }
            Err(err) => {
                error!("Lab teardown failed: {}", err);
                self.console
                    .error(format!("Failed to reach the backend: {}", err))
                    .await;
            }
        }
    }

    // ----- security screen -----

    /// Screen entry: immediate refresh of both panels plus history,
    /// then the 30-second poller. Re-entry replaces the task, so
    /// repeated entries never stack intervals.
    pub async fn enter_security_screen(self: &Arc<Self>) {
        self.refresh_sonarqube().await;
        self.refresh_trivy().await;
        self.load_scan_history().await;

        let controller = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut tick = interval(controller.config.security_poll_interval);
            tick.tick().await;
            loop {
                tick.tick().await;
                controller.refresh_sonarqube().await;
                controller.refresh_trivy().await;
            }
        });

        let mut slot = self.security_task.lock().unwrap();
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    pub fn exit_security_screen(&self) {
        let handle = self.security_task.lock().unwrap().take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    pub fn security_poll_active(&self) -> bool {
        self.security_task
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub async fn refresh_sonarqube(&self) {
        match self.api.sonarqube().await {
            Ok(report) => {
                self.view.write().await.sonarqube = security::sonar_panel(&report);
            }
            Err(err) => {
                warn!("SonarQube refresh failed: {}", err);
                self.view.write().await.sonarqube =
                    SecurityPanel::unreachable(format!("Connection failed: {}", err));
            }
        }
    }

    pub async fn refresh_trivy(&self) {
        match self.api.trivy().await {
            Ok(report) => {
                self.view.write().await.trivy = security::trivy_summary(&report);
            }
            Err(err) => {
                warn!("Trivy refresh failed: {}", err);
                self.view.write().await.trivy = TrivyView::Offline {
                    message: format!("Connection failed: {}", err),
                };
            }
        }
    }

    pub async fn load_scan_history(&self) {
        match self.api.scan_history().await {
            Ok(response) if response.success && !response.scans.is_empty() => {
                let entries = response
                    .scans
                    .iter()
                    .map(|scan| HistoryRow {
                        source: if scan.kind == "sonar" {
                            "SonarQube".to_string()
                        } else {
                            "Trivy".to_string()
                        },
                        timestamp: scan.timestamp,
                        summary: scan
                            .summary
                            .clone()
                            .unwrap_or_else(|| "Scan completed".to_string()),
                    })
                    .collect();
                self.view.write().await.history = HistoryView::Entries(entries);
            }
            Ok(_) => {
                self.view.write().await.history = HistoryView::Empty;
            }
            Err(err) => {
                warn!("Scan history load failed: {}", err);
                self.view.write().await.history = HistoryView::Unavailable;
            }
        }
    }

    pub async fn start_trivy_scan(&self) {
        self.console.info("Starting Trivy scan...").await;

        match self.api.trivy_scan().await {
            Ok(response) if response.success => {
                self.console.success("Scan started").await;
                self.refresh_trivy().await;
            }
            Ok(response) => {
                self.console
                    .warning(format!(
                        "Failed to start scan: {}",
                        failure_reason(&response.error)
                    ))
                    .await;
            }
            Err(err) => {
                self.console
                    .error(format!("Failed to start scan: {}", err))
                    .await;
            }
        }
    }

    /// Scan a named image. The name is validated client-side first;
    /// the panel shows the in-flight state until the result replaces
    /// it.
    pub async fn scan_image(&self, image: &str) {
        let image = match security::validate_image_name(image) {
            Ok(image) => image,
            Err(reason) => {
                self.console.error(reason).await;
                return;
            }
        };

        self.view.write().await.trivy = TrivyView::Scanning {
            image: image.clone(),
        };
        self.console
            .info(format!("Starting scan of image: {}", image))
            .await;

        match self.api.scan_image(&image).await {
            Ok(response) if response.success => {
                let results = response.results.unwrap_or_default();
                self.console
                    .success(format!("Scan finished for {}", image))
                    .await;
                self.view.write().await.trivy =
                    TrivyView::ScanResult(security::image_scan_view(&image, &results));
            }
            Ok(response) => {
                let reason = failure_reason(&response.error);
                self.console
                    .warning(format!("Scan failed: {}", reason))
                    .await;
                self.view.write().await.trivy = TrivyView::Offline { message: reason };
            }
            Err(err) => {
                self.console
                    .error(format!("Failed to scan image: {}", err))
                    .await;
                self.view.write().await.trivy = TrivyView::Offline {
                    message: err.to_string(),
                };
            }
        }
    }

    /// Preset shortcut buttons funnel into the same scan path.
    pub async fn quick_scan(&self, image: &str) {
        self.scan_image(image).await;
    }

    pub async fn clear_trivy_results(&self) {
        self.view.write().await.trivy = TrivyView::Waiting;
        self.console.info("Trivy results cleared").await;
    }

    // ----- CI/CD screen -----

    pub async fn enter_cicd_screen(&self) {
        self.refresh_cicd().await;
    }

    /// Hardcoded snapshot until the backend proxies a real Jenkins.
    pub async fn refresh_cicd(&self) {
        self.view.write().await.cicd = cicd::panel_snapshot();
    }

    pub async fn trigger_build(&self) {
        self.console.info("Starting a new build...").await;
        self.console.success("Build started").await;
        self.refresh_cicd().await;
    }

    pub async fn create_pipeline(&self, spec: &PipelineSpec) {
        if let Err(reason) = spec.validate() {
            self.console
                .error(format!("Cannot create pipeline: {}", reason))
                .await;
            return;
        }

        self.console
            .info(format!("Creating pipeline \"{}\"...", spec.name))
            .await;
        self.console
            .success(format!("Pipeline \"{}\" created", spec.name))
            .await;
        self.refresh_cicd().await;
    }

    // ----- console screen / terminal -----

    /// Entering the console screen always starts from a disconnected
    /// terminal.
    pub fn enter_console_screen(&self) {
        self.close_terminal();
    }

    pub async fn connect_server(&self, name: &str, connection: ConnectionType) {
        *self.terminal.lock().unwrap() = Some(TerminalSession::connect(name, connection));
        self.console
            .success(format!("Connected to {} via {}", name, connection))
            .await;
    }

    pub async fn connect_custom_server(
        &self,
        user: &str,
        host: &str,
        port: u16,
        connection: ConnectionType,
    ) {
        let session = TerminalSession::connect_custom(user, host, port, connection);
        let name = session.server().to_string();
        *self.terminal.lock().unwrap() = Some(session);
        self.console
            .success(format!("Connected to {} via {}", name, connection))
            .await;
    }

    /// Feed one input line to the connected terminal; ignored when
    /// disconnected.
    pub fn terminal_input(&self, command: &str) {
        if let Some(session) = self.terminal.lock().unwrap().as_mut() {
            session.execute(command);
        }
    }

    pub fn terminal(&self) -> Option<TerminalSession> {
        self.terminal.lock().unwrap().clone()
    }

    pub fn close_terminal(&self) {
        *self.terminal.lock().unwrap() = None;
    }

    // ----- sidebar -----

    pub async fn load_sidebar_state(&self) {
        let prefs = self.prefs.load();
        let collapsed = sidebar_collapsed_for(self.config.viewport_width, &prefs);
        self.view.write().await.sidebar.collapsed = collapsed;
    }

    pub async fn toggle_sidebar(&self) {
        let collapsed = {
            let mut view = self.view.write().await;
            view.sidebar.collapsed = !view.sidebar.collapsed;
            view.sidebar.collapsed
        };

        if let Err(err) = self.prefs.save(&UiPrefs {
            sidebar_collapsed: collapsed,
        }) {
            warn!("Failed to persist sidebar preference: {}", err);
        }
    }

    // ----- busy tracking -----

    async fn begin(&self, kind: ActionKind) -> Option<BusyGuard> {
        let acquired = self.busy.lock().unwrap().insert(kind);
        if acquired {
            Some(BusyGuard {
                kind,
                flags: Arc::clone(&self.busy),
            })
        } else {
            self.console
                .warning(format!("{} is already in progress", kind.label()))
                .await;
            None
        }
    }
}

fn failure_reason(error: &Option<String>) -> String {
    error
        .clone()
        .unwrap_or_else(|| "backend reported failure".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ConsoleLevel;
    use crate::view::{PanelStatus, Tone};
    use serde_json::json;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(server: &MockServer, prefs_path: Option<PathBuf>) -> Config {
        Config {
            backend_url: server.uri(),
            status_poll_interval: Duration::from_millis(50),
            security_poll_interval: Duration::from_millis(50),
            http_timeout: Duration::from_secs(2),
            prefs_path,
            viewport_width: 1280,
        }
    }

    fn controller_for(server: &MockServer, prefs_path: Option<PathBuf>) -> Arc<DashboardController> {
        Arc::new(DashboardController::new(test_config(server, prefs_path)).unwrap())
    }

    async fn requests_to(server: &MockServer, endpoint: &str) -> usize {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == endpoint)
            .count()
    }

    async fn mount_lists(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/stacks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/status"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"running_stacks": []})),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_empty_stack_list_renders_empty_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/stacks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let controller = controller_for(&server, None);
        controller.load_available_stacks().await;

        let view = controller.view().await;
        assert_eq!(view.available, StackListView::Empty);
        assert_eq!(view.available.card_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_stack_load_keeps_prior_render() {
        let server = MockServer::start().await;
        let controller = controller_for(&server, None);

        {
            let _guard = Mock::given(method("GET"))
                .and(path("/api/stacks"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                    {"name": "web", "services": ["nginx"]}
                ])))
                .mount_as_scoped(&server)
                .await;
            controller.load_available_stacks().await;
        }
        assert_eq!(controller.view().await.available.card_count(), 1);

        // The mock is gone; the fetch now fails to decode
        controller.load_available_stacks().await;

        let view = controller.view().await;
        assert_eq!(view.available.card_count(), 1);
        let entries = controller.console().entries().await;
        assert_eq!(entries.last().unwrap().level, ConsoleLevel::Error);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_not_zero_stacks() {
        let server = MockServer::start().await;
        let controller = controller_for(&server, None);

        controller.refresh_status().await;
        assert_eq!(controller.view().await.active, ActiveStacksView::Unreachable);
    }

    #[tokio::test]
    async fn test_deploy_refetches_each_list_exactly_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/deploy"))
            .and(body_json(json!({"stack": "web"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "output": "deployed"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/stacks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/status"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"running_stacks": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let controller = controller_for(&server, None);
        controller.deploy_stack("web").await;

        let entries = controller.console().entries().await;
        assert!(
            entries
                .iter()
                .any(|entry| entry.level == ConsoleLevel::Success)
        );
        // The .expect(1) mocks verify the exactly-once re-fetches on drop
    }

    #[tokio::test]
    async fn test_application_failure_leaves_view_and_warns() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/deploy"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": false, "error": "compose file invalid"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/stacks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let controller = controller_for(&server, None);
        controller.deploy_stack("web").await;

        let entries = controller.console().entries().await;
        let last = entries.last().unwrap();
        assert_eq!(last.level, ConsoleLevel::Warning);
        assert!(last.message.contains("compose file invalid"));
        // View untouched: still the initial loading placeholder
        assert_eq!(controller.view().await.available, StackListView::Loading);
        assert!(!controller.is_busy(ActionKind::Deploy));
    }

    #[tokio::test]
    async fn test_transport_failure_logs_error_and_releases_busy() {
        let server = MockServer::start().await;
        let controller = controller_for(&server, None);

        // Nothing mounted: the POST decodes an empty 404 body and fails
        controller.deploy_stack("web").await;

        let entries = controller.console().entries().await;
        assert_eq!(entries.last().unwrap().level, ConsoleLevel::Error);
        assert!(!controller.is_busy(ActionKind::Deploy));
    }

    #[tokio::test]
    async fn test_same_action_is_rejected_while_in_flight() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/deploy"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true}))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;
        mount_lists(&server).await;

        let controller = controller_for(&server, None);
        let second = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                controller.deploy_stack("web").await;
            })
        };
        controller.deploy_stack("web").await;
        second.await.unwrap();

        let entries = controller.console().entries().await;
        assert!(
            entries
                .iter()
                .any(|entry| entry.message.contains("already in progress"))
        );
    }

    #[tokio::test]
    async fn test_unrelated_actions_run_concurrently() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/deploy"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true}))
                    .set_delay(Duration::from_millis(150)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/remove"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;
        mount_lists(&server).await;

        let controller = controller_for(&server, None);
        tokio::join!(controller.deploy_stack("web"), controller.remove_stack("db"));

        let entries = controller.console().entries().await;
        assert!(
            !entries
                .iter()
                .any(|entry| entry.message.contains("already in progress"))
        );
    }

    #[tokio::test]
    async fn test_poller_fires_and_is_cleared_once() {
        let server = MockServer::start().await;
        mount_lists(&server).await;

        let controller = controller_for(&server, None);
        controller.start().await;
        assert!(controller.polling_active());

        tokio::time::sleep(Duration::from_millis(180)).await;
        let seen = requests_to(&server, "/api/status").await;
        // Startup refreshed twice (status + metrics); ticks add more
        assert!(seen >= 4, "expected recurring polls, saw {}", seen);

        controller.shutdown().await;
        assert!(!controller.polling_active());

        // Let any in-flight request land before freezing the count
        tokio::time::sleep(Duration::from_millis(60)).await;
        let frozen = requests_to(&server, "/api/status").await;
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(requests_to(&server, "/api/status").await, frozen);

        // Second shutdown is a no-op
        controller.shutdown().await;
    }

    async fn mount_security(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/security/sonarqube"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/security/trivy"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/security/history"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"success": true, "scans": []})),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_security_screen_has_single_interval() {
        let server = MockServer::start().await;
        mount_security(&server).await;

        let controller = controller_for(&server, None);
        controller.enter_security_screen().await;
        controller.enter_security_screen().await;
        assert!(controller.security_poll_active());

        // One exit stops everything: no task survives the double entry
        controller.exit_security_screen();
        assert!(!controller.security_poll_active());

        // Let any in-flight request land before freezing the count
        tokio::time::sleep(Duration::from_millis(60)).await;
        let frozen = requests_to(&server, "/api/security/sonarqube").await;
        tokio::time::sleep(Duration::from_millis(180)).await;
        assert_eq!(
            requests_to(&server, "/api/security/sonarqube").await,
            frozen
        );
    }

    #[tokio::test]
    async fn test_switch_screen_runs_enter_and_exit_hooks() {
        let server = MockServer::start().await;
        mount_security(&server).await;

        let controller = controller_for(&server, None);
        assert_eq!(controller.current_screen(), Screen::Dashboard);

        controller.switch_screen(Screen::Security).await;
        assert!(controller.security_poll_active());

        // Re-entering keeps a single poller
        controller.switch_screen(Screen::Security).await;
        assert!(controller.security_poll_active());

        controller.switch_screen(Screen::Stacks).await;
        assert_eq!(controller.current_screen(), Screen::Stacks);
        assert!(!controller.security_poll_active());
    }

    #[tokio::test]
    async fn test_sonar_panel_renders_report() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/security/sonarqube"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "bugs": 2,
                "vulnerabilities": 0,
                "coverage": 87.5,
                "quality_gate": "OK"
            })))
            .mount(&server)
            .await;

        let controller = controller_for(&server, None);
        controller.refresh_sonarqube().await;

        let panel = controller.view().await.sonarqube;
        assert_eq!(panel.status, PanelStatus::Online);
        assert_eq!(panel.row("Bugs").unwrap().value, "2");
        let vulns = panel.row("Vulnerabilities").unwrap();
        assert_eq!(vulns.value, "0");
        assert_eq!(vulns.tone, Tone::Success);
        assert_eq!(panel.row("Coverage").unwrap().value, "87.5%");
        let gate = panel.row("Quality gate").unwrap();
        assert_eq!(gate.value, "OK");
        assert_eq!(gate.tone, Tone::Success);
    }

    #[tokio::test]
    async fn test_confirmation_gates_the_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/remove"))
            .and(body_json(json!({"stack": "web"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;
        mount_lists(&server).await;

        let controller = controller_for(&server, None);

        let prompt = controller.request_remove("web");
        assert!(prompt.message.contains("web"));
        assert!(controller.pending_action().is_some());

        // Cancelling issues nothing
        controller.cancel_pending();
        assert!(controller.pending_action().is_none());
        controller.confirm_pending().await;
        assert_eq!(requests_to(&server, "/api/remove").await, 0);

        // Confirming runs the staged action once
        controller.request_remove("web");
        controller.confirm_pending().await;
        assert!(controller.pending_action().is_none());
    }

    #[tokio::test]
    async fn test_yaml_editing_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/stack-yaml/web"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "yaml": "services:\n  nginx:\n    image: nginx\n"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/update-stack"))
            .and(body_json(json!({
                "stack": "web",
                "yaml": "services:\n  nginx:\n    image: nginx:1.27\n"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;
        mount_lists(&server).await;

        let controller = controller_for(&server, None);

        // Saving with no editing session only logs
        controller.save_and_deploy_yaml("whatever").await;
        assert_eq!(
            controller.console().entries().await.last().unwrap().level,
            ConsoleLevel::Error
        );

        let yaml = controller.open_yaml_editor("web").await.unwrap();
        assert!(yaml.contains("nginx"));
        assert_eq!(controller.editing_stack().as_deref(), Some("web"));

        controller
            .save_and_deploy_yaml("services:\n  nginx:\n    image: nginx:1.27\n")
            .await;
        assert!(controller.editing_stack().is_none());
    }

    #[tokio::test]
    async fn test_sidebar_toggle_survives_reload() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let prefs_path = dir.path().join("prefs.json");

        let controller = controller_for(&server, Some(prefs_path.clone()));
        controller.load_sidebar_state().await;
        assert!(!controller.view().await.sidebar.collapsed);

        controller.toggle_sidebar().await;
        assert!(controller.view().await.sidebar.collapsed);

        // Simulated reload: a fresh controller over the same store
        let reloaded = controller_for(&server, Some(prefs_path.clone()));
        reloaded.load_sidebar_state().await;
        assert!(reloaded.view().await.sidebar.collapsed);

        // The mobile branch wins even over a stored expanded flag
        let mobile_dir = TempDir::new().unwrap();
        let mobile_prefs = mobile_dir.path().join("prefs.json");
        crate::prefs::PrefsStore::new(mobile_prefs.clone())
            .save(&UiPrefs {
                sidebar_collapsed: false,
            })
            .unwrap();

        let mut config = test_config(&server, Some(mobile_prefs));
        config.viewport_width = 800;
        let mobile = Arc::new(DashboardController::new(config).unwrap());
        mobile.load_sidebar_state().await;
        assert!(mobile.view().await.sidebar.collapsed);
    }

    #[tokio::test]
    async fn test_scan_image_rejects_blank_name() {
        let server = MockServer::start().await;
        let controller = controller_for(&server, None);

        controller.scan_image("   ").await;

        assert_eq!(requests_to(&server, "/api/security/trivy/scan-image").await, 0);
        assert_eq!(
            controller.console().entries().await.last().unwrap().level,
            ConsoleLevel::Error
        );
        assert_eq!(controller.view().await.trivy, TrivyView::Waiting);
    }

    #[tokio::test]
    async fn test_image_scan_replaces_panel() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/security/trivy/scan-image"))
            .and(body_json(json!({"image": "nginx:latest"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "results": {"critical": 0, "high": 1, "medium": 0, "low": 2, "vulnerabilities": []}
            })))
            .mount(&server)
            .await;

        let controller = controller_for(&server, None);
        controller.scan_image("  nginx:latest ").await;

        match controller.view().await.trivy {
            TrivyView::ScanResult(scan) => {
                assert_eq!(scan.image, "nginx:latest");
                assert_eq!(scan.verdict, "Attention");
            }
            other => panic!("expected scan result, got {:?}", other),
        }

        controller.clear_trivy_results().await;
        assert_eq!(controller.view().await.trivy, TrivyView::Waiting);
    }

    #[tokio::test]
    async fn test_terminal_lifecycle_on_console_screen() {
        let server = MockServer::start().await;
        let controller = controller_for(&server, None);

        controller.connect_server("lab-swarm1", ConnectionType::Ssh).await;
        controller.terminal_input("pwd");
        let session = controller.terminal().unwrap();
        assert_eq!(session.history(), &["pwd"]);

        // Entering the console screen resets to disconnected
        controller.enter_console_screen();
        assert!(controller.terminal().is_none());
    }

    #[tokio::test]
    async fn test_cicd_screen_uses_fixture_data() {
        let server = MockServer::start().await;
        let controller = controller_for(&server, None);

        controller.enter_cicd_screen().await;

        let view = controller.view().await.cicd;
        assert_eq!(view.jobs.len(), 3);
        assert_eq!(view.metrics.successful_builds, 2);
        // No request ever leaves for CI/CD data
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_create_pipeline_validation() {
        let server = MockServer::start().await;
        let controller = controller_for(&server, None);

        controller.create_pipeline(&PipelineSpec::default()).await;
        assert_eq!(
            controller.console().entries().await.last().unwrap().level,
            ConsoleLevel::Error
        );

        let spec = PipelineSpec {
            name: "deploy-shop".to_string(),
            repository: "https://git.lab/shop.git".to_string(),
            branch: "main".to_string(),
            build_script: String::new(),
        };
        controller.create_pipeline(&spec).await;
        assert_eq!(
            controller.console().entries().await.last().unwrap().level,
            ConsoleLevel::Success
        );
    }
}
