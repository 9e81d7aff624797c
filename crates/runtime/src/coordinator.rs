use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::sleep;
use tracing::{error, info};
use replygen_common::{Error, GenerateRequest, Result};
use replygen_config::AppConfig;

use crate::generation::GenerationProxy;
use crate::process_supervisor::{resolve_executable, serve_command, ProcessSupervisor};
use crate::prompt::{PromptComposer, PromptVars, DEFAULT_TEMPLATE};
use crate::provisioner::ModelProvisioner;

/// Coordinator lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Starting,
    Ready,
    ShuttingDown,
    Stopped,
}

/// Sequences the inference server's lifecycle and exposes the generation
/// path to the HTTP layer. The supervisor handle is written exactly twice
/// over the process lifetime (start, stop); request handling only reads the
/// immutable model name, server address, and template.
pub struct LifecycleCoordinator {
    supervisor: Arc<Mutex<ProcessSupervisor>>,
    provisioner: ModelProvisioner,
    proxy: GenerationProxy,
    executable: PathBuf,
    template: &'static str,
    state: Arc<RwLock<LifecycleState>>,
    probe_attempts: u32,
    probe_interval: Duration,
    grace: Duration,
}

impl LifecycleCoordinator {
    pub fn new(config: &AppConfig, model_name: String) -> Result<Self> {
        let executable = resolve_executable(config.upstream.executable.as_deref())?;
        let proxy = GenerationProxy::new(
            config.upstream.base_url.clone(),
            model_name,
            Duration::from_secs(config.upstream.request_timeout_secs),
        )?;

        Ok(Self {
            supervisor: Arc::new(Mutex::new(ProcessSupervisor::new("ollama".to_string()))),
            provisioner: ModelProvisioner::new(executable.clone()),
            proxy,
            executable,
            template: DEFAULT_TEMPLATE,
            state: Arc::new(RwLock::new(LifecycleState::Idle)),
            probe_attempts: config.upstream.startup_probe_attempts,
            probe_interval: Duration::from_millis(config.upstream.startup_probe_interval_ms),
            grace: Duration::from_secs(config.upstream.shutdown_grace_secs),
        })
    }

    /// Boot the inference server: spawn the process, wait until it accepts
    /// connections, then make sure the model is present. Any failure
    /// releases the child before the error propagates, so a partially
    /// initialized Ready state is never observable.
    pub async fn start(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            if *state != LifecycleState::Idle {
                return Err(Error::Internal("coordinator already started".into()));
            }
            *state = LifecycleState::Starting;
        }

        // Armed until boot succeeds: terminate the child and land in
        // Stopped on every failed path out of this function.
        let cleanup = scopeguard::guard(
            (self.supervisor.clone(), self.state.clone(), self.grace),
            |(supervisor, state, grace)| {
                tokio::spawn(async move {
                    let _ = supervisor.lock().await.terminate(grace).await;
                    *state.write().await = LifecycleState::Stopped;
                });
            },
        );

        info!("Starting inference server: {}", self.executable.display());
        self.supervisor
            .lock()
            .await
            .spawn(serve_command(&self.executable))
            .await?;

        self.await_reachable().await?;
        self.provisioner.ensure_model(self.proxy.model()).await?;

        scopeguard::ScopeGuard::into_inner(cleanup);
        *self.state.write().await = LifecycleState::Ready;
        info!("Ready; model '{}' available", self.proxy.model());
        Ok(())
    }

    /// Bounded readiness wait: the spawn call returns before the server
    /// accepts connections, so poll until it does or give up.
    async fn await_reachable(&self) -> Result<()> {
        for attempt in 1..=self.probe_attempts {
            sleep(self.probe_interval).await;
            if self.proxy.is_reachable().await {
                info!("Inference server reachable after {} attempt(s)", attempt);
                return Ok(());
            }
        }
        Err(Error::StartupTimeout(self.probe_attempts))
    }

    /// Generate one aggregated reply. Safe to call concurrently.
    pub async fn handle(&self, request: &GenerateRequest) -> Result<String> {
        request.validate()?;

        if *self.state.read().await != LifecycleState::Ready {
            return Err(Error::UpstreamUnavailable("service is not ready".into()));
        }

        let prompt = PromptComposer::render(
            self.template,
            &PromptVars {
                tone: &request.tone,
                action_instruction: &request.action_instruction,
                char_limit: request.char_limit,
                email: &request.email,
            },
        )
        .map_err(|e| {
            error!("Prompt template defect: {}", e);
            e
        })?;

        self.proxy.generate(&prompt).await
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    /// The resolved model name, immutable for the process lifetime
    pub fn model(&self) -> &str {
        self.proxy.model()
    }

    /// Terminate the inference server. Runs on every shutdown trigger,
    /// including failures elsewhere; idempotent once Stopped.
    pub async fn shutdown(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            if *state == LifecycleState::Stopped {
                return Ok(());
            }
            *state = LifecycleState::ShuttingDown;
        }

        info!("Shutting down inference server");
        let result = self.supervisor.lock().await.terminate(self.grace).await;
        *self.state.write().await = LifecycleState::Stopped;
        result
    }
}
