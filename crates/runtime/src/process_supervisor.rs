use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::timeout;
use tracing::{debug, warn, error, info};
use replygen_common::{Error, Result};

/// Where Ollama installs when it is not on PATH
const WELL_KNOWN_EXECUTABLE: &str = "/usr/local/bin/ollama";

const EXECUTABLE_NAME: &str = "ollama";

/// Bound on the post-kill wait, separate from the caller's grace period
const KILL_WAIT: Duration = Duration::from_secs(2);

/// Resolve the inference server executable: configured override first, then
/// a PATH search, then the well-known install location.
pub fn resolve_executable(override_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(Error::Launch(format!(
            "configured executable not found: {}",
            path.display()
        )));
    }

    if let Some(paths) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&paths) {
            let candidate = dir.join(EXECUTABLE_NAME);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
    }

    Ok(PathBuf::from(WELL_KNOWN_EXECUTABLE))
}

/// Build the serve command for the resolved executable
pub fn serve_command(executable: &Path) -> Command {
    let mut command = Command::new(executable);
    command.arg("serve");
    command
}

/// Liveness of the supervised child process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    NotStarted,
    Running,
    Stopping,
    Stopped,
}

/// Owns the inference server's OS process: spawn, liveness, terminate with
/// escalation. Exactly one child is live between a successful `spawn` and a
/// completed `terminate`.
pub struct ProcessSupervisor {
    child: Option<Child>,
    state: ProcessState,
    name: String,
}

impl ProcessSupervisor {
    pub fn new(name: String) -> Self {
        Self {
            child: None,
            state: ProcessState::NotStarted,
            name,
        }
    }

    /// Spawn a new process with proper stdout/stderr handling
    pub async fn spawn(&mut self, mut command: Command) -> Result<()> {
        // Ensure old process is cleaned up first
        self.cleanup().await?;

        command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|e| Error::Launch(format!("failed to spawn {}: {}", self.name, e)))?;

        // Drain stdout and stderr so the child never blocks on a full pipe
        if let Some(stdout) = child.stdout.take() {
            let name = self.name.clone();
            tokio::spawn(async move {
                let reader = BufReader::new(stdout);
                let mut lines = reader.lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("{} stdout: {}", name, line);
                }
            });
        }

        if let Some(stderr) = child.stderr.take() {
            let name = self.name.clone();
            tokio::spawn(async move {
                let reader = BufReader::new(stderr);
                let mut lines = reader.lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("{} stderr: {}", name, line);
                }
            });
        }

        info!("{} started with PID {:?}", self.name, child.id());
        self.child = Some(child);
        self.state = ProcessState::Running;
        Ok(())
    }

    /// Check if process is still running
    pub fn is_running(&mut self) -> bool {
        if let Some(ref mut child) = self.child {
            match child.try_wait() {
                Ok(Some(_)) => {
                    self.child = None;
                    self.state = ProcessState::Stopped;
                    false
                }
                Ok(None) => true,
                Err(e) => {
                    warn!("Error checking {} status: {}", self.name, e);
                    false
                }
            }
        } else {
            false
        }
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Get process ID if running
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref()?.id()
    }

    /// Gracefully terminate the process, escalating to a forceful kill once
    /// the grace period runs out. Idempotent: a no-op when already stopped.
    pub async fn terminate(&mut self, grace: Duration) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            self.state = ProcessState::Stopped;
            return Ok(());
        };

        self.state = ProcessState::Stopping;
        info!("Terminating {} process", self.name);

        // First try SIGTERM for graceful shutdown
        #[cfg(unix)]
        {
            use nix::sys::signal::{self, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = child.id() {
                let _ = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM);

                match timeout(grace, child.wait()).await {
                    Ok(Ok(status)) => {
                        info!("{} exited gracefully with status: {:?}", self.name, status);
                        self.state = ProcessState::Stopped;
                        return Ok(());
                    }
                    _ => {
                        warn!("{} didn't exit within grace period, forcing kill", self.name);
                    }
                }
            }
        }

        // Forceful kill if graceful didn't work
        if let Err(e) = child.kill().await {
            warn!("Failed to kill {}: {}", self.name, e);
        }

        match timeout(KILL_WAIT, child.wait()).await {
            Ok(Ok(status)) => {
                info!("{} forcefully killed with status: {:?}", self.name, status);
            }
            Ok(Err(e)) => {
                error!("Error waiting for {} to exit: {}", self.name, e);
            }
            Err(_) => {
                error!("Timeout waiting for {} to exit after kill", self.name);
            }
        }

        self.state = ProcessState::Stopped;
        Ok(())
    }

    /// Clean up any existing process
    async fn cleanup(&mut self) -> Result<()> {
        if self.is_running() {
            self.terminate(Duration::from_secs(1)).await?;
        }
        self.child = None;
        Ok(())
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        // Last-resort kill so no exit path leaks the child
        if let Some(mut child) = self.child.take() {
            let name = self.name.clone();
            tokio::spawn(async move {
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill {} on drop: {}", name, e);
                }
                let _ = child.wait().await;
            });
        }
    }
}
