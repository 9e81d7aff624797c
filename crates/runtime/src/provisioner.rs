use std::path::PathBuf;
use tokio::process::Command;
use tracing::info;
use replygen_common::{Error, Result};

/// Ensures the configured model artifact exists on the inference server
/// before it is used.
pub struct ModelProvisioner {
    executable: PathBuf,
}

impl ModelProvisioner {
    pub fn new(executable: PathBuf) -> Self {
        Self { executable }
    }

    /// Invoke the server's pull operation for `model` and block until it
    /// completes. Must only be called once the server is reachable.
    pub async fn ensure_model(&self, model: &str) -> Result<()> {
        info!("Pulling model: {}", model);

        let output = Command::new(&self.executable)
            .arg("pull")
            .arg(model)
            .output()
            .await
            .map_err(|e| Error::Provision {
                model: model.to_string(),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Provision {
                model: model.to_string(),
                detail: format!(
                    "pull exited with {}: {}",
                    output.status,
                    stderr.trim().lines().last().unwrap_or("")
                ),
            });
        }

        info!("Model '{}' pulled successfully", model);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pull_success_on_zero_exit() {
        // `true` ignores its arguments and exits 0
        let provisioner = ModelProvisioner::new(PathBuf::from("/bin/true"));
        assert!(provisioner.ensure_model("mistral").await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pull_failure_on_nonzero_exit() {
        let provisioner = ModelProvisioner::new(PathBuf::from("/bin/false"));
        let result = provisioner.ensure_model("mistral").await;

        match result {
            Err(Error::Provision { model, .. }) => assert_eq!(model, "mistral"),
            other => panic!("expected Provision error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pull_failure_on_missing_executable() {
        let provisioner = ModelProvisioner::new(PathBuf::from("/nonexistent/ollama"));
        let result = provisioner.ensure_model("mistral").await;
        assert!(matches!(result, Err(Error::Provision { .. })));
    }
}
