use replygen_common::Result;
use std::path::Path;
use tracing::info;

/// Model used when neither the file nor the environment names one
pub const DEFAULT_MODEL: &str = "mistral";

/// Local file consulted first for the model name
pub const MODEL_FILE: &str = "model.txt";

/// Environment variable consulted when the file is absent or empty
pub const MODEL_ENV_VAR: &str = "MODEL_NAME";

/// Resolve the model name for this process.
///
/// Resolution order: `model.txt` in the working directory, then the
/// `MODEL_NAME` environment variable, then the built-in default. Resolved
/// once at startup; immutable afterwards.
pub fn resolve_model_name() -> Result<String> {
    let name = resolve_from(
        Path::new(MODEL_FILE),
        std::env::var(MODEL_ENV_VAR).ok(),
    );
    info!("Resolved model name: {}", name);
    Ok(name)
}

/// Resolution with explicit inputs, so the priority order is testable
/// without touching process-wide environment state.
fn resolve_from(file: &Path, env_value: Option<String>) -> String {
    if let Ok(content) = std::fs::read_to_string(file) {
        let name = content.trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }

    if let Some(name) = env_value {
        let name = name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }

    DEFAULT_MODEL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_wins_over_env_and_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MODEL_FILE);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "llama3").unwrap();

        let name = resolve_from(&path, Some("gemma".to_string()));
        assert_eq!(name, "llama3");
    }

    #[test]
    fn env_wins_when_file_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MODEL_FILE);

        let name = resolve_from(&path, Some("gemma".to_string()));
        assert_eq!(name, "gemma");
    }

    #[test]
    fn default_when_neither_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MODEL_FILE);

        let name = resolve_from(&path, None);
        assert_eq!(name, DEFAULT_MODEL);
    }

    #[test]
    fn blank_file_falls_through_to_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MODEL_FILE);
        std::fs::write(&path, "  \n").unwrap();

        let name = resolve_from(&path, Some("gemma".to_string()));
        assert_eq!(name, "gemma");
    }

    #[test]
    fn file_contents_are_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MODEL_FILE);
        std::fs::write(&path, "  phi3  \n").unwrap();

        let name = resolve_from(&path, None);
        assert_eq!(name, "phi3");
    }
}
