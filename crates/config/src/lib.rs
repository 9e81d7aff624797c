mod config_loader;
mod model_name;


pub use config_loader::{AppConfig, ConfigLoader, ServerConfig, UpstreamConfig};
pub use model_name::{resolve_model_name, DEFAULT_MODEL, MODEL_ENV_VAR, MODEL_FILE};
