mod coordinator;
mod generation;
mod process_supervisor;
mod prompt;
mod provisioner;


pub use coordinator::{LifecycleCoordinator, LifecycleState};
pub use generation::{decode_line, GenerationProxy, ResponseChunk};
pub use process_supervisor::{resolve_executable, serve_command, ProcessState, ProcessSupervisor};
pub use prompt::{PromptComposer, PromptVars, DEFAULT_TEMPLATE};
pub use provisioner::ModelProvisioner;
