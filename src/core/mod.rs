// Public modules
pub mod artifact;
pub mod build;
pub mod clean;
pub mod context;
pub mod env;
pub mod error;
pub mod executor;
pub mod install;
pub mod pipeline;
pub mod publish;
pub mod release;
pub mod stage;
pub mod test;

// Re-export common types for convenience
pub use context::{Credentials, ExecutionContext, PipelineContext, ResolvedVersion, Trigger};
pub use error::{Error, ErrorCode, Result};
pub use stage::{Stage, StageResult, StageStatus};
