use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("environment `{0}` is not registered")]
    EnvironmentNotFound(String),

    #[error("invalid construction arguments: {0}")]
    InvalidConstructionArgs(String),

    #[error("cannot get rendered images")]
    RenderingUnsupported,

    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("expected {expected} actions, got {got}")]
    ActionCountMismatch { expected: usize, got: usize },

    #[error("worker {rank} failed: {message}")]
    Worker { rank: usize, message: String },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("vectorized environment is closed")]
    Closed,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
