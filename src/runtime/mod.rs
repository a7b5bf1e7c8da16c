//! Process isolation for vectorized environments.
//!
//! The parent talks to each worker over its stdin/stdout with
//! newline-delimited JSON (see [`protocol`]).

pub mod codec;
mod command;
pub mod protocol;
mod subproc;
mod worker;

pub use command::{WORKER_BIN, WORKER_ENV_VAR, WorkerCommand};
pub use subproc::SubprocVecEnv;
pub use worker::{run_worker, serve};
