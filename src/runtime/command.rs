use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Overrides the worker program used for process-isolated environments.
pub const WORKER_ENV_VAR: &str = "ENVKIT_WORKER";

/// File name of the bundled worker binary, without platform suffix.
pub const WORKER_BIN: &str = "envkit-worker";

/// The program launched once per process-isolated environment.
///
/// Workers are always started as fresh processes. A custom program serves
/// its own registry by calling [`crate::runtime::serve`] (or
/// [`crate::runtime::run_worker`] after registering its environments).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// `$ENVKIT_WORKER`, then `envkit-worker` next to the running executable
    /// (or one directory up, for test binaries under `deps/`), then
    /// `envkit-worker` from `PATH`.
    pub fn resolve() -> Self {
        if let Some(program) = std::env::var_os(WORKER_ENV_VAR) {
            return Self::new(program);
        }
        if let Ok(exe) = std::env::current_exe() {
            if let Some(found) = find_sibling_worker(&exe) {
                return Self::new(found);
            }
        }
        Self::new(WORKER_BIN)
    }

    pub(crate) fn command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        command
    }
}

impl Default for WorkerCommand {
    fn default() -> Self {
        Self::resolve()
    }
}

fn find_sibling_worker(exe: &Path) -> Option<PathBuf> {
    let file_name = format!("{WORKER_BIN}{}", std::env::consts::EXE_SUFFIX);
    exe.ancestors()
        .skip(1)
        .take(2)
        .map(|dir| dir.join(&file_name))
        .find(|candidate| candidate.is_file())
}
