//! Builds vectorized environments from a [`ConstructionRequest`].
//!
//! A single instance runs in-process; more than one instance runs as one
//! spawned worker process each.

mod handle;
mod request;

use std::sync::Arc;

use tracing::info;

use crate::env::registry::{self, Registry};
use crate::env::{DummyVecEnv, Env, EnvError};
use crate::runtime::{SubprocVecEnv, WorkerCommand};

pub use handle::{Backend, Strategy, VecEnvHandle};
pub use request::{ConstructionRequest, EnvDescriptor};

#[derive(Debug, Clone, Default)]
pub struct FactoryConfig {
    /// Program started for every instance when more than one is requested.
    pub worker: WorkerCommand,
}

/// Chooses the execution strategy and builds the instances.
#[derive(Default)]
pub struct VecEnvFactory {
    /// `None` means the process-wide registry.
    registry: Option<Arc<Registry>>,
    config: FactoryConfig,
}

impl VecEnvFactory {
    pub fn new(config: FactoryConfig) -> Self {
        Self {
            registry: None,
            config,
        }
    }

    /// Builds in-process instances from `registry` instead of the global one.
    ///
    /// Worker processes always use the registry of the program they run.
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn build(&self, request: &ConstructionRequest) -> Result<VecEnvHandle, EnvError> {
        info!(
            env_id = request.env_id(),
            num_envs = request.num_envs(),
            "Creating {} environments.",
            request.num_envs()
        );
        if request.num_envs() == 0 {
            return Err(EnvError::InvalidConstructionArgs(
                "num_envs must be at least 1".to_string(),
            ));
        }

        let descriptors = request.descriptors();
        let backend = if descriptors.len() > 1 {
            Backend::Process(SubprocVecEnv::spawn(&descriptors, &self.config.worker)?)
        } else {
            let descriptor = &descriptors[0];
            Backend::Sequential(DummyVecEnv::new([|| self.build_local(descriptor)])?)
        };
        Ok(VecEnvHandle::new(backend, descriptors))
    }

    fn build_local(&self, descriptor: &EnvDescriptor) -> Result<Box<dyn Env>, EnvError> {
        match &self.registry {
            Some(registry) => descriptor.build(registry),
            None => {
                let registry = registry::global()
                    .read()
                    .map_err(|_| EnvError::Protocol("registry lock poisoned".to_string()))?;
                descriptor.build(&registry)
            }
        }
    }
}

/// Builds `request` with the global registry and the default worker program.
pub fn make_vec_env(request: &ConstructionRequest) -> Result<VecEnvHandle, EnvError> {
    VecEnvFactory::default().build(request)
}
