use serde::{Deserialize, Serialize};

use crate::env::registry::Registry;
use crate::env::vec_env::derive_seed;
use crate::env::{Env, EnvError, KwArgs, NoTimeout};

/// Everything needed to build a vectorized environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructionRequest {
    env_id: String,
    num_envs: usize,
    seed: u64,
    no_timeout: bool,
    env_kwargs: KwArgs,
}

impl ConstructionRequest {
    /// Seed 1, step-count truncation suppressed, no constructor options.
    pub fn new(env_id: impl Into<String>, num_envs: usize) -> Self {
        Self {
            env_id: env_id.into(),
            num_envs,
            seed: 1,
            no_timeout: true,
            env_kwargs: KwArgs::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_no_timeout(mut self, no_timeout: bool) -> Self {
        self.no_timeout = no_timeout;
        self
    }

    pub fn with_env_kwargs(mut self, env_kwargs: KwArgs) -> Self {
        self.env_kwargs = env_kwargs;
        self
    }

    pub fn env_id(&self) -> &str {
        &self.env_id
    }

    pub fn num_envs(&self) -> usize {
        self.num_envs
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn no_timeout(&self) -> bool {
        self.no_timeout
    }

    pub fn env_kwargs(&self) -> &KwArgs {
        &self.env_kwargs
    }

    /// One descriptor per instance, in rank order.
    pub fn descriptors(&self) -> Vec<EnvDescriptor> {
        (0..self.num_envs)
            .map(|rank| EnvDescriptor {
                env_id: self.env_id.clone(),
                rank,
                base_seed: self.seed,
                no_timeout: self.no_timeout,
                env_kwargs: self.env_kwargs.clone(),
            })
            .collect()
    }
}

/// Recipe for one environment instance.
///
/// Descriptors are plain data so they can be handed to a freshly spawned
/// worker process, which rebuilds the environment from its own registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvDescriptor {
    pub env_id: String,
    pub rank: usize,
    pub base_seed: u64,
    pub no_timeout: bool,
    #[serde(default)]
    pub env_kwargs: KwArgs,
}

impl EnvDescriptor {
    /// `base_seed + rank`, wrapping at `u64::MAX`.
    pub fn seed(&self) -> u64 {
        derive_seed(self.base_seed, self.rank)
    }

    /// Makes the environment, strips its step limit if requested, and seeds it.
    pub fn build(&self, registry: &Registry) -> Result<Box<dyn Env>, EnvError> {
        let mut env = registry.make(&self.env_id, self.env_kwargs.clone())?;
        if self.no_timeout {
            env = Box::new(NoTimeout::new(env));
        }
        env.seed(self.seed());
        Ok(env)
    }
}
