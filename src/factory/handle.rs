use std::fmt;

use crate::env::render::RenderSource;
use crate::env::{Action, DummyVecEnv, EnvError, EnvSpaces, Image, Observation, Step, VecEnv};
use crate::factory::EnvDescriptor;
use crate::runtime::SubprocVecEnv;

/// How the instances behind a [`VecEnvHandle`] are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// All instances in the caller's thread.
    Sequential,
    /// One spawned worker process per instance.
    Process,
}

pub enum Backend {
    Sequential(DummyVecEnv),
    Process(SubprocVecEnv),
}

/// The vectorized environment returned by the factory.
///
/// Presents the same [`VecEnv`] interface whichever strategy backs it. The
/// caller owns it and should [`close`](VecEnv::close) it when done.
pub struct VecEnvHandle {
    backend: Backend,
    descriptors: Vec<EnvDescriptor>,
}

// Manual Debug implementation - the backends hold live environments and processes
impl fmt::Debug for VecEnvHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VecEnvHandle")
            .field("strategy", &self.strategy())
            .field("descriptors", &self.descriptors)
            .finish()
    }
}

impl VecEnvHandle {
    pub(crate) fn new(backend: Backend, descriptors: Vec<EnvDescriptor>) -> Self {
        Self {
            backend,
            descriptors,
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self.backend {
            Backend::Sequential(_) => Strategy::Sequential,
            Backend::Process(_) => Strategy::Process,
        }
    }

    /// The recipe each instance was built from, in rank order.
    pub fn descriptors(&self) -> &[EnvDescriptor] {
        &self.descriptors
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn into_backend(self) -> Backend {
        self.backend
    }

    fn inner(&mut self) -> &mut dyn VecEnv {
        match &mut self.backend {
            Backend::Sequential(envs) => envs as &mut dyn VecEnv,
            Backend::Process(envs) => envs as &mut dyn VecEnv,
        }
    }
}

impl VecEnv for VecEnvHandle {
    fn num_envs(&self) -> usize {
        match &self.backend {
            Backend::Sequential(envs) => envs.num_envs(),
            Backend::Process(envs) => envs.num_envs(),
        }
    }

    fn spaces(&mut self) -> Result<EnvSpaces, EnvError> {
        self.inner().spaces()
    }

    fn reset(&mut self) -> Result<Vec<Observation>, EnvError> {
        self.inner().reset()
    }

    fn step(&mut self, actions: &[Action]) -> Result<Vec<Step>, EnvError> {
        self.inner().step(actions)
    }

    fn seed(&mut self, seed: u64) -> Result<(), EnvError> {
        self.inner().seed(seed)
    }

    fn get_images(&mut self) -> Option<Result<Vec<Image>, EnvError>> {
        self.inner().get_images()
    }

    fn close(&mut self) -> Result<(), EnvError> {
        self.inner().close()
    }
}

impl RenderSource for VecEnvHandle {
    fn images(&mut self) -> Option<Result<Vec<Image>, EnvError>> {
        self.get_images()
    }
}
