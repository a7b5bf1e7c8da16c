use std::any::Any;

use crate::env::errors::EnvError;
use crate::env::types::{Action, EnvSpaces, Image, Observation, Step};
use crate::space::Space;

/// Lets callers inspect the concrete type behind a `dyn Env`.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A single simulation environment.
///
/// Observations and actions are concrete, serializable types so that the
/// same environment can run in-process or inside a worker process.
pub trait Env: AsAny + Send {
    fn observation_space(&self) -> Space;
    fn action_space(&self) -> Space;

    fn reset(&mut self) -> Result<Observation, EnvError>;
    fn step(&mut self, action: &Action) -> Result<Step, EnvError>;

    /// Reseeds the environment's random source. Takes effect on the next reset.
    fn seed(&mut self, seed: u64);

    fn close(&mut self) -> Result<(), EnvError> {
        Ok(())
    }

    /// Renders the current state as an RGB frame.
    ///
    /// `None` means the environment has no rendering capability at all.
    fn render(&mut self) -> Option<Result<Image, EnvError>> {
        None
    }

    /// The environment this one decorates, if it is a wrapper.
    fn inner(&self) -> Option<&dyn Env> {
        None
    }

    fn spaces(&self) -> EnvSpaces {
        EnvSpaces {
            observation: self.observation_space(),
            action: self.action_space(),
        }
    }
}
