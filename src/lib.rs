//! Environment plumbing for reinforcement-learning experiments.
//!
//! - [`space`]: flattened dimensionality of observation and action spaces.
//! - [`env`]: the environment trait, step-limit wrappers, the registry and
//!   in-process vectorization.
//! - [`factory`]: builds a vectorized environment, in-process for one
//!   instance and one worker process per instance otherwise.
//! - [`runtime`]: the worker side of process isolation.

pub mod env;
pub mod factory;
pub mod logging;
pub mod runtime;
pub mod space;

pub use env::{
    Action, Env, EnvError, Observation, RenderedImages, Step, VecEnv, get_render_images,
    is_time_limit_env,
};
pub use factory::{ConstructionRequest, Strategy, VecEnvFactory, VecEnvHandle, make_vec_env};
pub use space::{Space, SpaceError, num_space_dim};
