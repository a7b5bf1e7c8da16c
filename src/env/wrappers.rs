use serde_json::Value;

use crate::env::errors::EnvError;
use crate::env::traits::Env;
use crate::env::types::{Action, Image, Observation, Step};
use crate::space::Space;

/// Info key set by [`TimeLimit`] when it cut an episode short.
pub const TIME_LIMIT_TRUNCATED: &str = "TimeLimit.truncated";

/// Truncates episodes after a fixed number of steps.
pub struct TimeLimit {
    env: Box<dyn Env>,
    max_episode_steps: u32,
    elapsed_steps: u32,
}

impl TimeLimit {
    pub fn new(env: Box<dyn Env>, max_episode_steps: u32) -> Self {
        Self {
            env,
            max_episode_steps,
            elapsed_steps: 0,
        }
    }

    pub fn max_episode_steps(&self) -> u32 {
        self.max_episode_steps
    }
}

impl Env for TimeLimit {
    fn observation_space(&self) -> Space {
        self.env.observation_space()
    }

    fn action_space(&self) -> Space {
        self.env.action_space()
    }

    fn reset(&mut self) -> Result<Observation, EnvError> {
        self.elapsed_steps = 0;
        self.env.reset()
    }

    fn step(&mut self, action: &Action) -> Result<Step, EnvError> {
        let mut step = self.env.step(action)?;
        self.elapsed_steps = self.elapsed_steps.saturating_add(1);
        if self.elapsed_steps >= self.max_episode_steps && !step.terminated {
            step.truncated = true;
            step.info
                .insert(TIME_LIMIT_TRUNCATED.to_string(), Value::Bool(true));
        }
        Ok(step)
    }

    fn seed(&mut self, seed: u64) {
        self.env.seed(seed)
    }

    fn close(&mut self) -> Result<(), EnvError> {
        self.env.close()
    }

    fn render(&mut self) -> Option<Result<Image, EnvError>> {
        self.env.render()
    }

    fn inner(&self) -> Option<&dyn Env> {
        Some(&*self.env)
    }
}

/// Removes step-count truncation coming from a [`TimeLimit`] underneath.
///
/// Episodes then only end when the wrapped environment terminates on its own.
/// Truncation raised for any other reason is passed through untouched.
pub struct NoTimeout {
    env: Box<dyn Env>,
}

impl NoTimeout {
    pub fn new(env: Box<dyn Env>) -> Self {
        Self { env }
    }
}

impl Env for NoTimeout {
    fn observation_space(&self) -> Space {
        self.env.observation_space()
    }

    fn action_space(&self) -> Space {
        self.env.action_space()
    }

    fn reset(&mut self) -> Result<Observation, EnvError> {
        self.env.reset()
    }

    fn step(&mut self, action: &Action) -> Result<Step, EnvError> {
        let mut step = self.env.step(action)?;
        if step.info.remove(TIME_LIMIT_TRUNCATED) == Some(Value::Bool(true)) {
            step.truncated = false;
        }
        Ok(step)
    }

    fn seed(&mut self, seed: u64) {
        self.env.seed(seed)
    }

    fn close(&mut self) -> Result<(), EnvError> {
        self.env.close()
    }

    fn render(&mut self) -> Option<Result<Image, EnvError>> {
        self.env.render()
    }

    fn inner(&self) -> Option<&dyn Env> {
        Some(&*self.env)
    }
}

/// Whether `env`, or the environment it directly wraps, is a [`TimeLimit`].
///
/// Only the first two layers are inspected.
pub fn is_time_limit_env(env: &dyn Env) -> bool {
    if env.as_any().is::<TimeLimit>() {
        return true;
    }
    env.inner()
        .is_some_and(|inner| inner.as_any().is::<TimeLimit>())
}
