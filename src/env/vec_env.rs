use serde_json::Value;

use super::render::RenderSource;
use super::{Action, Env, EnvError, EnvSpaces, Image, Observation, Step};

/// Info key holding the last observation of an episode that was auto-reset.
pub const TERMINAL_OBSERVATION: &str = "terminal_observation";

/// N environment instances behind one batched interface.
///
/// Instance `i` always sits at index `i` of every batch, whatever backend
/// runs it.
pub trait VecEnv {
    fn num_envs(&self) -> usize;

    fn spaces(&mut self) -> Result<EnvSpaces, EnvError>;

    fn reset(&mut self) -> Result<Vec<Observation>, EnvError>;

    /// Steps every instance with its action. Instances whose episode ended
    /// are reset right away; see [`TERMINAL_OBSERVATION`].
    fn step(&mut self, actions: &[Action]) -> Result<Vec<Step>, EnvError>;

    /// Reseeds instance `i` with `seed + i`.
    fn seed(&mut self, seed: u64) -> Result<(), EnvError>;

    /// One frame per instance, or `None` if this backend cannot render.
    fn get_images(&mut self) -> Option<Result<Vec<Image>, EnvError>> {
        None
    }

    fn close(&mut self) -> Result<(), EnvError>;
}

pub(crate) fn check_action_count(expected: usize, actions: &[Action]) -> Result<(), EnvError> {
    if actions.len() != expected {
        return Err(EnvError::ActionCountMismatch {
            expected,
            got: actions.len(),
        });
    }
    Ok(())
}

/// Steps `env` and resets it if the episode ended.
pub(crate) fn step_with_autoreset(env: &mut dyn Env, action: &Action) -> Result<Step, EnvError> {
    let mut step = env.step(action)?;
    if step.done() {
        let terminal = std::mem::replace(&mut step.obs, env.reset()?);
        step.info.insert(
            TERMINAL_OBSERVATION.to_string(),
            Value::from(terminal),
        );
    }
    Ok(step)
}

pub(crate) fn derive_seed(base: u64, rank: usize) -> u64 {
    base.wrapping_add(rank as u64)
}

/// Runs every instance in the caller's thread, one after another.
pub struct DummyVecEnv {
    envs: Vec<Box<dyn Env>>,
}

impl DummyVecEnv {
    /// Builds the instances by calling each constructor in order.
    ///
    /// The first constructor error is returned as-is.
    pub fn new<F>(make_envs: impl IntoIterator<Item = F>) -> Result<Self, EnvError>
    where
        F: FnOnce() -> Result<Box<dyn Env>, EnvError>,
    {
        let envs = make_envs
            .into_iter()
            .map(|make_env| make_env())
            .collect::<Result<Vec<_>, _>>()?;
        if envs.is_empty() {
            return Err(EnvError::InvalidConstructionArgs(
                "Must provide at least one environment".to_string(),
            ));
        }
        Ok(Self { envs })
    }

    pub fn envs(&self) -> &[Box<dyn Env>] {
        &self.envs
    }
}

impl VecEnv for DummyVecEnv {
    fn num_envs(&self) -> usize {
        self.envs.len()
    }

    fn spaces(&mut self) -> Result<EnvSpaces, EnvError> {
        Ok(self.envs[0].spaces())
    }

    fn reset(&mut self) -> Result<Vec<Observation>, EnvError> {
        self.envs.iter_mut().map(|env| env.reset()).collect()
    }

    fn step(&mut self, actions: &[Action]) -> Result<Vec<Step>, EnvError> {
        check_action_count(self.envs.len(), actions)?;

        self.envs
            .iter_mut()
            .zip(actions)
            .map(|(env, action)| step_with_autoreset(env.as_mut(), action))
            .collect()
    }

    fn seed(&mut self, seed: u64) -> Result<(), EnvError> {
        for (rank, env) in self.envs.iter_mut().enumerate() {
            env.seed(derive_seed(seed, rank));
        }
        Ok(())
    }

    fn get_images(&mut self) -> Option<Result<Vec<Image>, EnvError>> {
        let mut images = Vec::with_capacity(self.envs.len());
        for env in &mut self.envs {
            match env.render()? {
                Ok(image) => images.push(image),
                Err(err) => return Some(Err(err)),
            }
        }
        Some(Ok(images))
    }

    fn close(&mut self) -> Result<(), EnvError> {
        for env in &mut self.envs {
            env.close()?;
        }
        Ok(())
    }
}

impl RenderSource for DummyVecEnv {
    fn images(&mut self) -> Option<Result<Vec<Image>, EnvError>> {
        self.get_images()
    }
}
