use std::collections::BTreeMap;
use std::sync::{OnceLock, RwLock};

use crate::env::classic::{CartPole, Pendulum};
use crate::env::errors::EnvError;
use crate::env::traits::Env;
use crate::env::types::KwArgs;
use crate::env::wrappers::TimeLimit;

/// Constructor registered for an environment id.
pub type EnvFactory = Box<dyn Fn(KwArgs) -> Result<Box<dyn Env>, EnvError> + Send + Sync>;

/// Adapts a typed constructor into an [`EnvFactory`].
pub fn factory_of<E, F>(ctor: F) -> EnvFactory
where
    E: Env,
    F: Fn(KwArgs) -> Result<E, EnvError> + Send + Sync + 'static,
{
    Box::new(move |kwargs| ctor(kwargs).map(|env| Box::new(env) as Box<dyn Env>))
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnvSpec {
    pub id: String,
    /// When set, `make` wraps the environment in a [`TimeLimit`].
    pub max_episode_steps: Option<u32>,
}

impl EnvSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            max_episode_steps: None,
        }
    }

    pub fn with_max_episode_steps(mut self, steps: u32) -> Self {
        self.max_episode_steps = Some(steps);
        self
    }
}

struct Entry {
    spec: EnvSpec,
    factory: EnvFactory,
}

/// Maps environment ids to their constructors.
#[derive(Default)]
pub struct Registry {
    entries: BTreeMap<String, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the classic-control environments shipped with the crate.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let builtins: [(EnvSpec, EnvFactory); 2] = [
            (
                EnvSpec::new("CartPole-v1").with_max_episode_steps(500),
                factory_of(CartPole::from_kwargs),
            ),
            (
                EnvSpec::new("Pendulum-v1").with_max_episode_steps(200),
                factory_of(Pendulum::from_kwargs),
            ),
        ];
        for (spec, factory) in builtins {
            registry
                .entries
                .insert(spec.id.clone(), Entry { spec, factory });
        }
        registry
    }

    pub fn register(&mut self, spec: EnvSpec, factory: EnvFactory) -> Result<(), EnvError> {
        if self.entries.contains_key(&spec.id) {
            return Err(EnvError::InvalidConstructionArgs(format!(
                "environment `{}` is already registered",
                spec.id
            )));
        }
        self.entries
            .insert(spec.id.clone(), Entry { spec, factory });
        Ok(())
    }

    pub fn spec(&self, id: &str) -> Option<&EnvSpec> {
        self.entries.get(id).map(|entry| &entry.spec)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Constructs `id` with `kwargs`, applying the registered step limit.
    pub fn make(&self, id: &str, kwargs: KwArgs) -> Result<Box<dyn Env>, EnvError> {
        let entry = self
            .entries
            .get(id)
            .ok_or_else(|| EnvError::EnvironmentNotFound(id.to_string()))?;
        let env = (entry.factory)(kwargs)?;
        match entry.spec.max_episode_steps {
            Some(steps) => Ok(Box::new(TimeLimit::new(env, steps))),
            None => Ok(env),
        }
    }
}

static GLOBAL_REGISTRY: OnceLock<RwLock<Registry>> = OnceLock::new();

/// The process-wide registry, seeded with the built-in environments.
///
/// Worker processes start with a fresh copy: registrations made in the
/// parent are not inherited.
pub fn global() -> &'static RwLock<Registry> {
    GLOBAL_REGISTRY.get_or_init(|| RwLock::new(Registry::with_builtins()))
}

pub fn register(spec: EnvSpec, factory: EnvFactory) -> Result<(), EnvError> {
    global()
        .write()
        .map_err(|_| EnvError::Protocol("registry lock poisoned".to_string()))?
        .register(spec, factory)
}

pub fn make(id: &str, kwargs: KwArgs) -> Result<Box<dyn Env>, EnvError> {
    global()
        .read()
        .map_err(|_| EnvError::Protocol("registry lock poisoned".to_string()))?
        .make(id, kwargs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::wrappers::is_time_limit_env;

    #[test]
    fn test_builtins_are_time_limited() {
        let registry = Registry::with_builtins();
        let ids: Vec<_> = registry.ids().collect();
        assert_eq!(ids, vec!["CartPole-v1", "Pendulum-v1"]);

        let env = registry.make("CartPole-v1", KwArgs::new()).unwrap();
        assert!(is_time_limit_env(&*env));
        let limit = (*env)
            .as_any()
            .downcast_ref::<TimeLimit>()
            .map(TimeLimit::max_episode_steps);
        assert_eq!(limit, Some(500));
        assert_eq!(
            registry.spec("Pendulum-v1").unwrap().max_episode_steps,
            Some(200)
        );
    }

    #[test]
    fn test_unknown_id() {
        let registry = Registry::with_builtins();
        assert!(matches!(
            registry.make("Nope-v0", KwArgs::new()),
            Err(EnvError::EnvironmentNotFound(id)) if id == "Nope-v0"
        ));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = Registry::with_builtins();
        let result = registry.register(
            EnvSpec::new("CartPole-v1"),
            factory_of(|_| Ok(CartPole::new())),
        );
        assert!(matches!(result, Err(EnvError::InvalidConstructionArgs(_))));
    }

    #[test]
    fn test_spec_without_limit_is_unwrapped() {
        let mut registry = Registry::new();
        registry
            .register(
                EnvSpec::new("Free-v0"),
                factory_of(|_| Ok(CartPole::new())),
            )
            .unwrap();
        let env = registry.make("Free-v0", KwArgs::new()).unwrap();
        assert!(!is_time_limit_env(&*env));
        assert!((*env).as_any().is::<CartPole>());
    }
}
