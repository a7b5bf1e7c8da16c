//! Pendulum-v1: swing a frictionless pendulum upright and keep it there.
//!
//! The task never terminates on its own.

use std::f32::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::env::{Action, Env, EnvError, KwArgs, Observation, Step};
use crate::space::Space;

const MAX_SPEED: f32 = 8.0;
const MAX_TORQUE: f32 = 2.0;
const DT: f32 = 0.05;
const MASS: f32 = 1.0;
const LENGTH: f32 = 1.0;
const DEFAULT_GRAVITY: f32 = 10.0;

pub struct Pendulum {
    theta: f32,
    theta_dot: f32,
    gravity: f32,
    rng: StdRng,
}

impl Pendulum {
    pub fn new(gravity: f32) -> Self {
        Self {
            theta: 0.0,
            theta_dot: 0.0,
            gravity,
            rng: StdRng::from_entropy(),
        }
    }

    /// Accepts an optional numeric `g` (gravity).
    pub fn from_kwargs(kwargs: KwArgs) -> Result<Self, EnvError> {
        let mut gravity = DEFAULT_GRAVITY;
        for (key, value) in kwargs {
            match key.as_str() {
                "g" => {
                    gravity = value.as_f64().ok_or_else(|| {
                        EnvError::InvalidConstructionArgs(format!(
                            "`g` must be a number, got {value}"
                        ))
                    })? as f32;
                }
                _ => {
                    return Err(EnvError::InvalidConstructionArgs(format!(
                        "unknown Pendulum option `{key}`"
                    )));
                }
            }
        }
        Ok(Self::new(gravity))
    }

    fn observation(&self) -> Observation {
        vec![self.theta.cos(), self.theta.sin(), self.theta_dot]
    }
}

fn angle_normalize(x: f32) -> f32 {
    (x + PI).rem_euclid(2.0 * PI) - PI
}

impl Env for Pendulum {
    fn observation_space(&self) -> Space {
        Space::continuous([3])
    }

    fn action_space(&self) -> Space {
        Space::continuous([1])
    }

    fn reset(&mut self) -> Result<Observation, EnvError> {
        self.theta = self.rng.gen_range(-PI..PI);
        self.theta_dot = self.rng.gen_range(-1.0..1.0);
        Ok(self.observation())
    }

    fn step(&mut self, action: &Action) -> Result<Step, EnvError> {
        let torque = match action {
            Action::Continuous(values) if values.len() == 1 => {
                values[0].clamp(-MAX_TORQUE, MAX_TORQUE)
            }
            other => {
                return Err(EnvError::InvalidAction(format!(
                    "Pendulum expects a single torque value, got {other:?}"
                )));
            }
        };

        let cost = angle_normalize(self.theta).powi(2)
            + 0.1 * self.theta_dot.powi(2)
            + 0.001 * torque.powi(2);

        let theta_acc = 3.0 * self.gravity / (2.0 * LENGTH) * self.theta.sin()
            + 3.0 / (MASS * LENGTH * LENGTH) * torque;
        self.theta_dot = (self.theta_dot + theta_acc * DT).clamp(-MAX_SPEED, MAX_SPEED);
        self.theta += self.theta_dot * DT;

        Ok(Step::new(self.observation(), -cost, false))
    }

    fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}
