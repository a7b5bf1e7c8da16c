//! CartPole-v1.
//!
//! A pole is hinged to a cart on a frictionless track; the agent pushes the
//! cart left or right to keep the pole upright. Episodes terminate when the
//! pole tips past 12 degrees or the cart leaves the track. The step limit
//! is applied by the registry, not here.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::env::{Action, Env, EnvError, Image, KwArgs, Observation, Step};
use crate::space::Space;

const GRAVITY: f32 = 9.8;
const MASS_CART: f32 = 1.0;
const MASS_POLE: f32 = 0.1;
const TOTAL_MASS: f32 = MASS_CART + MASS_POLE;
const HALF_LENGTH: f32 = 0.5;
const POLE_MASS_LENGTH: f32 = MASS_POLE * HALF_LENGTH;
const FORCE_MAG: f32 = 10.0;
const TAU: f32 = 0.02;
const THETA_THRESHOLD: f32 = 12.0 * 2.0 * std::f32::consts::PI / 360.0;
const X_THRESHOLD: f32 = 2.4;

const FRAME_WIDTH: u32 = 120;
const FRAME_HEIGHT: u32 = 80;

pub struct CartPole {
    x: f32,
    x_dot: f32,
    theta: f32,
    theta_dot: f32,
    rng: StdRng,
    frame: Image,
}

impl CartPole {
    pub fn new() -> Self {
        Self {
            x: 0.0,
            x_dot: 0.0,
            theta: 0.0,
            theta_dot: 0.0,
            rng: StdRng::from_entropy(),
            frame: Image::rgb(FRAME_WIDTH, FRAME_HEIGHT),
        }
    }

    pub fn from_kwargs(kwargs: KwArgs) -> Result<Self, EnvError> {
        if let Some(key) = kwargs.keys().next() {
            return Err(EnvError::InvalidConstructionArgs(format!(
                "CartPole takes no options, got `{key}`"
            )));
        }
        Ok(Self::new())
    }

    fn observation(&self) -> Observation {
        vec![self.x, self.x_dot, self.theta, self.theta_dot]
    }

    fn is_terminated(&self) -> bool {
        self.x.abs() > X_THRESHOLD || self.theta.abs() > THETA_THRESHOLD
    }

    fn draw(&mut self) {
        let frame = &mut self.frame;
        frame.data.fill(255);

        let track_y = FRAME_HEIGHT * 3 / 4;
        for x in 0..FRAME_WIDTH {
            frame.put_pixel(x, track_y, [0, 0, 0]);
        }

        let scale = FRAME_WIDTH as f32 / (2.0 * X_THRESHOLD);
        let cart_x = (self.x + X_THRESHOLD) * scale;
        for dx in -6i32..=6 {
            for dy in -3i32..=0 {
                let px = cart_x as i32 + dx;
                let py = track_y as i32 + dy - 1;
                if px >= 0 && py >= 0 {
                    frame.put_pixel(px as u32, py as u32, [40, 40, 40]);
                }
            }
        }

        let pole_len = 2.0 * HALF_LENGTH * scale;
        let base_y = track_y as f32 - 4.0;
        for i in 0..=pole_len as i32 {
            let t = i as f32;
            let px = cart_x + t * self.theta.sin();
            let py = base_y - t * self.theta.cos();
            if px >= 0.0 && py >= 0.0 {
                frame.put_pixel(px as u32, py as u32, [200, 120, 60]);
            }
        }
    }
}

impl Default for CartPole {
    fn default() -> Self {
        Self::new()
    }
}

impl Env for CartPole {
    fn observation_space(&self) -> Space {
        Space::continuous([4])
    }

    fn action_space(&self) -> Space {
        Space::discrete(2)
    }

    fn reset(&mut self) -> Result<Observation, EnvError> {
        self.x = self.rng.gen_range(-0.05..0.05);
        self.x_dot = self.rng.gen_range(-0.05..0.05);
        self.theta = self.rng.gen_range(-0.05..0.05);
        self.theta_dot = self.rng.gen_range(-0.05..0.05);
        Ok(self.observation())
    }

    fn step(&mut self, action: &Action) -> Result<Step, EnvError> {
        let force = match action {
            Action::Discrete(0) => -FORCE_MAG,
            Action::Discrete(1) => FORCE_MAG,
            other => {
                return Err(EnvError::InvalidAction(format!(
                    "CartPole expects Discrete(0|1), got {other:?}"
                )));
            }
        };

        let cos_theta = self.theta.cos();
        let sin_theta = self.theta.sin();

        let temp =
            (force + POLE_MASS_LENGTH * self.theta_dot * self.theta_dot * sin_theta) / TOTAL_MASS;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (HALF_LENGTH * (4.0 / 3.0 - MASS_POLE * cos_theta * cos_theta / TOTAL_MASS));
        let x_acc = temp - POLE_MASS_LENGTH * theta_acc * cos_theta / TOTAL_MASS;

        self.x += TAU * self.x_dot;
        self.x_dot += TAU * x_acc;
        self.theta += TAU * self.theta_dot;
        self.theta_dot += TAU * theta_acc;

        Ok(Step::new(self.observation(), 1.0, self.is_terminated()))
    }

    fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn render(&mut self) -> Option<Result<Image, EnvError>> {
        self.draw();
        Some(Ok(self.frame.clone()))
    }
}
