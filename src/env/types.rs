use serde::{Deserialize, Serialize};

use crate::space::Space;

pub type Observation = Vec<f32>;

/// Free-form constructor options, passed through to the registered factory.
pub type KwArgs = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Discrete(i64),
    Continuous(#[serde(with = "crate::env::floats::vec")] Vec<f32>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(with = "crate::env::floats::vec")]
    pub obs: Observation,
    #[serde(with = "crate::env::floats::scalar")]
    pub reward: f32,
    pub terminated: bool,
    pub truncated: bool,
    pub info: serde_json::Map<String, serde_json::Value>,
}

impl Step {
    pub fn new(obs: Observation, reward: f32, terminated: bool) -> Self {
        Self {
            obs,
            reward,
            terminated,
            truncated: false,
            info: serde_json::Map::new(),
        }
    }

    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// Row-major pixel buffer, `channels` bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub data: Vec<u8>,
}

impl Image {
    pub fn rgb(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            channels: 3,
            data: vec![0; (width * height * 3) as usize],
        }
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = ((y * self.width + x) * self.channels as u32) as usize;
        self.data[offset..offset + 3].copy_from_slice(&color);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvSpaces {
    pub observation: Space,
    pub action: Space,
}
