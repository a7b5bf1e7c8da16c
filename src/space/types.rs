use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Shape description of an observation or action space.
///
/// Spaces are plain values: they are built by environments, handed out
/// read-only, and serialized as-is when a worker process reports them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Space {
    /// Real-valued tensor with the given dimension sizes.
    Continuous { shape: Vec<usize> },
    /// A single choice among `n` options.
    Discrete { n: usize },
    /// `n` independent binary flags.
    MultiBinary { n: usize },
    /// A tensor of discrete choices with the given dimension sizes.
    MultiDiscrete { shape: Vec<usize> },
    Tuple(Vec<Space>),
    Dict(BTreeMap<String, Space>),
    /// Variable-length string of at most `max_length` characters.
    Text { max_length: usize },
    /// Variable-length sequence of elements drawn from the inner space.
    Sequence(Box<Space>),
}

impl Space {
    pub fn continuous(shape: impl Into<Vec<usize>>) -> Self {
        Space::Continuous {
            shape: shape.into(),
        }
    }

    pub fn discrete(n: usize) -> Self {
        Space::Discrete { n }
    }

    /// Short name of the variant, used in error messages and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Space::Continuous { .. } => "continuous",
            Space::Discrete { .. } => "discrete",
            Space::MultiBinary { .. } => "multi_binary",
            Space::MultiDiscrete { .. } => "multi_discrete",
            Space::Tuple(_) => "tuple",
            Space::Dict(_) => "dict",
            Space::Text { .. } => "text",
            Space::Sequence(_) => "sequence",
        }
    }
}
