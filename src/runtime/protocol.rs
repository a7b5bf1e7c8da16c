use serde::{Deserialize, Serialize};

use crate::env::{Action, EnvError, EnvSpaces, Image, Observation, Step};
use crate::factory::EnvDescriptor;

/// Messages sent from the parent to a worker, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Init { descriptor: EnvDescriptor },
    Reset,
    Step { action: Action },
    Seed { seed: u64 },
    Render,
    Spaces,
    Close,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Reply {
    Ready,
    Observation(#[serde(with = "crate::env::floats::vec")] Observation),
    Step(Step),
    Seeded,
    /// `None` when the environment has no rendering capability.
    Frame(Option<Image>),
    Spaces(EnvSpaces),
    Closed,
}

impl Reply {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Reply::Ready => "ready",
            Reply::Observation(_) => "observation",
            Reply::Step(_) => "step",
            Reply::Seeded => "seeded",
            Reply::Frame(_) => "frame",
            Reply::Spaces(_) => "spaces",
            Reply::Closed => "closed",
        }
    }
}

/// Every request, `Init` included, gets exactly one response.
pub type Response = Result<Reply, WireError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireErrorKind {
    EnvironmentNotFound,
    InvalidConstructionArgs,
    RenderingUnsupported,
    InvalidAction,
    Protocol,
    Other,
}

/// An [`EnvError`] flattened so it can cross the process boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
    pub kind: WireErrorKind,
    pub message: String,
}

impl WireError {
    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: WireErrorKind::Other,
            message: message.into(),
        }
    }

    /// Rebuilds the error on the parent side. Errors without a dedicated
    /// variant are attributed to the worker at `rank`.
    pub fn into_env_error(self, rank: usize) -> EnvError {
        match self.kind {
            WireErrorKind::EnvironmentNotFound => EnvError::EnvironmentNotFound(self.message),
            WireErrorKind::InvalidConstructionArgs => {
                EnvError::InvalidConstructionArgs(self.message)
            }
            WireErrorKind::RenderingUnsupported => EnvError::RenderingUnsupported,
            WireErrorKind::InvalidAction => EnvError::InvalidAction(self.message),
            WireErrorKind::Protocol => EnvError::Protocol(self.message),
            WireErrorKind::Other => EnvError::Worker {
                rank,
                message: self.message,
            },
        }
    }
}

impl From<&EnvError> for WireError {
    fn from(err: &EnvError) -> Self {
        let (kind, message) = match err {
            EnvError::EnvironmentNotFound(id) => (WireErrorKind::EnvironmentNotFound, id.clone()),
            EnvError::InvalidConstructionArgs(msg) => {
                (WireErrorKind::InvalidConstructionArgs, msg.clone())
            }
            EnvError::RenderingUnsupported => (WireErrorKind::RenderingUnsupported, err.to_string()),
            EnvError::InvalidAction(msg) => (WireErrorKind::InvalidAction, msg.clone()),
            EnvError::Protocol(msg) => (WireErrorKind::Protocol, msg.clone()),
            other => (WireErrorKind::Other, other.to_string()),
        };
        Self { kind, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_survives_the_wire() {
        let err = EnvError::EnvironmentNotFound("Nope-v0".to_string());
        let wire = WireError::from(&err);
        let json = serde_json::to_string(&wire).unwrap();
        let back: WireError = serde_json::from_str(&json).unwrap();

        assert!(matches!(
            back.into_env_error(3),
            EnvError::EnvironmentNotFound(id) if id == "Nope-v0"
        ));
    }

    #[test]
    fn test_unclassified_errors_name_the_worker() {
        let wire = WireError::from(&EnvError::Closed);
        assert_eq!(wire.kind, WireErrorKind::Other);
        assert!(matches!(
            wire.into_env_error(2),
            EnvError::Worker { rank: 2, message } if message.contains("closed")
        ));
    }

    #[test]
    fn test_request_layout() {
        let json = serde_json::to_string(&Request::Seed { seed: 4 }).unwrap();
        assert_eq!(json, r#"{"type":"seed","seed":4}"#);
        let json = serde_json::to_string(&Request::Reset).unwrap();
        assert_eq!(json, r#"{"type":"reset"}"#);
    }
}
