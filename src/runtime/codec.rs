//! Newline-delimited JSON framing shared by parent and worker.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::env::EnvError;

/// Serializes `message` as one line, trailing newline included.
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, EnvError> {
    let mut bytes =
        serde_json::to_vec(message).map_err(|e| EnvError::Protocol(e.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

pub fn decode<T: DeserializeOwned>(line: &str) -> Result<T, EnvError> {
    serde_json::from_str(line.trim_end())
        .map_err(|e| EnvError::Protocol(format!("malformed message {line:?}: {e}")))
}
