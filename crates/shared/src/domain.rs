use serde::{Deserialize, Serialize};

/// Requested state for a single relayed button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ButtonRequest {
    Press,
    Release,
}
