//! Chapter blocks for WebVTT generation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single chapter/subtitle cue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Chapter {
    /// Cue start, e.g. "00:00:00.000"
    pub start: String,
    /// Cue end
    pub end: String,
    /// Cue text
    pub text: String,
}
