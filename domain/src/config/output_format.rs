//! Output format value object

use serde::{Deserialize, Serialize};

/// How a finished turn is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Every branch answer followed by the fused answer
    Full,
    /// Only the fused answer (default)
    #[default]
    Fused,
    /// The persisted turn shape as JSON
    Json,
}
