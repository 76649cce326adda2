use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A problem packaged for the external coding agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTask {
    /// Task description: title plus the labeled context sections
    pub task: String,

    /// Supporting context string (labels, relevant files, success criteria)
    pub context: String,

    /// Unique referenced filenames, sorted
    pub files_to_modify: Vec<String>,

    pub acceptance_criteria: Vec<String>,

    /// Referenced code grouped by filename
    pub related_code: HashMap<String, String>,

    /// Issue provenance plus any caller-supplied extras
    pub metadata: HashMap<String, Value>,
}
