use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A fenced code block lifted out of an issue body, with file/line
/// metadata when a reference line preceded the fence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeReference {
    /// Language tag of the fence, "text" when the fence carried none
    pub language: String,

    /// Block content with surrounding whitespace trimmed
    pub content: String,

    pub filename: Option<String>,

    pub start_line: Option<u32>,

    pub end_line: Option<u32>,
}

impl CodeReference {
    pub fn new(language: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            content: content.into(),
            filename: None,
            start_line: None,
            end_line: None,
        }
    }
}

/// Structured representation of a coding problem extracted from an issue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDefinition {
    pub title: String,

    /// The raw issue body (empty string when the issue had none)
    pub description: String,

    pub code_references: Vec<CodeReference>,

    /// Label names in the order GitHub returned them
    pub labels: Vec<String>,

    pub success_criteria: Vec<String>,

    /// Labeled context sections from the body plus the accumulated
    /// `additional_info` entry gathered from comments
    pub context: HashMap<String, String>,

    pub issue_number: u64,

    pub issue_url: String,
}
