use std::collections::HashMap;

use regex::Regex;

use crate::models::github::{Comment, Issue};
use crate::models::problem::{CodeReference, ProblemDefinition};

/// Section headers that introduce a success criteria list
const SUCCESS_MARKERS: [&str; 5] = [
    "success criteria",
    "definition of done",
    "acceptance criteria",
    "expected outcome",
    "expected result",
];

/// Paragraph labels that contribute context entries
const CONTEXT_LABELS: [&str; 3] = ["context:", "background:", "current behavior:"];

/// Comment phrases that mark a comment as additional context
const COMMENT_MARKERS: [&str; 3] = ["additional context", "more details", "to clarify"];

/// Parser for converting GitHub issues into structured problem definitions.
///
/// Every extraction is a pure function of the markdown it is handed:
/// malformed or empty input degrades to empty results, never to an error.
pub struct IssueParser {
    code_block: Regex,
    file_ref: Regex,
}

impl Default for IssueParser {
    fn default() -> Self {
        Self::new()
    }
}

impl IssueParser {
    pub fn new() -> Self {
        // Fenced block with an optional language tag
        let code_block = Regex::new(r"```(\w+)?\n(?s:(.*?))\n```").unwrap();

        // e.g. "in `src/lib.rs`:10-20:" or "at main.py:5:" or "file: a.c:3"
        let file_ref =
            Regex::new(r"(?i)(?:in|at|file)[:\s]+`?([^`\n]+?)`?:(?:lines?\s+)?(\d+)(?:-(\d+))?")
                .unwrap();

        Self {
            code_block,
            file_ref,
        }
    }

    /// Extract fenced code blocks, attaching file/line metadata when one of
    /// the up-to-three lines above the fence carries a file reference.
    /// The nearest preceding line with a match wins.
    pub fn extract_code_blocks(&self, content: &str) -> Vec<CodeReference> {
        let mut refs = Vec::new();

        for captures in self.code_block.captures_iter(content) {
            let whole = captures.get(0).unwrap();
            let language = captures
                .get(1)
                .map(|m| m.as_str())
                .unwrap_or("text")
                .to_string();
            let code = captures
                .get(2)
                .map(|m| m.as_str())
                .unwrap_or_default()
                .trim()
                .to_string();

            let mut code_ref = CodeReference::new(language, code);

            let before = &content[..whole.start()];
            let mut lines: Vec<&str> = before.split('\n').collect();
            // The newline right before the fence leaves an empty trailing
            // fragment; it is not one of the preceding lines.
            if lines.last().map(|l| l.is_empty()).unwrap_or(false) {
                lines.pop();
            }

            for line in lines.iter().rev().take(3) {
                if let Some(file_caps) = self.file_ref.captures(line) {
                    code_ref.filename = file_caps.get(1).map(|m| m.as_str().to_string());
                    code_ref.start_line = file_caps.get(2).and_then(|m| m.as_str().parse().ok());
                    code_ref.end_line = file_caps.get(3).and_then(|m| m.as_str().parse().ok());
                    break;
                }
            }

            refs.push(code_ref);
        }

        refs
    }

    /// Extract success criteria bullets following the first marker line.
    ///
    /// Blank lines between bullets are skipped; the first non-empty line
    /// that is not a bullet ends the list. Bullet text keeps its casing.
    pub fn extract_success_criteria(&self, content: &str) -> Vec<String> {
        let mut criteria = Vec::new();
        let lines: Vec<&str> = content.lines().collect();

        let marker_index = lines.iter().position(|line| {
            let lower = line.to_lowercase();
            SUCCESS_MARKERS.iter().any(|marker| lower.contains(marker))
        });

        let Some(index) = marker_index else {
            return criteria;
        };

        for line in &lines[index + 1..] {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let bullet = trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("* "))
                .or_else(|| trimmed.strip_prefix("\u{2022} "));
            match bullet {
                Some(text) => criteria.push(text.trim().to_string()),
                None => break,
            }
        }

        criteria
    }

    /// Extract labeled context paragraphs from the body and accumulate
    /// clarifying comments under `additional_info`.
    pub fn extract_context(&self, content: &str, comments: &[Comment]) -> HashMap<String, String> {
        let mut context = HashMap::new();

        for section in content.split("\n\n") {
            let section = section.trim();
            let lower = section.to_lowercase();
            for label in CONTEXT_LABELS {
                if lower.starts_with(label) {
                    // Split on the section's own first colon rather than at
                    // the label length: lowercasing can change byte length
                    // for some Unicode characters.
                    if let Some((key, value)) = section.split_once(':') {
                        context.insert(key.trim().to_lowercase(), value.trim().to_string());
                    }
                    break;
                }
            }
        }

        let mut additional = String::new();
        for comment in comments {
            let lower = comment.body.to_lowercase();
            if COMMENT_MARKERS.iter().any(|marker| lower.contains(marker)) {
                if !additional.is_empty() {
                    additional.push('\n');
                }
                additional.push_str(&comment.body);
            }
        }
        if !additional.is_empty() {
            context.insert("additional_info".to_string(), additional);
        }

        context
    }

    /// Parse an issue (plus any comments) into a problem definition.
    pub fn parse(&self, issue: &Issue, comments: &[Comment]) -> ProblemDefinition {
        let content = issue.body.clone().unwrap_or_default();

        let code_references = self.extract_code_blocks(&content);
        let success_criteria = self.extract_success_criteria(&content);
        let context = self.extract_context(&content, comments);

        ProblemDefinition {
            title: issue.title.clone(),
            description: content,
            code_references,
            labels: issue.labels.iter().map(|l| l.name.clone()).collect(),
            success_criteria,
            context,
            issue_number: issue.number,
            issue_url: issue.html_url.clone(),
        }
    }
}
