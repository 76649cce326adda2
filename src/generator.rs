use std::collections::{BTreeSet, HashMap};

use serde_json::{json, Value};

use crate::models::problem::ProblemDefinition;
use crate::models::task::AgentTask;

/// Converts a structured problem definition into the task shape the
/// external coding agent consumes. Pure derivation, no external state.
pub struct TaskGenerator;

impl Default for TaskGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Build the task description: title followed by the labeled context
    /// sections that survived parsing.
    pub fn build_task_description(&self, problem: &ProblemDefinition) -> String {
        let mut task = format!("{}\n\n", problem.title);

        for key in ["context", "background"] {
            if let Some(value) = problem.context.get(key) {
                task.push_str(&format!("\nBackground:\n{}\n", value));
            }
        }
        if let Some(value) = problem.context.get("current behavior") {
            task.push_str(&format!("\nCurrent Behavior:\n{}\n", value));
        }
        if let Some(value) = problem.context.get("additional_info") {
            task.push_str(&format!("\nAdditional Information:\n{}\n", value));
        }

        task.trim().to_string()
    }

    /// Collect the unique filenames referenced by code blocks, sorted.
    pub fn collect_file_references(&self, problem: &ProblemDefinition) -> Vec<String> {
        let files: BTreeSet<String> = problem
            .code_references
            .iter()
            .filter_map(|r| r.filename.clone())
            .collect();
        files.into_iter().collect()
    }

    /// Group referenced code by filename, each block framed with its
    /// location and language.
    pub fn organize_code_references(&self, problem: &ProblemDefinition) -> HashMap<String, String> {
        let mut blocks_by_file: HashMap<String, Vec<String>> = HashMap::new();

        for code_ref in &problem.code_references {
            let Some(filename) = &code_ref.filename else {
                continue;
            };

            let mut location = String::new();
            if let Some(start) = code_ref.start_line {
                location = format!("Lines {}", start);
                if let Some(end) = code_ref.end_line {
                    location.push_str(&format!("-{}", end));
                }
            }

            let rule = "=".repeat(40);
            let mut block = format!("{}\n", rule);
            if !location.is_empty() {
                block.push_str(&format!("Location: {}\n", location));
            }
            block.push_str(&format!("Language: {}\n\n", code_ref.language));
            block.push_str(&code_ref.content);
            block.push_str(&format!("\n{}\n", rule));

            blocks_by_file
                .entry(filename.clone())
                .or_default()
                .push(block);
        }

        blocks_by_file
            .into_iter()
            .map(|(filename, blocks)| (filename, blocks.join("\n\n")))
            .collect()
    }

    /// Build the supporting context string: labels, relevant files, and
    /// success criteria.
    pub fn build_context_string(
        &self,
        problem: &ProblemDefinition,
        code_by_file: &HashMap<String, String>,
    ) -> String {
        let mut sections = Vec::new();

        if !problem.labels.is_empty() {
            sections.push(format!("Issue Labels: {}", problem.labels.join(", ")));
        }

        if !code_by_file.is_empty() {
            sections.push("\nRelevant Files:".to_string());
            let mut filenames: Vec<&String> = code_by_file.keys().collect();
            filenames.sort();
            for filename in filenames {
                sections.push(format!("- {}", filename));
            }
        }

        if !problem.success_criteria.is_empty() {
            sections.push("\nSuccess Criteria:".to_string());
            for criterion in &problem.success_criteria {
                sections.push(format!("- {}", criterion));
            }
        }

        sections.join("\n")
    }

    /// Generate an agent task from a problem definition.
    pub fn generate(
        &self,
        problem: &ProblemDefinition,
        additional_context: Option<HashMap<String, Value>>,
    ) -> AgentTask {
        let task = self.build_task_description(problem);
        let files_to_modify = self.collect_file_references(problem);
        let related_code = self.organize_code_references(problem);
        let context = self.build_context_string(problem, &related_code);

        let mut metadata: HashMap<String, Value> = HashMap::new();
        metadata.insert("issue_number".to_string(), json!(problem.issue_number));
        metadata.insert("issue_url".to_string(), json!(problem.issue_url));
        metadata.insert("labels".to_string(), json!(problem.labels));
        if let Some(extra) = additional_context {
            metadata.extend(extra);
        }

        AgentTask {
            task,
            context,
            files_to_modify,
            acceptance_criteria: problem.success_criteria.clone(),
            related_code,
            metadata,
        }
    }

    /// Build the flat instruction string handed to the coding agent:
    /// task description, full issue body, context sections, and the
    /// repository the work targets.
    pub fn build_instructions(
        &self,
        problem: &ProblemDefinition,
        owner: &str,
        repo: &str,
    ) -> String {
        let mut instructions = format!("{}\n\n", problem.title);
        if !problem.description.is_empty() {
            instructions.push_str(&format!("{}\n\n", problem.description));
        }

        for key in ["context", "background"] {
            if let Some(value) = problem.context.get(key) {
                instructions.push_str(&format!("\nBackground:\n{}\n", value));
            }
        }
        if let Some(value) = problem.context.get("current behavior") {
            instructions.push_str(&format!("\nCurrent Behavior:\n{}\n", value));
        }
        if let Some(value) = problem.context.get("additional_info") {
            instructions.push_str(&format!("\nAdditional Information:\n{}\n", value));
        }

        instructions.push_str(&format!("\nRepository: {}/{}", owner, repo));
        instructions
    }
}
