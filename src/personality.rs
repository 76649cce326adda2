use log::{debug, warn};

use crate::llm::TextGenerator;

/// Glyph ending a generated flavor line. Its presence on the first line of
/// a body is how re-application detects prior decoration.
pub const FLAVOR_MARKER: char = '\u{2728}';

/// Optional stylistic post-processor for outgoing comment and PR bodies.
///
/// Prepends a one-line flavor sentence generated from a cached
/// personality document. Every failure path is an identity transform:
/// this must never block the issue-to-PR workflow.
pub struct PersonalityEngine {
    enabled: bool,
    document: Option<String>,
    source_owner: Option<String>,
    generator: Option<Box<dyn TextGenerator>>,
    load_attempted: bool,
}

impl PersonalityEngine {
    pub fn new(enabled: bool, generator: Option<Box<dyn TextGenerator>>) -> Self {
        Self {
            enabled,
            document: None,
            source_owner: None,
            generator,
            load_attempted: false,
        }
    }

    /// An engine that never touches text
    pub fn disabled() -> Self {
        Self::new(false, None)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    pub fn source_owner(&self) -> Option<&str> {
        self.source_owner.as_deref()
    }

    /// Whether the owning client still needs to fetch the personality
    /// document. True at most once per process: the first install call,
    /// successful or not, ends the lazy load.
    pub fn needs_load(&self) -> bool {
        self.enabled && self.generator.is_some() && !self.load_attempted
    }

    /// Record the outcome of the document fetch. A `None` document means
    /// the fetch failed and the engine stays an identity transform.
    pub fn install_document(&mut self, source_owner: Option<String>, document: Option<String>) {
        self.source_owner = source_owner;
        self.document = document;
        self.load_attempted = true;
    }

    /// Apply the personality to an outgoing body.
    ///
    /// Returns the text unchanged when disabled, when no document is
    /// loaded, when no generator is configured, or when generation fails.
    pub fn apply(&self, text: &str, context_hint: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        let Some(document) = &self.document else {
            return text.to_string();
        };
        let Some(generator) = &self.generator else {
            return text.to_string();
        };

        // Re-applying to already-decorated text replaces the flavor line
        // instead of stacking a second one.
        let original = strip_flavor_line(text);
        let prompt = build_flavor_prompt(document, original, context_hint);

        match generator.generate(&prompt) {
            Ok(response) => {
                let first_line = response.lines().next().unwrap_or("").trim();
                if first_line.is_empty() {
                    debug!("Generator returned no usable flavor line");
                    return text.to_string();
                }
                let mut flavor = first_line.to_string();
                if !flavor.ends_with(FLAVOR_MARKER) {
                    flavor.push(' ');
                    flavor.push(FLAVOR_MARKER);
                }
                format!("{}\n{}", flavor, original)
            }
            Err(e) => {
                warn!("Personality generation failed, leaving text unchanged: {}", e);
                text.to_string()
            }
        }
    }
}

/// Drop a leading flavor line (one ending in the marker glyph) so that
/// re-decoration starts from the undecorated body.
pub fn strip_flavor_line(text: &str) -> &str {
    if let Some((first, rest)) = text.split_once('\n') {
        if first.trim_end().ends_with(FLAVOR_MARKER) {
            return rest;
        }
    }
    text
}

fn build_flavor_prompt(document: &str, text: &str, context_hint: &str) -> String {
    format!(
        "You are writing a single short opening line for a {hint} on GitHub.\n\
         Adopt the voice described by this personality document:\n\n\
         {document}\n\n\
         Write exactly one sentence of flavor text to open the {hint}. \
         Do not restate or summarize the content. Respond with the sentence only.\n\n\
         Original text:\n{text}\n",
        hint = context_hint,
        document = document,
        text = text,
    )
}
