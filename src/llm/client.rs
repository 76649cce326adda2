use anyhow::Result;

/// A pluggable text generation capability.
///
/// Model invocation itself lives outside this crate; callers construct a
/// concrete generator once at startup and inject it where needed.
pub trait TextGenerator {
    /// Generate text from a prompt
    fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the name of the generator
    fn name(&self) -> &str;
}

/// Null-object generator for when no capability is configured. Its
/// failures are swallowed by callers, so features that depend on
/// generation quietly turn into identity transforms.
pub struct NullGenerator;

impl TextGenerator for NullGenerator {
    fn generate(&self, _prompt: &str) -> Result<String> {
        Err(anyhow::anyhow!("no text generator configured"))
    }

    fn name(&self) -> &str {
        "null"
    }
}
