use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

/// Prompt templates loaded once at startup into an immutable registry.
/// A missing template file is a startup-fatal error, not a runtime one.
#[derive(Debug, Clone)]
pub struct PromptRegistry {
    templates: HashMap<&'static str, String>,
}

pub const CONDENSE_QUESTION: &str = "condense_question";
pub const CONTEXT_INTEGRATION: &str = "context_integration";
pub const DIRECT_SYSTEM: &str = "direct_system";
pub const SUMMARIZATION: &str = "summarization";

const TEMPLATE_NAMES: [&str; 4] = [
    CONDENSE_QUESTION,
    CONTEXT_INTEGRATION,
    DIRECT_SYSTEM,
    SUMMARIZATION,
];

impl PromptRegistry {
    /// Loads every named template from `dir/{name}.txt`. Fails fast if
    /// any file is missing or unreadable — there is no fallback prompt.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut templates = HashMap::with_capacity(TEMPLATE_NAMES.len());

        for name in TEMPLATE_NAMES {
            let path = dir.join(format!("{name}.txt"));
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("missing prompt template: {}", path.display()))?;
            templates.insert(name, content);
        }

        Ok(Self { templates })
    }

    pub fn get(&self, name: &str) -> &str {
        self.templates
            .get(name)
            .map(|s| s.as_str())
            .unwrap_or_else(|| panic!("prompt template '{name}' was not loaded at startup"))
    }

    pub fn condense_question(&self, chat_history: &str, question: &str) -> String {
        self.get(CONDENSE_QUESTION)
            .replace("{chat_history}", chat_history)
            .replace("{question}", question)
    }

    pub fn context_integration(&self, context: &str, question: &str) -> String {
        self.get(CONTEXT_INTEGRATION)
            .replace("{context}", context)
            .replace("{question}", question)
    }

    pub fn direct_system(&self) -> &str {
        self.get(DIRECT_SYSTEM)
    }

    pub fn summarization(&self, existing_summary: &str, transcript: &str) -> String {
        self.get(SUMMARIZATION)
            .replace("{existing_summary}", existing_summary)
            .replace("{transcript}", transcript)
    }
}
