//! Prompt templates for the two generation calls of a turn.
//!
//! Templates live as plain text under `config/prompts/` and are compiled in.
//! A `prompts_dir` in config can shadow either file; missing files there are
//! skipped so overrides can be partial.
//!
//! Variable substitution uses `{{key}}` syntax and runs in a single pass, so
//! text substituted in (a retrieved excerpt, the user's question) is never
//! scanned for further placeholders.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info};

use crate::error::AppError;

pub const GROUNDED_FILE: &str = "grounded_answer.txt";
pub const KEYWORD_FILE: &str = "keyword_extract.txt";

const GROUNDED_TEMPLATE: &str = include_str!("../../config/prompts/grounded_answer.txt");
const KEYWORD_TEMPLATE: &str = include_str!("../../config/prompts/keyword_extract.txt");

/// Context section text when the novel retrieval came back empty.
pub const NO_CONTEXT: &str = "(nothing relevant found in the novel)";
/// Memory section text before the first answer has been committed.
pub const NO_MEMORY_YET: &str = "(no memory yet)";
/// Memory section text when memory exists but nothing in it matched.
pub const NO_RELEVANT_MEMORY: &str = "(no relevant memory found)";

/// What the memory section of a grounded prompt should say.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemorySection<'a> {
    /// Memory was empty, so it was not searched.
    Empty,
    /// Memory was searched; the excerpt may itself be empty.
    Retrieved(&'a str),
}

#[derive(Debug, Clone)]
pub struct PromptTemplates {
    grounded: String,
    keywords: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            grounded: GROUNDED_TEMPLATE.trim().to_string(),
            keywords: KEYWORD_TEMPLATE.trim().to_string(),
        }
    }
}

impl PromptTemplates {
    /// Built-in templates, with any files found in `dir` taking their place.
    pub fn load(dir: Option<&Path>) -> Result<Self, AppError> {
        let mut templates = Self::default();
        let Some(dir) = dir else {
            return Ok(templates);
        };

        if let Some(text) = read_override(dir, GROUNDED_FILE)? {
            require_vars(GROUNDED_FILE, &text, &["context", "memory", "query"])?;
            templates.grounded = text;
        }
        if let Some(text) = read_override(dir, KEYWORD_FILE)? {
            require_vars(KEYWORD_FILE, &text, &["query"])?;
            templates.keywords = text;
        }
        Ok(templates)
    }

    /// Prompt asking for an answer grounded in both retrievals.
    pub fn grounded(&self, context: &str, memory: MemorySection<'_>, query: &str) -> String {
        let context = if context.trim().is_empty() { NO_CONTEXT } else { context };
        let memory = match memory {
            MemorySection::Empty => NO_MEMORY_YET,
            MemorySection::Retrieved(m) if m.trim().is_empty() => NO_RELEVANT_MEMORY,
            MemorySection::Retrieved(m) => m,
        };
        render(
            &self.grounded,
            &[("context", context), ("memory", memory), ("query", query)],
        )
    }

    /// Prompt asking for the question's keywords as a JSON-style list.
    pub fn keywords(&self, query: &str) -> String {
        render(&self.keywords, &[("query", query)])
    }
}

fn read_override(dir: &Path, filename: &str) -> Result<Option<String>, AppError> {
    let path = dir.join(filename);
    match fs::read_to_string(&path) {
        Ok(text) => {
            info!(path = %path.display(), "using prompt override");
            Ok(Some(text.trim().to_string()))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("prompt: override '{}' not found, using built-in", path.display());
            Ok(None)
        }
        Err(e) => Err(AppError::Config(format!("cannot read {}: {e}", path.display()))),
    }
}

fn require_vars(filename: &str, text: &str, vars: &[&str]) -> Result<(), AppError> {
    for var in vars {
        if !text.contains(&format!("{{{{{var}}}}}")) {
            return Err(AppError::Config(format!(
                "prompt {filename} is missing the {{{{{var}}}}} placeholder"
            )));
        }
    }
    Ok(())
}

/// Replace each `{{key}}` with its value. Unknown keys are left as written.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let key = &after[..end];
        match vars.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push_str("{{");
                out.push_str(key);
                out.push_str("}}");
            }
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn grounded_prompt_layout() {
        let p = PromptTemplates::default().grounded(
            "Alice fell.",
            MemorySection::Empty,
            "Who is Alice?",
        );
        assert_eq!(
            p,
            "RETRIEVAL FROM CONTEXT:\nAlice fell.\n\nRETRIEVAL FROM MEMORY:\n(no memory yet)\n\n\
             BASED on the retrievals above, respond to the user's query: Who is Alice?"
        );
    }

    #[test]
    fn empty_sections_get_markers() {
        let t = PromptTemplates::default();
        let p = t.grounded("  ", MemorySection::Retrieved(""), "q");
        assert!(p.contains(NO_CONTEXT));
        assert!(p.contains(NO_RELEVANT_MEMORY));
        assert!(!p.contains(NO_MEMORY_YET));
    }

    #[test]
    fn retrieved_memory_is_embedded() {
        let p = PromptTemplates::default().grounded(
            "ctx",
            MemorySection::Retrieved("Alice is a girl."),
            "Where is she?",
        );
        assert!(p.contains("RETRIEVAL FROM MEMORY:\nAlice is a girl.\n"));
    }

    #[test]
    fn keyword_prompt_carries_query_only() {
        let p = PromptTemplates::default().keywords("Who built the creature?");
        assert!(p.starts_with("Context: Who built the creature?\nPROMPT: Extract"));
        assert!(p.ends_with(r#"["keyword1", "keyword2", "keyword3"]"#));
    }

    #[test]
    fn substituted_text_is_not_rescanned() {
        let out = render("A {{query}} B", &[("query", "{{context}}"), ("context", "X")]);
        assert_eq!(out, "A {{context}} B");
    }

    #[test]
    fn unknown_and_unclosed_placeholders_kept() {
        assert_eq!(render("{{nope}} and {{query", &[("query", "q")]), "{{nope}} and {{query");
    }

    #[test]
    fn override_dir_shadows_one_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(KEYWORD_FILE), "Keywords for: {{query}}\n").unwrap();
        let t = PromptTemplates::load(Some(dir.path())).unwrap();
        assert_eq!(t.keywords("q"), "Keywords for: q");
        assert!(t.grounded("c", MemorySection::Empty, "q").starts_with("RETRIEVAL FROM CONTEXT:"));
    }

    #[test]
    fn override_without_query_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(GROUNDED_FILE), "{{context}} {{memory}}").unwrap();
        let err = PromptTemplates::load(Some(dir.path())).unwrap_err();
        assert!(err.to_string().contains("{{query}}"));
    }
}
