//! Tests for prompt templates under config/prompts

use std::fs;

use novel_agent::agent::PromptTemplates;
use novel_agent::agent::prompt::{GROUNDED_FILE, KEYWORD_FILE, MemorySection};

#[test]
fn test_grounded_prompt_file_exists() {
    let path = format!("config/prompts/{GROUNDED_FILE}");
    assert!(fs::metadata(&path).is_ok(), "{GROUNDED_FILE} prompt file missing");
}

#[test]
fn test_keyword_prompt_file_exists() {
    let path = format!("config/prompts/{KEYWORD_FILE}");
    assert!(fs::metadata(&path).is_ok(), "{KEYWORD_FILE} prompt file missing");
}

#[test]
fn test_grounded_prompt_template_vars() {
    let text = fs::read_to_string("config/prompts/grounded_answer.txt").unwrap();
    assert!(text.contains("{{context}}"), "grounded_answer.txt should contain {{context}} variable");
    assert!(text.contains("{{memory}}"), "grounded_answer.txt should contain {{memory}} variable");
    assert!(text.contains("{{query}}"), "grounded_answer.txt should contain {{query}} variable");
    assert!(
        text.find("{{context}}") < text.find("{{memory}}"),
        "context section should come before memory"
    );
}

#[test]
fn test_keyword_prompt_template_vars() {
    let text = fs::read_to_string("config/prompts/keyword_extract.txt").unwrap();
    assert!(text.contains("{{query}}"), "keyword_extract.txt should contain {{query}} variable");
    assert!(!text.contains("{{context}}"), "keyword extraction sees the question only");
}

#[test]
fn test_shipped_dir_loads_as_override() {
    let from_dir = PromptTemplates::load(Some(std::path::Path::new("config/prompts"))).unwrap();
    let built_in = PromptTemplates::default();
    assert_eq!(
        from_dir.grounded("c", MemorySection::Empty, "q"),
        built_in.grounded("c", MemorySection::Empty, "q")
    );
    assert_eq!(from_dir.keywords("q"), built_in.keywords("q"));
}
