//! Prompt templates for vidmind.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub summary: SummaryPrompts,
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for transcript summaries, one per report variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    pub brief: String,
    pub detailed: String,
    pub breakdown: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            brief: r#"
You are an assistant that summarizes YouTube video transcripts.

Please provide a concise and informative summary of the following transcript:

{{transcript}}

Summary:
"#
            .to_string(),

            detailed: r#"
You are an AI assistant. Read the transcript of a YouTube video below and generate a detailed explanation that expands on all important points, examples, and logic used.

Transcript:
{{transcript}}

Detailed Explanation:
"#
            .to_string(),

            breakdown: r#"
Read the following YouTube video transcript and generate a time-aligned breakdown of key sections. Format it as:

[00:00] Introduction: ...
[01:15] Key Concept 1: ...
[03:45] Example and Use Case: ...
...

Transcript:
{{transcript}}
"#
            .to_string(),
        }
    }
}

/// Prompts for question answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    /// User turn for chat answers.
    pub question: String,
    /// Single prompt for the completion backend.
    pub completion: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            question: "Context:\n{{context}}\n\nQuestion: {{question}}".to_string(),

            completion: r#"
You are a helpful assistant. Based on the following context, answer the question:

Context:
{{context}}

Question:
{{question}}

Answer:
"#
            .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.summary.brief.contains("{{transcript}}"));
        assert!(prompts.summary.breakdown.contains("[00:00] Introduction"));
        assert!(prompts.rag.question.contains("{{context}}"));
    }

    #[test]
    fn test_render_template() {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), "ctx".to_string());
        vars.insert("question".to_string(), "why?".to_string());

        let result = Prompts::render(&RagPrompts::default().question, &vars);
        assert_eq!(result, "Context:\nctx\n\nQuestion: why?");
    }

    #[test]
    fn test_custom_variables_are_overridden_by_call_vars() {
        let mut custom = HashMap::new();
        custom.insert("audience".to_string(), "students".to_string());
        custom.insert("question".to_string(), "ignored".to_string());
        let prompts = Prompts::load(None, Some(&custom)).unwrap();

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "kept".to_string());
        let out = prompts.render_with_custom("{{audience}}: {{question}}", &vars);
        assert_eq!(out, "students: kept");
    }

    #[test]
    fn test_load_overrides_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("summary.toml"),
            "brief = \"Short: {{transcript}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.summary.brief, "Short: {{transcript}}");
        // Unlisted fields keep their defaults
        assert!(prompts.summary.detailed.contains("Detailed Explanation"));
    }
}
