//! Agent selection through a classifier model.

use std::env;
use std::path::Path;
use std::sync::Arc;

use agent_core::{
    hash_prompt, truncate_chars, AgentDescriptor, ClassifierModel, ClassifierPrompt,
    MessagePair, ModelError,
};
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::config::{LogToggles, OrchestratorConfig};
use crate::registry::AgentRegistry;

/// Default path for the classifier prompt file.
pub const DEFAULT_CLASSIFIER_PROMPT_FILE: &str = "CLASSIFIER_PROMPT.md";

/// Default classifier instructions (fallback if no file or env var).
///
/// The agent catalogue is appended to these instructions at request time.
pub const DEFAULT_CLASSIFIER_SYSTEM_PROMPT: &str = r#"You are an intent classifier. Pick the single agent best suited to handle the user's message.

Read the user's message together with the recent conversation. Follow-up messages such as "and tomorrow?" or "what about the other one?" usually belong to the agent that answered the previous turn.

Only choose an agent listed under "Available agents", using its exact id. If no agent fits, answer with "selected_agent": null.

Output JSON only, with no explanation:
{"selected_agent": "<agent id or null>", "confidence": <number between 0 and 1>}

The input format is:
[HISTORY: recent turns, oldest first, if any]
[MESSAGE: the user's new message]"#;

/// Load the classifier instructions.
///
/// Priority:
/// 1. `CLASSIFIER_SYSTEM_PROMPT` env var (if set)
/// 2. Contents of prompt file (`CLASSIFIER_PROMPT_FILE` or default `CLASSIFIER_PROMPT.md`)
/// 3. Embedded default prompt
pub fn load_classifier_prompt() -> String {
    if let Ok(prompt) = env::var("CLASSIFIER_SYSTEM_PROMPT") {
        info!("Using classifier prompt from CLASSIFIER_SYSTEM_PROMPT env var");
        return prompt;
    }

    let prompt_file = env::var("CLASSIFIER_PROMPT_FILE")
        .unwrap_or_else(|_| DEFAULT_CLASSIFIER_PROMPT_FILE.to_string());

    if let Some(prompt) = load_prompt_file(&prompt_file) {
        info!("Loaded classifier prompt from {}", prompt_file);
        return prompt;
    }

    info!("Using embedded default classifier prompt");
    DEFAULT_CLASSIFIER_SYSTEM_PROMPT.to_string()
}

/// Load a prompt file, returning None if not found or empty.
fn load_prompt_file(path: impl AsRef<Path>) -> Option<String> {
    match std::fs::read_to_string(path.as_ref()) {
        Ok(content) => {
            let trimmed = content.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Err(_) => None,
    }
}

/// Outcome of one classification. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    /// A registered agent id, or `None` when the output named nothing usable.
    pub selected_agent_id: Option<String>,
    /// Model-reported confidence, if any.
    pub confidence: Option<f64>,
    /// The model's text verbatim.
    pub raw_output: String,
    /// Set by the orchestrator when the default agent was used instead.
    pub used_fallback: bool,
}

/// Picks an agent for an utterance.
///
/// Stateless: every call renders a fresh prompt from the registry, the
/// supplied history, and the utterance.
pub struct Classifier {
    model: Arc<dyn ClassifierModel>,
    instructions: String,
    prompt_hash: String,
    history_pairs: usize,
    history_chars: usize,
    logging: LogToggles,
}

impl Classifier {
    /// Create a classifier with the given model and instructions.
    pub fn new(model: Arc<dyn ClassifierModel>, instructions: impl Into<String>) -> Self {
        let instructions = instructions.into();
        let prompt_hash = hash_prompt(&instructions);
        info!(
            model = model.model_name(),
            "Classifier prompt fingerprint: {}", prompt_hash
        );

        let defaults = OrchestratorConfig::default();
        Self {
            model,
            instructions,
            prompt_hash,
            history_pairs: defaults.classifier_history_pairs,
            history_chars: defaults.classifier_history_chars,
            logging: LogToggles::default(),
        }
    }

    /// Create a classifier using the history budget and logging switches of `config`.
    pub fn configured(
        model: Arc<dyn ClassifierModel>,
        instructions: impl Into<String>,
        config: &OrchestratorConfig,
    ) -> Self {
        Self::new(model, instructions)
            .with_history_budget(config.classifier_history_pairs, config.classifier_history_chars)
            .with_logging(config.logging)
    }

    /// Limit the history shown to the model.
    pub fn with_history_budget(mut self, max_pairs: usize, max_chars: usize) -> Self {
        self.history_pairs = max_pairs;
        self.history_chars = max_chars;
        self
    }

    pub fn with_logging(mut self, logging: LogToggles) -> Self {
        self.logging = logging;
        self
    }

    /// Get the instructions fingerprint.
    pub fn prompt_hash(&self) -> &str {
        &self.prompt_hash
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Classify `utterance`.
    ///
    /// Unusable model output is not an error: it yields a result with no
    /// selected agent. Only model call failures are returned as errors.
    pub async fn classify(
        &self,
        utterance: &str,
        history: &[MessagePair],
        registry: &AgentRegistry,
    ) -> Result<ClassificationResult, ModelError> {
        let prompt = self.build_prompt(utterance, history, registry);

        if self.logging.classifier_chat {
            info!(system = %prompt.system, user = %prompt.user, "CLASSIFIER_INPUT");
        } else {
            trace!(system = %prompt.system, user = %prompt.user, "CLASSIFIER_INPUT");
        }

        let raw_output = self.model.raw_classify(&prompt).await?;

        if self.logging.classifier_raw_output {
            info!(raw_output = %raw_output, "CLASSIFIER_RAW_OUTPUT");
        } else {
            trace!(raw_output = %raw_output, "CLASSIFIER_RAW_OUTPUT");
        }

        let (selected_agent_id, confidence) = Self::parse_selection(&raw_output, registry);
        if selected_agent_id.is_none() {
            warn!(raw_output = %raw_output, "CLASSIFIER_NO_SELECTION");
        }

        let result = ClassificationResult {
            selected_agent_id,
            confidence,
            raw_output,
            used_fallback: false,
        };

        if self.logging.classifier_output {
            info!(selected = ?result.selected_agent_id, confidence = ?result.confidence, "CLASSIFIER_OUTPUT");
        } else {
            debug!(selected = ?result.selected_agent_id, confidence = ?result.confidence, "CLASSIFIER_OUTPUT");
        }

        Ok(result)
    }

    /// Render the prompt for one request.
    pub fn build_prompt(
        &self,
        utterance: &str,
        history: &[MessagePair],
        registry: &AgentRegistry,
    ) -> ClassifierPrompt {
        let system = format!(
            "{}\n\nAvailable agents:\n{}",
            self.instructions,
            Self::format_catalogue(&registry.list())
        );
        let history_text = Self::format_history(history, self.history_pairs, self.history_chars);
        ClassifierPrompt {
            system,
            user: Self::format_classifier_input(utterance, &history_text),
        }
    }

    /// One block per agent: id, name, description.
    pub fn format_catalogue(agents: &[&AgentDescriptor]) -> String {
        agents
            .iter()
            .map(|agent| {
                format!(
                    "- id: {}\n  name: {}\n  description: {}",
                    agent.id, agent.name, agent.description
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Render the most recent `max_pairs` pairs, oldest first, within `max_chars`.
    ///
    /// Whole pairs are dropped from the old end until the rest fits. If even
    /// the newest pair is over budget, its tail is kept.
    pub fn format_history(history: &[MessagePair], max_pairs: usize, max_chars: usize) -> String {
        if max_pairs == 0 || max_chars == 0 {
            return String::new();
        }

        let start = history.len().saturating_sub(max_pairs);
        let mut kept: Vec<String> = Vec::new();
        let mut used = 0;

        for pair in history[start..].iter().rev() {
            let rendered = format!(
                "user: {}\n{}: {}",
                pair.user_text(),
                pair.agent_id(),
                pair.agent_text()
            );
            let cost = rendered.chars().count() + usize::from(!kept.is_empty());
            if used + cost > max_chars {
                if kept.is_empty() {
                    kept.push(truncate_chars(&rendered, max_chars).to_string());
                }
                break;
            }
            used += cost;
            kept.push(rendered);
        }

        kept.reverse();
        kept.join("\n")
    }

    /// Format the user part of the prompt.
    pub fn format_classifier_input(utterance: &str, history: &str) -> String {
        let mut parts = Vec::new();
        if !history.is_empty() {
            parts.push(format!("[HISTORY:\n{}]", history));
        }
        parts.push(format!("[MESSAGE: {}]", utterance));
        parts.join("\n")
    }

    /// Extract a registered agent id and confidence from raw model output.
    ///
    /// Accepts a JSON object (possibly fenced or followed by junk) with a
    /// `selected_agent` field, or a bare agent id or name.
    pub fn parse_selection(raw: &str, registry: &AgentRegistry) -> (Option<String>, Option<f64>) {
        let json = Self::extract_json(raw);

        if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(json) {
            let candidate = ["selected_agent", "selectedAgent", "agent_id", "agent"]
                .iter()
                .find_map(|key| fields.get(*key).and_then(Value::as_str));
            let confidence = fields.get("confidence").and_then(|value| {
                value
                    .as_f64()
                    .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
            });
            let selected = candidate.and_then(|c| Self::resolve_candidate(c, registry));
            return (selected, confidence);
        }

        let bare = raw
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '.')
            .trim();
        (Self::resolve_candidate(bare, registry), None)
    }

    fn resolve_candidate(candidate: &str, registry: &AgentRegistry) -> Option<String> {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return None;
        }
        registry
            .find(candidate)
            .or_else(|| registry.find_by_name(candidate))
            .map(|agent| agent.id().to_string())
    }

    /// Extract JSON from a response that may contain markdown or other text.
    fn extract_json(response: &str) -> &str {
        let trimmed = response.trim();

        if trimmed.starts_with('{') {
            return Self::extract_balanced_json(trimmed);
        }

        if let Some(start) = trimmed.find("```json") {
            let json_start = start + 7;
            if let Some(end) = trimmed[json_start..].find("```") {
                let extracted = trimmed[json_start..json_start + end].trim();
                return Self::extract_balanced_json(extracted);
            }
        }

        if let Some(start) = trimmed.find("```") {
            let after_backticks = &trimmed[start + 3..];
            // Skip optional language identifier
            let json_start = after_backticks.find('\n').map(|i| i + 1).unwrap_or(0);
            if let Some(end) = after_backticks[json_start..].find("```") {
                let extracted = after_backticks[json_start..json_start + end].trim();
                return Self::extract_balanced_json(extracted);
            }
        }

        if let Some(start) = trimmed.find('{') {
            return Self::extract_balanced_json(&trimmed[start..]);
        }

        trimmed
    }

    /// Cut a string starting with '{' at its matching closing brace.
    ///
    /// Models sometimes emit extra closing braces or commentary after the object.
    fn extract_balanced_json(s: &str) -> &str {
        if !s.starts_with('{') {
            return s;
        }

        let mut depth = 0;
        let mut in_string = false;
        let mut escape_next = false;

        for (i, ch) in s.char_indices() {
            if escape_next {
                escape_next = false;
                continue;
            }

            match ch {
                '\\' if in_string => escape_next = true,
                '"' => in_string = !in_string,
                '{' if !in_string => depth += 1,
                '}' if !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        return &s[..=i];
                    }
                }
                _ => {}
            }
        }

        s
    }
}
