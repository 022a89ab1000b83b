//! Scripted classifier model.

use std::sync::atomic::{AtomicUsize, Ordering};

use agent_core::{async_trait, ClassifierModel, ClassifierPrompt, ModelError};
use tokio::sync::Mutex;

/// A classifier model that returns canned raw output.
///
/// Can be told to fail transiently for a number of attempts first, or to
/// fail forever. Every call counts as one attempt.
#[derive(Debug)]
pub struct ScriptedModel {
    raw_output: String,
    transient_failures: Option<usize>,
    attempts: AtomicUsize,
    last_prompt: Mutex<Option<ClassifierPrompt>>,
}

impl ScriptedModel {
    /// Always answer with `raw_output` verbatim.
    pub fn answering(raw_output: impl Into<String>) -> Self {
        Self {
            raw_output: raw_output.into(),
            transient_failures: Some(0),
            attempts: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Answer with a well-formed selection of `agent_id`.
    pub fn selecting(agent_id: &str) -> Self {
        Self::answering(
            serde_json::json!({ "selected_agent": agent_id, "confidence": 0.92 }).to_string(),
        )
    }

    /// Fail with [`ModelError::Unavailable`] for the first `failures` attempts.
    pub fn failing_transiently(mut self, failures: usize) -> Self {
        self.transient_failures = Some(failures);
        self
    }

    /// Fail with [`ModelError::Unavailable`] on every attempt.
    pub fn always_unavailable(mut self) -> Self {
        self.transient_failures = None;
        self
    }

    /// Number of times `raw_classify` has been called.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// The prompt seen by the most recent call.
    pub async fn last_prompt(&self) -> Option<ClassifierPrompt> {
        self.last_prompt.lock().await.clone()
    }
}

#[async_trait]
impl ClassifierModel for ScriptedModel {
    async fn raw_classify(&self, prompt: &ClassifierPrompt) -> Result<String, ModelError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_prompt.lock().await = Some(prompt.clone());

        match self.transient_failures {
            Some(failures) if attempt > failures => Ok(self.raw_output.clone()),
            _ => Err(ModelError::Unavailable(format!(
                "scripted model failure on attempt {}",
                attempt
            ))),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
