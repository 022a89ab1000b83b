//! Classifier model collaborator.

use async_trait::async_trait;

use crate::error::ModelError;

/// A fully rendered classification prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierPrompt {
    /// Instructions plus the agent catalogue.
    pub system: String,
    /// Conversation context and the utterance to classify.
    pub user: String,
}

/// The raw model call behind classification.
///
/// Implementations return the model's text verbatim; parsing it into an
/// agent id is the classifier's job.
#[async_trait]
pub trait ClassifierModel: Send + Sync {
    async fn raw_classify(&self, prompt: &ClassifierPrompt) -> Result<String, ModelError>;

    /// Model identifier for logs.
    fn model_name(&self) -> &str;
}
