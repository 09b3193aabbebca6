//! Question → Query Translation

use crate::model::LanguageModel;
use crate::prompt::{clean_query_output, translation_prompt};
use crate::TranslationError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Turns a natural-language question into one graph query
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, question: &str, schema: &str, examples: &str) -> Result<String, TranslationError>;
}

/// Translator backed by a language model
pub struct LlmTranslator {
    model: Arc<dyn LanguageModel>,
    instructions: Vec<String>,
}

impl LlmTranslator {
    pub fn new(model: Arc<dyn LanguageModel>, instructions: Vec<String>) -> Self {
        Self { model, instructions }
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    async fn translate(&self, question: &str, schema: &str, examples: &str) -> Result<String, TranslationError> {
        let prompt = translation_prompt(question, schema, examples, &self.instructions);
        debug!("Translation prompt:\n{}", prompt);

        let raw = self.model.generate(&prompt).await?;
        debug!("Raw model output:\n{}", raw);

        let query = clean_query_output(&raw);
        if query.is_empty() {
            return Err(TranslationError::EmptyOutput);
        }

        info!("Generated query: {}", query);
        Ok(query)
    }
}
