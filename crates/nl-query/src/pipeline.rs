//! Question Answering Pipeline

use crate::model::LanguageModel;
use crate::profile::QueryProfile;
use crate::prompt::answer_prompt;
use crate::translator::Translator;
use crate::PipelineError;
use graph_store::{GraphStore, Params, Record};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Answer used when the query matched nothing
const NO_RESULTS_ANSWER: &str = "No se encontró información en la base de conocimiento para esa pregunta.";

/// Everything produced while answering a question
#[derive(Debug, Clone, Serialize)]
pub struct QaOutcome {
    pub question: String,
    /// Generated graph query
    pub query: String,
    /// Raw rows returned by the graph store
    pub rows: Vec<Record>,
    /// Natural-language answer, when answer synthesis is enabled
    pub answer: Option<String>,
}

/// Question → query → rows → answer
pub struct QaPipeline {
    profile: QueryProfile,
    translator: Arc<dyn Translator>,
    store: Arc<dyn GraphStore>,
    answer_model: Option<Arc<dyn LanguageModel>>,
}

impl QaPipeline {
    pub fn new(profile: QueryProfile, translator: Arc<dyn Translator>, store: Arc<dyn GraphStore>) -> Self {
        Self {
            profile,
            translator,
            store,
            answer_model: None,
        }
    }

    /// Phrase results through `model` after each query
    pub fn with_answers(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.answer_model = Some(model);
        self
    }

    pub fn profile(&self) -> &QueryProfile {
        &self.profile
    }

    /// Answer a question. Collaborator failures are returned as-is, never
    /// retried.
    pub async fn ask(&self, question: &str) -> Result<QaOutcome, PipelineError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(PipelineError::EmptyQuestion);
        }

        info!("[{}] Question: {}", self.profile.name, question);

        let query = self
            .translator
            .translate(question, &self.profile.schema, &self.profile.examples)
            .await?;

        let rows = match self.store.execute(&query, Params::new()).await {
            Ok(rows) => rows,
            Err(source) => {
                warn!("[{}] Generated query failed: {}", self.profile.name, source);
                return Err(PipelineError::Query { source, query });
            }
        };

        let answer = match &self.answer_model {
            Some(_) if rows.is_empty() => Some(NO_RESULTS_ANSWER.to_string()),
            Some(model) => match model.generate(&answer_prompt(question, &rows)).await {
                Ok(text) => Some(text.trim().to_string()),
                Err(source) => return Err(PipelineError::Answer { source, query }),
            },
            None => None,
        };

        info!("[{}] {} rows", self.profile.name, rows.len());

        Ok(QaOutcome {
            question: question.to_string(),
            query,
            rows,
            answer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TranslationError;
    use async_trait::async_trait;
    use graph_store::MockGraphStore;
    use serde_json::json;

    struct FixedTranslator(Result<String, TranslationError>);

    #[async_trait]
    impl Translator for FixedTranslator {
        async fn translate(&self, _: &str, _: &str, _: &str) -> Result<String, TranslationError> {
            self.0.clone()
        }
    }

    struct EchoModel;

    #[async_trait]
    impl LanguageModel for EchoModel {
        async fn generate(&self, _prompt: &str) -> Result<String, TranslationError> {
            Ok(" El paciente presenta Dolor. ".to_string())
        }
    }

    fn pipeline(translated: Result<String, TranslationError>, store: MockGraphStore) -> QaPipeline {
        QaPipeline::new(
            QueryProfile::clinical(),
            Arc::new(FixedTranslator(translated)),
            Arc::new(store),
        )
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let p = pipeline(Ok("MATCH (n) RETURN n".to_string()), MockGraphStore::new());
        assert!(matches!(p.ask("   ").await, Err(PipelineError::EmptyQuestion)));
    }

    #[tokio::test]
    async fn test_rows_and_answer() {
        let store = MockGraphStore::new().on("PRESENTA_SINTOMA", vec![json!({"sintoma": "Dolor"})]);
        let p = pipeline(
            Ok("MATCH (p:Paciente)-[:PRESENTA_SINTOMA]->(s) RETURN s.nombre AS sintoma".to_string()),
            store,
        )
        .with_answers(Arc::new(EchoModel));

        let outcome = p.ask("¿Qué síntomas presenta?").await.unwrap();
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.answer.as_deref(), Some("El paciente presenta Dolor."));
    }

    #[tokio::test]
    async fn test_no_rows_answer() {
        let p = pipeline(Ok("MATCH (n:Nada) RETURN n".to_string()), MockGraphStore::new())
            .with_answers(Arc::new(EchoModel));
        let outcome = p.ask("¿Algo?").await.unwrap();
        assert_eq!(outcome.answer.as_deref(), Some(NO_RESULTS_ANSWER));
    }

    #[tokio::test]
    async fn test_query_failure_keeps_generated_query() {
        let store = MockGraphStore::new().fail_on("m.tipo", "Neo.ClientError.Statement.SyntaxError", "Unknown property");
        let p = pipeline(Ok("MATCH (m:Monitoreo) RETURN m.tipo".to_string()), store);

        let err = p.ask("¿Qué monitoreos hay?").await.unwrap_err();
        assert_eq!(err.query(), Some("MATCH (m:Monitoreo) RETURN m.tipo"));
        assert!(err.to_string().contains("Unknown property"));
    }

    #[tokio::test]
    async fn test_translation_failure_propagates() {
        let p = pipeline(
            Err(TranslationError::Connection("refused".to_string())),
            MockGraphStore::new(),
        );
        let err = p.ask("¿Qué?").await.unwrap_err();
        assert!(matches!(err, PipelineError::Translation(TranslationError::Connection(_))));
        assert!(err.query().is_none());
    }
}
