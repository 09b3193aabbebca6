//! Natural-Language Graph Queries
//!
//! Question → (language model) → graph query → (graph store) → rows →
//! optional natural-language answer. Schema text and few-shot examples are
//! passed in through [`QueryProfile`] at construction time.

mod error;
mod model;
mod pipeline;
mod profile;
mod prompt;
mod translator;

pub use error::{PipelineError, TranslationError};
pub use model::{LanguageModel, ModelConfig, OllamaModel};
pub use pipeline::{QaOutcome, QaPipeline};
pub use profile::QueryProfile;
pub use prompt::{answer_prompt, clean_query_output, translation_prompt};
pub use translator::{LlmTranslator, Translator};
