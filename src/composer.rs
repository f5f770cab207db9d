//! Grounded answer composition.
//!
//! Assembles a prompt from retrieved chunk texts and a persona preamble,
//! makes one chat call, and records the exchange in the caller's
//! session. A summarization pass with a plain-language persona and a
//! quiz generator are separate composable steps over the same grounding
//! context.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::integrations::OpenAIClient;
use crate::retriever::Retriever;
use crate::scope::QueryScope;
use crate::session::ChatSession;

/// Separator between chunks in the context block.
const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

const ANSWER_PERSONA: &str = "You are a helpful educational and informational assistant. \
    Answer concisely and supportively; when relevant, indicate which part of the provided \
    context supports your answer. Always use simple language so that students, parents, or \
    non-technical people can easily understand.";

const SIMPLIFY_PERSONA: &str = "You are an educational advisor. Rewrite the response below \
    as a clear, concise summary that a high school student or their parents can follow, \
    avoiding technical terms wherever possible.";

const QUIZ_PERSONA: &str = "You are an exam author. Using only the provided context, write \
    multiple choice questions. Reply with a JSON array only, no prose: each element has the \
    fields \"question\", \"options\" (four strings) and \"answer\" (the correct option).";

/// Number of grounding chunks used for quiz generation.
const QUIZ_CONTEXT_CHUNKS: u64 = 8;

/// A generated multiple-choice question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

/// Composes grounded answers from retrieved context.
pub struct AnswerComposer {
    llm: OpenAIClient,
    retriever: Retriever,
    model: String,
    default_top_k: u64,
}

impl AnswerComposer {
    pub fn new(
        llm: OpenAIClient,
        retriever: Retriever,
        model: impl Into<String>,
        default_top_k: u64,
    ) -> Self {
        Self {
            llm,
            retriever,
            model: model.into(),
            default_top_k,
        }
    }

    /// Answer `question` using retrieved context, appending the exchange
    /// to `session`.
    ///
    /// Empty retrieval is not short-circuited: the model is still asked,
    /// with an empty context section, so it can say what it knows (or
    /// that it found nothing).
    pub async fn answer(
        &self,
        question: &str,
        scope: &QueryScope,
        session: &mut ChatSession,
    ) -> Result<String> {
        let top_k = scope.top_k.unwrap_or(self.default_top_k);
        let chunks = self.retriever.retrieve(question, top_k, scope).await?;
        debug!("Composing answer from {} context chunks", chunks.len());

        let context = chunks.join(CONTEXT_SEPARATOR);
        let prompt = format!(
            "CONTEXT:\n{}\n\nQUESTION: {}\n\nAnswer:",
            context, question
        );

        let answer = self.llm.generate(ANSWER_PERSONA, &prompt, &self.model).await?;
        session.push(question, answer.clone());
        Ok(answer)
    }

    /// Rewrite a raw answer into a simplified register.
    pub async fn simplify(&self, answer: &str) -> Result<String> {
        let prompt = format!("Response:\n{}\n\nSummary:", answer);
        let summary = self
            .llm
            .generate(SIMPLIFY_PERSONA, &prompt, &self.model)
            .await?;
        Ok(summary.trim().to_string())
    }

    /// Generate `num_questions` multiple-choice questions grounded in the
    /// scope's documents.
    pub async fn generate_quiz(
        &self,
        scope: &QueryScope,
        num_questions: usize,
    ) -> Result<Vec<QuizQuestion>> {
        let top_k = scope.top_k.unwrap_or(QUIZ_CONTEXT_CHUNKS);
        let chunks = self
            .retriever
            .retrieve("key facts and definitions", top_k, scope)
            .await?;

        let context = chunks.join(CONTEXT_SEPARATOR);
        let prompt = format!(
            "CONTEXT:\n{}\n\nWrite exactly {} questions.",
            context, num_questions
        );

        let raw = self.llm.generate(QUIZ_PERSONA, &prompt, &self.model).await?;
        let mut questions = parse_quiz(&raw)?;
        questions.truncate(num_questions);
        Ok(questions)
    }
}

/// Parse the model's quiz reply, tolerating Markdown code fences.
fn parse_quiz(raw: &str) -> Result<Vec<QuizQuestion>> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(body)
        .map_err(|e| Error::Generation(format!("quiz reply was not valid JSON: {}", e)))
}
