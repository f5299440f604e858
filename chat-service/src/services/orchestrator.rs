//! Query orchestration: search, prompt, generate, and degrade to the keyword
//! responder when any hosted call fails.

use crate::services::gateways::{
    DiscoveryGateway, GatewayError, GenerationGateway, GenerationParams,
};
use crate::services::{metrics, responder};
use std::sync::Arc;

pub const NOT_CONFIGURED: &str =
    "The document search service is not configured. Please contact the administrator.";
pub const NO_RELEVANT_INFORMATION: &str =
    "I couldn't find relevant information in the document to answer your question.";

/// Number of ranked results requested from discovery.
pub const SEARCH_RESULT_COUNT: u32 = 3;
/// Maximum snippet length, in characters, embedded in the prompt.
pub const SNIPPET_MAX_CHARS: usize = 500;

const ANSWER_PREFIX: &str = "Based on the document, here's what I found: ";

/// Where in the pipeline a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSite {
    Search,
    Snippet,
    Generation,
}

/// How a chat answer was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    Generated(String),
    NoResults,
    NotConfigured,
    Fallback { site: FailureSite, answer: String },
}

impl ChatOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ChatOutcome::Generated(_) => "generated",
            ChatOutcome::NoResults => "no_results",
            ChatOutcome::NotConfigured => "not_configured",
            ChatOutcome::Fallback { .. } => "fallback",
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ChatOutcome::Generated(text) => text,
            ChatOutcome::NoResults => NO_RELEVANT_INFORMATION.to_string(),
            ChatOutcome::NotConfigured => NOT_CONFIGURED.to_string(),
            ChatOutcome::Fallback { answer, .. } => answer,
        }
    }
}

/// Composes the discovery and generation gateways.
#[derive(Clone)]
pub struct Orchestrator {
    discovery: Option<Arc<dyn DiscoveryGateway>>,
    generation: Option<Arc<dyn GenerationGateway>>,
}

enum PipelineResult {
    Answer(String),
    NoResults,
}

impl Orchestrator {
    pub fn new(
        discovery: Option<Arc<dyn DiscoveryGateway>>,
        generation: Option<Arc<dyn GenerationGateway>>,
    ) -> Self {
        Self {
            discovery,
            generation,
        }
    }

    /// Answer `query` about `document_name`.
    pub async fn answer(&self, query: &str, document_name: &str) -> String {
        self.run(query, document_name).await.into_text()
    }

    /// Answer and report which path produced the text.
    pub async fn run(&self, query: &str, document_name: &str) -> ChatOutcome {
        let outcome = match &self.discovery {
            None => ChatOutcome::NotConfigured,
            Some(discovery) => match self.pipeline(discovery.as_ref(), query).await {
                Ok(PipelineResult::Answer(text)) => ChatOutcome::Generated(text),
                Ok(PipelineResult::NoResults) => ChatOutcome::NoResults,
                Err((site, err)) => {
                    tracing::warn!(
                        site = ?site,
                        error = %err,
                        "Hosted pipeline failed; answering from keywords"
                    );
                    ChatOutcome::Fallback {
                        site,
                        answer: responder::respond(query, document_name),
                    }
                }
            },
        };

        metrics::record_chat_response(outcome.label());
        outcome
    }

    async fn pipeline(
        &self,
        discovery: &dyn DiscoveryGateway,
        query: &str,
    ) -> Result<PipelineResult, (FailureSite, GatewayError)> {
        let results = discovery
            .query(query, SEARCH_RESULT_COUNT)
            .await
            .map_err(|e| (FailureSite::Search, e))?;

        let Some(top) = results.into_iter().next() else {
            return Ok(PipelineResult::NoResults);
        };

        let text = top.text.ok_or_else(|| {
            (
                FailureSite::Snippet,
                GatewayError::MalformedResponse(format!(
                    "result {} carries no text",
                    top.document_id
                )),
            )
        })?;

        let prompt = build_prompt(&truncate_snippet(&text), query);

        let generation = self.generation.as_ref().ok_or_else(|| {
            (
                FailureSite::Generation,
                GatewayError::NotConfigured("generation credentials not set".to_string()),
            )
        })?;

        let outputs = generation
            .generate(&prompt, &GenerationParams::default())
            .await
            .map_err(|e| (FailureSite::Generation, e))?;

        let generated = outputs.into_iter().next().ok_or_else(|| {
            (
                FailureSite::Generation,
                GatewayError::MalformedResponse("no generated text".to_string()),
            )
        })?;

        Ok(PipelineResult::Answer(format!("{}{}", ANSWER_PREFIX, generated)))
    }
}

/// First [`SNIPPET_MAX_CHARS`] characters of `text`.
pub fn truncate_snippet(text: &str) -> String {
    text.chars().take(SNIPPET_MAX_CHARS).collect()
}

pub fn build_prompt(snippet: &str, query: &str) -> String {
    format!("Based on the following information: '{}', {}", snippet, query)
}
