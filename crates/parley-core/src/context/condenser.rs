//! History condensing for bounded agent context.
//!
//! Long conversations grow the context sequence without bound. The
//! condenser replaces the oldest segment with a single summary entry
//! produced by a lightweight secondary completion, keeping the most
//! recent entries verbatim. It never fails: when the summarization call
//! errors, the older segment is simply discarded.

use tracing::{debug, warn};

use parley_types::agent::ContextEntry;
use parley_types::config::CondenserConfig;
use parley_types::llm::{CompletionRequest, LlmError, Message, MessageRole};

use crate::llm::box_provider::BoxLlmProvider;

/// System prompt for the summarization call.
const SUMMARY_SYSTEM_PROMPT: &str = "\
Summarize this conversation segment, focusing on:
- Key technical points and decisions
- Important context and requirements
- Action items and next steps
- Omit small talk, greetings, and casual conversation
Keep the summary concise but informative.";

/// Condenses an agent context sequence when it exceeds a length threshold.
///
/// Runs immediately before agent execution on the fully built sequence.
/// At or below `threshold` entries the sequence passes through unchanged;
/// above it, everything older than the `keep_recent` newest entries is
/// summarized into one synthetic entry spliced in front of them.
#[derive(Debug, Clone)]
pub struct HistoryCondenser {
    threshold: usize,
    keep_recent: usize,
    summarizer_model: Option<String>,
}

impl HistoryCondenser {
    pub fn new(threshold: usize, keep_recent: usize, summarizer_model: Option<String>) -> Self {
        Self {
            threshold,
            keep_recent,
            summarizer_model,
        }
    }

    pub fn from_config(config: &CondenserConfig) -> Self {
        Self::new(
            config.threshold,
            config.keep_recent,
            config.summarizer_model.clone(),
        )
    }

    /// Condense `entries`, using `provider` for the summarization call.
    ///
    /// `fallback_model` is used when no dedicated summarizer model is
    /// configured. Summarization failure falls back to truncation and is
    /// logged, never surfaced.
    #[tracing::instrument(
        name = "condense_history",
        skip(self, provider, entries),
        fields(entry_count = entries.len())
    )]
    pub async fn condense(
        &self,
        provider: &BoxLlmProvider,
        fallback_model: &str,
        entries: Vec<ContextEntry>,
    ) -> Vec<ContextEntry> {
        if entries.len() <= self.threshold {
            return entries;
        }

        let split = entries.len() - self.keep_recent;
        let (older, recent) = entries.split_at(split);

        match self.summarize(provider, fallback_model, older).await {
            Ok(summary) => {
                debug!(
                    condensed = older.len(),
                    kept = recent.len(),
                    "Condensed older context into a summary entry"
                );
                let mut condensed = Vec::with_capacity(recent.len() + 1);
                condensed.push(ContextEntry::summary(format!(
                    "[Conversation Summary: {summary}]"
                )));
                condensed.extend_from_slice(recent);
                condensed
            }
            Err(err) => {
                warn!(
                    error = %err,
                    discarded = older.len(),
                    "History summarization failed, truncating to recent entries"
                );
                recent.to_vec()
            }
        }
    }

    /// Summarize a context segment into concise text.
    async fn summarize(
        &self,
        provider: &BoxLlmProvider,
        fallback_model: &str,
        older: &[ContextEntry],
    ) -> Result<String, LlmError> {
        let conversation_text: String = older
            .iter()
            .map(|entry| format!("{}: {}", entry.role(), entry.content()))
            .collect::<Vec<_>>()
            .join("\n\n");

        let model = self
            .summarizer_model
            .as_deref()
            .unwrap_or(fallback_model)
            .to_string();

        let request = CompletionRequest {
            model,
            messages: vec![Message {
                role: MessageRole::User,
                content: format!(
                    "Please summarize the key points from this conversation segment:\n\n<conversation>\n{conversation_text}\n</conversation>"
                ),
            }],
            system: Some(SUMMARY_SYSTEM_PROMPT.to_string()),
            max_tokens: 1024,
            temperature: Some(0.0),
        };

        let response = provider.complete(&request).await?;
        Ok(response.content.trim().to_string())
    }
}

impl Default for HistoryCondenser {
    fn default() -> Self {
        Self::from_config(&CondenserConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::LlmProvider;
    use parley_types::llm::{CompletionResponse, Usage};
    use std::sync::Mutex;

    /// Provider that answers every completion with a fixed string and
    /// records the requests it saw.
    struct FixedProvider {
        reply: String,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl FixedProvider {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl LlmProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(CompletionResponse {
                content: self.reply.clone(),
                model: request.model.clone(),
                usage: Usage::default(),
            })
        }
    }

    /// Provider that fails every completion.
    struct FailingProvider;

    impl LlmProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            Err(LlmError::Overloaded("synthetic failure".to_string()))
        }
    }

    fn entries(n: usize) -> Vec<ContextEntry> {
        (0..n).map(|i| ContextEntry::user(format!("turn {i}"))).collect()
    }

    #[tokio::test]
    async fn test_at_threshold_passes_through_unchanged() {
        let condenser = HistoryCondenser::default();
        let provider = BoxLlmProvider::new(FixedProvider::new("unused"));
        let input = entries(10);
        let output = condenser.condense(&provider, "gpt-4o-mini", input.clone()).await;
        assert_eq!(output, input);
    }

    #[tokio::test]
    async fn test_below_threshold_passes_through_unchanged() {
        let condenser = HistoryCondenser::default();
        let provider = BoxLlmProvider::new(FixedProvider::new("unused"));
        let input = entries(3);
        let output = condenser.condense(&provider, "gpt-4o-mini", input.clone()).await;
        assert_eq!(output, input);
    }

    #[tokio::test]
    async fn test_over_threshold_yields_summary_plus_recent() {
        let condenser = HistoryCondenser::default();
        let provider = BoxLlmProvider::new(FixedProvider::new("they discussed the schema"));
        let input = entries(12);
        let output = condenser.condense(&provider, "gpt-4o-mini", input.clone()).await;

        assert_eq!(output.len(), 9);
        assert_eq!(
            output[0],
            ContextEntry::summary("[Conversation Summary: they discussed the schema]")
        );
        // The last 8 entries are the input's tail, verbatim.
        assert_eq!(&output[1..], &input[4..]);
    }

    #[tokio::test]
    async fn test_failure_truncates_to_recent() {
        let condenser = HistoryCondenser::default();
        let provider = BoxLlmProvider::new(FailingProvider);
        let input = entries(15);
        let output = condenser.condense(&provider, "gpt-4o-mini", input.clone()).await;

        assert_eq!(output.len(), 8);
        assert_eq!(&output[..], &input[7..]);
    }

    /// BoxLlmProvider takes ownership; this wrapper keeps an inspectable
    /// handle on the underlying provider.
    struct Shared(std::sync::Arc<FixedProvider>);

    impl LlmProvider for Shared {
        fn name(&self) -> &str {
            self.0.name()
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.0.complete(request).await
        }
    }

    #[tokio::test]
    async fn test_summarizer_model_override() {
        let condenser = HistoryCondenser::new(10, 8, Some("gpt-4o-mini".to_string()));
        let provider = std::sync::Arc::new(FixedProvider::new("summary"));
        let boxed = BoxLlmProvider::new(Shared(provider.clone()));

        let _ = condenser.condense(&boxed, "gpt-4o", entries(11)).await;

        let seen = provider.requests.lock().unwrap();
        assert_eq!(seen.len(), 1);
        // The configured summarizer model wins over the bot's model.
        assert_eq!(seen[0].model, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_summary_request_uses_distinct_system_prompt() {
        let condenser = HistoryCondenser::new(2, 1, None);
        let provider = std::sync::Arc::new(FixedProvider::new("short summary"));
        let boxed = BoxLlmProvider::new(Shared(provider.clone()));
        let output = condenser.condense(&boxed, "gpt-4o-mini", entries(3)).await;
        assert_eq!(output.len(), 2);

        let seen = provider.requests.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let request = &seen[0];
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.max_tokens, 1024);
        assert_eq!(request.temperature, Some(0.0));
        let system = request.system.as_deref().unwrap();
        assert!(system.contains("technical points"));
        assert!(system.contains("Action items"));
        assert!(system.contains("Omit small talk"));
        assert!(request.messages[0].content.contains("turn 0"));
        assert!(request.messages[0].content.contains("turn 1"));
        // The kept entry is not part of the summarized segment.
        assert!(!request.messages[0].content.contains("turn 2"));
    }
}
