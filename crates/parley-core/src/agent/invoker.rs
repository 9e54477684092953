//! Agent invocation with per-bot caching and graceful degradation.
//!
//! Agents are cached per (bot id, model name) for the life of the process.
//! A bot whose provider cannot be constructed is cached as unavailable and
//! answers with a templated placeholder; execution failures produce an
//! apology naming the bot. `respond` therefore always returns text --
//! a triggered turn is never dropped and never propagates a provider error
//! to the conversation.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, error, warn};

use parley_types::agent::ContextEntry;
use parley_types::bot::BotConfig;
use parley_types::config::AgentConfig;
use parley_types::error::BotError;
use parley_types::id::BotId;
use parley_types::llm::{CompletionRequest, LlmError, Message};

use crate::context::condenser::HistoryCondenser;
use crate::llm::box_provider::BoxLlmProvider;

/// Constructs a provider from a materialized bot configuration.
///
/// Implemented in parley-infra, where the per-provider client wiring
/// lives. Configuration errors (missing credentials, malformed provider
/// config) surface here and degrade the agent to unavailable.
pub trait ProviderFactory: Send + Sync {
    fn construct(&self, config: &BotConfig) -> Result<BoxLlmProvider, BotError>;
}

/// Cache key: one agent per bot identity and model.
type AgentKey = (BotId, String);

/// A cached agent, ready or permanently degraded for this process.
enum AgentSlot {
    Ready(BoxLlmProvider),
    Unavailable,
}

/// Gets or creates cached agents and executes them against built context.
pub struct AgentInvoker<F> {
    factory: F,
    condenser: HistoryCondenser,
    config: AgentConfig,
    agents: DashMap<AgentKey, Arc<AgentSlot>>,
    /// Insertion order for eviction when `max_cached_agents` is set.
    insertion_order: Mutex<VecDeque<AgentKey>>,
}

impl<F: ProviderFactory> AgentInvoker<F> {
    pub fn new(factory: F, condenser: HistoryCondenser, config: AgentConfig) -> Self {
        Self {
            factory,
            condenser,
            config,
            agents: DashMap::new(),
            insertion_order: Mutex::new(VecDeque::new()),
        }
    }

    /// Generate a response for `bot` from the built context sequence.
    ///
    /// The last entry is the current turn; everything before it is
    /// history. The condenser runs on the full sequence immediately
    /// before execution. Always returns text.
    #[tracing::instrument(
        name = "agent_respond",
        skip(self, bot, context),
        fields(bot = %bot.name, model = %bot.model, entries = context.len())
    )]
    pub async fn respond(&self, bot: &BotConfig, context: Vec<ContextEntry>) -> String {
        let slot = self.get_or_construct(bot);

        let provider = match slot.as_ref() {
            AgentSlot::Ready(provider) => provider,
            AgentSlot::Unavailable => {
                debug!(bot = %bot.name, "Agent unavailable, using placeholder reply");
                return placeholder_reply(bot, &context);
            }
        };

        let context = self
            .condenser
            .condense(provider, &bot.model, context)
            .await;

        if context.is_empty() {
            return apology_reply(bot);
        }

        let request = build_request(bot, &context);
        match self.execute(provider, &request).await {
            Ok(content) => content,
            Err(err) => {
                warn!(bot = %bot.name, error = %err, "Agent execution failed, sending apology");
                apology_reply(bot)
            }
        }
    }

    /// Execute a completion with the configured deadline and bounded
    /// retry on transient errors.
    async fn execute(
        &self,
        provider: &BoxLlmProvider,
        request: &CompletionRequest,
    ) -> Result<String, LlmError> {
        let deadline = Duration::from_secs(self.config.request_timeout_secs);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let err = match tokio::time::timeout(deadline, provider.complete(request)).await {
                Ok(Ok(response)) if !response.content.trim().is_empty() => {
                    return Ok(response.content);
                }
                Ok(Ok(_)) => LlmError::Deserialization("provider returned empty content".into()),
                Ok(Err(err)) => err,
                Err(_) => LlmError::Timeout(self.config.request_timeout_secs),
            };

            if attempt >= self.config.max_attempts || !err.is_transient() {
                return Err(err);
            }
            debug!(attempt, error = %err, "Transient provider error, retrying");
        }
    }

    /// Look up or construct the cached agent for a bot.
    ///
    /// Construction is serialized per key by the map's entry lock, so
    /// concurrent first access constructs at most one agent and the first
    /// write wins. A failed construction is cached as unavailable until
    /// process restart.
    fn get_or_construct(&self, bot: &BotConfig) -> Arc<AgentSlot> {
        let key = (bot.bot_id, bot.model.clone());

        if let Some(slot) = self.agents.get(&key) {
            return slot.clone();
        }

        match self.agents.entry(key.clone()) {
            Entry::Occupied(occupied) => occupied.get().clone(),
            Entry::Vacant(vacant) => {
                let slot = match self.factory.construct(bot) {
                    Ok(provider) => {
                        debug!(bot = %bot.name, model = %bot.model, "Constructed agent");
                        Arc::new(AgentSlot::Ready(provider))
                    }
                    Err(err) => {
                        error!(
                            bot = %bot.name,
                            error = %err,
                            "Agent construction failed, caching as unavailable"
                        );
                        Arc::new(AgentSlot::Unavailable)
                    }
                };
                vacant.insert(slot.clone());
                self.record_insertion(key);
                slot
            }
        }
    }

    /// Track insertion order and evict the oldest entries past capacity.
    fn record_insertion(&self, key: AgentKey) {
        let mut order = self
            .insertion_order
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        order.push_back(key);

        if let Some(capacity) = self.config.max_cached_agents {
            while order.len() > capacity {
                if let Some(evicted) = order.pop_front() {
                    self.agents.remove(&evicted);
                    debug!(bot = %evicted.0, model = %evicted.1, "Evicted cached agent");
                }
            }
        }
    }

    /// Number of currently cached agents (ready or unavailable).
    pub fn cached_agents(&self) -> usize {
        self.agents.len()
    }
}

/// Map a condensed context onto a provider request.
///
/// Leading system entries ride in the request's dedicated system field;
/// the remainder becomes the message list with the last entry as the
/// current turn.
fn build_request(bot: &BotConfig, context: &[ContextEntry]) -> CompletionRequest {
    let leading_system = context
        .iter()
        .take_while(|entry| matches!(entry, ContextEntry::System { .. }))
        .count();

    let system = if leading_system > 0 {
        Some(
            context[..leading_system]
                .iter()
                .map(ContextEntry::content)
                .collect::<Vec<_>>()
                .join("\n\n"),
        )
    } else {
        None
    };

    let turns = &context[leading_system..];
    let (history, current) = match turns.len() {
        0 => (&[][..], &[][..]),
        n => turns.split_at(n - 1),
    };

    let messages = history
        .iter()
        .chain(current.iter())
        .map(|entry| Message {
            role: entry.role(),
            content: entry.content().to_string(),
        })
        .collect();

    CompletionRequest {
        model: bot.model.clone(),
        messages,
        system,
        max_tokens: bot.max_tokens,
        temperature: Some(bot.temperature),
    }
}

/// Templated reply when the agent could not be constructed.
fn placeholder_reply(bot: &BotConfig, context: &[ContextEntry]) -> String {
    let last_user_text = context
        .iter()
        .rev()
        .find(|entry| entry.is_request())
        .map(|entry| entry.content())
        .unwrap_or("something");
    format!(
        "I'm {}! I understand you said: '{}'. This is a placeholder response until AI integration is complete.",
        bot.display_name, last_user_text
    )
}

/// Apology when execution failed. Never carries the raw provider error.
fn apology_reply(bot: &BotConfig) -> String {
    format!(
        "I apologize -- {} couldn't generate a response just now. Please try again.",
        bot.display_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::LlmProvider;
    use parley_types::bot::ProviderKind;
    use parley_types::llm::{CompletionResponse, MessageRole, Usage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_bot(model: &str) -> BotConfig {
        BotConfig {
            bot_id: BotId::new(),
            name: "assistant_bot".to_string(),
            display_name: "Assistant".to_string(),
            model: model.to_string(),
            provider: ProviderKind::OpenAi,
            system_prompt: Some("You are helpful.".to_string()),
            temperature: 0.7,
            max_tokens: 1000,
            api_key: Some("sk-test".to_string()),
            api_base_url: None,
            extra: None,
        }
    }

    /// Provider that pops scripted outcomes per call; repeats the last
    /// outcome once the script runs dry. Records every request.
    struct ScriptedProvider {
        script: Mutex<VecDeque<Result<String, LlmError>>>,
        requests: Arc<Mutex<Vec<CompletionRequest>>>,
    }

    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.requests.lock().unwrap().push(request.clone());
            let outcome = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("default reply".to_string()));
            outcome.map(|content| CompletionResponse {
                content,
                model: request.model.clone(),
                usage: Usage::default(),
            })
        }
    }

    /// Factory that hands out scripted providers and counts constructions.
    struct ScriptedFactory {
        outcomes: Mutex<VecDeque<Result<Vec<Result<String, LlmError>>, BotError>>>,
        constructions: AtomicUsize,
        requests: Arc<Mutex<Vec<CompletionRequest>>>,
    }

    impl ScriptedFactory {
        fn new(outcomes: Vec<Result<Vec<Result<String, LlmError>>, BotError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                constructions: AtomicUsize::new(0),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn always_replying(reply: &str) -> Self {
            Self::new(vec![Ok(vec![Ok(reply.to_string())])])
        }
    }

    impl ProviderFactory for &ScriptedFactory {
        fn construct(&self, _config: &BotConfig) -> Result<BoxLlmProvider, BotError> {
            self.constructions.fetch_add(1, Ordering::SeqCst);
            let outcome = self
                .outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(vec![]));
            outcome.map(|script| {
                BoxLlmProvider::new(ScriptedProvider {
                    script: Mutex::new(script.into()),
                    requests: self.requests.clone(),
                })
            })
        }
    }

    fn invoker<'a>(
        factory: &'a ScriptedFactory,
        config: AgentConfig,
    ) -> AgentInvoker<&'a ScriptedFactory> {
        AgentInvoker::new(factory, HistoryCondenser::default(), config)
    }

    fn user_turns(n: usize) -> Vec<ContextEntry> {
        (0..n).map(|i| ContextEntry::user(format!("turn {i}"))).collect()
    }

    #[tokio::test]
    async fn test_successful_response() {
        let factory = ScriptedFactory::always_replying("hello from the model");
        let invoker = invoker(&factory, AgentConfig::default());
        let bot = test_bot("gpt-4o-mini");

        let reply = invoker.respond(&bot, user_turns(2)).await;
        assert_eq!(reply, "hello from the model");
    }

    #[tokio::test]
    async fn test_agent_cached_per_bot_and_model() {
        let factory = ScriptedFactory::new(vec![Ok(vec![]), Ok(vec![])]);
        let invoker = invoker(&factory, AgentConfig::default());
        let bot = test_bot("gpt-4o-mini");

        invoker.respond(&bot, user_turns(1)).await;
        invoker.respond(&bot, user_turns(1)).await;
        assert_eq!(factory.constructions.load(Ordering::SeqCst), 1);

        // A different model is a different cache key.
        let other = test_bot("gpt-4o");
        invoker.respond(&other, user_turns(1)).await;
        assert_eq!(factory.constructions.load(Ordering::SeqCst), 2);
        assert_eq!(invoker.cached_agents(), 2);
    }

    #[tokio::test]
    async fn test_construction_failure_degrades_to_placeholder() {
        let factory = ScriptedFactory::new(vec![Err(BotError::MissingApiKey(
            ProviderKind::OpenAi,
        ))]);
        let invoker = invoker(&factory, AgentConfig::default());
        let bot = test_bot("gpt-4o-mini");

        let context = vec![ContextEntry::user("what is the plan?")];
        let reply = invoker.respond(&bot, context.clone()).await;
        assert!(reply.contains("Assistant"));
        assert!(reply.contains("what is the plan?"));
        assert!(reply.contains("placeholder"));

        // The failure is cached: no second construction attempt.
        invoker.respond(&bot, context).await;
        assert_eq!(factory.constructions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_execution_failure_yields_apology_without_raw_error() {
        let factory = ScriptedFactory::new(vec![Ok(vec![Err(LlmError::Provider {
            message: "secret internal detail".to_string(),
        })])]);
        let invoker = invoker(&factory, AgentConfig::default());
        let bot = test_bot("gpt-4o-mini");

        let reply = invoker.respond(&bot, user_turns(1)).await;
        assert!(reply.contains("Assistant"));
        assert!(reply.contains("apologize"));
        assert!(!reply.contains("secret internal detail"));
    }

    #[tokio::test]
    async fn test_empty_content_is_treated_as_failure() {
        let factory = ScriptedFactory::new(vec![Ok(vec![Ok("   ".to_string())])]);
        let invoker = invoker(&factory, AgentConfig::default());
        let bot = test_bot("gpt-4o-mini");

        let reply = invoker.respond(&bot, user_turns(1)).await;
        assert!(reply.contains("apologize"));
    }

    #[tokio::test]
    async fn test_transient_error_retried_within_bound() {
        let factory = ScriptedFactory::new(vec![Ok(vec![
            Err(LlmError::RateLimited {
                retry_after_ms: None,
            }),
            Ok("second attempt".to_string()),
        ])]);
        let config = AgentConfig {
            max_attempts: 2,
            ..AgentConfig::default()
        };
        let invoker = invoker(&factory, config);
        let bot = test_bot("gpt-4o-mini");

        let reply = invoker.respond(&bot, user_turns(1)).await;
        assert_eq!(reply, "second attempt");
    }

    #[tokio::test]
    async fn test_non_transient_error_not_retried() {
        let factory = ScriptedFactory::new(vec![Ok(vec![
            Err(LlmError::AuthenticationFailed),
            Ok("should never be reached".to_string()),
        ])]);
        let config = AgentConfig {
            max_attempts: 3,
            ..AgentConfig::default()
        };
        let invoker = invoker(&factory, config);
        let bot = test_bot("gpt-4o-mini");

        let reply = invoker.respond(&bot, user_turns(1)).await;
        assert!(reply.contains("apologize"));
        // One construction, one (failed) call: no retries happened.
        assert_eq!(factory.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_condenser_runs_before_execution() {
        // First completion is the summarization, second is the reply.
        let factory = ScriptedFactory::new(vec![Ok(vec![
            Ok("condensed history".to_string()),
            Ok("final reply".to_string()),
        ])]);
        let invoker = invoker(&factory, AgentConfig::default());
        let bot = test_bot("gpt-4o-mini");

        let reply = invoker.respond(&bot, user_turns(12)).await;
        assert_eq!(reply, "final reply");

        let requests = factory.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        // The final request carries 1 summary + 8 recent turns.
        let final_request = &requests[1];
        assert_eq!(final_request.messages.len(), 9);
        assert!(final_request.messages[0]
            .content
            .contains("condensed history"));
        assert_eq!(final_request.messages[8].content, "turn 11");
    }

    #[tokio::test]
    async fn test_cache_eviction_honors_capacity() {
        let factory = ScriptedFactory::new(vec![Ok(vec![]), Ok(vec![]), Ok(vec![])]);
        let config = AgentConfig {
            max_cached_agents: Some(1),
            ..AgentConfig::default()
        };
        let invoker = invoker(&factory, config);

        let first = test_bot("model-a");
        let second = test_bot("model-b");
        invoker.respond(&first, user_turns(1)).await;
        invoker.respond(&second, user_turns(1)).await;
        assert_eq!(invoker.cached_agents(), 1);

        // First bot was evicted; invoking it constructs again.
        invoker.respond(&first, user_turns(1)).await;
        assert_eq!(factory.constructions.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_build_request_system_and_turn_split() {
        let bot = test_bot("gpt-4o-mini");
        let context = vec![
            ContextEntry::system("You are helpful."),
            ContextEntry::user("hi"),
            ContextEntry::assistant("hello"),
            ContextEntry::user("current question"),
        ];
        let request = build_request(&bot, &context);
        assert_eq!(request.system.as_deref(), Some("You are helpful."));
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[0].role, MessageRole::User);
        assert_eq!(request.messages[1].role, MessageRole::Assistant);
        assert_eq!(request.messages[2].content, "current question");
        assert_eq!(request.max_tokens, 1000);
        assert_eq!(request.temperature, Some(0.7));
    }

    #[test]
    fn test_placeholder_echoes_last_request_entry() {
        let bot = test_bot("gpt-4o-mini");
        let context = vec![
            ContextEntry::user("first"),
            ContextEntry::assistant("a reply"),
            ContextEntry::user("the latest"),
        ];
        let reply = placeholder_reply(&bot, &context);
        assert!(reply.contains("the latest"));
        assert!(!reply.contains("a reply"));

        let empty = placeholder_reply(&bot, &[]);
        assert!(empty.contains("something"));
    }
}
