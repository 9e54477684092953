//! Message posting and the bot trigger-and-response pipeline.
//!
//! `post_user_message` is the only path that evaluates triggers.
//! Bot-authored messages go through `post_bot_message`, which never does
//! -- the asymmetry is the shape of the API, which is what rules out
//! bot-triggers-bot loops.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, error, info, warn};

use parley_types::agent::ContextEntry;
use parley_types::error::{MessageError, RepositoryError};
use parley_types::id::{BotId, ConversationId, MessageId, UserId};
use parley_types::message::{Message, Sender, validate_content, MAX_CONTENT_LEN};

use crate::agent::invoker::{AgentInvoker, ProviderFactory};
use crate::context::builder::build_context;
use crate::repository::bot::BotRepository;
use crate::repository::message::MessageRepository;
use crate::repository::Page;
use crate::trigger::evaluator::TriggerEvaluator;
use crate::trigger::mention::extract_mentions;
use crate::trigger::selection::SelectionPolicy;
use crate::trigger::TriggerDecision;

/// Result of posting a human message: the stored message plus the bot
/// reply, when one was triggered and persisted.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PostOutcome {
    pub message: Message,
    pub bot_reply: Option<Message>,
}

/// Orchestrates message persistence and the trigger pipeline.
///
/// Generic over the repositories and provider factory so the core stays
/// free of infrastructure; the application layer pins the concrete types.
pub struct MessageService<M, B, F> {
    message_repo: M,
    bot_repo: B,
    invoker: AgentInvoker<F>,
    evaluator: TriggerEvaluator,
    policy: Box<dyn SelectionPolicy>,
    context_window: u32,
    /// One async mutex per conversation serializes overlapping
    /// trigger-and-respond pipelines, so each triggering message gets
    /// exactly one reply and replies land in order.
    conversation_locks: DashMap<ConversationId, Arc<tokio::sync::Mutex<()>>>,
}

impl<M, B, F> MessageService<M, B, F>
where
    M: MessageRepository,
    B: BotRepository,
    F: ProviderFactory,
{
    pub fn new(
        message_repo: M,
        bot_repo: B,
        invoker: AgentInvoker<F>,
        evaluator: TriggerEvaluator,
        policy: Box<dyn SelectionPolicy>,
        context_window: u32,
    ) -> Self {
        Self {
            message_repo,
            bot_repo,
            invoker,
            evaluator,
            policy,
            context_window,
            conversation_locks: DashMap::new(),
        }
    }

    /// Post a human message and run the trigger pipeline.
    ///
    /// The human message is validated and persisted before anything else;
    /// no downstream failure can undo that. If the message triggers a bot
    /// and an active bot exists, a reply (generated, placeholder, or
    /// apology) is persisted and returned alongside. The bot reply is
    /// written in a single repository call after generation completes, so
    /// a caller cancelled mid-generation leaves no partial reply behind.
    #[tracing::instrument(
        name = "post_user_message",
        skip(self, content),
        fields(conversation = %conversation_id)
    )]
    pub async fn post_user_message(
        &self,
        conversation_id: ConversationId,
        sender: UserId,
        content: String,
    ) -> Result<PostOutcome, MessageError> {
        let message = Message::new(conversation_id, Sender::User(sender), content)?;
        self.message_repo
            .create(&message)
            .await
            .map_err(map_repo_err)?;

        let bot_reply = self.trigger_and_respond(&message).await;
        Ok(PostOutcome { message, bot_reply })
    }

    /// Persist a bot-authored message.
    ///
    /// Never evaluates triggers: a bot message cannot provoke another
    /// bot reply.
    pub async fn post_bot_message(
        &self,
        conversation_id: ConversationId,
        bot_id: BotId,
        content: String,
        forwarded_history: Option<Vec<ContextEntry>>,
    ) -> Result<Message, MessageError> {
        let mut message = Message::new(conversation_id, Sender::Bot(bot_id), content)?;
        if let Some(history) = forwarded_history {
            message = message.with_forwarded_history(history);
        }
        self.message_repo
            .create(&message)
            .await
            .map_err(map_repo_err)?;
        Ok(message)
    }

    /// Pure trigger detection: extract mentions, evaluate, and resolve
    /// the responding bot. Does not generate anything.
    ///
    /// Returns `None` when the message does not trigger, or when it does
    /// but no active bot is available (fail soft, not an error).
    async fn detect_trigger(&self, message: &Message) -> Option<TriggerDecision> {
        let mentions = extract_mentions(&message.content);
        if !self.evaluator.should_trigger(&message.content, &mentions) {
            return None;
        }

        let bots = match self.bot_repo.list_active().await {
            Ok(bots) => bots,
            Err(err) => {
                warn!(error = %err, "Bot lookup failed, skipping trigger");
                return None;
            }
        };
        let Some(bot) = self.policy.select(&bots) else {
            debug!("Message triggered but no active bot is available");
            return None;
        };

        Some(TriggerDecision {
            bot: bot.materialize(),
        })
    }

    /// The trigger-detect, context-build, condense, invoke, persist
    /// sequence. Runs under the conversation's pipeline lock. Returns the
    /// persisted bot reply, or `None` when no bot responded.
    async fn trigger_and_respond(&self, message: &Message) -> Option<Message> {
        let lock = self
            .conversation_locks
            .entry(message.conversation_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let decision = self.detect_trigger(message).await?;
        let config = decision.bot;

        let prior = match self
            .message_repo
            .recent_context(&message.conversation_id, &message.id, self.context_window)
            .await
        {
            Ok(prior) => prior,
            Err(err) => {
                // Respond from the triggering message alone rather than
                // dropping the turn.
                warn!(error = %err, "Context fetch failed, replying without history");
                Vec::new()
            }
        };

        let context = build_context(&prior, message, config.system_prompt.as_deref());
        let response_text = self.invoker.respond(&config, context).await;

        match self
            .post_bot_message(
                message.conversation_id,
                config.bot_id,
                clamp_content(response_text),
                None,
            )
            .await
        {
            Ok(reply) => {
                info!(
                    bot = %config.name,
                    reply_id = %reply.id,
                    "Bot reply persisted"
                );
                Some(reply)
            }
            Err(err) => {
                error!(bot = %config.name, error = %err, "Failed to persist bot reply");
                None
            }
        }
    }

    pub async fn get_message(&self, id: &MessageId) -> Result<Message, MessageError> {
        self.message_repo
            .get_by_id(id)
            .await
            .map_err(map_repo_err)?
            .ok_or(MessageError::NotFound)
    }

    /// Active messages in a conversation, newest first.
    pub async fn list_messages(
        &self,
        conversation_id: &ConversationId,
        page: Page,
    ) -> Result<Vec<Message>, MessageError> {
        self.message_repo
            .list_for_conversation(conversation_id, page)
            .await
            .map_err(map_repo_err)
    }

    /// Edit a message. Only the human sender may do so.
    pub async fn update_message(
        &self,
        id: &MessageId,
        caller: UserId,
        content: Option<String>,
        is_active: Option<bool>,
    ) -> Result<Message, MessageError> {
        let mut message = self.get_message(id).await?;
        if message.sender.user_id() != Some(caller) {
            return Err(MessageError::NotSender);
        }
        if let Some(content) = content {
            validate_content(&content)?;
            message.content = content;
        }
        if let Some(is_active) = is_active {
            message.is_active = is_active;
        }
        message.updated_at = chrono::Utc::now();
        self.message_repo
            .update(&message)
            .await
            .map_err(map_repo_err)?;
        Ok(message)
    }

    /// Soft-delete a message. Only the human sender may do so.
    pub async fn delete_message(&self, id: &MessageId, caller: UserId) -> Result<(), MessageError> {
        let message = self.get_message(id).await?;
        if message.sender.user_id() != Some(caller) {
            return Err(MessageError::NotSender);
        }
        let removed = self
            .message_repo
            .soft_delete(id)
            .await
            .map_err(map_repo_err)?;
        if removed { Ok(()) } else { Err(MessageError::NotFound) }
    }
}

/// Bound generated text to the message size limit, on a char boundary.
fn clamp_content(text: String) -> String {
    if text.chars().count() <= MAX_CONTENT_LEN {
        text
    } else {
        text.chars().take(MAX_CONTENT_LEN).collect()
    }
}

fn map_repo_err(err: RepositoryError) -> MessageError {
    match err {
        RepositoryError::NotFound => MessageError::NotFound,
        other => MessageError::Storage(other.to_string()),
    }
}
