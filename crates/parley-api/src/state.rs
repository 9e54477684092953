//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by the REST API.
//! Services are generic over repository traits, but AppState pins them to
//! the concrete SQLite implementations.

use std::path::PathBuf;
use std::sync::Arc;

use parley_core::agent::invoker::AgentInvoker;
use parley_core::context::condenser::HistoryCondenser;
use parley_core::service::bot::BotService;
use parley_core::service::conversation::ConversationService;
use parley_core::service::message::MessageService;
use parley_core::service::user::UserService;
use parley_core::trigger::evaluator::TriggerEvaluator;
use parley_core::trigger::selection::EarliestCreated;
use parley_infra::config::{database_url, load_config};
use parley_infra::llm::factory::DefaultProviderFactory;
use parley_infra::sqlite::bot::SqliteBotRepository;
use parley_infra::sqlite::conversation::SqliteConversationRepository;
use parley_infra::sqlite::message::SqliteMessageRepository;
use parley_infra::sqlite::pool::DatabasePool;
use parley_infra::sqlite::user::SqliteUserRepository;
use parley_types::config::AppConfig;

/// Concrete type aliases for the service generics pinned to infra
/// implementations.
pub type ConcreteUserService = UserService<SqliteUserRepository>;
pub type ConcreteBotService = BotService<SqliteBotRepository>;
pub type ConcreteConversationService = ConversationService<SqliteConversationRepository>;
pub type ConcreteMessageService =
    MessageService<SqliteMessageRepository, SqliteBotRepository, DefaultProviderFactory>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<ConcreteUserService>,
    pub bot_service: Arc<ConcreteBotService>,
    pub conversation_service: Arc<ConcreteConversationService>,
    pub message_service: Arc<ConcreteMessageService>,
    pub config: AppConfig,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: load config, connect to the
    /// database, wire services.
    pub async fn init(data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;

        let db_url = database_url(&data_dir);
        let db_pool = DatabasePool::new(&db_url).await?;

        let user_service = UserService::new(SqliteUserRepository::new(db_pool.clone()));
        let bot_service = BotService::new(SqliteBotRepository::new(db_pool.clone()));
        let conversation_service =
            ConversationService::new(SqliteConversationRepository::new(db_pool.clone()));

        let invoker = AgentInvoker::new(
            DefaultProviderFactory,
            HistoryCondenser::from_config(&config.condenser),
            config.agent.clone(),
        );
        let message_service = MessageService::new(
            SqliteMessageRepository::new(db_pool.clone()),
            SqliteBotRepository::new(db_pool.clone()),
            invoker,
            TriggerEvaluator::from_config(&config.trigger),
            Box::new(EarliestCreated),
            config.agent.context_window,
        );

        Ok(Self {
            user_service: Arc::new(user_service),
            bot_service: Arc::new(bot_service),
            conversation_service: Arc::new(conversation_service),
            message_service: Arc::new(message_service),
            config,
            data_dir,
            db_pool,
        })
    }
}
