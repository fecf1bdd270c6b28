//! Central shared state, passed as `Arc<AppState>` to every WS/HTTP handler —
//! the same role `skynet-gateway::app::AppState` plays for its components.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use axum::{routing::get, Router};

use qqbot_adapter::{AdapterRouter, OneBotClient, OneBotV11Adapter};
use qqbot_agent::AgentRouter;
use qqbot_antirecall::AntiRecallEngine;
use qqbot_cache::RecallCache;
use qqbot_command::CommandRegistry;
use qqbot_config::ConfigStore;
use qqbot_core::config::BotConfig;
use qqbot_recall::SelfDeleteExecutor;

pub struct AppState {
    pub bot_config: Arc<BotConfig>,
    pub config_store: Arc<ConfigStore>,
    pub client: Arc<OneBotClient>,
    pub commands: CommandRegistry,
    pub antirecall: AntiRecallEngine,
    pub agent: AgentRouter,
    pub self_deleter: SelfDeleteExecutor,
    /// Latest `self_id` observed on any inbound event — NapCat reports it on
    /// every frame, so there's no separate lifecycle handshake to wait on.
    /// Shared with `antirecall`, which needs it for the "bot-as-sender" node
    /// in recall-reaction forward cards.
    pub self_id: Arc<AtomicI64>,
    /// Platform-neutral capability seam (§4.3), shared with `antirecall` and
    /// used directly by the WS dispatch loop for voice extraction ahead of
    /// agent turns.
    pub adapters: Arc<AdapterRouter>,
}

impl AppState {
    pub fn new(bot_config: BotConfig) -> anyhow::Result<Self> {
        let bot_config = Arc::new(bot_config);
        let config_store = Arc::new(ConfigStore::load(&bot_config.nb_config_json_path));
        let client = Arc::new(OneBotClient::new(
            bot_config.onebot.base_url.clone(),
            bot_config.onebot.access_token.clone(),
        ));
        let cache = Arc::new(RecallCache::new());
        let commands = CommandRegistry::new(bot_config.command_start.clone());
        let self_id = Arc::new(AtomicI64::new(0));
        let adapters = Arc::new(AdapterRouter::new(OneBotV11Adapter::new(client.clone())));

        let antirecall = AntiRecallEngine::new(
            cache,
            config_store.clone(),
            bot_config.clone(),
            client.clone(),
            adapters.clone(),
            self_id.clone(),
        );

        let llm = qqbot_llm::from_name(&qqbot_llm::ProvidersConfig {
            provider: bot_config.agent.provider.clone(),
            gemini_base_url: bot_config.agent.gemini_base_url.clone(),
            gemini_api_key: bot_config.agent.gemini_api_key.clone(),
            gemini_model: bot_config.agent.gemini_model.clone(),
        })?;
        let webhook = qqbot_webhook::WebhookClient::new(
            bot_config.agent.n8n_base_url.clone().unwrap_or_default(),
            bot_config.agent.n8n_webhook_path.clone().unwrap_or_default(),
            bot_config.agent.n8n_api_key.clone(),
        );
        let agent = AgentRouter::new(llm, webhook);

        let self_deleter = SelfDeleteExecutor::new(client.clone());

        Ok(Self {
            bot_config,
            config_store,
            client,
            commands,
            antirecall,
            agent,
            self_deleter,
            self_id,
            adapters,
        })
    }

    pub fn self_id(&self) -> i64 {
        self.self_id.load(Ordering::Relaxed)
    }

    pub fn observe_self_id(&self, self_id: i64) {
        self.self_id.store(self_id, Ordering::Relaxed);
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/ws", get(crate::ws::connection::ws_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
