//! botato HTTP Server
//!
//! Axum-based server exposing conversation sessions backed by the tool-calling
//! agent, with web and Wikipedia search tools.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use botato_core::{
    AgentBuilder, ConversationStore, FileConversationStore, InferenceClient, MemoryConversationStore,
    SessionManager, ToolRegistry,
};
use botato_runtime::OpenAiClient;
use botato_search::backend::{TavilyClient, TavilyConfig, WikipediaClient, WikipediaConfig};
use botato_search::tools::{WebSearchTool, WikiSearchTool};

use crate::config::ServerConfig;
use crate::handlers::{create_session, get_history, health_check, list_tools, send_message};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    let system_prompt = config.load_system_prompt()?;

    // Initialize inference client
    let inference: Arc<dyn InferenceClient> = Arc::new(OpenAiClient::from_env()?);
    match inference.health_check().await {
        Ok(true) => tracing::info!("Connected to inference service ({})", inference.name()),
        Ok(false) | Err(_) => {
            tracing::warn!("Inference service not reachable - turns will fail until it is");
        }
    }

    let tools = build_tools(&config)?;
    tracing::info!("Registered {} tools: {}", tools.len(), tools.names().join(", "));

    let store: Arc<dyn ConversationStore> = match &config.store_dir {
        Some(dir) => {
            tracing::info!("Persisting conversations under {}", dir.display());
            Arc::new(FileConversationStore::open(dir.clone()).await?)
        }
        None => {
            tracing::info!("Keeping conversations in memory");
            Arc::new(MemoryConversationStore::new())
        }
    };

    let agent = AgentBuilder::new()
        .inference(inference)
        .tools(tools)
        .store(store)
        .system_prompt(system_prompt)
        .model(config.model.clone())
        .temperature(0.0)
        .max_tool_round_trips(config.max_tool_round_trips)
        .inference_timeout(Some(config.inference_timeout))
        .build()?;

    let app = router(AppState::new(SessionManager::new(agent)));

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("botato server running on http://{}", config.bind_addr);
    tracing::info!("  GET  /health                       - Health check");
    tracing::info!("  GET  /api/tools                    - Advertised tools");
    tracing::info!("  POST /api/sessions                 - Start a conversation");
    tracing::info!("  POST /api/sessions/{{id}}/messages   - Send a message");
    tracing::info!("  GET  /api/sessions/{{id}}/messages   - Conversation history");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Register the search tools that have a configured backend
fn build_tools(config: &ServerConfig) -> anyhow::Result<ToolRegistry> {
    let mut tools = ToolRegistry::new().with_timeout(Some(config.tool_timeout));

    match TavilyConfig::from_env() {
        Some(tavily) => tools.register(WebSearchTool::new(Arc::new(TavilyClient::new(tavily)?)))?,
        None => tracing::warn!("TAVILY_API_KEY not set - web_search disabled"),
    }

    let wikipedia = WikipediaClient::new(WikipediaConfig::from_env())?;
    tools.register(WikiSearchTool::new(Arc::new(wikipedia)))?;

    Ok(tools)
}

/// Build the HTTP router
pub(crate) fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/tools", get(list_tools))
        .route("/api/sessions", post(create_session))
        .route(
            "/api/sessions/{id}/messages",
            post(send_message).get(get_history),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
