//! Staffbot webhook binary.
//!
//! Serves the single endpoint Google Chat pushes events to. All real
//! work happens in `staffbot::handlers`; this file is wiring: config,
//! store, gateway clients, router.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use tokio::sync::Mutex;

use staffbot::config;
use staffbot::event::ChatEvent;
use staffbot::gateways::auth::TokenProvider;
use staffbot::gateways::calendar::CalendarClient;
use staffbot::gateways::chat::ChatClient;
use staffbot::handlers::{self, BotContext};
use staffbot::store::RecordStore;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    let db_path = match &config.db_path {
        Some(path) => PathBuf::from(path),
        None => match config::default_db_path() {
            Ok(path) => path,
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        },
    };

    let store = match RecordStore::open_at(db_path) {
        Ok(store) => store,
        Err(e) => {
            log::error!("Failed to open record store: {}", e);
            std::process::exit(1);
        }
    };

    let http = reqwest::Client::new();
    let token = Arc::new(TokenProvider::new(config.google.clone(), http.clone()));
    let tz = config.tz();

    let listen_addr = config.listen_addr.clone();
    let ctx = Arc::new(BotContext {
        store: Arc::new(Mutex::new(store)),
        chat: Arc::new(ChatClient::new(http.clone(), token.clone())),
        calendar: Arc::new(CalendarClient::new(http, token, tz)),
        config: Arc::new(config),
    });

    let app = Router::new()
        .route("/v1/event-handler", post(event_handler))
        .with_state(ctx);

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("Failed to bind {}: {}", listen_addr, e);
            std::process::exit(1);
        }
    };
    log::info!("Listening on http://{}", listen_addr);

    if let Err(e) = axum::serve(listener, app).await {
        log::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Always answers 204. Failures surface through chat replies and logs,
/// never through the HTTP status.
async fn event_handler(State(ctx): State<Arc<BotContext>>, body: String) -> StatusCode {
    match serde_json::from_str::<ChatEvent>(&body) {
        Ok(event) => handlers::process_event(&ctx, &event).await,
        Err(e) => log::warn!("Discarding undecodable event payload: {}", e),
    }
    StatusCode::NO_CONTENT
}
