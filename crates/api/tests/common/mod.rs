#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use keeper_api::config::ServerConfig;
use keeper_api::router::build_app_router;
use keeper_api::state::AppState;
use keeper_chain::mock::MockChainClient;
use keeper_chain::ChainClient;
use keeper_core::proposal::ProposalRecord;
use keeper_core::registry::DaoRegistry;
use keeper_db::PgDaoRegistry;
use keeper_pipeline::{EngineConfig, ExecutionEngine};
use sqlx::PgPool;
use tower::ServiceExt;

pub const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub const DAO: &str = "0xabc0000000000000000000000000000000000001";
pub const OTHER_DAO: &str = "0xabc0000000000000000000000000000000000002";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        scheduler_enabled: false,
    }
}

/// Engine settings as they would come from the environment. The RPC URL is
/// never dialled: tests swap in a mock chain.
pub fn engine_config(signing_key: Option<&str>) -> EngineConfig {
    engine_config_with(signing_key, &[])
}

/// [`engine_config`] with extra environment variables set.
pub fn engine_config_with(signing_key: Option<&str>, vars: &[(&str, &str)]) -> EngineConfig {
    let signing_key = signing_key.map(str::to_string);
    EngineConfig::from_lookup(move |key| match key {
        "RPC_URL" => Some("http://127.0.0.1:8545".to_string()),
        "EXECUTOR_PRIVATE_KEY" => signing_key.clone(),
        _ => vars
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.to_string()),
    })
}

/// Handles to everything behind the router, for tests that need to poke at
/// the engine or inspect chain traffic.
pub struct TestApp {
    pub router: Router,
    pub engine: Arc<ExecutionEngine>,
    pub chain: Arc<MockChainClient>,
}

/// Build the full application with the same middleware stack as production,
/// over a Postgres registry and the given mock chain.
pub fn build_test_app_with(
    pool: PgPool,
    chain: MockChainClient,
    signing_key: Option<&str>,
) -> TestApp {
    build_test_app_from(test_config(), engine_config(signing_key), pool, chain)
}

/// Full application with explicit server and engine settings.
pub fn build_test_app_from(
    config: ServerConfig,
    engine_config: EngineConfig,
    pool: PgPool,
    chain: MockChainClient,
) -> TestApp {
    let chain = Arc::new(chain);
    let registry: Arc<dyn DaoRegistry> = Arc::new(PgDaoRegistry::new(pool.clone()));
    let engine = Arc::new(
        engine_config
            .build_engine_with(Arc::clone(&chain) as Arc<dyn ChainClient>, Arc::clone(&registry)),
    );

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        registry,
        engine: Arc::clone(&engine),
    };

    TestApp {
        router: build_app_router(state, &config),
        engine,
        chain,
    }
}

/// Application over an idle chain and a configured signer.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, MockChainClient::new(1_000), Some(DEV_KEY)).router
}

pub fn address(raw: &str) -> Address {
    Address::from_str(raw).unwrap()
}

pub fn proposal(id: u64, description: &str) -> ProposalRecord {
    ProposalRecord::new(
        U256::from(id),
        vec![Address::repeat_byte(0x10)],
        vec![U256::ZERO],
        vec![Bytes::from(vec![0xa9, 0x05, 0x9c, 0xbb])],
        description.to_string(),
    )
    .unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, Body::empty()).await
}

pub async fn post(app: Router, uri: &str) -> Response {
    send(app, Method::POST, uri, Body::empty()).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

async fn send(app: Router, method: Method, uri: &str, body: Body) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(body)
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
