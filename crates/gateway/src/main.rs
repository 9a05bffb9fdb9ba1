use std::sync::Arc;

use warden_authz::{CacheStore, InMemoryCacheStore};
use warden_gateway::GatewayConfig;
use warden_gateway::app::{Collaborators, build_app};
use warden_gateway::clients::{HttpIdentityDirectory, HttpPolicyEngine};

#[tokio::main]
async fn main() {
    warden_observability::init();

    let config = GatewayConfig::from_env();
    let http = reqwest::Client::new();

    let cache = select_cache(&config).await;
    let collaborators = Collaborators {
        key_endpoint: Arc::new(warden_auth::HttpKeyEndpoint::new(config.jwks_url.clone())),
        directory: Arc::new(HttpIdentityDirectory::new(
            http.clone(),
            config.directory_url.clone(),
        )),
        policy_engine: Arc::new(HttpPolicyEngine::new(
            http,
            config.policy_engine_url.clone(),
        )),
        cache,
    };

    let app = build_app(&config, collaborators);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind listen address");
    tracing::info!(addr = %config.bind_addr, "warden gateway listening");

    axum::serve(listener, app).await.expect("server error");
}

#[cfg(feature = "redis")]
async fn select_cache(config: &GatewayConfig) -> Arc<dyn CacheStore> {
    match &config.redis_url {
        Some(url) => {
            let store = warden_authz::RedisCacheStore::connect(url)
                .await
                .expect("failed to connect to redis");
            tracing::info!("using redis cache store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("WARDEN_REDIS_URL not set, falling back to in-process cache");
            Arc::new(InMemoryCacheStore::new())
        }
    }
}

#[cfg(not(feature = "redis"))]
async fn select_cache(config: &GatewayConfig) -> Arc<dyn CacheStore> {
    if config.redis_url.is_some() {
        tracing::warn!("WARDEN_REDIS_URL set but the redis feature is disabled");
    }
    Arc::new(InMemoryCacheStore::new())
}
