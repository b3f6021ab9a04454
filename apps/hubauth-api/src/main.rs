mod config;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use hubauth_events::{EventPublisher, NoopPublisher};
use hubauth_service::{CsrfTokens, DeviceAuthService, OAuth2Provider};
use hubauth_store::DeviceStore;

use crate::config::ApiConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,hubauth=debug")),
        )
        .init();

    let config = ApiConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        std::process::exit(1);
    });

    tracing::info!(
        listen_addr = %config.listen_addr,
        database = %config.store.database,
        owner_claim = %config.owner_claim,
        "starting hubauth api"
    );

    let store = DeviceStore::new(&config.store).await.unwrap_or_else(|e| {
        eprintln!("Store connection error: {e}");
        std::process::exit(1);
    });

    let provider = Arc::new(OAuth2Provider::new(config.oauth.clone()));
    let publisher = build_publisher(&config);

    let service = Arc::new(DeviceAuthService::new(
        Arc::new(store),
        provider.clone(),
        publisher.clone(),
        &config.owner_claim,
    ));

    let state = AppState {
        service,
        provider,
        csrf: Arc::new(CsrfTokens::new(config.csrf_ttl)),
    };

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Bind error: {e}");
            std::process::exit(1);
        });

    tracing::info!(listen_addr = %config.listen_addr, "hubauth api listening");

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap_or_else(|e| {
            eprintln!("Server error: {e}");
            std::process::exit(1);
        });

    // Let in-flight event deliveries drain before the process exits.
    if let Err(e) = publisher.flush().await {
        tracing::warn!(error = %e, "cannot flush pending events");
    }
}

#[cfg(feature = "kafka")]
fn build_publisher(config: &ApiConfig) -> Arc<dyn EventPublisher> {
    match &config.kafka {
        Some(settings) => {
            let publisher = hubauth_events::KafkaPublisher::new(&hubauth_events::KafkaConfig {
                bootstrap_servers: settings.bootstrap_servers.clone(),
                client_id: settings.client_id.clone(),
                topic: settings.topic.clone(),
            })
            .unwrap_or_else(|e| {
                eprintln!("Kafka error: {e}");
                std::process::exit(1);
            });
            Arc::new(publisher)
        }
        None => Arc::new(NoopPublisher),
    }
}

#[cfg(not(feature = "kafka"))]
fn build_publisher(config: &ApiConfig) -> Arc<dyn EventPublisher> {
    if config.kafka.is_some() {
        tracing::warn!("KAFKA_BOOTSTRAP_SERVERS is set but the kafka feature is disabled");
    }
    Arc::new(NoopPublisher)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for the shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
