#![allow(dead_code)]

use product_service::config::{
    CorsConfig, CorsPolicy, Environment, MongoConfig, ProductConfig, DEFAULT_ALLOWED_ORIGIN,
};
use product_service::services::{LifecycleState, MockConnector, MockProductStore, StoreConnector};
use product_service::{AppState, Application};
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use std::time::Duration;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub state: AppState,
    pub settled: LifecycleState,
}

pub fn test_config() -> ProductConfig {
    ProductConfig {
        common: CoreConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port for testing
        },
        environment: Environment::Dev,
        log_level: "error".to_string(),
        otlp_endpoint: None,
        mongodb: MongoConfig {
            uri: None,
            database: None,
        },
        cors: CorsConfig {
            policy: CorsPolicy::AllowList(vec![DEFAULT_ALLOWED_ORIGIN.to_string()]),
        },
        seed_on_startup: true,
    }
}

impl TestApp {
    /// Spawn the service against `store` and wait until bootstrap settles.
    pub async fn spawn(store: Arc<MockProductStore>) -> Self {
        Self::spawn_with(test_config(), Arc::new(MockConnector::new(store))).await
    }

    pub async fn spawn_without_seeding(store: Arc<MockProductStore>) -> Self {
        let mut config = test_config();
        config.seed_on_startup = false;
        Self::spawn_with(config, Arc::new(MockConnector::new(store))).await
    }

    pub async fn spawn_unreachable() -> Self {
        Self::spawn_with(test_config(), Arc::new(MockConnector::unreachable())).await
    }

    pub async fn spawn_with(config: ProductConfig, connector: Arc<dyn StoreConnector>) -> Self {
        let app = Application::build_with_connector(config, connector)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let state = app.state().clone();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        let settled = tokio::time::timeout(Duration::from_secs(5), state.lifecycle.settled())
            .await
            .expect("Bootstrap did not settle");

        TestApp {
            address,
            port,
            state,
            settled,
        }
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        reqwest::Client::new()
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }
}
