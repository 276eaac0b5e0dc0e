//! Common test utilities for E2E tests
#![allow(dead_code)]

use rookery::{AppState, config};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// A registered user with an API token
pub struct TestUser {
    pub id: String,
    pub username: String,
    pub token: String,
}

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance with the feed cache enabled
    pub async fn new() -> Self {
        Self::start(true).await
    }

    /// Create a test server with the feed cache disabled
    pub async fn without_cache() -> Self {
        Self::start(false).await
    }

    async fn start(cache_enabled: bool) -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "localhost".to_string(),
                protocol: "http".to_string(),
            },
            database: config::DatabaseConfig {
                path: db_path.clone(),
            },
            auth: config::AuthConfig {
                session_secret: "test-secret-key-32-bytes-long!!!".to_string(),
                session_max_age: 604800,
            },
            feed: config::FeedConfig {
                default_page_size: 20,
                max_page_size: 50,
            },
            cache: config::CacheConfig {
                enabled: cache_enabled,
                feed_ttl_seconds: 300,
                feed_max_entries: 10_000,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state
        let state = AppState::new(config.clone()).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build router
        let app = rookery::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Register a user through the API and return their token
    pub async fn register_user(&self, username: &str) -> TestUser {
        let response = self
            .client
            .post(self.url("/api/v1/auth/register"))
            .json(&json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "password1",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201, "registration should succeed");

        let body: Value = response.json().await.unwrap();
        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            username: username.to_string(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Create a post through the API, returning its ID
    pub async fn create_post(&self, user: &TestUser, content: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/v1/posts"))
            .bearer_auth(&user.token)
            .json(&json!({ "content": content }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201, "post creation should succeed");

        let body: Value = response.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    /// Follow a target user through the API
    pub async fn follow(&self, follower: &TestUser, target_id: &str) {
        let response = self
            .client
            .post(self.url(&format!("/api/v1/accounts/{}/follow", target_id)))
            .bearer_auth(&follower.token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200, "follow should succeed");
    }

    /// Fetch one feed page as a user
    pub async fn feed_page(
        &self,
        user: &TestUser,
        cursor: Option<&str>,
        limit: Option<usize>,
    ) -> Value {
        let mut request = self
            .client
            .get(self.url("/api/v1/feed"))
            .bearer_auth(&user.token);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit.to_string())]);
        }

        let response = request.send().await.unwrap();
        assert_eq!(response.status(), 200, "feed request should succeed");
        response.json().await.unwrap()
    }

    /// Collect post IDs from a feed response
    pub fn feed_post_ids(page: &Value) -> Vec<String> {
        page["posts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|post| post["id"].as_str().unwrap().to_string())
            .collect()
    }
}
