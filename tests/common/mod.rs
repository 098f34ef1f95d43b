#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use movies_api_rust::config::{AppConfig, Environment};
use movies_api_rust::database::models::Person;
use movies_api_rust::database::{MemoryStore, MovieStore, PersonStore, Store};
use movies_api_rust::state::create_admin;
use movies_api_rust::{app, AppState};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-password";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Serves the real router over a fresh memory store on an unused port.
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = AppConfig::for_environment(Environment::Development);
        config.server.host = "127.0.0.1".to_string();
        config.server.port = port;
        config.security.jwt_secret = "test-secret".to_string();

        let store = Arc::new(MemoryStore::new());
        create_admin(store.as_ref(), ADMIN_USERNAME, ADMIN_PASSWORD).await?;

        let state = AppState::new(store.clone() as Arc<dyn Store>, Arc::new(config));
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind {}", port))?;

        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let server = Self {
            port,
            base_url,
            store,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Signs in and returns the bearer token.
    pub async fn signin(&self, username: &str, password: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/users/signin"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "signin failed: {}", res.status());

        let body: Value = res.json().await?;
        body["data"]["token"]
            .as_str()
            .map(str::to_string)
            .context("signin response has no token")
    }

    pub async fn admin_token(&self) -> Result<String> {
        self.signin(ADMIN_USERNAME, ADMIN_PASSWORD).await
    }

    /// Creates a movie through the API and returns its id.
    pub async fn create_movie(&self, body: Value) -> Result<String> {
        let res = self.client.post(self.url("/movies")).json(&body).send().await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create failed: {}", res.status());

        // The create response echoes the request, so look the id up by title
        let title = body["title"].as_str().context("movie needs a title")?;
        self.movie_id_by_title(title).await
    }

    pub async fn movie_id_by_title(&self, title: &str) -> Result<String> {
        let count = self.store.count_movies().await?;
        let movies = self.store.list_movies(0, count.max(1)).await?;
        movies
            .into_iter()
            .find(|movie| movie.document.title == title)
            .map(|movie| movie.id.to_string())
            .with_context(|| format!("no movie titled {}", title))
    }

    pub async fn add_person(&self, name: &str) -> Result<String> {
        let mut attributes = serde_json::Map::new();
        attributes.insert("name".to_string(), json!(name));
        let person = self.store.insert_person(Person::new(attributes)).await?;
        Ok(person.id.to_string())
    }
}
