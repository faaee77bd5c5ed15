// tests/common/mod.rs

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use recofeed::{
    config::Config,
    routes,
    state::AppState,
    storage::LocalObjectStore,
    store::{MemoryStore, Store},
};

pub const PASSWORD: &str = "password123";

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStore>,
    pub storage_root: PathBuf,
}

pub fn test_config(root: &PathBuf, oauth_authorize_url: Option<String>) -> Config {
    Config {
        database_url: None,
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        port: 0,
        public_base_url: "http://cdn.test".to_string(),
        storage_root: root.join("storage"),
        storage_bucket: "post-images".to_string(),
        static_dir: root.join("static"),
        login_path: "/login".to_string(),
        oauth_authorize_url,
        oauth_providers: vec!["google".to_string()],
    }
}

/// Spawns the app on a random port with an in-memory store and a temp-dir object store.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_oauth(None).await
}

pub async fn spawn_app_with_oauth(oauth_authorize_url: Option<&str>) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    spawn(store.clone(), store, oauth_authorize_url).await
}

/// Spawns the app on `store`, which wraps `memory`. Lets tests inject store failures
/// while still inspecting the rows that were written.
pub async fn spawn_app_with_store(store: Arc<dyn Store>, memory: Arc<MemoryStore>) -> TestApp {
    spawn(store, memory, None).await
}

async fn spawn(
    store: Arc<dyn Store>,
    memory: Arc<MemoryStore>,
    oauth_authorize_url: Option<&str>,
) -> TestApp {
    let root = std::env::temp_dir().join(format!("recofeed-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(root.join("static")).expect("Failed to create static dir");
    std::fs::write(root.join("static/index.html"), "<html>home</html>")
        .expect("Failed to write index page");
    std::fs::write(root.join("static/login.html"), "<html>login</html>")
        .expect("Failed to write login page");

    let config = test_config(&root, oauth_authorize_url.map(str::to_string));
    let objects = LocalObjectStore::new(&config.storage_root, &config.storage_bucket);
    let storage_root = config.storage_root.clone();

    let state = AppState {
        store,
        objects: Arc::new(objects),
        config,
    };

    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        store: memory,
        storage_root,
    }
}

pub fn http() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Registers an account and returns (token, user id).
pub async fn sign_up(app: &TestApp, email: &str) -> (String, String) {
    let body = http()
        .post(format!("{}/api/auth/signup", app.address))
        .json(&serde_json::json!({ "email": email, "password": PASSWORD }))
        .send()
        .await
        .expect("Sign up failed")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse sign up json");

    (
        body["token"].as_str().expect("Token not found").to_string(),
        body["user"]["id"].as_str().expect("User id not found").to_string(),
    )
}

/// Submits a post without an image. Returns the raw response.
pub async fn create_post(
    app: &TestApp,
    token: &str,
    kind: &str,
    title: &str,
    is_public: bool,
) -> reqwest::Response {
    let form = reqwest::multipart::Form::new()
        .text("type", kind.to_string())
        .text("title", title.to_string())
        .text("description", "")
        .text("is_public", is_public.to_string());

    http()
        .post(format!("{}/api/posts", app.address))
        .bearer_auth(token)
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request")
}

pub async fn public_feed(app: &TestApp, token: Option<&str>) -> Vec<serde_json::Value> {
    let mut request = http().get(format!("{}/api/posts", app.address));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    request
        .send()
        .await
        .unwrap()
        .json::<Vec<serde_json::Value>>()
        .await
        .unwrap()
}

pub async fn own_posts(app: &TestApp, token: &str) -> Vec<serde_json::Value> {
    http()
        .get(format!("{}/api/profile/posts", app.address))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .json::<Vec<serde_json::Value>>()
        .await
        .unwrap()
}

pub async fn toggle_like(app: &TestApp, token: &str, post_id: &str) -> serde_json::Value {
    http()
        .post(format!("{}/api/posts/{}/like", app.address, post_id))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap()
}
