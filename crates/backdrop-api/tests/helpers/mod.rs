//! Test helpers: build the router against mocked upstream services.
//!
//! Run from workspace root: `cargo test -p backdrop-api`.

pub mod fixtures;

use std::collections::HashMap;

use axum_test::TestServer;
use backdrop_api::setup::{routes, services};
use backdrop_core::Config;
use mockito::{Matcher, Mock, ServerGuard};

pub const TEST_API_KEY: &str = "test-remove-bg-key";
pub const REMOVE_BG_PATH: &str = "/v1.0/removebg";

/// Test application: server plus the mocked upstreams it talks to.
pub struct TestApp {
    pub server: TestServer,
    pub remove_bg: ServerGuard,
    pub generator: ServerGuard,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Removal upstream answering with a PNG cutout.
    pub async fn mock_removal_success(&mut self, cutout: Vec<u8>) -> Mock {
        self.remove_bg
            .mock("POST", REMOVE_BG_PATH)
            .match_header("x-api-key", TEST_API_KEY)
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(cutout)
            .create_async()
            .await
    }

    /// Removal upstream rejecting with a remove.bg style error body.
    pub async fn mock_removal_failure(&mut self, status: usize, title: &str) -> Mock {
        self.remove_bg
            .mock("POST", REMOVE_BG_PATH)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(serde_json::json!({ "errors": [{ "title": title }] }).to_string())
            .create_async()
            .await
    }

    pub async fn mock_generation_success(&mut self, background: Vec<u8>) -> Mock {
        self.generator
            .mock("GET", Matcher::Regex(r"^/prompt/".to_string()))
            .match_query(Matcher::UrlEncoded("nologo".into(), "true".into()))
            .with_status(200)
            .with_header("content-type", "image/jpeg")
            .with_body(background)
            .create_async()
            .await
    }

    pub async fn mock_generation_failure(&mut self, status: usize) -> Mock {
        self.generator
            .mock("GET", Matcher::Regex(r"^/prompt/".to_string()))
            .with_status(status)
            .create_async()
            .await
    }
}

/// Setup test app with a configured removal key.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with_key(Some(TEST_API_KEY)).await
}

pub async fn setup_test_app_with_key(api_key: Option<&str>) -> TestApp {
    let remove_bg = mockito::Server::new_async().await;
    let generator = mockito::Server::new_async().await;

    let mut vars: HashMap<&'static str, String> = HashMap::new();
    vars.insert(
        "REMOVE_BG_API_URL",
        format!("{}{}", remove_bg.url(), REMOVE_BG_PATH),
    );
    vars.insert("IMAGE_GENERATION_API_URL", generator.url());
    vars.insert("MAX_UPLOAD_SIZE_MB", "1".to_string());
    if let Some(key) = api_key {
        vars.insert("REMOVE_BG_API_KEY", key.to_string());
    }

    let config =
        Config::from_source(move |key| vars.get(key).cloned()).expect("Invalid test config");
    let state = services::initialize_services(&config).expect("Failed to initialize services");
    let app = routes::setup_routes(&config, state).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        remove_bg,
        generator,
    }
}
