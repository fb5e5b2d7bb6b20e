//! Test utilities shared by handler and end-to-end tests.
//!
//! Every test gets its own mock inference API and its own output directory, so tests can run in
//! parallel without seeing each other's requests or files.

use axum_test::TestServer;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::{AssetSource, Config, UpstreamConfig};

/// A running application wired to a mock upstream.
pub struct TestContext {
    pub server: TestServer,
    /// Serves both the inference API (under `/ai/run`) and the default assets (under `/assets`)
    pub upstream: MockServer,
    pub output_dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Build a context after letting the caller tweak the test configuration.
    pub async fn with_config(customize: impl FnOnce(&mut Config)) -> Self {
        let upstream = MockServer::start().await;
        let output_dir = tempfile::tempdir().expect("Failed to create temp dir");

        let mut config = create_test_config(&upstream.uri(), &output_dir);
        customize(&mut config);

        let server = crate::Application::new(config)
            .expect("Failed to create application")
            .into_test_server();

        Self {
            server,
            upstream,
            output_dir,
        }
    }

    /// Names of the files currently in the output directory, sorted.
    pub fn saved_files(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.output_dir.path()) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

pub fn create_test_config(upstream_uri: &str, output_dir: &TempDir) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        output_dir: output_dir.path().to_path_buf(),
        upstream: UpstreamConfig {
            base_url: format!("{upstream_uri}/ai/run"),
            account_id: None,
            api_token: Some("test-token".to_string()),
        },
        assets: crate::config::AssetsConfig {
            image: AssetSource {
                path: None,
                url: format!("{upstream_uri}/assets/image.png").parse().unwrap(),
            },
            mask: AssetSource {
                path: None,
                url: format!("{upstream_uri}/assets/mask.png").parse().unwrap(),
            },
        },
        enable_metrics: false,
        ..Default::default()
    }
}

/// Mount a model endpoint that answers with raw image bytes.
pub async fn mount_upstream_image(server: &MockServer, endpoint: &str, image: &[u8], expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(image.to_vec()))
        .expect(expected_calls)
        .mount(server)
        .await;
}
