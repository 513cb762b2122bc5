use createai_probe::{
    api::ApiReply,
    config::{ApiConfig, Config, ModelConfig},
};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::{fs, net::TcpListener, task::JoinHandle};
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::{
        Message,
        handshake::server::{ErrorResponse, Request, Response},
    },
};

pub const TEST_TOKEN: &str = "test-token";

/// Create a test configuration pointing at a local server
pub fn create_test_config(base_url: &str) -> Config {
    Config {
        api: ApiConfig {
            base_url: base_url.to_string(),
            ws_url: "ws://127.0.0.1:1/".to_string(),
            token_env: "CREATE_AI_API_TOKEN".to_string(),
            timeout_secs: 5,
        },
        model: ModelConfig::default(),
        ..Config::default()
    }
}

pub fn success(value: Value) -> ApiReply {
    ApiReply::Success(value)
}

pub fn failure(status: u16, body: &str) -> ApiReply {
    ApiReply::Failure {
        status,
        body: body.to_string(),
    }
}

/// Create a temporary directory for test files
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Create a test config YAML file
pub async fn create_test_config_file(dir: &TempDir, content: &str) -> String {
    let config_path = dir.path().join("config.yaml");
    fs::write(&config_path, content).await.unwrap();
    config_path.to_string_lossy().to_string()
}

/// What the local WebSocket server saw from the client.
#[derive(Debug, Default, Clone)]
pub struct Captured {
    pub uri: String,
    pub payload: Option<String>,
}

/// Starts a one-connection WebSocket server that waits for the query
/// payload, then sends `frames` in order. Returns the `ws://` URL.
pub async fn spawn_ws_server(
    frames: Vec<Message>,
) -> (String, Arc<Mutex<Captured>>, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let captured = Arc::new(Mutex::new(Captured::default()));

    let server_captured = captured.clone();
    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let uri_slot = server_captured.clone();
        let mut ws = accept_hdr_async(stream, move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
            uri_slot.lock().unwrap().uri = request.uri().to_string();
            Ok(response)
        })
        .await
        .unwrap();

        if let Some(Ok(Message::Text(payload))) = ws.next().await {
            server_captured.lock().unwrap().payload = Some(payload.as_str().to_string());
        }

        for frame in frames {
            if ws.send(frame).await.is_err() {
                return;
            }
        }

        // Drain until the client closes
        while let Some(Ok(_)) = ws.next().await {}
    });

    (format!("ws://{addr}/"), captured, handle)
}

/// Sample configuration YAML for testing
pub const SAMPLE_CONFIG_YAML: &str = r#"
api:
  base_url: "https://api.example.com"
  ws_url: "wss://ws.example.com/"
  token_env: "MY_CREATEAI_TOKEN"
  timeout_secs: 30

model:
  provider: "aws"
  name: "claude4_5_sonnet"
  temperature: 0.5
  system_prompt: "You are a study assistant."

stream:
  ping_interval_secs: 5
  ping_timeout_secs: 15

logs:
  level: "debug"

scenarios:
  - name: "sql-only"
    description: "Restrict to the SQL deck"
    query: "How do I write SQL queries?"
    filter:
      material_id: "1002"
      source_name: ["2-sql_basics.pptx"]
    target_source_name: "2-sql_basics.pptx"
    keywords: ["select", "join"]
  - name: "list-docs"
    endpoint: search
    query: "the"
    top_k: 100
"#;
