//! End-to-End Test Suite: model management and chat against a mock daemon
//!
//! Each test drives the public API the way the terminal front end does:
//! refresh the catalog, pull with progress, stream a chat turn and read the
//! reasoning/answer split back out of the transcript.

use ochat_client::{ModelManager, OllamaClient, ServerConfig};
use ochat_sessions::{ChatSession, Conversation, ConversationStore, ExchangeState};
use tempfile::TempDir;

fn client_for(url: &str) -> OllamaClient {
    let (host, port) = url.rsplit_once(':').expect("mock url has a port");
    let mut config = ServerConfig::default();
    config.set("host", host).expect("host is a known key");
    config.set("port", port).expect("port is a known key");
    OllamaClient::new(config).expect("client builds")
}

/// Listing one model makes it the default duplicate source
#[tokio::test]
async fn test_catalog_defaults_duplicate_source() {
    let mut server = mockito::Server::new_async().await;
    let _tags = server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"models":[{"name":"llama3","size":4000000000}]}"#)
        .create_async()
        .await;

    let manager = ModelManager::new(client_for(&server.url()));
    let models = manager.refresh().await.unwrap();

    assert_eq!(models.len(), 1);
    assert_eq!(models[0].size, 4_000_000_000);
    assert_eq!(
        manager.catalog().default_duplicate_source().await.as_deref(),
        Some("llama3")
    );
}

/// Pull progress ends at the last cumulative record
#[tokio::test]
async fn test_pull_reaches_full_progress() {
    let mut server = mockito::Server::new_async().await;
    let _pull = server
        .mock("POST", "/api/pull")
        .with_status(200)
        .with_body("{\"completed\":1024,\"total\":2048}\n{\"completed\":2048,\"total\":2048}\n")
        .create_async()
        .await;
    let _tags = server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_body(r#"{"models":[{"name":"llama3","size":2048}]}"#)
        .create_async()
        .await;

    let manager = ModelManager::new(client_for(&server.url()));
    let mut seen = Vec::new();
    let outcome = manager
        .pull_and_refresh("llama3", |p| seen.push((p.completed_bytes, p.total_bytes)))
        .await
        .unwrap();

    assert_eq!(seen, vec![(1024, 2048), (2048, 2048)]);
    assert_eq!(outcome.progress.completed_bytes, 2048);
    assert_eq!(outcome.progress.total_bytes, 2048);
    assert_eq!(outcome.progress.percentage(), 100.0);
    assert!(manager.catalog().contains("llama3").await);
}

/// Think markers arriving as separate deltas split into reasoning and answer
#[tokio::test]
async fn test_chat_segments_reasoning_from_answer() {
    let mut server = mockito::Server::new_async().await;
    let _generate = server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_body(concat!(
            "{\"response\":\"<think>\"}\n",
            "{\"response\":\"reasoning here\"}\n",
            "{\"response\":\"</think>\"}\n",
            "{\"response\":\"final answer\",\"done\":true}\n"
        ))
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let store = ConversationStore::with_dir(dir.path()).await.unwrap();
    let conversation = Conversation::new("Thinking");
    let id = conversation.id;

    let session = ChatSession::with_conversation(client_for(&server.url()), store.clone(), conversation);
    let index = session
        .send(ochat_client::ChatTurn::new("deepseek-r1", "think first"))
        .await
        .unwrap();

    let exchange = session.exchange(index).await.unwrap();
    assert_eq!(exchange.state(), &ExchangeState::Completed);

    let view = exchange.segmented();
    assert_eq!(view.reasoning(), "reasoning here");
    assert_eq!(view.answer(), "final answer");

    let saved = store.load(&id).await.unwrap();
    assert_eq!(saved.messages.len(), 2);
    assert_eq!(
        ochat_sessions::segment(&saved.messages[1].content).answer(),
        "final answer"
    );
}

/// A daemon that is not listening leaves the catalog as it was
#[tokio::test]
async fn test_unreachable_daemon_keeps_catalog() {
    let mut config = ServerConfig::default();
    config.set("port", "1").unwrap();
    let manager = ModelManager::new(OllamaClient::new(config).unwrap());
    manager
        .catalog()
        .replace(vec![ochat_client::ModelDescriptor::placeholder("cached")])
        .await;

    let err = manager.refresh().await.unwrap_err();
    assert_eq!(err.notice().title, "Server Unreachable");
    assert_eq!(manager.catalog().names().await, vec!["cached".to_string()]);
}
