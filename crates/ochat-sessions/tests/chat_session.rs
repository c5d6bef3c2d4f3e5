//! Integration tests for ChatSession against a mock daemon

use std::{io::Write, time::Duration};

use ochat_client::{ChatTurn, OllamaClient, ServerConfig};
use ochat_sessions::{
    ChatEvent, ChatSession, Conversation, ConversationStore, ExchangeState, SessionError,
};
use tempfile::TempDir;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

fn client_for(url: &str) -> OllamaClient {
    let (host, port) = url.rsplit_once(':').expect("mock url has a port");
    let mut config = ServerConfig::default();
    config.set("host", host).unwrap();
    config.set("port", port).unwrap();
    OllamaClient::new(config).unwrap()
}

const THINKING_BODY: &str = concat!(
    "{\"response\":\"<think>\",\"done\":false}\n",
    "{\"response\":\"reasoning here\",\"done\":false}\n",
    "{\"response\":\"</think>\",\"done\":false}\n",
    "{\"response\":\"final answer\",\"done\":true}\n"
);

#[tokio::test]
async fn test_send_streams_into_transcript() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_body(THINKING_BODY)
        .create_async()
        .await;

    let session = ChatSession::new(client_for(&server.url()));
    let mut events = session.bus().subscribe();

    let index = session.send(ChatTurn::new("deepseek-r1", "why?")).await.unwrap();
    assert_eq!(index, 0);

    let exchange = session.exchange(0).await.unwrap();
    assert_eq!(exchange.state(), &ExchangeState::Completed);
    assert_eq!(exchange.response(), "<think>reasoning here</think>final answer");

    let view = exchange.segmented();
    assert_eq!(view.reasoning(), "reasoning here");
    assert_eq!(view.answer(), "final answer");

    assert_eq!(events.recv().await.unwrap(), ChatEvent::ExchangeStarted { index: 0 });
    let mut updates = 0;
    loop {
        match events.recv().await.unwrap() {
            ChatEvent::ResponseUpdated { .. } => updates += 1,
            ChatEvent::ExchangeCompleted { index } => {
                assert_eq!(index, 0);
                break;
            }
            other => panic!("Unexpected event {:?}", other),
        }
    }
    assert_eq!(updates, 4);
}

#[tokio::test]
async fn test_failed_stream_keeps_partial_text() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_body("{\"response\":\"half an ans\"}\nnot-json\n")
        .create_async()
        .await;

    let session = ChatSession::new(client_for(&server.url()));
    let err = session
        .send(ChatTurn::new("llama3", "hi"))
        .await
        .unwrap_err();
    assert_eq!(err.notice().title, "Invalid Data");

    let exchange = session.exchange(0).await.unwrap();
    assert_eq!(exchange.response(), "half an ans");
    assert!(matches!(exchange.state(), ExchangeState::Failed(_)));
    assert!(!session.is_busy());
}

/// Answers one request with a single chunked record, then hangs up
async fn serve_truncated_stream(listener: TcpListener, record: &'static str) {
    let (mut socket, _) = listener.accept().await.unwrap();

    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        request.extend_from_slice(&buf[..n]);
        let text = String::from_utf8_lossy(&request);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let body_len = text[..head_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if request.len() >= head_end + 4 + body_len {
                break;
            }
        }
        if n == 0 {
            break;
        }
    }

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/x-ndjson\r\nTransfer-Encoding: chunked\r\n\r\n{:x}\r\n{}\r\n",
        record.len(),
        record
    );
    socket.write_all(response.as_bytes()).await.unwrap();
    socket.flush().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn test_dropped_connection_keeps_partial_text() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve_truncated_stream(
        listener,
        "{\"response\":\"partial \"}\n",
    ));

    let session = ChatSession::new(client_for(&format!("http://{}", addr)));
    let err = session
        .send(ChatTurn::new("llama3", "tell me everything"))
        .await
        .unwrap_err();
    server.await.unwrap();

    assert!(matches!(err, SessionError::Client(_)));
    assert_eq!(err.notice().title, "Server Unreachable");

    let exchange = session.exchange(0).await.unwrap();
    assert_eq!(exchange.response(), "partial ");
    assert!(matches!(exchange.state(), ExchangeState::Failed(_)));
    assert!(!session.is_busy());
}

#[tokio::test]
async fn test_status_error_records_failed_exchange() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/generate")
        .with_status(404)
        .with_body(r#"{"error":"model 'ghost' not found"}"#)
        .create_async()
        .await;

    let session = ChatSession::new(client_for(&server.url()));
    let err = session.send(ChatTurn::new("ghost", "hi")).await.unwrap_err();

    assert!(matches!(err, SessionError::Client(_)));
    let transcript = session.transcript().await;
    assert_eq!(transcript.len(), 1);
    assert_eq!(transcript[0].response(), "");
}

#[tokio::test]
async fn test_invalid_turn_adds_nothing() {
    let session = ChatSession::new(OllamaClient::with_default_config().unwrap());
    assert!(session.send(ChatTurn::new("llama3", "")).await.is_err());
    assert!(session.transcript().await.is_empty());
    assert!(!session.is_busy());
}

#[tokio::test]
async fn test_overlapping_send_rejected() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_chunked_body(|w| {
            std::thread::sleep(Duration::from_millis(300));
            w.write_all(b"{\"response\":\"slow\",\"done\":true}\n")
        })
        .create_async()
        .await;

    let session = ChatSession::new(client_for(&server.url()));
    let background = session.clone();
    let first = tokio::spawn(async move { background.send(ChatTurn::new("llama3", "one")).await });

    while !session.is_busy() {
        tokio::task::yield_now().await;
    }

    let second = session.send(ChatTurn::new("llama3", "two")).await;
    assert!(matches!(second, Err(SessionError::SendInFlight)));
    assert!(matches!(session.reset().await, Err(SessionError::SendInFlight)));

    assert_eq!(first.await.unwrap().unwrap(), 0);
    assert_eq!(session.transcript().await.len(), 1);
}

#[tokio::test]
async fn test_reset_clears_transcript() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_body("{\"response\":\"ok\",\"done\":true}\n")
        .expect(2)
        .create_async()
        .await;

    let session = ChatSession::new(client_for(&server.url()));
    session.send(ChatTurn::new("llama3", "a")).await.unwrap();
    session.reset().await.unwrap();
    assert!(session.transcript().await.is_empty());

    let index = session.send(ChatTurn::new("llama3", "b")).await.unwrap();
    assert_eq!(index, 0);
}

#[tokio::test]
async fn test_reset_releases_session() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_body("{\"response\":\"ok\",\"done\":true}\n")
        .create_async()
        .await;

    let session = ChatSession::new(client_for(&server.url()));
    session.reset().await.unwrap();
    session.reset().await.unwrap();
    assert!(!session.is_busy());

    assert_eq!(session.send(ChatTurn::new("llama3", "a")).await.unwrap(), 0);
}

#[tokio::test]
async fn test_bound_conversation_is_saved() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_body("{\"response\":\"Paris\",\"done\":true}\n")
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let store = ConversationStore::with_dir(dir.path()).await.unwrap();
    let conversation = Conversation::new("Geography");
    let id = conversation.id;

    let session =
        ChatSession::with_conversation(client_for(&server.url()), store.clone(), conversation);
    session
        .send(ChatTurn::new("llama3", "Capital of France?"))
        .await
        .unwrap();

    let saved = store.load(&id).await.unwrap();
    assert_eq!(saved.messages.len(), 2);
    assert_eq!(saved.messages[0].content, "Capital of France?");
    assert!(saved.messages[0].is_from_user);
    assert_eq!(saved.last_message_preview(), "Paris");
}
