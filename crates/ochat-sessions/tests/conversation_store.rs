//! Tests for on-disk conversation storage

use ochat_sessions::{Conversation, ConversationStore, SessionError};
use tempfile::TempDir;
use uuid::Uuid;

#[tokio::test]
async fn test_save_and_load() {
    let dir = TempDir::new().unwrap();
    let store = ConversationStore::with_dir(dir.path()).await.unwrap();

    let mut conversation = Conversation::new("Recipes");
    conversation.push_user("How long to boil an egg?");
    conversation.push_assistant("About nine minutes.");
    store.save(&conversation).await.unwrap();

    let loaded = store.load(&conversation.id).await.unwrap();
    assert_eq!(loaded, conversation);
}

#[tokio::test]
async fn test_load_missing() {
    let dir = TempDir::new().unwrap();
    let store = ConversationStore::with_dir(dir.path()).await.unwrap();

    let result = store.load(&Uuid::new_v4()).await;
    assert!(matches!(result, Err(SessionError::NotFound(_))));
}

#[tokio::test]
async fn test_list_newest_first_and_skips_corrupt() {
    let dir = TempDir::new().unwrap();
    let store = ConversationStore::with_dir(dir.path()).await.unwrap();

    let older = Conversation::new("older");
    store.save(&older).await.unwrap();

    let mut newer = Conversation::new("newer");
    newer.push_user("hello");
    store.save(&newer).await.unwrap();

    std::fs::write(dir.path().join("broken.json"), "{ nope").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let listed = store.list().await.unwrap();
    let titles: Vec<_> = listed.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["newer", "older"]);
}

#[tokio::test]
async fn test_delete() {
    let dir = TempDir::new().unwrap();
    let store = ConversationStore::with_dir(dir.path()).await.unwrap();

    let conversation = Conversation::new("temp");
    store.save(&conversation).await.unwrap();
    store.delete(&conversation.id).await.unwrap();

    assert!(store.list().await.unwrap().is_empty());
    assert!(matches!(
        store.delete(&conversation.id).await,
        Err(SessionError::NotFound(_))
    ));
}
