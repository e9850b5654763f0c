use mindmate_chat::store::{ACTIVE_KEY, CONVERSATIONS_KEY};
use mindmate_chat::{open_store, Message, MessageRole};

#[tokio::test]
async fn conversations_survive_restart() {
    let dir = tempfile::TempDir::new().unwrap();

    let store = open_store(dir.path()).await.unwrap();
    let id = store.create("Kept").await.id;
    store.append(&id, Message::user("note to self")).await;
    drop(store);

    let reopened = open_store(dir.path()).await.unwrap();
    assert_eq!(reopened.active_id().await, id);

    let conv = reopened.get(&id).await.unwrap();
    assert_eq!(conv.title, "Kept");
    assert_eq!(conv.messages.len(), 2);
    assert_eq!(conv.messages[1].role, MessageRole::User);
    assert_eq!(reopened.list().await.len(), 2);
}

#[tokio::test]
async fn corrupt_file_is_replaced_with_welcome_conversation() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(format!("{CONVERSATIONS_KEY}.json")),
        "this is not json",
    )
    .unwrap();

    let store = open_store(dir.path()).await.unwrap();
    let list = store.list().await;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].messages.len(), 1);
    assert_eq!(list[0].messages[0].role, MessageRole::Assistant);

    let active = std::fs::read_to_string(dir.path().join(format!("{ACTIVE_KEY}.json"))).unwrap();
    assert_eq!(active, list[0].id);
}
