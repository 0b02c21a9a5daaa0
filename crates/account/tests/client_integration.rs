//! Drives `HttpAccountClient` against the account router on a real socket.

use std::sync::Arc;
use std::time::Duration;

use account::{AccountApi, AccountService, HttpAccountClient, InMemoryAccountRepository};
use common::{AccountId, ErrorKind, Pagination};

async fn spawn_service() -> HttpAccountClient {
    let service = Arc::new(AccountService::new(InMemoryAccountRepository::new()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, account::routes::router(service))
            .await
            .unwrap();
    });
    HttpAccountClient::new(format!("http://{addr}"), Duration::from_secs(5))
}

#[tokio::test]
async fn test_create_get_and_list_over_http() {
    let client = spawn_service().await;

    let alice = client.create_account("Alice".into()).await.unwrap();
    assert_eq!(alice.name, "Alice");

    let fetched = client.get_account(&alice.id).await.unwrap();
    assert_eq!(fetched, alice);

    let listed = client.list_accounts(Pagination::new(0, 10)).await.unwrap();
    assert_eq!(listed, vec![alice]);
}

#[tokio::test]
async fn test_missing_account_keeps_not_found_kind() {
    let client = spawn_service().await;

    let err = client
        .get_account(&AccountId::new("ghost"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_reserved_characters_do_not_reach_another_account() {
    let client = spawn_service().await;
    let alice = client.create_account("Alice".into()).await.unwrap();

    for suffix in ["?x=1", "#frag", "/orders", "%2F"] {
        let id = AccountId::new(format!("{}{suffix}", alice.id));
        let err = client.get_account(&id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "id {id}");
    }

    let err = client.get_account(&AccountId::new("a/b")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_invalid_input_keeps_its_kind() {
    let client = spawn_service().await;

    let err = client.create_account("   ".into()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}
