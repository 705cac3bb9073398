//! End-to-end tests: a real server on an ephemeral port driven through `LibraryClient`

use libris_server::{
    api,
    client::{ClientError, LibraryClient},
    config::{AdminConfig, AppConfig},
    models::{book::CreateBook, user::RegisterUser, Role},
    repository::Repository,
    AppState,
};
use reqwest::StatusCode;

/// Start a server on the in-memory store with a bootstrapped `admin` account
async fn spawn_server() -> String {
    let mut config = AppConfig::default();
    config.database.url = "memory://".to_string();
    let admin = AdminConfig {
        username: "admin".to_string(),
        password: "admin-pass".to_string(),
        fullname: "Administrator".to_string(),
        email: "admin@example.com".to_string(),
        address: "Front desk".to_string(),
        phone_number: "000".to_string(),
    };

    let state = AppState::new(config, Repository::in_memory());
    state.services.users.ensure_admin(&admin).await.unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, api::router(state)).await.unwrap();
    });

    format!("http://{}/api/v1", addr)
}

fn reader(username: &str, phone: &str) -> RegisterUser {
    RegisterUser {
        username: username.to_string(),
        fullname: "Alice Liddell".to_string(),
        email: format!("{}@example.com", username),
        address: "1 Rabbit Hole".to_string(),
        phone_number: phone.to_string(),
        password: "secret1".to_string(),
    }
}

fn dune() -> CreateBook {
    CreateBook {
        title: "Dune".to_string(),
        book_id: "DUNE-1".to_string(),
        section: "fiction".to_string(),
        author: "Frank Herbert".to_string(),
        content: "Chapter one.".to_string(),
        edition: 1,
    }
}

#[tokio::test]
async fn test_reader_session_and_forbidden_admin_action() {
    let base = spawn_server().await;
    let client = LibraryClient::new(&base);

    let message = client.register(&reader("Alice", "555")).await.unwrap();
    assert_eq!(message, "User Registration Successful");

    let session = client.login("alice", "secret1").await.unwrap();
    assert_eq!(session.username, "alice");
    assert_eq!(session.role, Role::Regular);
    assert!(client.is_authenticated().await);
    assert!(!client.is_admin().await);

    assert!(client.list_books().await.unwrap().is_empty());

    let err = client.add_book(&dune()).await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(ref m) if m == "You are not permitted!"));
    assert!(!client.is_authenticated().await);
}

#[tokio::test]
async fn test_admin_manages_catalog_and_roles() {
    let base = spawn_server().await;
    let admin = LibraryClient::new(&base);
    let alice = LibraryClient::new(&base);

    alice.register(&reader("alice", "555")).await.unwrap();
    alice.login("alice", "secret1").await.unwrap();

    let session = admin.login("admin", "admin-pass").await.unwrap();
    assert_eq!(session.role, Role::Admin);

    let book = admin.add_book(&dune()).await.unwrap();
    assert_eq!(book.book_id, "DUNE-1");

    let book = admin.update_book("DUNE-1", " Chapter two.").await.unwrap();
    assert_eq!(book.content, "Chapter one. Chapter two.");

    let read = alice.read_book("dune-1").await.unwrap();
    assert_eq!(read.content, "Chapter one. Chapter two.");

    let users = admin.list_users().await.unwrap();
    assert_eq!(users.len(), 2);
    let alice_id = users.iter().find(|u| u.username == "alice").unwrap().id;

    let updated = admin.update_role(alice_id, Role::Admin).await.unwrap();
    assert_eq!(updated.user.role, Role::Admin);

    // The existing token still carries the old role until the next login
    assert!(!alice.is_admin().await);
    alice.login("alice", "secret1").await.unwrap();
    assert!(alice.is_admin().await);

    let message = alice.delete_book("DUNE-1", Some("Dune")).await.unwrap();
    assert_eq!(message, "Book deleted Successfully!");
    assert!(alice.list_books().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_api_errors_keep_the_session() {
    let base = spawn_server().await;
    let client = LibraryClient::new(&base);
    client.login("admin", "admin-pass").await.unwrap();

    client.add_book(&dune()).await.unwrap();
    let err = client.add_book(&dune()).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Api { status, ref message }
            if status == StatusCode::CONFLICT && message == "This Book already exists!"
    ));

    let err = client.read_book("missing").await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status, .. } if status == StatusCode::NOT_FOUND));

    assert!(client.is_authenticated().await);
}

#[tokio::test]
async fn test_bad_login_and_logout() {
    let base = spawn_server().await;
    let client = LibraryClient::new(&base);

    let err = client.login("admin", "wrong").await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(ref m) if m == "Invalid username or password"));

    client.login("admin", "admin-pass").await.unwrap();
    client.logout().await;
    assert!(client.session().await.is_none());

    let err = client.list_books().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(ref m) if m == "No token provided"));
}

#[tokio::test]
async fn test_concurrent_appends_are_all_kept() {
    let base = spawn_server().await;
    let client = std::sync::Arc::new(LibraryClient::new(&base));
    client.login("admin", "admin-pass").await.unwrap();
    client.add_book(&dune()).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..10 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client.update_book("DUNE-1", &format!("[{}]", i)).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let book = client.read_book("DUNE-1").await.unwrap();
    for i in 0..10 {
        assert!(book.content.contains(&format!("[{}]", i)));
    }
}
