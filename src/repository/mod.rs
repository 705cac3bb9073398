//! Repository layer for user and book persistence
//!
//! Services talk to the store through the [`UsersStore`] and [`BooksStore`]
//! traits. The `users` and `books` modules back them with PostgreSQL;
//! `MemoryRepository` keeps everything in process (`memory://` URL).

pub mod books;
pub mod memory;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookShort, CreateBook},
        user::{NewUser, Role, User},
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersStore: Send + Sync {
    /// Lookup by (already lowercased) username
    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// True when a user holds this username or this phone number
    async fn username_or_phone_exists(&self, username: &str, phone_number: &str) -> AppResult<bool>;

    async fn create(&self, user: &NewUser) -> AppResult<User>;

    /// All users, newest first
    async fn list(&self) -> AppResult<Vec<User>>;

    async fn update_role(&self, id: Uuid, role: Role) -> AppResult<Option<User>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BooksStore: Send + Sync {
    /// Exact bookId match
    async fn get_by_book_id(&self, book_id: &str) -> AppResult<Option<Book>>;

    /// Case-insensitive bookId match
    async fn find_by_book_id_ci(&self, book_id: &str) -> AppResult<Option<Book>>;

    async fn book_id_or_title_exists(&self, book_id: &str, title: &str) -> AppResult<bool>;

    async fn create(&self, book: &CreateBook) -> AppResult<Book>;

    /// Append text to the content in a single store operation
    async fn append_content(&self, book_id: &str, text: &str) -> AppResult<Option<Book>>;

    /// Returns false when no book had this bookId
    async fn delete(&self, book_id: &str) -> AppResult<bool>;

    /// All books without content, ordered by title
    async fn list(&self) -> AppResult<Vec<BookShort>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> AppResult<()>;
}

/// Handles to the stores used by the services
#[derive(Clone)]
pub struct Repository {
    pub users: Arc<dyn UsersStore>,
    pub books: Arc<dyn BooksStore>,
    pub health: Arc<dyn HealthCheck>,
}

impl Repository {
    /// Create a repository backed by the given PostgreSQL pool
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self {
            users: Arc::new(users::UsersRepository::new(pool.clone())),
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            health: Arc::new(PgHealth { pool }),
        }
    }

    /// Create a repository holding all records in process memory
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryRepository::default());
        Self {
            users: store.clone(),
            books: store.clone(),
            health: store,
        }
    }
}

struct PgHealth {
    pool: Pool<Postgres>,
}

#[async_trait]
impl HealthCheck for PgHealth {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
