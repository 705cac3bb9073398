//! In-process store used for tests and `memory://` deployments

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookShort, CreateBook},
        user::{NewUser, Role, User},
    },
};

use super::{BooksStore, HealthCheck, UsersStore};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    /// Keyed by bookId
    books: HashMap<String, Book>,
}

/// Both stores behind a single lock, mirroring the unique constraints of the SQL schema
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

#[async_trait]
impl UsersStore for MemoryRepository {
    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn username_or_phone_exists(&self, username: &str, phone_number: &str) -> AppResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .any(|u| u.username == username || u.phone_number == phone_number))
    }

    async fn create(&self, user: &NewUser) -> AppResult<User> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("Duplicate value violates users_username_key".to_string()));
        }
        if tables.users.values().any(|u| u.phone_number == user.phone_number) {
            return Err(AppError::Conflict("Duplicate value violates users_phone_number_key".to_string()));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            username: user.username.clone(),
            fullname: user.fullname.clone(),
            email: user.email.clone(),
            address: user.address.clone(),
            phone_number: user.phone_number.clone(),
            password: user.password_hash.clone(),
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(created.id, created.clone());

        Ok(created)
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let mut users: Vec<User> = self.tables.read().await.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn update_role(&self, id: Uuid, role: Role) -> AppResult<Option<User>> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.role = role;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }
}

#[async_trait]
impl BooksStore for MemoryRepository {
    async fn get_by_book_id(&self, book_id: &str) -> AppResult<Option<Book>> {
        Ok(self.tables.read().await.books.get(book_id).cloned())
    }

    async fn find_by_book_id_ci(&self, book_id: &str) -> AppResult<Option<Book>> {
        let tables = self.tables.read().await;
        let wanted = book_id.to_lowercase();
        let mut matches: Vec<&Book> = tables
            .books
            .values()
            .filter(|b| b.book_id.to_lowercase() == wanted)
            .collect();
        matches.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(matches.first().map(|b| (*b).clone()))
    }

    async fn book_id_or_title_exists(&self, book_id: &str, title: &str) -> AppResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.books.contains_key(book_id) || tables.books.values().any(|b| b.title == title))
    }

    async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let mut tables = self.tables.write().await;

        if tables.books.contains_key(&book.book_id) {
            return Err(AppError::Conflict("Duplicate value violates books_book_id_key".to_string()));
        }
        if tables.books.values().any(|b| b.title == book.title) {
            return Err(AppError::Conflict("Duplicate value violates books_title_key".to_string()));
        }

        let now = Utc::now();
        let created = Book {
            id: Uuid::new_v4(),
            title: book.title.clone(),
            book_id: book.book_id.clone(),
            section: book.section.clone(),
            author: book.author.clone(),
            content: book.content.clone(),
            edition: book.edition,
            created_at: now,
            updated_at: now,
        };
        tables.books.insert(created.book_id.clone(), created.clone());

        Ok(created)
    }

    async fn append_content(&self, book_id: &str, text: &str) -> AppResult<Option<Book>> {
        let mut tables = self.tables.write().await;
        Ok(tables.books.get_mut(book_id).map(|book| {
            book.content.push_str(text);
            book.updated_at = Utc::now();
            book.clone()
        }))
    }

    async fn delete(&self, book_id: &str) -> AppResult<bool> {
        Ok(self.tables.write().await.books.remove(book_id).is_some())
    }

    async fn list(&self) -> AppResult<Vec<BookShort>> {
        let mut books: Vec<BookShort> = self
            .tables
            .read()
            .await
            .books
            .values()
            .cloned()
            .map(BookShort::from)
            .collect();
        books.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(books)
    }
}

#[async_trait]
impl HealthCheck for MemoryRepository {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
