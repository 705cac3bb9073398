//! Book catalog service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, BookShort, CreateBook, DeleteBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Find a book by bookId, falling back to a case-insensitive match
    pub async fn read_book(&self, query: BookQuery) -> AppResult<Book> {
        query.validate()?;
        let book_id = query.book_id.trim();

        if let Some(book) = self.repository.books.get_by_book_id(book_id).await? {
            return Ok(book);
        }

        self.repository
            .books
            .find_by_book_id_ci(book_id)
            .await?
            .ok_or_else(|| AppError::NotFound("This Book is not present".to_string()))
    }

    pub async fn list_books(&self) -> AppResult<Vec<BookShort>> {
        self.repository.books.list().await
    }

    pub async fn add_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()?;

        if self
            .repository
            .books
            .book_id_or_title_exists(&book.book_id, &book.title)
            .await?
        {
            return Err(AppError::Conflict("This Book already exists!".to_string()));
        }

        let created = self.repository.books.create(&book).await.map_err(|e| match e {
            AppError::Conflict(_) => AppError::Conflict("This Book already exists!".to_string()),
            other => other,
        })?;

        tracing::info!(book_id = %created.book_id, title = %created.title, "Book created");
        Ok(created)
    }

    /// Append `updation` to the book content
    pub async fn update_book(&self, update: UpdateBook) -> AppResult<Book> {
        update.validate()?;
        let book_id = update.book_id.trim();

        let book = self
            .repository
            .books
            .append_content(book_id, &update.updation)
            .await?
            .ok_or_else(|| AppError::NotFound("That book does not exist!".to_string()))?;

        tracing::info!(book_id = %book.book_id, appended = update.updation.len(), "Book content appended");
        Ok(book)
    }

    pub async fn delete_book(&self, request: DeleteBook) -> AppResult<()> {
        request.validate()?;
        let book_id = request.book_id.trim();

        if !self.repository.books.delete(book_id).await? {
            return Err(AppError::NotFound(
                "This Book is not present or Id is wrong!".to_string(),
            ));
        }

        tracing::info!(book_id = %book_id, title = ?request.title, "Book deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockBooksStore;
    use std::sync::Arc;

    fn dune() -> CreateBook {
        CreateBook {
            title: "Dune".to_string(),
            book_id: "DUNE-1".to_string(),
            section: "fiction".to_string(),
            author: "Frank Herbert".to_string(),
            content: "In the week before their departure".to_string(),
            edition: 1,
        }
    }

    #[tokio::test]
    async fn test_add_rejects_duplicate_book_id_and_title() {
        let books = BooksService::new(Repository::in_memory());
        books.add_book(dune()).await.unwrap();

        let mut same_id = dune();
        same_id.title = "Dune Messiah".to_string();
        let mut same_title = dune();
        same_title.book_id = "DUNE-2".to_string();

        assert!(matches!(books.add_book(same_id).await, Err(AppError::Conflict(_))));
        assert!(matches!(books.add_book(same_title).await, Err(AppError::Conflict(_))));
        assert_eq!(books.list_books().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_read_falls_back_to_case_insensitive_match() {
        let books = BooksService::new(Repository::in_memory());
        books.add_book(dune()).await.unwrap();

        let found = books
            .read_book(BookQuery { book_id: " dune-1 ".to_string() })
            .await
            .unwrap();
        assert_eq!(found.title, "Dune");

        let missing = books.read_book(BookQuery { book_id: "nope".to_string() }).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_sequential_appends_both_land() {
        let books = BooksService::new(Repository::in_memory());
        books.add_book(dune()).await.unwrap();

        for text in [" Chapter 1.", " Chapter 2."] {
            books
                .update_book(UpdateBook { book_id: "DUNE-1".into(), updation: text.into() })
                .await
                .unwrap();
        }

        let book = books.read_book(BookQuery { book_id: "DUNE-1".into() }).await.unwrap();
        assert!(book.content.ends_with(" Chapter 1. Chapter 2."));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_book() {
        let books = BooksService::new(Repository::in_memory());

        let update = books
            .update_book(UpdateBook { book_id: "ghost".into(), updation: "boo".into() })
            .await;
        let delete = books
            .delete_book(DeleteBook { title: None, book_id: "ghost".into() })
            .await;

        assert!(matches!(update, Err(AppError::NotFound(_))));
        assert!(matches!(delete, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_padded_book_id_matches_on_update_and_delete() {
        let books = BooksService::new(Repository::in_memory());
        books.add_book(dune()).await.unwrap();

        let book = books
            .update_book(UpdateBook { book_id: " DUNE-1 ".into(), updation: " More.".into() })
            .await
            .unwrap();
        assert!(book.content.ends_with(" More."));

        books
            .delete_book(DeleteBook { title: None, book_id: " DUNE-1 ".into() })
            .await
            .unwrap();
        assert!(books.list_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_requires_text() {
        let books = BooksService::new(Repository::in_memory());
        let result = books
            .update_book(UpdateBook { book_id: "DUNE-1".into(), updation: String::new() })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_append_goes_through_single_store_call() {
        let mut store = MockBooksStore::new();
        store
            .expect_append_content()
            .withf(|book_id, text| book_id.to_string() == "DUNE-1" && text.to_string() == " more")
            .times(1)
            .returning(|_, _| Ok(None));

        let mut repository = Repository::in_memory();
        repository.books = Arc::new(store);

        let result = BooksService::new(repository)
            .update_book(UpdateBook { book_id: "DUNE-1".into(), updation: " more".into() })
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
