use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use thiserror::Error;
use utoipa::ToSchema;

static MEMDB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// A persisted book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, ToSchema, sqlx::FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub rating: f64,
    pub price: f64,
}

/// Book fields without an id. Request payload for create and update.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, ToSchema)]
pub struct NewBook {
    pub title: String,
    pub rating: f64,
    pub price: f64,
}

/// Book storage over a SQLite connection pool.
#[derive(Clone)]
pub struct BookStore {
    pool: SqlitePool,
}

impl BookStore {
    /// Connection acquire timeout.
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a new store, running migrations if needed.
    ///
    /// `path` is a SQLite file path, or `:memory:` for an in-memory database.
    pub async fn connect(path: &str) -> Result<Self, StoreError> {
        let pool = if path == ":memory:" {
            // Use a uniquely named shared-cache memory database per call.
            // `file::memory:` is global-ish and will collide across parallel tests.
            let id = MEMDB_COUNTER.fetch_add(1, Ordering::Relaxed);
            let memdb_uri = format!(
                "file:bookshelf-memdb-{}-{}?mode=memory&cache=shared",
                std::process::id(),
                id
            );

            let options = SqliteConnectOptions::new()
                .filename(&memdb_uri)
                .shared_cache(true)
                .create_if_missing(true);

            SqlitePoolOptions::new()
                .max_connections(1)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .connect_with(options)
                .await?
        } else {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    if let Err(err) = std::fs::create_dir_all(parent) {
                        tracing::warn!(path = %parent.display(), %err, "Failed to create database directory");
                    }
                }
            }

            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true);

            SqlitePoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .connect_with(options)
                .await?
        };

        tracing::info!(%path, "Database connected");

        sqlx::migrate!("./migrations").run(&pool).await?;

        // WAL mode allows reads to happen while writes are in progress.
        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&pool)
            .await?;

        Ok(Self { pool })
    }

    /// Inserts a book and returns it carrying the generated id.
    pub async fn insert(&self, new_book: &NewBook) -> Result<Book, StoreError> {
        let result = sqlx::query("INSERT INTO books (title, rating, price) VALUES (?, ?, ?)")
            .bind(&new_book.title)
            .bind(new_book.rating)
            .bind(new_book.price)
            .execute(&self.pool)
            .await?;

        Ok(Book {
            id: result.last_insert_rowid(),
            title: new_book.title.clone(),
            rating: new_book.rating,
            price: new_book.price,
        })
    }

    /// Returns all books in id order.
    pub async fn list(&self) -> Result<Vec<Book>, StoreError> {
        let books =
            sqlx::query_as::<_, Book>("SELECT id, title, rating, price FROM books ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(books)
    }

    /// Returns the book with the given id, if present.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Book>, StoreError> {
        let book =
            sqlx::query_as::<_, Book>("SELECT id, title, rating, price FROM books WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(book)
    }

    /// Overwrites title/rating/price of the book with the given id.
    ///
    /// Returns `None` if no book with that id exists.
    pub async fn update(&self, id: i64, fields: &NewBook) -> Result<Option<Book>, StoreError> {
        let result = sqlx::query("UPDATE books SET title = ?, rating = ?, price = ? WHERE id = ?")
            .bind(&fields.title)
            .bind(fields.rating)
            .bind(fields.price)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(Book {
            id,
            title: fields.title.clone(),
            rating: fields.rating,
            price: fields.price,
        }))
    }

    /// Deletes the book with the given id. Deleting a missing id is a no-op.
    ///
    /// Returns the number of rows deleted.
    pub async fn delete(&self, id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_book(title: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            rating: 4.0,
            price: 4000.0,
        }
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store = BookStore::connect(":memory:").await.unwrap();

        let first = store.insert(&new_book("one")).await.unwrap();
        let second = store.insert(&new_book("two")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.title, "one");
    }

    #[tokio::test]
    async fn list_returns_books_in_id_order() {
        let store = BookStore::connect(":memory:").await.unwrap();

        store.insert(&new_book("one")).await.unwrap();
        store.insert(&new_book("two")).await.unwrap();
        store.insert(&new_book("three")).await.unwrap();

        let books = store.list().await.unwrap();

        assert_eq!(books.len(), 3);
        assert_eq!(
            books.iter().map(|book| book.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(books[0].title, "one");
    }

    #[tokio::test]
    async fn find_by_id_returns_inserted_book() {
        let store = BookStore::connect(":memory:").await.unwrap();

        let inserted = store.insert(&new_book("one")).await.unwrap();
        let found = store.find_by_id(inserted.id).await.unwrap();

        assert_eq!(found, Some(inserted));
    }

    #[tokio::test]
    async fn find_by_id_missing_returns_none() {
        let store = BookStore::connect(":memory:").await.unwrap();

        let found = store.find_by_id(42).await.unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn update_overwrites_fields_and_keeps_id() {
        let store = BookStore::connect(":memory:").await.unwrap();

        let inserted = store.insert(&new_book("one")).await.unwrap();

        let updated = store
            .update(
                inserted.id,
                &NewBook {
                    title: "changed".to_string(),
                    rating: 5.0,
                    price: 5000.0,
                },
            )
            .await
            .unwrap()
            .expect("book exists");

        assert_eq!(updated.id, inserted.id);
        assert_eq!(updated.title, "changed");
        assert_eq!(updated.rating, 5.0);
        assert_eq!(updated.price, 5000.0);

        let found = store.find_by_id(inserted.id).await.unwrap();
        assert_eq!(found, Some(updated));
    }

    #[tokio::test]
    async fn update_missing_returns_none() {
        let store = BookStore::connect(":memory:").await.unwrap();

        let updated = store.update(42, &new_book("one")).await.unwrap();

        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn delete_removes_book() {
        let store = BookStore::connect(":memory:").await.unwrap();

        let inserted = store.insert(&new_book("one")).await.unwrap();

        let deleted = store.delete(inserted.id).await.unwrap();
        assert_eq!(deleted, 1);

        let found = store.find_by_id(inserted.id).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn delete_missing_is_a_noop() {
        let store = BookStore::connect(":memory:").await.unwrap();

        let deleted = store.delete(42).await.unwrap();

        assert_eq!(deleted, 0);
    }
}
