mod filters;

use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{error, info, span, Level};
use uuid::Uuid;

use crate::connection_pool::{checkout, DbPool};
use crate::controllers::books::{apply_update, fetch_book, insert_book, BookRequest};
use crate::errors::Error;
use crate::models::Book;
use crate::schema::{books, progress};
use crate::storage::Storage;

pub use filters::get_filters;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteBookResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total_books: usize,
    pub total_genres: usize,
    pub average_rating: f64,
}

impl CatalogStats {
    /// Average rating is rounded to one decimal and is 0 for an empty catalog.
    pub fn from_entries(entries: &[(String, f64)]) -> CatalogStats {
        let total_books = entries.len();
        let total_genres = entries.iter().map(|(genre, _)| genre).unique().count();
        let average_rating = if total_books == 0 {
            0.0
        } else {
            let sum: f64 = entries.iter().map(|(_, rating)| rating).sum();
            (sum / total_books as f64 * 10.0).round() / 10.0
        };
        CatalogStats {
            total_books,
            total_genres,
            average_rating,
        }
    }
}

#[tracing::instrument(
name = "Admin: list books.",
err,
level = "info"
skip(db_pool),
fields(
    request_id = %Uuid::new_v4(),
)
)]
pub async fn list_books(
    db_pool: DbPool,
) -> Result<Vec<Book>, Error> {
    let conn = checkout(&db_pool).await?;
    let db_span = span!(Level::INFO, "Loading books from db, newest first.");
    let _a = db_span.enter();
    Ok(books::table
        .order(books::created_at.desc())
        .load::<Book>(&*conn)?)
}

#[tracing::instrument(
name = "Admin: create a book.",
err,
level = "info"
skip(db_pool),
fields(
    request_id = %Uuid::new_v4(),
)
)]
pub async fn create_book(
    db_pool: DbPool,
    body: BookRequest,
) -> Result<Book, Error> {
    insert_book(body, &db_pool).await
}

#[tracing::instrument(
name = "Admin: get a book.",
err,
level = "info"
skip(db_pool),
fields(
    request_id = %Uuid::new_v4(),
)
)]
pub async fn get_book(
    book_id: Uuid,
    db_pool: DbPool,
) -> Result<Book, Error> {
    fetch_book(book_id, &db_pool).await
}

#[tracing::instrument(
name = "Admin: update a book.",
err,
level = "info"
skip(db_pool),
fields(
    request_id = %Uuid::new_v4(),
)
)]
pub async fn update_book(
    book_id: Uuid,
    db_pool: DbPool,
    body: BookRequest,
) -> Result<Book, Error> {
    apply_update(book_id, body, &db_pool).await
}

/// Removes the book row. Its progress rows and stored files are cleaned up
/// afterwards on a best-effort basis: failures there are logged only.
#[tracing::instrument(
name = "Admin: delete a book.",
err,
level = "info"
skip(db_pool, storage),
fields(
    request_id = %Uuid::new_v4(),
)
)]
pub async fn delete_book(
    book_id: Uuid,
    db_pool: DbPool,
    storage: Storage,
) -> Result<DeleteBookResponse, Error> {
    let book = {
        let conn = checkout(&db_pool).await?;
        let db_span = span!(Level::INFO, "Deleting book from db.");
        let _a = db_span.enter();
        let book = diesel::delete(books::table.find(book_id))
            .get_result::<Book>(&*conn)
            .optional()?
            .ok_or(Error::NotFound("Book"))?;
        match diesel::delete(progress::table.filter(progress::book_id.eq(book_id)))
            .execute(&*conn)
        {
            Ok(count) => info!(count, "Deleted progress records for book."),
            Err(err) => error!(?err, "Failed to delete progress records for book."),
        }
        book
    };
    for path in [book.cover_path, book.audio_path].into_iter().flatten() {
        if let Err(err) = storage.delete(&path).await {
            error!(?err, %path, "Failed to delete stored file for book.");
        }
    }
    Ok(DeleteBookResponse {
        message: "Book deleted successfully".into(),
    })
}

#[tracing::instrument(
name = "Admin: catalog stats.",
err,
level = "info"
skip(db_pool),
fields(
    request_id = %Uuid::new_v4(),
)
)]
pub async fn get_stats(
    db_pool: DbPool,
) -> Result<CatalogStats, Error> {
    let conn = checkout(&db_pool).await?;
    let db_span = span!(Level::INFO, "Loading genres and ratings from db.");
    let _a = db_span.enter();
    let entries = books::table
        .select((books::genre, books::rating))
        .load::<(String, f64)>(&*conn)?;
    Ok(CatalogStats::from_entries(&entries))
}
