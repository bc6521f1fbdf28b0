mod filters;
pub mod validation;

use chrono::Utc;
use diesel::{
    BoolExpressionMethods, ExpressionMethods, OptionalExtension, PgTextExpressionMethods, QueryDsl,
    RunQueryDsl,
};
use serde::Deserialize;
use tracing::{span, Level};
use uuid::Uuid;

use crate::connection_pool::{checkout, DbPool};
use crate::errors::Error;
use crate::models::Book;
use crate::schema::books;

pub use filters::get_filters;
pub use validation::BookRequest;

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub genre: Option<String>,
}

/// Escapes `%`, `_` and `\` so user input matches literally inside ILIKE.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[tracing::instrument(
name = "List books.",
err,
level = "info"
skip(db_pool),
fields(
    request_id = %Uuid::new_v4(),
)
)]
pub async fn list_books(query: CatalogQuery, db_pool: DbPool) -> Result<Vec<Book>, Error> {
    let conn = checkout(&db_pool).await?;
    let db_span = span!(Level::INFO, "Loading books from db.");
    let _a = db_span.enter();
    let mut statement = books::table.into_boxed();
    if let Some(term) = query.search.as_deref().map(str::trim).filter(|x| !x.is_empty()) {
        let pattern = like_pattern(term);
        statement = statement.filter(
            books::title
                .ilike(pattern.clone())
                .or(books::author.ilike(pattern)),
        );
    }
    if let Some(genre) = query
        .genre
        .as_deref()
        .map(str::trim)
        .filter(|x| !x.is_empty() && *x != "All")
    {
        statement = statement.filter(books::genre.eq(genre.to_owned()));
    }
    Ok(statement.order(books::title.asc()).load::<Book>(&*conn)?)
}

#[tracing::instrument(
name = "Get a book.",
err,
level = "info"
skip(db_pool),
fields(
    request_id = %Uuid::new_v4(),
)
)]
pub async fn get_book(book_id: Uuid, db_pool: DbPool) -> Result<Book, Error> {
    fetch_book(book_id, &db_pool).await
}

#[tracing::instrument(
name = "Creating a new book.",
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
name = "Updating a book.",
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

pub(crate) async fn fetch_book(book_id: Uuid, db_pool: &DbPool) -> Result<Book, Error> {
    let conn = checkout(db_pool).await?;
    let db_span = span!(Level::INFO, "Fetching book from db.");
    let _a = db_span.enter();
    books::table
        .find(book_id)
        .first::<Book>(&*conn)
        .optional()?
        .ok_or(Error::NotFound("Book"))
}

pub(crate) async fn insert_book(body: BookRequest, db_pool: &DbPool) -> Result<Book, Error> {
    let new_book = body.into_new_book(Utc::now())?;
    let conn = checkout(db_pool).await?;
    let db_span = span!(Level::INFO, "Inserting book into db.");
    let _a = db_span.enter();
    Ok(diesel::insert_into(books::table)
        .values(&new_book)
        .get_result::<Book>(&*conn)?)
}

pub(crate) async fn apply_update(
    book_id: Uuid,
    body: BookRequest,
    db_pool: &DbPool,
) -> Result<Book, Error> {
    let changeset = body.into_changeset(Utc::now())?;
    let conn = checkout(db_pool).await?;
    let db_span = span!(Level::INFO, "Updating book in db.");
    let _a = db_span.enter();
    diesel::update(books::table.find(book_id))
        .set(&changeset)
        .get_result::<Book>(&*conn)
        .optional()?
        .ok_or(Error::NotFound("Book"))
}
