use warp::{Filter, Reply};

use crate::auth::authorized;
use crate::connection_pool::DbPool;
use crate::controllers::{with_pool, JSON_BODY_LIMIT};
use crate::util::{map_created, map_result};

use super::{create_book, get_book, list_books, update_book};

pub fn get_filters(
    db_pool: DbPool,
) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    let list_books_filter = warp::path("api")
        .and(warp::path("books"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query())
        .and(with_pool(db_pool.clone()))
        .then(list_books)
        .map(map_result);
    let create_book_filter = warp::path("api")
        .and(warp::path("books"))
        .and(warp::path::end())
        .and(warp::post())
        .and(authorized())
        .and(with_pool(db_pool.clone()))
        .and(warp::body::content_length_limit(JSON_BODY_LIMIT))
        .and(warp::body::json())
        .then(create_book)
        .map(map_created);
    let get_book_filter = warp::path("api")
        .and(warp::path("books"))
        .and(warp::path::param())
        .and(warp::path::end())
        .and(warp::get())
        .and(with_pool(db_pool.clone()))
        .then(get_book)
        .map(map_result);
    let update_book_filter = warp::path("api")
        .and(warp::path("books"))
        .and(warp::path::param())
        .and(warp::path::end())
        .and(warp::put())
        .and(authorized())
        .and(with_pool(db_pool))
        .and(warp::body::content_length_limit(JSON_BODY_LIMIT))
        .and(warp::body::json())
        .then(update_book)
        .map(map_result);
    list_books_filter
        .or(create_book_filter)
        .or(get_book_filter)
        .or(update_book_filter)
}
