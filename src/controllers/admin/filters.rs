use warp::{Filter, Reply};

use crate::auth::authorized;
use crate::connection_pool::DbPool;
use crate::controllers::{with_pool, with_storage, JSON_BODY_LIMIT};
use crate::storage::Storage;
use crate::util::{map_created, map_result};

use super::{create_book, delete_book, get_book, get_stats, list_books, update_book};

pub fn get_filters(
    db_pool: DbPool,
    storage: Storage,
) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    let admin_books = warp::path("api")
        .and(warp::path("admin"))
        .and(warp::path("books"));
    let list_books_filter = admin_books.clone()
        .and(warp::path::end())
        .and(warp::get())
        .and(authorized())
        .and(with_pool(db_pool.clone()))
        .then(list_books)
        .map(map_result);
    let create_book_filter = admin_books.clone()
        .and(warp::path::end())
        .and(warp::post())
        .and(authorized())
        .and(with_pool(db_pool.clone()))
        .and(warp::body::content_length_limit(JSON_BODY_LIMIT))
        .and(warp::body::json())
        .then(create_book)
        .map(map_created);
    let get_book_filter = admin_books.clone()
        .and(warp::path::param())
        .and(warp::path::end())
        .and(warp::get())
        .and(authorized())
        .and(with_pool(db_pool.clone()))
        .then(get_book)
        .map(map_result);
    let update_book_filter = admin_books.clone()
        .and(warp::path::param())
        .and(warp::path::end())
        .and(warp::put())
        .and(authorized())
        .and(with_pool(db_pool.clone()))
        .and(warp::body::content_length_limit(JSON_BODY_LIMIT))
        .and(warp::body::json())
        .then(update_book)
        .map(map_result);
    let delete_book_filter = admin_books.clone()
        .and(warp::path::param())
        .and(warp::path::end())
        .and(warp::delete())
        .and(authorized())
        .and(with_pool(db_pool.clone()))
        .and(with_storage(storage))
        .then(delete_book)
        .map(map_result);
    let stats_filter = warp::path("api")
        .and(warp::path("admin"))
        .and(warp::path("stats"))
        .and(warp::path::end())
        .and(warp::get())
        .and(authorized())
        .and(with_pool(db_pool))
        .then(get_stats)
        .map(map_result);
    list_books_filter
        .or(create_book_filter)
        .or(get_book_filter)
        .or(update_book_filter)
        .or(delete_book_filter)
        .or(stats_filter)
}
