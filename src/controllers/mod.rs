use std::convert::Infallible;
use std::net::SocketAddr;
use std::num::NonZeroU32;

use futures::Future;
use warp::{Filter, Reply};

use crate::{
    connection_pool::DbPool, rate_limit::rate_limit_filter, storage::Storage,
    util::handle_rejection,
};

pub mod admin;
pub mod books;
pub mod health;
pub mod progress;
pub mod storage;
pub mod users;

/// Book bodies carry a description and a chapter list, so allow more than a
/// bare form post.
pub const JSON_BODY_LIMIT: u64 = 64 * 1024;

pub fn with_pool(db_pool: DbPool) -> impl Filter<Extract = (DbPool,), Error = Infallible> + Clone {
    warp::any().map(move || db_pool.clone())
}

pub fn with_storage(
    storage: Storage,
) -> impl Filter<Extract = (Storage,), Error = Infallible> + Clone {
    warp::any().map(move || storage.clone())
}

/// Every API route, with rejections turned into JSON errors. Rate limiting is
/// left to the server so tests can drive routes freely.
pub fn routes(
    pool: &DbPool,
    storage: &Storage,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let health_routes = health::get_filters();
    let book_routes = books::get_filters(pool.clone());
    let admin_routes = admin::get_filters(pool.clone(), storage.clone());
    let progress_routes = progress::get_filters(pool.clone());
    let user_routes = users::get_filters(pool.clone());
    let storage_routes = storage::get_filters(storage.clone());

    health_routes
        .or(book_routes)
        .or(admin_routes)
        .or(progress_routes)
        .or(user_routes)
        .or(storage_routes)
        .recover(handle_rejection)
}

pub fn get_server_future(
    pool: &DbPool,
    storage: &Storage,
    bind_address: SocketAddr,
    rate_limit_per_second: NonZeroU32,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, impl Future<Output = ()>), warp::Error> {
    let rate_limiter = rate_limit_filter(rate_limit_per_second);
    warp::serve(
        rate_limiter
            .or(routes(pool, storage))
            .with(warp::trace::request()),
    )
    .try_bind_with_graceful_shutdown(bind_address, shutdown)
}
