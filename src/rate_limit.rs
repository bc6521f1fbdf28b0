use std::{net::SocketAddr, num::NonZeroU32, sync::Arc};

use governor::{clock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter};
use warp::{
    filters::BoxedFilter,
    http::{Method, StatusCode},
    path::FullPath,
    reply::{Json, WithStatus},
    Filter, Rejection, Reply,
};

use crate::util::ErrorMessage;

type IpLimiter = Arc<
    RateLimiter<Option<SocketAddr>, DefaultKeyedStateStore<Option<SocketAddr>>, clock::DefaultClock>,
>;

type PathLimiter = Arc<
    RateLimiter<(String, Method), DefaultKeyedStateStore<(String, Method)>, clock::DefaultClock>,
>;

/// Rejects (so the request falls through to the routes) while under quota,
/// replies 429 once over it.
pub fn rate_limit_filter(per_second: NonZeroU32) -> BoxedFilter<(impl Reply,)> {
    let ip_limiter: IpLimiter = Arc::new(RateLimiter::keyed(Quota::per_second(per_second)));
    let path_limiter: PathLimiter = Arc::new(RateLimiter::keyed(Quota::per_second(per_second)));
    ip_rate_limit_filter(ip_limiter)
        .or(path_method_limit_filter(path_limiter))
        .unify()
        .boxed()
}

fn ip_rate_limit_filter(limiter: IpLimiter) -> BoxedFilter<(WithStatus<Json>,)> {
    warp::addr::remote()
        .and(warp::any().map(move || limiter.clone()))
        .and_then(check_ip_limiter)
        .boxed()
}

async fn check_ip_limiter(
    ip: Option<SocketAddr>,
    limiter: IpLimiter,
) -> Result<WithStatus<Json>, Rejection> {
    // Port changes per connection, only the address identifies a client.
    let ip = ip.map(|x| SocketAddr::new(x.ip(), 0));
    match limiter.check_key(&ip) {
        Ok(_) => Err(warp::reject()),
        Err(_) => Ok(too_many_requests("IP Rate Limit")),
    }
}

fn path_method_limit_filter(limiter: PathLimiter) -> BoxedFilter<(WithStatus<Json>,)> {
    warp::path::full()
        .and(warp::method())
        .and(warp::any().map(move || limiter.clone()))
        .and_then(check_path_limiter)
        .boxed()
}

async fn check_path_limiter(
    path: FullPath,
    method: Method,
    limiter: PathLimiter,
) -> Result<WithStatus<Json>, Rejection> {
    match limiter.check_key(&(path.as_str().into(), method)) {
        Ok(_) => Err(warp::reject()),
        Err(_) => Ok(too_many_requests("API Rate Limit")),
    }
}

fn too_many_requests(message: &str) -> WithStatus<Json> {
    warp::reply::with_status(
        warp::reply::json(&ErrorMessage::from(message)),
        StatusCode::TOO_MANY_REQUESTS,
    )
}
