use serde::{Deserialize, Serialize};
use warp::{Filter, Reply};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Health {
    pub status: String,
    pub version: String,
}

/// Liveness only: answers without touching the database or storage.
pub fn get_filters() -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    warp::path("api")
        .and(warp::path("health"))
        .and(warp::path::end())
        .and(warp::get())
        .map(|| {
            warp::reply::json(&Health {
                status: "ok".into(),
                version: env!("CARGO_PKG_VERSION").into(),
            })
        })
}
