use warp::{Filter, Rejection};

use crate::errors::Error;

/// Rejection raised when a protected route is called without credentials.
#[derive(Debug)]
pub struct Unauthorized;

impl warp::reject::Reject for Unauthorized {}

/// The raw `Authorization` header, if the client sent one.
pub fn authorization_header(
) -> impl Filter<Extract = (Option<String>,), Error = std::convert::Infallible> + Clone {
    warp::header::optional::<String>("authorization")
        .or(warp::any().map(|| None))
        .unify()
}

/// Presence check only. The bearer token is never verified.
pub fn require_authorization(header: &Option<String>) -> Result<(), Error> {
    match header.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(()),
        _ => Err(Error::Unauthorized),
    }
}

/// Guards a route. Place it before any body or query extraction so a
/// caller without credentials always sees 401.
pub fn authorized() -> impl Filter<Extract = (), Error = Rejection> + Clone {
    authorization_header()
        .and_then(|header: Option<String>| async move {
            require_authorization(&header).map_err(|_| warp::reject::custom(Unauthorized))
        })
        .untuple_one()
}
