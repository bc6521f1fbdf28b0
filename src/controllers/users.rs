use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl};
use serde::Deserialize;
use tracing::{info, span, Level};
use uuid::Uuid;
use warp::http::StatusCode;
use warp::{Filter, Reply};

use crate::auth::authorized;
use crate::connection_pool::{checkout, DbPool};
use crate::controllers::{with_pool, JSON_BODY_LIMIT};
use crate::errors::Error;
use crate::models::{NewUserProfile, UserProfile};
use crate::schema::users;
use crate::util::{error_reply, map_result, map_result_with_status};

#[derive(Debug, Deserialize)]
pub struct CreateProfileRequest {
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileQuery {
    pub email: Option<String>,
}

#[derive(Debug)]
pub enum ProfileOutcome {
    Existing(UserProfile),
    Created(UserProfile),
}

pub fn parse_email(email: &str) -> Result<String, Error> {
    let email = email.trim();
    addr::parse_email_address(email)
        .map_err(|err| Error::validation(format!("Invalid email address: {}", err)))?;
    Ok(email.to_owned())
}

#[tracing::instrument(
name = "Get or create a user profile.",
err,
level = "info"
skip(db_pool),
fields(
    request_id = %Uuid::new_v4(),
)
)]
pub async fn create_profile(
    db_pool: DbPool,
    body: CreateProfileRequest,
) -> Result<ProfileOutcome, Error> {
    let email = parse_email(&body.email)?;
    let conn = checkout(&db_pool).await?;
    let db_span = span!(Level::INFO, "Inserting user profile unless it exists.");
    let _a = db_span.enter();
    let inserted = diesel::insert_into(users::table)
        .values(&NewUserProfile::with_defaults(email.clone()))
        .on_conflict(users::email)
        .do_nothing()
        .get_result::<UserProfile>(&*conn)
        .optional()?;
    match inserted {
        Some(profile) => {
            info!(user_id = %profile.id, "Created user profile.");
            Ok(ProfileOutcome::Created(profile))
        }
        None => Ok(ProfileOutcome::Existing(
            users::table
                .filter(users::email.eq(&email))
                .first::<UserProfile>(&*conn)?,
        )),
    }
}

#[tracing::instrument(
name = "Get a user profile.",
err,
level = "info"
skip(db_pool),
fields(
    request_id = %Uuid::new_v4(),
)
)]
pub async fn get_profile(
    query: ProfileQuery,
    db_pool: DbPool,
) -> Result<UserProfile, Error> {
    let email = match query.email.as_deref().map(str::trim) {
        Some(x) if !x.is_empty() => x.to_owned(),
        _ => return Err(Error::validation("Email is required.")),
    };
    let conn = checkout(&db_pool).await?;
    let db_span = span!(Level::INFO, "Fetching user profile.");
    let _a = db_span.enter();
    users::table
        .filter(users::email.eq(&email))
        .first::<UserProfile>(&*conn)
        .optional()?
        .ok_or(Error::NotFound("User"))
}

fn map_outcome(result: Result<ProfileOutcome, Error>) -> warp::reply::Response {
    match result {
        Ok(ProfileOutcome::Created(profile)) => {
            map_result_with_status(StatusCode::CREATED, Ok::<_, Error>(profile))
        }
        Ok(ProfileOutcome::Existing(profile)) => map_result(Ok::<_, Error>(profile)),
        Err(err) => error_reply(err),
    }
}

pub fn get_filters(
    db_pool: DbPool,
) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    let create_profile_filter = warp::path("api")
        .and(warp::path("users"))
        .and(warp::path("profile"))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_pool(db_pool.clone()))
        .and(warp::body::content_length_limit(JSON_BODY_LIMIT))
        .and(warp::body::json())
        .then(create_profile)
        .map(map_outcome);
    let get_profile_filter = warp::path("api")
        .and(warp::path("users"))
        .and(warp::path("profile"))
        .and(warp::path::end())
        .and(warp::get())
        .and(authorized())
        .and(warp::query())
        .and(with_pool(db_pool))
        .then(get_profile)
        .map(map_result);
    create_profile_filter.or(get_profile_filter)
}
