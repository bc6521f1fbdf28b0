use chrono::Utc;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl};
use serde::{Deserialize, Serialize};
use tracing::{span, Level};
use uuid::Uuid;
use warp::{Filter, Reply};

use crate::auth::authorized;
use crate::connection_pool::{checkout, DbPool};
use crate::controllers::{with_pool, JSON_BODY_LIMIT};
use crate::errors::Error;
use crate::models::{Progress, ProgressChangeset};
use crate::schema::progress;
use crate::util::{map_result, Success};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProgressRequest {
    pub book_id: Uuid,
    pub user_id: String,
    pub progress: f64,
    pub current_time: f64,
}

impl SaveProgressRequest {
    /// Percent is rounded to a whole number, as the player reports it.
    pub fn into_changeset(self, now: chrono::DateTime<Utc>) -> Result<ProgressChangeset, Error> {
        let user_id = self.user_id.trim().to_owned();
        if user_id.is_empty() {
            return Err(Error::validation("Field userId is required."));
        }
        if !(0.0..=100.0).contains(&self.progress) {
            return Err(Error::validation("Progress must be between 0 and 100."));
        }
        if !self.current_time.is_finite() || self.current_time < 0.0 {
            return Err(Error::validation("Current time cannot be negative."));
        }
        Ok(ProgressChangeset {
            user_id,
            book_id: self.book_id,
            percent_complete: self.progress.round() as i32,
            position_seconds: self.current_time,
            last_updated: now,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressQuery {
    pub user_id: Option<String>,
    pub book_id: Option<Uuid>,
}

/// A user with no record for a book is at the very start of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyProgress {
    pub progress: i32,
    pub current_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProgressLookup {
    Record(Progress),
    Empty(EmptyProgress),
    All(Vec<Progress>),
}

#[tracing::instrument(
name = "Saving playback progress.",
err,
level = "info"
skip(db_pool),
fields(
    request_id = %Uuid::new_v4(),
)
)]
pub async fn save_progress(
    db_pool: DbPool,
    body: SaveProgressRequest,
) -> Result<Success, Error> {
    let changeset = body.into_changeset(Utc::now())?;
    let conn = checkout(&db_pool).await?;
    let db_span = span!(Level::INFO, "Upserting progress record.");
    let _a = db_span.enter();
    diesel::insert_into(progress::table)
        .values(&changeset)
        .on_conflict((progress::user_id, progress::book_id))
        .do_update()
        .set(&changeset)
        .execute(&*conn)?;
    Ok(Success::new())
}

#[tracing::instrument(
name = "Fetching playback progress.",
err,
level = "info"
skip(db_pool),
fields(
    request_id = %Uuid::new_v4(),
)
)]
pub async fn get_progress(
    query: ProgressQuery,
    db_pool: DbPool,
) -> Result<ProgressLookup, Error> {
    let user_id = query
        .user_id
        .map(|x| x.trim().to_owned())
        .filter(|x| !x.is_empty())
        .ok_or_else(|| Error::validation("Missing required parameters"))?;
    let conn = checkout(&db_pool).await?;
    match query.book_id {
        Some(book_id) => {
            let db_span = span!(Level::INFO, "Fetching progress for one book.");
            let _a = db_span.enter();
            let record = progress::table
                .find((&user_id, book_id))
                .first::<Progress>(&*conn)
                .optional()?;
            Ok(match record {
                Some(record) => ProgressLookup::Record(record),
                None => ProgressLookup::Empty(EmptyProgress {
                    progress: 0,
                    current_time: 0.0,
                }),
            })
        }
        None => {
            let db_span = span!(Level::INFO, "Fetching all progress for user.");
            let _a = db_span.enter();
            Ok(ProgressLookup::All(
                progress::table
                    .filter(progress::user_id.eq(&user_id))
                    .order(progress::last_updated.desc())
                    .load::<Progress>(&*conn)?,
            ))
        }
    }
}

pub fn get_filters(
    db_pool: DbPool,
) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    let save_progress_filter = warp::path("api")
        .and(warp::path("progress"))
        .and(warp::path::end())
        .and(warp::post())
        .and(authorized())
        .and(with_pool(db_pool.clone()))
        .and(warp::body::content_length_limit(JSON_BODY_LIMIT))
        .and(warp::body::json())
        .then(save_progress)
        .map(map_result);
    let get_progress_filter = warp::path("api")
        .and(warp::path("progress"))
        .and(warp::path::end())
        .and(warp::get())
        .and(authorized())
        .and(warp::query())
        .and(with_pool(db_pool))
        .then(get_progress)
        .map(map_result);
    save_progress_filter.or(get_progress_filter)
}
