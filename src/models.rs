use crate::schema::{books, progress, users};

use chrono::{DateTime, Utc};
use diesel::{
    deserialize::FromSql,
    serialize::ToSql,
    sql_types::{self},
    Identifiable, Queryable,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entry of a book's table of contents. `start_time` is the offset into
/// the audio file, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: i64,
    pub title: String,
    pub duration: String,
    pub start_time: i64,
}

/// Chapters are kept in list order inside a single jsonb column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[serde(transparent)]
#[sql_type = "sql_types::Jsonb"]
pub struct Chapters(pub Vec<Chapter>);

impl<DB> ToSql<sql_types::Jsonb, DB> for Chapters
where
    DB: diesel::backend::Backend,
    serde_json::Value: ToSql<sql_types::Jsonb, DB>,
{
    fn to_sql<W: std::io::Write>(
        &self,
        out: &mut diesel::serialize::Output<W, DB>,
    ) -> diesel::serialize::Result {
        serde_json::to_value(self)?.to_sql(out)
    }
}

impl<DB> FromSql<sql_types::Jsonb, DB> for Chapters
where
    DB: diesel::backend::Backend,
    serde_json::Value: FromSql<sql_types::Jsonb, DB>,
{
    fn from_sql(bytes: Option<&DB::RawValue>) -> diesel::deserialize::Result<Self> {
        let value = serde_json::Value::from_sql(bytes)?;
        Ok(serde_json::from_value(value)?)
    }
}

#[derive(Identifiable, Queryable, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub narrator: String,
    pub duration: String,
    pub rating: f64,
    pub reviews: i32,
    pub genre: String,
    pub description: String,
    pub publish_date: String,
    #[serde(rename = "cover")]
    pub cover_url: Option<String>,
    pub cover_path: Option<String>,
    pub audio_url: Option<String>,
    pub audio_path: Option<String>,
    pub chapters: Chapters,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[table_name = "books"]
pub struct NewBook {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub narrator: String,
    pub duration: String,
    pub rating: f64,
    pub reviews: i32,
    pub genre: String,
    pub description: String,
    pub publish_date: String,
    pub cover_url: Option<String>,
    pub cover_path: Option<String>,
    pub audio_url: Option<String>,
    pub audio_path: Option<String>,
    pub chapters: Chapters,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update of a book. `None` leaves the column untouched.
#[derive(AsChangeset, Debug, Clone, Default, PartialEq)]
#[table_name = "books"]
pub struct BookChangeset {
    pub title: Option<String>,
    pub author: Option<String>,
    pub narrator: Option<String>,
    pub duration: Option<String>,
    pub rating: Option<f64>,
    pub reviews: Option<i32>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub publish_date: Option<String>,
    pub cover_url: Option<String>,
    pub cover_path: Option<String>,
    pub audio_url: Option<String>,
    pub audio_path: Option<String>,
    pub chapters: Option<Chapters>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Queryable, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub user_id: String,
    pub book_id: Uuid,
    #[serde(rename = "progress")]
    pub percent_complete: i32,
    #[serde(rename = "currentTime")]
    pub position_seconds: f64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[table_name = "progress"]
pub struct ProgressChangeset {
    pub user_id: String,
    pub book_id: Uuid,
    pub percent_complete: i32,
    pub position_seconds: f64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[serde(rename_all = "camelCase")]
#[sql_type = "sql_types::Jsonb"]
pub struct Preferences {
    pub playback_speed: f64,
    pub auto_play: bool,
    pub theme: Theme,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            playback_speed: 1.0,
            auto_play: true,
            theme: Theme::Light,
        }
    }
}

impl<DB> ToSql<sql_types::Jsonb, DB> for Preferences
where
    DB: diesel::backend::Backend,
    serde_json::Value: ToSql<sql_types::Jsonb, DB>,
{
    fn to_sql<W: std::io::Write>(
        &self,
        out: &mut diesel::serialize::Output<W, DB>,
    ) -> diesel::serialize::Result {
        serde_json::to_value(self)?.to_sql(out)
    }
}

impl<DB> FromSql<sql_types::Jsonb, DB> for Preferences
where
    DB: diesel::backend::Backend,
    serde_json::Value: FromSql<sql_types::Jsonb, DB>,
{
    fn from_sql(bytes: Option<&DB::RawValue>) -> diesel::deserialize::Result<Self> {
        let value = serde_json::Value::from_sql(bytes)?;
        Ok(serde_json::from_value(value)?)
    }
}

/// `library` and `progress` are created empty and nothing writes them.
#[derive(Identifiable, Queryable, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[table_name = "users"]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub preferences: Preferences,
    pub library: serde_json::Value,
    #[serde(rename = "progress")]
    pub progress_map: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[table_name = "users"]
pub struct NewUserProfile {
    pub id: Uuid,
    pub email: String,
    pub preferences: Preferences,
    pub library: serde_json::Value,
    pub progress_map: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl NewUserProfile {
    pub fn with_defaults(email: String) -> Self {
        NewUserProfile {
            id: Uuid::new_v4(),
            email,
            preferences: Preferences::default(),
            library: serde_json::Value::Array(Vec::new()),
            progress_map: serde_json::Value::Object(serde_json::Map::new()),
            created_at: Utc::now(),
        }
    }
}
