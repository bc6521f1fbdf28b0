use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use crate::errors::Error;
use crate::models::{BookChangeset, Chapter, Chapters, NewBook};

pub const GENRES: [&str; 15] = [
    "Fiction",
    "Non-Fiction",
    "Mystery",
    "Romance",
    "Science Fiction",
    "Fantasy",
    "Biography",
    "History",
    "Self-Help",
    "Business",
    "Classic Literature",
    "Memoir",
    "True Crime",
    "Philosophy",
    "Psychology",
];

/// Body of book create and update requests. Every field is optional on the
/// wire; create enforces the required ones, update applies whatever is set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub narrator: Option<String>,
    pub duration: Option<String>,
    pub rating: Option<f64>,
    pub reviews: Option<i32>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub publish_date: Option<String>,
    pub cover: Option<String>,
    pub cover_path: Option<String>,
    pub audio_url: Option<String>,
    pub audio_path: Option<String>,
    pub chapters: Option<Vec<Chapter>>,
}

impl BookRequest {
    pub fn into_new_book(self, now: DateTime<Utc>) -> Result<NewBook, Error> {
        Ok(NewBook {
            id: Uuid::new_v4(),
            title: required("title", self.title)?,
            author: required("author", self.author)?,
            narrator: required("narrator", self.narrator)?,
            duration: required("duration", self.duration)?,
            rating: rating(self.rating.unwrap_or(0.0))?,
            reviews: reviews(self.reviews.unwrap_or(0))?,
            genre: genre(required("genre", self.genre)?)?,
            description: self.description.unwrap_or_default(),
            publish_date: self.publish_date.unwrap_or_default(),
            cover_url: optional_location("cover", self.cover)?,
            cover_path: non_blank(self.cover_path),
            audio_url: optional_location("audioUrl", self.audio_url)?,
            audio_path: non_blank(self.audio_path),
            chapters: chapters(self.chapters.unwrap_or_default())?,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn into_changeset(self, now: DateTime<Utc>) -> Result<BookChangeset, Error> {
        Ok(BookChangeset {
            title: self.title.map(|x| required("title", Some(x))).transpose()?,
            author: self.author.map(|x| required("author", Some(x))).transpose()?,
            narrator: self
                .narrator
                .map(|x| required("narrator", Some(x)))
                .transpose()?,
            duration: self
                .duration
                .map(|x| required("duration", Some(x)))
                .transpose()?,
            rating: self.rating.map(rating).transpose()?,
            reviews: self.reviews.map(reviews).transpose()?,
            genre: self
                .genre
                .map(|x| required("genre", Some(x)).and_then(genre))
                .transpose()?,
            description: self.description,
            publish_date: self.publish_date,
            cover_url: optional_location("cover", self.cover)?,
            cover_path: non_blank(self.cover_path),
            audio_url: optional_location("audioUrl", self.audio_url)?,
            audio_path: non_blank(self.audio_path),
            chapters: self.chapters.map(chapters).transpose()?,
            updated_at: Some(now),
        })
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, Error> {
    match value.map(|x| x.trim().to_owned()) {
        Some(x) if !x.is_empty() => Ok(x),
        _ => Err(Error::validation(format!("Field {} is required.", field))),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|x| x.trim().to_owned())
        .filter(|x| !x.is_empty())
}

fn rating(value: f64) -> Result<f64, Error> {
    if (0.0..=5.0).contains(&value) {
        Ok(value)
    } else {
        Err(Error::validation("Rating must be between 0 and 5."))
    }
}

fn reviews(value: i32) -> Result<i32, Error> {
    if value >= 0 {
        Ok(value)
    } else {
        Err(Error::validation("Review count cannot be negative."))
    }
}

fn genre(value: String) -> Result<String, Error> {
    GENRES
        .iter()
        .find(|x| x.eq_ignore_ascii_case(&value))
        .map(|x| x.to_string())
        .ok_or_else(|| Error::validation(format!("Unknown genre {}.", value)))
}

/// Absolute URLs and site-relative paths are both accepted. Blank means unset.
fn optional_location(field: &str, value: Option<String>) -> Result<Option<String>, Error> {
    let value = match non_blank(value) {
        Some(x) => x,
        None => return Ok(None),
    };
    if value.starts_with('/') || Url::parse(&value).is_ok() {
        Ok(Some(value))
    } else {
        Err(Error::validation(format!("Field {} must be a URL.", field)))
    }
}

/// Chapters missing a title or a duration are dropped, the rest keep their order.
fn chapters(values: Vec<Chapter>) -> Result<Chapters, Error> {
    let kept: Vec<Chapter> = values
        .into_iter()
        .filter(|x| !x.title.trim().is_empty() && !x.duration.trim().is_empty())
        .collect();
    if let Some(chapter) = kept.iter().find(|x| x.start_time < 0) {
        return Err(Error::validation(format!(
            "Chapter {} has a negative start time.",
            chapter.title
        )));
    }
    Ok(Chapters(kept))
}
