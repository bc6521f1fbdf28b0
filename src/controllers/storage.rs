use chrono::Utc;
use futures::TryStreamExt;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use warp::hyper::body::Buf;
use warp::multipart::{FormData, Part};
use warp::{Filter, Reply};

use crate::auth::authorized;
use crate::controllers::with_storage;
use crate::errors::Error;
use crate::storage::{generate_file_path, FileKind, Listing, Storage, UploadResult};
use crate::util::{map_result, Success};

/// Largest accepted multipart body: the audio limit plus room for the text fields.
pub const UPLOAD_BODY_LIMIT: u64 = 100 * 1024 * 1024 + 64 * 1024;

#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    pub book_id: Option<String>,
    pub kind: Option<String>,
}

pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len_bytes", &self.bytes.len())
            .finish()
    }
}

/// A validated upload, ready to be written to `path`.
#[derive(Debug)]
pub struct UploadPlan {
    pub path: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadForm {
    pub fn into_plan(self, millis: i64) -> Result<UploadPlan, Error> {
        let (file, book_id, kind) = match (self.file, non_blank(self.book_id), non_blank(self.kind))
        {
            (Some(file), Some(book_id), Some(kind)) => (file, book_id, kind),
            _ => return Err(Error::validation("Missing required fields")),
        };
        let kind = FileKind::parse(&kind)
            .ok_or_else(|| Error::validation("Type must be either cover or audio"))?;
        if !file.content_type.starts_with(kind.mime_prefix()) {
            return Err(Error::validation(match kind {
                FileKind::Cover => "Invalid file type for cover image",
                FileKind::Audio => "Invalid file type for audio file",
            }));
        }
        if file.bytes.len() > kind.max_bytes() {
            return Err(Error::validation(format!(
                "File size must be less than {}MB",
                kind.max_bytes() / (1024 * 1024)
            )));
        }
        if book_id.contains('/') || book_id == "." || book_id == ".." {
            return Err(Error::validation("Invalid book id"));
        }
        Ok(UploadPlan {
            path: generate_file_path(&book_id, kind, &file.file_name, millis),
            content_type: file.content_type,
            bytes: file.bytes,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|x| x.trim().to_owned())
        .filter(|x| !x.is_empty())
}

async fn read_part(part: Part) -> Result<Vec<u8>, Error> {
    part.stream()
        .try_fold(Vec::new(), |mut acc, buf| async move {
            acc.extend_from_slice(buf.chunk());
            Ok(acc)
        })
        .await
        .map_err(|_| Error::validation("Malformed multipart body"))
}

/// Parts are drained one at a time; the parser will not yield the next part
/// while an earlier one is still unread.
pub async fn read_form(form: FormData) -> Result<UploadForm, Error> {
    futures::pin_mut!(form);
    let mut upload = UploadForm::default();
    while let Some(part) = form
        .try_next()
        .await
        .map_err(|_| Error::validation("Malformed multipart body"))?
    {
        let name = part.name().to_owned();
        match name.as_str() {
            "file" => {
                let file_name = part.filename().unwrap_or("upload").to_owned();
                let content_type = part
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_owned();
                let bytes = read_part(part).await?;
                upload.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            "bookId" => upload.book_id = Some(read_text(part).await?),
            "type" => upload.kind = Some(read_text(part).await?),
            _ => {
                read_part(part).await?;
            }
        }
    }
    Ok(upload)
}

async fn read_text(part: Part) -> Result<String, Error> {
    Ok(String::from_utf8_lossy(&read_part(part).await?).into_owned())
}

#[derive(Debug, Default, Deserialize)]
pub struct PathQuery {
    pub path: Option<String>,
}

#[tracing::instrument(
name = "Uploading a book file.",
err,
level = "info"
skip(storage, form),
fields(
    request_id = %Uuid::new_v4(),
)
)]
pub async fn upload_file(
    storage: Storage,
    form: FormData,
) -> Result<UploadResult, Error> {
    let plan = read_form(form)
        .await?
        .into_plan(Utc::now().timestamp_millis())?;
    info!(path = %plan.path, content_type = %plan.content_type, "Uploading file.");
    Ok(storage
        .upload(&plan.path, &plan.content_type, plan.bytes)
        .await?)
}

#[tracing::instrument(
name = "Deleting a stored file.",
err,
level = "info"
skip(storage),
fields(
    request_id = %Uuid::new_v4(),
)
)]
pub async fn delete_file(
    query: PathQuery,
    storage: Storage,
) -> Result<Success, Error> {
    let path = non_blank(query.path).ok_or_else(|| Error::validation("File path is required"))?;
    storage.delete(&path).await?;
    Ok(Success::new())
}

#[tracing::instrument(
name = "Listing stored files.",
err,
level = "info"
skip(storage),
fields(
    request_id = %Uuid::new_v4(),
)
)]
pub async fn list_files(
    query: PathQuery,
    storage: Storage,
) -> Result<Listing, Error> {
    Ok(storage.list(query.path.as_deref().unwrap_or("")).await?)
}

pub fn get_filters(
    storage: Storage,
) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    let upload_filter = warp::path("api")
        .and(warp::path("storage"))
        .and(warp::path("upload"))
        .and(warp::path::end())
        .and(warp::post())
        .and(authorized())
        .and(with_storage(storage.clone()))
        .and(warp::multipart::form().max_length(UPLOAD_BODY_LIMIT))
        .then(upload_file)
        .map(map_result);
    let delete_filter = warp::path("api")
        .and(warp::path("storage"))
        .and(warp::path("delete"))
        .and(warp::path::end())
        .and(warp::delete())
        .and(authorized())
        .and(warp::query())
        .and(with_storage(storage.clone()))
        .then(delete_file)
        .map(map_result);
    let list_filter = warp::path("api")
        .and(warp::path("storage"))
        .and(warp::path("files"))
        .and(warp::path::end())
        .and(warp::get())
        .and(authorized())
        .and(warp::query())
        .and(with_storage(storage))
        .then(list_files)
        .map(map_result);
    upload_filter.or(delete_filter).or(list_filter)
}
