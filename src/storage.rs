use derive_more::{Display, Error, From};
use rusoto_core::{credential::StaticProvider, request::TlsError, HttpClient, Region, RusotoError};
use rusoto_s3::{
    DeleteObjectError, DeleteObjectRequest, HeadObjectError, HeadObjectRequest,
    ListObjectsV2Error, ListObjectsV2Request, PutObjectError, PutObjectRequest, S3Client, S3,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::configuration::StorageConfiguration;

#[derive(Debug, Display, From, Error)]
pub enum Error {
    #[display(fmt = "Tls: {}", _0)]
    Tls(TlsError),
    #[display(fmt = "HeadObject: {}", _0)]
    HeadObject(RusotoError<HeadObjectError>),
    #[from(ignore)]
    #[display(fmt = "AlreadyExists: {}", _0)]
    AlreadyExists(#[error(not(source))] String),
    #[display(fmt = "PutObject: {}", _0)]
    PutObject(RusotoError<PutObjectError>),
    #[display(fmt = "DeleteObject: {}", _0)]
    DeleteObject(RusotoError<DeleteObjectError>),
    #[display(fmt = "ListObjects: {}", _0)]
    ListObjects(RusotoError<ListObjectsV2Error>),
}

/// Which slot of a book an uploaded file fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Cover,
    Audio,
}

impl FileKind {
    pub fn parse(value: &str) -> Option<FileKind> {
        match value {
            "cover" => Some(FileKind::Cover),
            "audio" => Some(FileKind::Audio),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Cover => "cover",
            FileKind::Audio => "audio",
        }
    }

    /// Content types must start with this prefix.
    pub fn mime_prefix(&self) -> &'static str {
        match self {
            FileKind::Cover => "image/",
            FileKind::Audio => "audio/",
        }
    }

    pub fn max_bytes(&self) -> usize {
        match self {
            FileKind::Cover => 5 * 1024 * 1024,
            FileKind::Audio => 100 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub url: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub name: String,
    pub path: String,
    pub size: i64,
    pub last_modified: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub folders: Vec<String>,
    pub files: Vec<StoredFile>,
}

/// `books/{book_id}/{kind}/{millis}.{extension}`. The extension is whatever
/// follows the last `.` of the original name, or the whole name without one.
pub fn generate_file_path(book_id: &str, kind: FileKind, file_name: &str, millis: i64) -> String {
    let extension = file_name.rsplit('.').next().unwrap_or(file_name);
    format!("books/{}/{}/{}.{}", book_id, kind.as_str(), millis, extension)
}

#[derive(Clone)]
pub struct Storage {
    client: S3Client,
    bucket: String,
    public_url: String,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("bucket", &self.bucket)
            .field("public_url", &self.public_url)
            .finish()
    }
}

impl Storage {
    pub fn new(config: &StorageConfiguration) -> Result<Storage, Error> {
        let client = S3Client::new_with(
            HttpClient::new()?,
            StaticProvider::new_minimal(config.key.clone(), config.secret.clone()),
            Region::Custom {
                name: config.region.clone(),
                endpoint: config.endpoint.clone(),
            },
        );
        Ok(Storage {
            client,
            bucket: config.bucket.clone(),
            public_url: config.public_url(),
        })
    }

    pub fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_url.trim_end_matches('/'), path)
    }

    #[tracing::instrument(name = "Uploading file to storage.", level = "info", err, skip(self, bytes))]
    pub async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResult, Error> {
        self.ensure_absent(path).await?;
        info!(len_bytes = bytes.len(), "Putting object.");
        self.client
            .put_object(PutObjectRequest {
                bucket: self.bucket.clone(),
                key: path.to_owned(),
                body: Some(bytes.into()),
                content_type: Some(content_type.to_owned()),
                cache_control: Some("max-age=3600".into()),
                acl: Some("public-read".into()),
                ..Default::default()
            })
            .await?;
        Ok(UploadResult {
            url: self.public_url(path),
            path: path.to_owned(),
        })
    }

    /// Uploads never replace an existing object.
    async fn ensure_absent(&self, path: &str) -> Result<(), Error> {
        let head = self
            .client
            .head_object(HeadObjectRequest {
                bucket: self.bucket.clone(),
                key: path.to_owned(),
                ..Default::default()
            })
            .await;
        match head {
            Ok(_) => Err(Error::AlreadyExists(path.to_owned())),
            Err(err) if is_missing(&err) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    #[tracing::instrument(name = "Deleting file from storage.", level = "info", err, skip(self))]
    pub async fn delete(&self, path: &str) -> Result<(), Error> {
        self.client
            .delete_object(DeleteObjectRequest {
                bucket: self.bucket.clone(),
                key: path.to_owned(),
                ..Default::default()
            })
            .await?;
        Ok(())
    }

    #[tracing::instrument(name = "Listing files in storage.", level = "info", err, skip(self))]
    pub async fn list(&self, prefix: &str) -> Result<Listing, Error> {
        let prefix = match prefix.trim_matches('/') {
            "" => String::new(),
            trimmed => format!("{}/", trimmed),
        };
        let response = self
            .client
            .list_objects_v2(ListObjectsV2Request {
                bucket: self.bucket.clone(),
                prefix: Some(prefix.clone()),
                delimiter: Some("/".into()),
                ..Default::default()
            })
            .await?;
        let folders = response
            .common_prefixes
            .unwrap_or_default()
            .into_iter()
            .filter_map(|x| x.prefix)
            .map(|x| x.trim_end_matches('/').to_owned())
            .collect();
        let files = response
            .contents
            .unwrap_or_default()
            .into_iter()
            .filter_map(|object| {
                let key = object.key?;
                let name = key.strip_prefix(&prefix).unwrap_or(&key).to_owned();
                Some(StoredFile {
                    url: self.public_url(&key),
                    name,
                    size: object.size.unwrap_or(0),
                    last_modified: object.last_modified,
                    path: key,
                })
            })
            .collect();
        Ok(Listing { folders, files })
    }
}

/// HEAD responses carry no body, so a missing key often surfaces as an
/// untyped 404 rather than `NoSuchKey`.
fn is_missing(err: &RusotoError<HeadObjectError>) -> bool {
    match err {
        RusotoError::Service(HeadObjectError::NoSuchKey(_)) => true,
        RusotoError::Unknown(response) => response.status.as_u16() == 404,
        _ => false,
    }
}
