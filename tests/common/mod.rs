#![allow(dead_code)]

use audiobook_catalog::configuration::StorageConfiguration;
use audiobook_catalog::connection_pool::{establish_connection_pool, DbPool};
use audiobook_catalog::storage::Storage;

/// A pool that never connects unless a handler gets as far as a query.
pub fn unreachable_pool() -> DbPool {
    establish_connection_pool("postgres://nobody@127.0.0.1:1/unreachable")
}

pub fn database_pool() -> DbPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for db tests");
    audiobook_catalog::connection_pool::run_migrations(&url).expect("migrations failed");
    establish_connection_pool(&url)
}

pub fn offline_storage() -> Storage {
    Storage::new(&StorageConfiguration {
        key: "key".into(),
        secret: "secret".into(),
        endpoint: "http://127.0.0.1:1".into(),
        region: "us-east-1".into(),
        bucket: "audiobooks".into(),
        public_url: None,
    })
    .expect("failed to build storage client")
}

pub fn multipart_body(boundary: &str, file_type: &str, kind: &str) -> Vec<u8> {
    format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"bookId\"\r\n\r\n\
         0b8f6a4e\r\n\
         --{b}\r\n\
         Content-Disposition: form-data; name=\"type\"\r\n\r\n\
         {kind}\r\n\
         --{b}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"notes.txt\"\r\n\
         Content-Type: {file_type}\r\n\r\n\
         hello\r\n\
         --{b}--\r\n",
        b = boundary,
        kind = kind,
        file_type = file_type,
    )
    .into_bytes()
}

pub fn message_of(body: &[u8]) -> String {
    let value: serde_json::Value = serde_json::from_slice(body).expect("body is not json");
    value["message"].as_str().unwrap_or_default().to_owned()
}
