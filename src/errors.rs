use derive_more::{Display, Error, From};

use crate::storage;

#[derive(Debug, Display, Error, From)]
pub enum Error {
    #[display(fmt = "EstablishConnection: {}", _0)]
    EstablishConnection(mobc::Error<diesel::ConnectionError>),
    #[display(fmt = "QueryResult: {}", _0)]
    QueryResult(diesel::result::Error),
    #[display(fmt = "Storage: {}", _0)]
    Storage(storage::Error),
    #[from(ignore)]
    #[display(fmt = "Validation: {}", _0)]
    Validation(#[error(not(source))] String),
    #[display(fmt = "Missing authorization header")]
    Unauthorized,
    #[from(ignore)]
    #[display(fmt = "NotFound: {}", _0)]
    NotFound(#[error(not(source))] &'static str),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }
}
