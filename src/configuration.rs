use std::env;
use std::net::SocketAddr;
use std::num::NonZeroU32;

use derive_more::{Display, Error};
use nonzero_ext::nonzero;

#[derive(Debug, Display, Error)]
pub enum Error {
    #[display(fmt = "Missing environment variable {}", _0)]
    Missing(#[error(not(source))] &'static str),
    #[display(fmt = "Invalid value for environment variable {}", _0)]
    Invalid(#[error(not(source))] &'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub database_url: String,
    pub bind_address: SocketAddr,
    pub rate_limit_per_second: NonZeroU32,
    pub storage: StorageConfiguration,
    pub honeycomb: Option<HoneycombConfiguration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfiguration {
    pub key: String,
    pub secret: String,
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub public_url: Option<String>,
}

impl StorageConfiguration {
    /// Objects are served from `{endpoint}/{bucket}` unless a CDN base is set.
    pub fn public_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.clone(),
            None => format!("{}/{}", self.endpoint.trim_end_matches('/'), self.bucket),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoneycombConfiguration {
    pub api_key: String,
    pub dataset: String,
}

impl Configuration {
    pub fn from_env() -> Result<Configuration, Error> {
        Configuration::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Configuration, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(Error::Missing(name));
        let optional = |name: &'static str| lookup(name).filter(|x| !x.trim().is_empty());

        let bind_address = optional("AUDIOBOOKS_BIND_ADDRESS")
            .unwrap_or_else(|| "0.0.0.0:3000".into())
            .parse()
            .map_err(|_| Error::Invalid("AUDIOBOOKS_BIND_ADDRESS"))?;
        let rate_limit_per_second = match optional("AUDIOBOOKS_RATE_LIMIT_PER_SECOND") {
            Some(x) => x
                .parse::<NonZeroU32>()
                .map_err(|_| Error::Invalid("AUDIOBOOKS_RATE_LIMIT_PER_SECOND"))?,
            None => nonzero!(5u32),
        };
        let honeycomb = match optional("HONEYCOMB_API_KEY") {
            Some(api_key) => Some(HoneycombConfiguration {
                api_key,
                dataset: required("HONEYCOMB_DATASET")?,
            }),
            None => None,
        };
        Ok(Configuration {
            database_url: required("DATABASE_URL")?,
            bind_address,
            rate_limit_per_second,
            storage: StorageConfiguration {
                key: required("AUDIOBOOKS_STORAGE_KEY")?,
                secret: required("AUDIOBOOKS_STORAGE_SECRET")?,
                endpoint: required("AUDIOBOOKS_STORAGE_ENDPOINT")?,
                region: optional("AUDIOBOOKS_STORAGE_REGION").unwrap_or_else(|| "us-east-1".into()),
                bucket: optional("AUDIOBOOKS_STORAGE_BUCKET").unwrap_or_else(|| "audiobooks".into()),
                public_url: optional("AUDIOBOOKS_STORAGE_PUBLIC_URL"),
            },
            honeycomb,
        })
    }
}
