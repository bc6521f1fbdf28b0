use std::time::Duration;

use diesel::{Connection, ConnectionError, PgConnection};
use diesel_tracing::pg::InstrumentedPgConnection;
use mobc::{async_trait, Connection as Pooled, Manager, Pool};
use tracing::{info, Instrument};

embed_migrations!("migrations");

pub type DbPool = Pool<PgConnectionManager>;

pub struct PgConnectionManager {
    database_url: String,
}

impl PgConnectionManager {
    pub fn new(database_url: impl Into<String>) -> Self {
        PgConnectionManager {
            database_url: database_url.into(),
        }
    }
}

#[async_trait]
impl Manager for PgConnectionManager {
    type Connection = InstrumentedPgConnection;
    type Error = ConnectionError;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        InstrumentedPgConnection::establish(&self.database_url)
    }

    async fn check(&self, conn: Self::Connection) -> Result<Self::Connection, Self::Error> {
        Ok(conn)
    }
}

/// Connections are opened lazily on first checkout.
pub fn establish_connection_pool(database_url: &str) -> DbPool {
    Pool::builder()
        .max_open(16)
        .max_idle(4)
        .get_timeout(Some(Duration::from_secs(5)))
        .build(PgConnectionManager::new(database_url))
}

pub async fn checkout(
    db_pool: &DbPool,
) -> Result<Pooled<PgConnectionManager>, mobc::Error<ConnectionError>> {
    db_pool
        .get()
        .instrument(tracing::info_span!("Acquiring a DB Connection."))
        .await
}

#[tracing::instrument(name = "Running pending migrations.", level = "info", err, skip(database_url))]
pub fn run_migrations(database_url: &str) -> anyhow::Result<()> {
    let conn = PgConnection::establish(database_url)?;
    embedded_migrations::run(&conn)?;
    info!("Database schema is up to date.");
    Ok(())
}
