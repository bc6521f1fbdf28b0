#[macro_use]
extern crate diesel;
#[macro_use]
extern crate diesel_migrations;

pub mod auth;
pub mod configuration;
pub mod connection_pool;
pub mod controllers;
pub mod errors;
pub mod models;
pub mod rate_limit;
pub mod schema;
pub mod storage;
pub mod telemetry;
pub mod util;
