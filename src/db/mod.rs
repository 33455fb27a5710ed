//! Database module: repository entry model, schema and access.
//!
//! Layout:
//! - `models.rs`: the repository entry document and its field conventions
//! - `schema.rs`: SQL DDL for initializing the database (SQLite)
//! - `sqlite.rs`: `RepoStore`, queries over stored entries
//! - `connection.rs`: `CasicsDb`, credentials plus named database pools

pub mod connection;
pub mod models;
pub mod schema;
pub mod sqlite;

pub use connection::CasicsDb;
pub use models::{
    Content, ContentType, Fork, Language, Probe, Readme, RepoEntry, RepoTimes, make_content_type,
    make_languages, make_topics,
};
pub use schema::SQLITE_INIT;
pub use sqlite::{RepoStore, SqlitePool};
