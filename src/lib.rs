pub mod accounts;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod data_helpers;
pub mod dataset;
pub mod db;
pub mod error;
pub mod logging;
pub mod messages;
pub mod network;
pub mod path;
pub mod system;
pub mod timestamps;

pub use credentials::{Credentials, Secret};
pub use db::{CasicsDb, RepoEntry, RepoStore};
pub use error::CasicsError;
pub use logging::Logger;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const TITLE: &str = "CASICS common code";
pub const URL: &str = "https://github.com/casics/common";
pub const LICENSE: &str = "GNU General Public License, version 3.0";
