//! Starts Cloud SQL exports into Cloud Storage.
//!
//! Each call to [`export::trigger_export`] asks the Cloud SQL Admin API to
//! dump one instance to `gs://{bucket}/{dir}/{instance}-{timestamp}.sql.gz`
//! and returns the operation the service started for it.

#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate log;

pub mod config;
pub mod credentials;
pub mod error;
pub mod export;
pub mod sqladmin;

#[cfg(test)]
mod http_double;

pub use config::Config;
pub use credentials::{default_provider, AccessToken, TokenProvider};
pub use error::{Error, Result};
pub use export::{trigger_export, Clock, LocalClock};
pub use sqladmin::{Operation, RestClient, SqlAdmin};
