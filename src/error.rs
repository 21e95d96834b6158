use reqwest::Error as ReqwestError;
use serde_json::Error as SerdeError;
use snafu::Snafu;
use std::path::PathBuf;

/// General purpose error enum
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Missing configuration, is {} set?", key))]
    MissingConfig { key: String },

    #[snafu(display("Failed to load credentials from {}: {}", path.display(), reason))]
    CredentialsFile { path: PathBuf, reason: String },

    #[snafu(display("Failed to exchange service account JWT for a token: {}", reason))]
    Token { reason: String },

    #[snafu(display("Metadata server refused token request ({}): {}", status, body))]
    Metadata { status: u16, body: String },

    #[snafu(display("Network request to {} failed: {}", url, source))]
    Http { url: String, source: ReqwestError },

    /// The remote service answered with a non-success status.
    #[snafu(display("Remote service rejected the request ({}): {}", status, message))]
    Api { status: u16, message: String },

    #[snafu(display("JSON Encoding/Decoding failed: {}", source))]
    Decode { source: SerdeError },

    #[snafu(display("Failed to read event payload from {}: {}", path.display(), source))]
    Event {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
