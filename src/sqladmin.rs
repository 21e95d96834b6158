// This file contains 1:1 representations of the Cloud SQL Admin REST API
// pieces needed to start an export.

use super::credentials::AccessToken;
use super::error::{ApiSnafu, DecodeSnafu, HttpSnafu, Result};
use reqwest::blocking::Client;
use snafu::ResultExt;

pub const SQLADMIN_BASE_V1BETA4: &'static str = "https://sqladmin.googleapis.com/sql/v1beta4";

/// Contains 1:1 representations of the Cloud SQL Admin resource types
pub mod types {
    use serde_aux::field_attributes::deserialize_default_from_null;

    pub const EXPORT_CONTEXT_KIND: &'static str = "sql#exportContext";

    /// https://cloud.google.com/sql/docs/mysql/admin-api/rest/v1beta4/SqlFileType
    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum SqlFileType {
        Sql,
        Csv,
        Bak,
    }

    /// https://cloud.google.com/sql/docs/mysql/admin-api/rest/v1beta4/ExportContext
    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
    #[serde(rename_all = "camelCase")]
    pub struct ExportContext {
        pub kind: String,
        pub file_type: SqlFileType,
        /// `gs://bucket/object`; a `.gz` suffix makes the service compress
        pub uri: String,
        /// Left out of the body entirely when every database is exported
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub databases: Option<Vec<String>>,
    }

    /// Body of `instances.export`
    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
    #[serde(rename_all = "camelCase")]
    pub struct InstancesExportRequest {
        pub export_context: ExportContext,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
    pub struct OperationErrorEntry {
        #[serde(default)]
        pub code: String,
        #[serde(default)]
        pub message: String,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
    pub struct OperationErrors {
        #[serde(default, deserialize_with = "deserialize_default_from_null")]
        pub errors: Vec<OperationErrorEntry>,
    }

    /// https://cloud.google.com/sql/docs/mysql/admin-api/rest/v1beta4/operations
    /// Only `name` is guaranteed; everything else is informational.
    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
    #[serde(rename_all = "camelCase")]
    pub struct Operation {
        pub name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub kind: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub status: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub operation_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub target_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub target_project: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub self_link: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub insert_time: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub user: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub error: Option<OperationErrors>,
    }

    /// Google's JSON error envelope, `{"error": {...}}`
    #[derive(Deserialize, Debug)]
    pub struct ErrorEnvelope {
        pub error: ErrorBody,
    }

    #[derive(Deserialize, Debug)]
    pub struct ErrorBody {
        #[serde(default)]
        pub code: u16,
        #[serde(default)]
        pub message: String,
        #[serde(default)]
        pub status: Option<String>,
    }
}

pub use self::types::{ExportContext, InstancesExportRequest, Operation, SqlFileType};

/// The slice of the admin API the exporter talks to.
pub trait SqlAdmin {
    /// https://cloud.google.com/sql/docs/mysql/admin-api/rest/v1beta4/instances/export
    /// Returns as soon as the service has accepted the request; the export
    /// itself keeps running remotely.
    fn export_instance(
        &self,
        token: &AccessToken,
        project: &str,
        instance: &str,
        request: &InstancesExportRequest,
    ) -> Result<Operation>;
}

/// Blocking REST client for the Cloud SQL Admin API
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
}

impl Default for RestClient {
    fn default() -> Self {
        RestClient::with_base_url(SQLADMIN_BASE_V1BETA4)
    }
}

impl RestClient {
    pub fn new() -> RestClient {
        RestClient::default()
    }

    pub fn with_base_url<S: Into<String>>(base_url: S) -> RestClient {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        RestClient {
            client: Client::new(),
            base_url,
        }
    }

    // Creates a proper URL for the export call
    pub fn export_url(&self, project: &str, instance: &str) -> String {
        format!(
            "{}/projects/{}/instances/{}/export",
            self.base_url, project, instance
        )
    }
}

impl SqlAdmin for RestClient {
    fn export_instance(
        &self,
        token: &AccessToken,
        project: &str,
        instance: &str,
        request: &InstancesExportRequest,
    ) -> Result<Operation> {
        let url = self.export_url(project, instance);
        debug!("POST {}", url);
        let response = self
            .client
            .post(&*url)
            .bearer_auth(token.secret())
            .json(request)
            .send()
            .context(HttpSnafu { url: url.clone() })?;
        let status = response.status().as_u16();
        let body = response.text().context(HttpSnafu { url })?;
        read_operation(status, &body)
    }
}

/// Turns a raw response into an `Operation`, or into `Error::Api` carrying
/// the service's own message when the status is not a success.
pub fn read_operation(status: u16, body: &str) -> Result<Operation> {
    if (200..300).contains(&status) {
        return serde_json::from_str::<Operation>(body).context(DecodeSnafu);
    }
    let message = match serde_json::from_str::<types::ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => body.trim().to_string(),
    };
    ApiSnafu { status, message }.fail()
}
