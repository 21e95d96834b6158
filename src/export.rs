use super::config::Config;
use super::credentials::TokenProvider;
use super::error::{DecodeSnafu, EventSnafu, Result};
use super::sqladmin::types::EXPORT_CONTEXT_KIND;
use super::sqladmin::{ExportContext, InstancesExportRequest, Operation, SqlAdmin, SqlFileType};
use chrono::{Local, NaiveDateTime};
use serde_json::Value;
use snafu::ResultExt;
use std::path::Path;

/// `YYYYMMDD-HHMMSS`
pub const TIMESTAMP_FORMAT: &'static str = "%Y%m%d-%H%M%S";
pub const BACKUP_SUFFIX: &'static str = ".sql.gz";

/// Source of wall-clock time for backup names
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local time of the machine running the export
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

pub fn timestamp(clock: &dyn Clock) -> String {
    clock.now().format(TIMESTAMP_FORMAT).to_string()
}

pub fn backup_object_name(instance: &str, timestamp: &str) -> String {
    format!("{}-{}{}", instance, timestamp, BACKUP_SUFFIX)
}

/// `gs://{bucket}/{backup_dir}/{instance}-{timestamp}.sql.gz`
pub fn destination_uri(config: &Config, timestamp: &str) -> String {
    let object = backup_object_name(&config.instance, timestamp);
    if config.backup_dir.is_empty() {
        format!("gs://{}/{}", config.bucket, object)
    } else {
        format!("gs://{}/{}/{}", config.bucket, config.backup_dir, object)
    }
}

/// Builds the `instances.export` body for one invocation.
pub fn build_request(config: &Config, clock: &dyn Clock) -> InstancesExportRequest {
    let uri = destination_uri(config, &timestamp(clock));
    InstancesExportRequest {
        export_context: ExportContext {
            kind: EXPORT_CONTEXT_KIND.to_string(),
            file_type: SqlFileType::Sql,
            uri,
            databases: config.database.clone().map(|database| vec![database]),
        },
    }
}

/// Reads a trigger payload from disk; no path means an empty payload.
pub fn load_event(path: Option<&Path>) -> Result<Value> {
    match path {
        None => Ok(Value::Null),
        Some(path) => {
            let text = std::fs::read_to_string(path).context(EventSnafu { path })?;
            serde_json::from_str(&text).context(DecodeSnafu)
        }
    }
}

/// Starts an export of `config.instance` and hands back the operation the
/// service created for it. `event` and `context` are whatever the trigger
/// delivered and are not inspected.
///
/// Credentials are resolved before anything is sent, so a credentials
/// failure never reaches the admin API. Nothing is retried and the call
/// does not wait for the export to finish.
pub fn trigger_export(
    _event: &Value,
    _context: &Value,
    config: &Config,
    provider: &dyn TokenProvider,
    admin: &dyn SqlAdmin,
    clock: &dyn Clock,
) -> Result<Operation> {
    debug!("Using credentials from {}", provider.describe());
    let token = provider.access_token()?;

    let request = build_request(config, clock);
    info!(
        "Starting backup of {} to {}",
        config.instance, request.export_context.uri
    );
    let operation = admin.export_instance(&token, &config.project_id, &config.instance, &request)?;

    info!("Backup started successfully. Operation ID: {}", operation.name);
    Ok(operation)
}
