//! Two-path load orchestration.
//!
//! One invocation makes at most one stage-and-notify attempt and, when that
//! fails, exactly one bulk attempt. Retry of the whole operation belongs to
//! the caller's scheduler. The serverless step order is fixed: clear the
//! stage, upload, sign, notify. The stage is never cleared after the pipe
//! has been notified — the pipe consumes staged files asynchronously, so a
//! late remove could silently lose data.
//!
//! Concurrent invocations against the same table are not coordinated here;
//! keeping them serialized is the caller's invariant.

use serde::Serialize;
use tracing::{error, warn};

use crate::auth;
use crate::bulk::BulkLoader;
use crate::config::{Credential, LoaderConfig};
use crate::connector::WarehouseConnector;
use crate::dataset::Dataset;
use crate::error::{CredentialError, LoadError, ServerlessError};
use crate::pipe::IngestionTrigger;
use crate::stage::{StageJanitor, StageUploader};

/// Which path landed the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStrategy {
    /// Stage-and-notify through the serverless pipe.
    Serverless,
    /// Warehouse-backed synchronous bulk load.
    Bulk,
}

/// Terminal outcome of one load invocation.
#[derive(Debug, Clone, Serialize)]
pub struct LoadResult {
    /// Which path landed the data.
    pub strategy: LoadStrategy,
    /// Rows handed to that path.
    pub rows_attempted: usize,
    /// Whether the path reported success.
    pub success: bool,
    /// Cause of the abandoned serverless attempt when the bulk path ran.
    pub error: Option<String>,
}

/// Coordinates the two load paths with a defined fallback cascade.
pub struct Loader<'a> {
    connector: &'a dyn WarehouseConnector,
    credential: &'a Credential,
    config: LoaderConfig,
}

impl<'a> Loader<'a> {
    pub fn new(
        connector: &'a dyn WarehouseConnector,
        credential: &'a Credential,
        config: LoaderConfig,
    ) -> Self {
        Self {
            connector,
            credential,
            config,
        }
    }

    /// Land `dataset` in the configured table.
    ///
    /// Tries the serverless path first. Any failure there is logged and
    /// answered with one bulk attempt; a bulk failure is terminal and
    /// surfaces both causes.
    pub fn load(&self, dataset: &Dataset) -> Result<LoadResult, LoadError> {
        match self.serverless_attempt(dataset) {
            Ok(()) => Ok(LoadResult {
                strategy: LoadStrategy::Serverless,
                rows_attempted: dataset.len(),
                success: true,
                error: None,
            }),
            Err(serverless) => {
                warn!(cause = %serverless, "serverless path failed; falling back to bulk load");
                let loaded = BulkLoader::new(self.connector, self.credential)
                    .load(dataset, &self.config.table);
                match loaded {
                    Ok(rows) => Ok(LoadResult {
                        strategy: LoadStrategy::Bulk,
                        rows_attempted: rows,
                        success: true,
                        error: Some(serverless.to_string()),
                    }),
                    Err(fallback) => {
                        error!(serverless = %serverless, fallback = %fallback, "both load paths failed");
                        Err(LoadError {
                            serverless,
                            fallback,
                        })
                    }
                }
            }
        }
    }

    /// Clear stage, upload, sign, notify — in that fixed order.
    fn serverless_attempt(&self, dataset: &Dataset) -> Result<(), ServerlessError> {
        StageJanitor::new(self.connector, self.credential).clean(&self.config.table)?;

        let staged = StageUploader::new(self.connector, self.credential)
            .upload(dataset, &self.config.table)?;

        let key = self
            .credential
            .private_key_pem
            .as_deref()
            .ok_or(CredentialError::MissingKey)?;
        let token = auth::sign(&self.credential.account, &self.credential.user, key)?;

        let trigger = IngestionTrigger::new(&self.config, self.credential)?;
        trigger.trigger(&staged, self.credential, &token)?;
        Ok(())
    }
}
