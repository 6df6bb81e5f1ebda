//! Fire-and-forget notification of the serverless ingestion pipe.
//!
//! Acceptance of the HTTP request is the only completion signal this crate
//! relies on: the pipe consumes staged files asynchronously and nothing here
//! polls for confirmation that rows actually landed. That gap is deliberate;
//! out-of-band verification belongs to a separate process.

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Serialize;
use tracing::info;

use crate::auth::SignedToken;
use crate::config::{Credential, LoaderConfig};
use crate::error::IngestionError;
use crate::stage::StagedFile;

const TOKEN_TYPE_HEADER: &str = "X-Snowflake-Authorization-Token-Type";
const TOKEN_TYPE_KEYPAIR_JWT: &str = "KEYPAIR_JWT";

#[derive(Debug, Serialize)]
struct InsertFilesRequest<'a> {
    files: Vec<StagedPath<'a>>,
}

#[derive(Debug, Serialize)]
struct StagedPath<'a> {
    path: &'a str,
}

/// Notifies the ingestion service that new staged files are ready.
pub struct IngestionTrigger {
    http: Client,
    base: String,
}

impl IngestionTrigger {
    /// Build a trigger client for the configured endpoint, with the
    /// configured per-request timeout.
    pub fn new(config: &LoaderConfig, credential: &Credential) -> Result<Self, IngestionError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        let base = config.endpoint.clone().unwrap_or_else(|| {
            format!("https://{}.{}", credential.account, config.host_domain)
        });
        Ok(Self { http, base })
    }

    /// `PIPE_<TABLE>`, the pipe bound to a table by naming convention.
    pub fn pipe_name(table: &str) -> String {
        format!("pipe_{table}").to_uppercase()
    }

    /// Fully qualified insertFiles URL for a table's pipe.
    pub fn insert_files_url(&self, database: &str, schema: &str, table: &str) -> String {
        format!(
            "{}/v1/data/pipes/{}.{}.{}/insertFiles",
            self.base,
            database,
            schema,
            Self::pipe_name(table)
        )
    }

    /// Tell the pipe about one staged file. HTTP 200 is the only success;
    /// every other status surfaces as a rejection carrying status and body.
    pub fn trigger(
        &self,
        staged: &StagedFile,
        credential: &Credential,
        token: &SignedToken,
    ) -> Result<(), IngestionError> {
        let url = self.insert_files_url(&credential.database, &credential.schema, &staged.table);
        info!(url = %url, file = %staged.name, "notifying ingestion pipe");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&token.value)
            .header(TOKEN_TYPE_HEADER, TOKEN_TYPE_KEYPAIR_JWT)
            .json(&InsertFilesRequest {
                files: vec![StagedPath { path: &staged.name }],
            })
            .send()?;

        let status = response.status();
        let body = response.text().unwrap_or_default();
        if status != StatusCode::OK {
            return Err(IngestionError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(status = %status, "pipe accepted insertFiles request");
        Ok(())
    }
}
