//! Error types for the two load paths.
//!
//! Each failure family gets its own type so the orchestrator can treat the
//! serverless path as a tagged result rather than a chain of opaque
//! exceptions. A total failure surfaces [`LoadError`] carrying the causes
//! from both attempts.

use thiserror::Error;

/// Signing-key problems in the key-pair token path.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The PEM private key could not be parsed.
    #[error("signing key could not be parsed: {0}")]
    InvalidKey(String),

    /// The signing operation itself failed.
    #[error("token signing failed: {0}")]
    Signing(String),

    /// The credential bundle carries no private key.
    #[error("credential bundle has no private key for key-pair signing")]
    MissingKey,
}

/// A warehouse session could not be opened.
#[derive(Debug, Error)]
#[error("could not open warehouse session: {0}")]
pub struct ConnectionError(pub String);

/// A statement or file transfer failed inside an open session.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SessionError(pub String);

/// Failures while staging or clearing files in a table stage.
#[derive(Debug, Error)]
pub enum StageError {
    /// Session open failure.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The PUT of the serialized file into the stage failed.
    #[error("stage put of {file} failed: {source}")]
    Upload {
        /// Name of the file that was being uploaded.
        file: String,
        /// Driver-side failure.
        source: SessionError,
    },

    /// Clearing the stage failed.
    #[error("stage remove failed: {0}")]
    Remove(SessionError),

    /// The dataset could not be serialized to parquet.
    #[error("could not serialize dataset to parquet: {0}")]
    Serialize(String),

    /// Local temporary-file handling failed.
    #[error("temporary file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures from the serverless ingestion trigger endpoint.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// The HTTP request could not be built or sent.
    #[error("ingestion trigger request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-200 status.
    #[error("ingestion service rejected insertFiles (status {status}): {body}")]
    Rejected {
        /// HTTP status code of the rejection.
        status: u16,
        /// Response body, kept verbatim for diagnosis.
        body: String,
    },
}

/// Failures on the warehouse-backed bulk-load path. Terminal for the
/// invocation: the loader has no further fallback.
#[derive(Debug, Error)]
pub enum FallbackLoadError {
    /// Session open failure.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The bulk insert failed.
    #[error("bulk load into {table} failed: {source}")]
    Load {
        /// Destination table.
        table: String,
        /// Driver-side failure.
        source: SessionError,
    },

    /// The credential bundle names no virtual warehouse, which the bulk
    /// path requires for compute.
    #[error("bulk load requires a virtual warehouse in the credential bundle")]
    MissingWarehouse,
}

/// Any failure on the stage-and-notify path. The loader logs it and
/// transitions to the bulk fallback; it never reaches the caller directly.
#[derive(Debug, Error)]
pub enum ServerlessError {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error(transparent)]
    Ingestion(#[from] IngestionError),
}

/// Terminal failure: both load paths failed in one invocation. Carries both
/// causes so operators can tell "table missing" apart from "warehouse
/// unreachable".
#[derive(Debug, Error)]
#[error("bulk fallback failed after serverless path failed: {fallback} (serverless cause: {serverless})")]
pub struct LoadError {
    /// Why the stage-and-notify attempt was abandoned.
    pub serverless: ServerlessError,
    /// Why the bulk attempt failed.
    #[source]
    pub fallback: FallbackLoadError,
}
