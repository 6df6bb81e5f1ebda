//! Dual-path warehouse ingestion loader.
//!
//! Given a batch of sales-order records, land it durably in a warehouse
//! table via one of two mutually exclusive strategies:
//!
//! - **Stage-and-notify** (cheap, compute-free): clear the table's implicit
//!   stage, upload a parquet serialization of the batch, mint a key-pair
//!   bearer token and notify the table's serverless ingestion pipe over
//!   REST. Fire-and-forget — acceptance of the HTTP request is the only
//!   completion signal.
//! - **Bulk load** (expensive, deterministic): open a compute-backed session
//!   and synchronously insert the rows, creating the table when absent.
//!
//! [`Loader`] runs the first path and falls back to the second on any
//! failure; when both fail, the returned [`LoadError`] carries both causes.
//!
//! Wire-protocol session operations (open, PUT, REMOVE, bulk write) sit
//! behind the [`connector`] traits so any driver binding can be plugged in.
//!
//! ```rust,ignore
//! use snowpipe_loader::{Loader, LoaderConfig};
//!
//! let config = LoaderConfig::builder("fake_sales_orders").build();
//! let loader = Loader::new(&connector, &credential, config);
//! let result = loader.load(&dataset)?;
//! println!("loaded {} rows via {:?}", result.rows_attempted, result.strategy);
//! ```

pub mod auth;
pub mod bulk;
pub mod config;
pub mod connector;
pub mod dataset;
pub mod error;
pub mod loader;
pub mod pipe;
pub mod stage;

// Re-export commonly used types
pub use auth::{SignedToken, TOKEN_LIFETIME_SECONDS};
pub use bulk::BulkLoader;
pub use config::{Credential, LoaderConfig, LoaderConfigBuilder};
pub use connector::{WarehouseConnector, WarehouseSession};
pub use dataset::{Dataset, SalesOrder};
pub use error::{
    ConnectionError, CredentialError, FallbackLoadError, IngestionError, LoadError, ServerlessError,
    SessionError, StageError,
};
pub use loader::{LoadResult, LoadStrategy, Loader};
pub use pipe::IngestionTrigger;
pub use stage::{StageJanitor, StageUploader, StagedFile};
