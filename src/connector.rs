//! Session seam for warehouse drivers.
//!
//! The loader core owns the external contract — stage naming, command
//! ordering, the REST trigger shape, the parquet format — but not the wire
//! protocol of warehouse sessions. Deployments plug their driver binding in
//! through these traits; tests use in-memory fakes.
//!
//! Every opened session must release its server-side resources when dropped,
//! which covers success, handled failure and panics alike.

use std::path::Path;

use arrow::record_batch::RecordBatch;

use crate::config::Credential;
use crate::error::{ConnectionError, SessionError};

/// Opens authenticated sessions against the warehouse.
pub trait WarehouseConnector {
    /// Open a session under the bundle's role, database and schema.
    /// `warehouse` attaches a compute resource; only the bulk path passes
    /// one.
    fn connect(
        &self,
        credential: &Credential,
        warehouse: Option<&str>,
    ) -> Result<Box<dyn WarehouseSession + '_>, ConnectionError>;
}

/// One open warehouse session.
pub trait WarehouseSession {
    /// Transfer a local file into `stage`, the driver-side equivalent of
    /// `PUT file://<local> @<stage>`.
    fn put_file(&mut self, local: &Path, stage: &str) -> Result<(), SessionError>;

    /// Remove every file currently present in `stage` (`REMOVE @<stage>`).
    /// Returns the number of files removed; an empty stage removes zero and
    /// is not an error.
    fn remove_files(&mut self, stage: &str) -> Result<usize, SessionError>;

    /// Synchronous bulk insert of `rows` into `table`, creating the table
    /// from the batch schema when it does not exist. Returns the exact
    /// number of rows written.
    fn write_rows(&mut self, table: &str, rows: &RecordBatch) -> Result<usize, SessionError>;
}
