//! Stage-side file handling: parquet serialization, upload, cleanup.
//!
//! Each table owns an implicit stage named `"%" + table`. The uploader
//! serializes a dataset into a scoped temporary parquet file, puts it into
//! that stage and reports the generated file name; the janitor clears the
//! stage. The janitor runs before the uploader in a pass, never after the
//! pipe has been notified, because the pipe consumes staged files
//! asynchronously and a late remove could delete data before it is ingested.

use std::fs::File;
use std::path::Path;

use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::properties::WriterProperties;
use tracing::info;

use crate::config::Credential;
use crate::connector::WarehouseConnector;
use crate::dataset::Dataset;
use crate::error::StageError;

/// Implicit per-table stage name.
pub fn table_stage(table: &str) -> String {
    format!("%{table}")
}

/// A file sitting in a table stage, awaiting ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// Generated file name inside the stage.
    pub name: String,
    /// Table owning the stage.
    pub table: String,
}

/// Serialize a dataset to a parquet file on the local filesystem.
pub fn write_parquet(dataset: &Dataset, path: &Path) -> Result<(), StageError> {
    let batch = dataset
        .to_record_batch()
        .map_err(|e| StageError::Serialize(e.to_string()))?;
    let out = File::create(path)?;
    let mut writer = ArrowWriter::try_new(out, batch.schema(), Some(WriterProperties::builder().build()))
        .map_err(|e| StageError::Serialize(e.to_string()))?;
    writer
        .write(&batch)
        .map_err(|e| StageError::Serialize(e.to_string()))?;
    writer
        .close()
        .map_err(|e| StageError::Serialize(e.to_string()))?;
    Ok(())
}

/// Read a parquet file written by [`write_parquet`] back into a dataset.
pub fn read_parquet(path: &Path) -> Result<Dataset, StageError> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| StageError::Serialize(e.to_string()))?
        .build()
        .map_err(|e| StageError::Serialize(e.to_string()))?;

    let mut records = Vec::new();
    for batch in reader {
        let batch = batch.map_err(|e| StageError::Serialize(e.to_string()))?;
        let chunk = Dataset::from_record_batch(&batch)
            .map_err(|e| StageError::Serialize(e.to_string()))?;
        records.extend_from_slice(chunk.records());
    }
    Ok(Dataset::new(records))
}

/// Serializes a dataset and puts it into the table's implicit stage.
pub struct StageUploader<'a> {
    connector: &'a dyn WarehouseConnector,
    credential: &'a Credential,
}

impl<'a> StageUploader<'a> {
    pub fn new(connector: &'a dyn WarehouseConnector, credential: &'a Credential) -> Self {
        Self {
            connector,
            credential,
        }
    }

    /// Serialize `dataset` and upload it. The local temporary file is
    /// removed when this function returns, on every path.
    ///
    /// No retry is attempted here: a failed put surfaces to the caller,
    /// which decides whether to fall back.
    pub fn upload(&self, dataset: &Dataset, table: &str) -> Result<StagedFile, StageError> {
        let temp = tempfile::Builder::new()
            .prefix("orders-")
            .suffix(".parquet")
            .tempfile()?;
        write_parquet(dataset, temp.path())?;

        let name = temp
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stage = table_stage(table);
        info!(stage = %stage, file = %name, rows = dataset.len(), "uploading dataset to table stage");

        let mut session = self.connector.connect(self.credential, None)?;
        session
            .put_file(temp.path(), &stage)
            .map_err(|source| StageError::Upload {
                file: name.clone(),
                source,
            })?;

        Ok(StagedFile {
            name,
            table: table.to_string(),
        })
    }
}

/// Clears stale files from a table's implicit stage.
pub struct StageJanitor<'a> {
    connector: &'a dyn WarehouseConnector,
    credential: &'a Credential,
}

impl<'a> StageJanitor<'a> {
    pub fn new(connector: &'a dyn WarehouseConnector, credential: &'a Credential) -> Self {
        Self {
            connector,
            credential,
        }
    }

    /// Remove every file in the table's stage. Cleaning an empty stage is a
    /// no-op.
    pub fn clean(&self, table: &str) -> Result<(), StageError> {
        let stage = table_stage(table);
        let mut session = self.connector.connect(self.credential, None)?;
        let removed = session.remove_files(&stage).map_err(StageError::Remove)?;
        info!(stage = %stage, removed, "table stage cleared");
        Ok(())
    }
}
