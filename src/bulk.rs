//! Warehouse-backed bulk load, the deterministic fallback path.
//!
//! Strictly more expensive than stage-and-notify (the warehouse bills in
//! coarse time units) but on success the table is guaranteed to exist and
//! contain the rows, which is what makes it the fallback when the serverless
//! path cannot succeed.

use tracing::info;

use crate::config::Credential;
use crate::connector::WarehouseConnector;
use crate::dataset::Dataset;
use crate::error::{FallbackLoadError, SessionError};

/// Loads a dataset with a synchronous, compute-backed bulk insert.
pub struct BulkLoader<'a> {
    connector: &'a dyn WarehouseConnector,
    credential: &'a Credential,
}

impl<'a> BulkLoader<'a> {
    pub fn new(connector: &'a dyn WarehouseConnector, credential: &'a Credential) -> Self {
        Self {
            connector,
            credential,
        }
    }

    /// Bulk insert `dataset` into `table`, creating the table from the
    /// dataset schema when it does not exist. Returns the exact number of
    /// rows written. Failure here is terminal for the invocation.
    pub fn load(&self, dataset: &Dataset, table: &str) -> Result<usize, FallbackLoadError> {
        let warehouse = self
            .credential
            .warehouse
            .as_deref()
            .ok_or(FallbackLoadError::MissingWarehouse)?;

        let batch = dataset
            .to_record_batch()
            .map_err(|e| FallbackLoadError::Load {
                table: table.to_string(),
                source: SessionError(e.to_string()),
            })?;

        let mut session = self.connector.connect(self.credential, Some(warehouse))?;
        let rows = session
            .write_rows(table, &batch)
            .map_err(|source| FallbackLoadError::Load {
                table: table.to_string(),
                source,
            })?;

        info!(table, rows, warehouse, "bulk load complete");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::record_batch::RecordBatch;
    use std::cell::RefCell;
    use std::path::Path;

    use crate::connector::WarehouseSession;
    use crate::dataset::SalesOrder;
    use crate::error::ConnectionError;
    use chrono::Utc;

    fn sample(n: usize) -> Dataset {
        Dataset::new(
            (0..n)
                .map(|i| SalesOrder {
                    name: format!("Customer {i}"),
                    email: format!("customer{i}@example.com"),
                    address: format!("{i} Main Street"),
                    ordered_at_utc: Utc::now(),
                    extracted_at_utc: Utc::now(),
                    sales_order_id: format!("order-{i}"),
                })
                .collect(),
        )
    }

    fn credential(warehouse: Option<&str>) -> Credential {
        let mut value = serde_json::json!({
            "account": "acct",
            "user": "u",
            "role": "r",
            "database": "db",
            "schema": "sc"
        });
        if let Some(w) = warehouse {
            value["warehouse"] = serde_json::json!(w);
        }
        serde_json::from_value(value).unwrap()
    }

    #[derive(Default)]
    struct BulkConnector {
        warehouses: RefCell<Vec<Option<String>>>,
        writes: RefCell<Vec<(String, usize)>>,
    }

    struct BulkSession<'a> {
        owner: &'a BulkConnector,
    }

    impl WarehouseConnector for BulkConnector {
        fn connect(
            &self,
            _credential: &Credential,
            warehouse: Option<&str>,
        ) -> Result<Box<dyn WarehouseSession + '_>, ConnectionError> {
            self.warehouses
                .borrow_mut()
                .push(warehouse.map(str::to_string));
            Ok(Box::new(BulkSession { owner: self }))
        }
    }

    impl WarehouseSession for BulkSession<'_> {
        fn put_file(&mut self, _local: &Path, _stage: &str) -> Result<(), SessionError> {
            unreachable!("bulk tests never stage files")
        }

        fn remove_files(&mut self, _stage: &str) -> Result<usize, SessionError> {
            unreachable!("bulk tests never clean stages")
        }

        fn write_rows(&mut self, table: &str, rows: &RecordBatch) -> Result<usize, SessionError> {
            self.owner
                .writes
                .borrow_mut()
                .push((table.to_string(), rows.num_rows()));
            Ok(rows.num_rows())
        }
    }

    #[test]
    fn load_attaches_the_configured_warehouse() {
        let connector = BulkConnector::default();
        let credential = credential(Some("compute_wh"));
        let rows = BulkLoader::new(&connector, &credential)
            .load(&sample(7), "orders")
            .unwrap();

        assert_eq!(rows, 7);
        assert_eq!(
            *connector.warehouses.borrow(),
            vec![Some("compute_wh".to_string())]
        );
        assert_eq!(
            *connector.writes.borrow(),
            vec![("orders".to_string(), 7)]
        );
    }

    #[test]
    fn load_without_warehouse_is_rejected_before_connecting() {
        let connector = BulkConnector::default();
        let credential = credential(None);
        let err = BulkLoader::new(&connector, &credential)
            .load(&sample(1), "orders")
            .unwrap_err();

        assert!(matches!(err, FallbackLoadError::MissingWarehouse));
        assert!(connector.warehouses.borrow().is_empty());
    }
}
