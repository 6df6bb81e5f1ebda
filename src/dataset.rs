//! The fixed sales-order schema this pipeline moves.
//!
//! Both load paths serialize through [`Dataset::schema`] and
//! [`Dataset::to_record_batch`], so the staged parquet files and the
//! auto-created bulk table always agree on column names and types.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One sales-order record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesOrder {
    /// Customer name.
    pub name: String,
    /// Customer email.
    pub email: String,
    /// Customer postal address.
    pub address: String,
    /// When the order was placed.
    pub ordered_at_utc: DateTime<Utc>,
    /// When the record was extracted upstream.
    pub extracted_at_utc: DateTime<Utc>,
    /// Unique order identifier (UUID v4 at the producer).
    pub sales_order_id: String,
}

/// An immutable, ordered batch of sales orders. Produced by an external
/// generator and owned by the caller until handed to the loader.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<SalesOrder>,
}

impl Dataset {
    /// Wrap a batch of records.
    pub fn new(records: Vec<SalesOrder>) -> Self {
        Self { records }
    }

    /// Number of records in the batch.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The records, in their original order.
    pub fn records(&self) -> &[SalesOrder] {
        &self.records
    }

    /// The Arrow schema shared by the staged parquet files and the
    /// auto-created bulk table.
    pub fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("name", DataType::Utf8, false),
            Field::new("email", DataType::Utf8, false),
            Field::new("address", DataType::Utf8, false),
            Field::new("ordered_at_utc", utc_timestamp(), false),
            Field::new("extracted_at_utc", utc_timestamp(), false),
            Field::new("sales_order_id", DataType::Utf8, false),
        ]))
    }

    /// Convert the batch to Arrow columns.
    pub fn to_record_batch(&self) -> Result<RecordBatch, ArrowError> {
        let names: StringArray = self.records.iter().map(|r| Some(r.name.as_str())).collect();
        let emails: StringArray = self
            .records
            .iter()
            .map(|r| Some(r.email.as_str()))
            .collect();
        let addresses: StringArray = self
            .records
            .iter()
            .map(|r| Some(r.address.as_str()))
            .collect();
        let ordered_at = timestamp_column(self.records.iter().map(|r| r.ordered_at_utc));
        let extracted_at = timestamp_column(self.records.iter().map(|r| r.extracted_at_utc));
        let order_ids: StringArray = self
            .records
            .iter()
            .map(|r| Some(r.sales_order_id.as_str()))
            .collect();

        RecordBatch::try_new(
            Self::schema(),
            vec![
                Arc::new(names) as ArrayRef,
                Arc::new(emails),
                Arc::new(addresses),
                Arc::new(ordered_at),
                Arc::new(extracted_at),
                Arc::new(order_ids),
            ],
        )
    }

    /// Rebuild a dataset from Arrow columns, e.g. when verifying a staged
    /// file. Timestamps are read back at microsecond precision, which is
    /// exactly what [`Dataset::to_record_batch`] writes.
    pub fn from_record_batch(batch: &RecordBatch) -> Result<Self, ArrowError> {
        let names = string_column(batch, 0, "name")?;
        let emails = string_column(batch, 1, "email")?;
        let addresses = string_column(batch, 2, "address")?;
        let ordered_at = timestamp_values(batch, 3, "ordered_at_utc")?;
        let extracted_at = timestamp_values(batch, 4, "extracted_at_utc")?;
        let order_ids = string_column(batch, 5, "sales_order_id")?;

        let records = (0..batch.num_rows())
            .map(|i| SalesOrder {
                name: names.value(i).to_string(),
                email: emails.value(i).to_string(),
                address: addresses.value(i).to_string(),
                ordered_at_utc: ordered_at[i],
                extracted_at_utc: extracted_at[i],
                sales_order_id: order_ids.value(i).to_string(),
            })
            .collect();

        Ok(Self { records })
    }
}

fn utc_timestamp() -> DataType {
    DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
}

fn timestamp_column(
    values: impl Iterator<Item = DateTime<Utc>>,
) -> TimestampMicrosecondArray {
    TimestampMicrosecondArray::from(values.map(|v| v.timestamp_micros()).collect::<Vec<_>>())
        .with_timezone("UTC")
}

fn string_column<'a>(
    batch: &'a RecordBatch,
    index: usize,
    name: &str,
) -> Result<&'a StringArray, ArrowError> {
    batch
        .column(index)
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| ArrowError::SchemaError(format!("column {name} is not Utf8")))
}

fn timestamp_values(
    batch: &RecordBatch,
    index: usize,
    name: &str,
) -> Result<Vec<DateTime<Utc>>, ArrowError> {
    let column = batch
        .column(index)
        .as_any()
        .downcast_ref::<TimestampMicrosecondArray>()
        .ok_or_else(|| {
            ArrowError::SchemaError(format!("column {name} is not a microsecond timestamp"))
        })?;

    (0..column.len())
        .map(|i| {
            DateTime::from_timestamp_micros(column.value(i)).ok_or_else(|| {
                ArrowError::SchemaError(format!("column {name} holds an out-of-range timestamp"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn micros_now() -> DateTime<Utc> {
        DateTime::from_timestamp_micros(Utc::now().timestamp_micros()).unwrap()
    }

    fn sample(n: usize) -> Dataset {
        let now = micros_now();
        Dataset::new(
            (0..n)
                .map(|i| SalesOrder {
                    name: format!("Customer {i}"),
                    email: format!("customer{i}@example.com"),
                    address: format!("{i} Main Street"),
                    ordered_at_utc: now - chrono::Duration::minutes(i as i64),
                    extracted_at_utc: now,
                    sales_order_id: Uuid::new_v4().to_string(),
                })
                .collect(),
        )
    }

    #[test]
    fn schema_has_expected_columns() {
        let schema = Dataset::schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(
            names,
            vec![
                "name",
                "email",
                "address",
                "ordered_at_utc",
                "extracted_at_utc",
                "sales_order_id"
            ]
        );
    }

    #[test]
    fn record_batch_round_trip_is_lossless() {
        let dataset = sample(25);
        let batch = dataset.to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 25);
        assert_eq!(batch.num_columns(), 6);

        let restored = Dataset::from_record_batch(&batch).unwrap();
        assert_eq!(restored.records(), dataset.records());
    }

    #[test]
    fn empty_dataset_converts_cleanly() {
        let dataset = Dataset::default();
        let batch = dataset.to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 0);

        let restored = Dataset::from_record_batch(&batch).unwrap();
        assert!(restored.is_empty());
    }
}
