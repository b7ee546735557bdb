use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::CatalogConfig;
use crate::domain::HclError;
use crate::sort::Sorter;

/// One device of the catalog, one value per schema field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    values: Vec<String>,
}

impl Record {
    pub fn new<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn value(&self, idx: usize) -> &str {
        &self.values[idx]
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

pub struct RecordStore {
    config: Arc<CatalogConfig>,
    records: Arc<Vec<Record>>,
}

impl RecordStore {
    /// Validates the shape of `raw` and keeps it in canonical display order.
    pub fn load(config: Arc<CatalogConfig>, raw: Vec<Record>) -> Result<Self, HclError> {
        config.validate()?;
        let width = config.schema.len();
        for (row, record) in raw.iter().enumerate() {
            if record.len() != width {
                return Err(HclError::schema(
                    "record",
                    &record.values().join(","),
                    format!("row {row} has {} fields, expected {width}", record.len()),
                ));
            }
        }

        let sorter = Sorter::new(&config)?;
        let mut records = raw;
        sorter.sort(&mut records);
        debug!("Sorted {} records", records.len());
        info!("Loaded catalog with {} devices", records.len());

        Ok(Self {
            config,
            records: Arc::new(records),
        })
    }

    /// All records in sorted order. Always the same allocation, which is what
    /// identifies the baseline record set.
    pub fn all_records(&self) -> Arc<Vec<Record>> {
        Arc::clone(&self.records)
    }

    pub fn config(&self) -> &Arc<CatalogConfig> {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Value of `field` for `record`, addressed by name.
    pub fn field<'a>(&self, record: &'a Record, field: &str) -> Result<&'a str, HclError> {
        let idx = self.config.schema.index_of(field)?;
        Ok(record.value(idx))
    }
}
