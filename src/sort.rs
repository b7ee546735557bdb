use std::cmp::Ordering;

use crate::catalog::CatalogConfig;
use crate::domain::HclError;
use crate::store::Record;

/// Canonical display order: manufacturer, then driver, both case-insensitive.
#[derive(Debug, Clone, Copy)]
pub struct Sorter {
    primary: usize,
    secondary: usize,
}

impl Sorter {
    pub fn new(config: &CatalogConfig) -> Result<Self, HclError> {
        Ok(Self {
            primary: config.schema.index_of(&config.sort_keys.0)?,
            secondary: config.schema.index_of(&config.sort_keys.1)?,
        })
    }

    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let key = |r: &Record, idx: usize| r.value(idx).to_lowercase();
        key(a, self.primary)
            .cmp(&key(b, self.primary))
            .then_with(|| key(a, self.secondary).cmp(&key(b, self.secondary)))
    }

    /// Stable: records equal on both keys keep their relative order.
    pub fn sort(&self, records: &mut [Record]) {
        records.sort_by(|a, b| self.compare(a, b));
    }
}
