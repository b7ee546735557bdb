use std::sync::Arc;

use tracing::debug;

use crate::catalog::CatalogConfig;
use crate::domain::HclError;
use crate::filter::{FilterDefinition, FilterEngine, Selection};
use crate::render::FieldRenderer;
use crate::store::{Record, RecordStore};
use crate::table::{DisplayRow, TableBuilder};

/// Visible part of the catalog: the filtered records and their display rows.
/// Every filter change re-derives both; nothing is patched in place.
pub struct CatalogView {
    store: RecordStore,
    builder: TableBuilder,
    engine: FilterEngine,
    records: Arc<Vec<Record>>,
    rows: Arc<Vec<DisplayRow>>,
}

impl CatalogView {
    pub fn new(store: RecordStore) -> Result<Self, HclError> {
        let config = Arc::clone(store.config());
        let all = store.all_records();
        let mut builder = TableBuilder::new(
            &config,
            FieldRenderer::for_table(&config.schema)?,
            Arc::clone(&all),
        )?;
        let engine = FilterEngine::new(&config, FieldRenderer::for_filters(&config.schema)?, &all)?;
        let rows = builder.build(&all)?;
        Ok(Self {
            store,
            builder,
            engine,
            records: all,
            rows,
        })
    }

    fn rebuild(&mut self, records: Arc<Vec<Record>>) -> Result<(), HclError> {
        self.rows = self.builder.build(&records)?;
        debug!(
            "Showing {} of {} devices in {} rows (baseline cached: {})",
            records.len(),
            self.store.len(),
            self.rows.len(),
            self.builder.is_cached()
        );
        self.records = records;
        Ok(())
    }

    pub fn apply_query(&mut self, pairs: &[(String, String)]) -> Result<(), HclError> {
        let all = self.store.all_records();
        let records = self.engine.apply_initial(pairs, &all)?;
        self.rebuild(records)
    }

    pub fn select(&mut self, control: &str, selection: Selection) -> Result<(), HclError> {
        let all = self.store.all_records();
        let records = self.engine.select(control, selection, &all)?;
        self.rebuild(records)
    }

    pub fn reset(&mut self) -> Result<(), HclError> {
        let all = self.store.all_records();
        let records = self.engine.reset(&all)?;
        self.rebuild(records)
    }

    pub fn config(&self) -> &CatalogConfig {
        self.store.config()
    }

    pub fn filters(&self) -> &[FilterDefinition] {
        self.engine.definitions()
    }

    pub fn records(&self) -> &Arc<Vec<Record>> {
        &self.records
    }

    pub fn rows(&self) -> &Arc<Vec<DisplayRow>> {
        &self.rows
    }

    pub fn field<'a>(&self, record: &'a Record, name: &str) -> Result<&'a str, HclError> {
        self.store.field(record, name)
    }

    pub fn total(&self) -> usize {
        self.store.len()
    }
}
