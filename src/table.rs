use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, trace};

use crate::catalog::CatalogConfig;
use crate::domain::HclError;
use crate::render::{FieldRenderer, support_class};
use crate::store::Record;

/// Joins the fields of one column group inside a cell.
pub const LINE_BREAK: &str = "\n";
pub const BAND_CLASSES: [&str; 2] = ["even", "odd"];
pub const HIDDEN_CLASS: &str = "hidden";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayCell {
    pub column: usize,
    pub text: String,
    /// Number of rows this cell covers, starting at the row it is emitted in.
    pub span: usize,
    pub style_class: String,
}

/// Cells emitted for one record. Columns covered by a cell of an earlier row
/// are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayRow {
    pub cells: Vec<DisplayCell>,
}

#[derive(Debug)]
struct ResolvedColumn {
    fields: Vec<usize>,
    unmerged: bool,
    hidden: bool,
}

pub struct TableBuilder {
    columns: Vec<ResolvedColumn>,
    renderer: FieldRenderer,
    band_idx: usize,
    style_idx: usize,
    baseline: Arc<Vec<Record>>,
    cache: Option<Arc<Vec<DisplayRow>>>,
}

impl TableBuilder {
    pub fn new(
        config: &CatalogConfig,
        renderer: FieldRenderer,
        baseline: Arc<Vec<Record>>,
    ) -> Result<Self, HclError> {
        let schema = &config.schema;
        let columns = config
            .columns
            .iter()
            .map(|c| {
                Ok(ResolvedColumn {
                    fields: c
                        .fields
                        .iter()
                        .map(|f| schema.index_of(f))
                        .collect::<Result<Vec<_>, HclError>>()?,
                    unmerged: c.contains(&config.unmerged_field),
                    hidden: c.hidden,
                })
            })
            .collect::<Result<Vec<_>, HclError>>()?;

        Ok(Self {
            columns,
            renderer,
            band_idx: schema.index_of(&config.band_field)?,
            style_idx: schema.index_of(&config.style_field)?,
            baseline,
            cache: None,
        })
    }

    /// Builds the display rows for `records`. The baseline record set is built
    /// once and replayed from the cache afterwards.
    pub fn build(&mut self, records: &Arc<Vec<Record>>) -> Result<Arc<Vec<DisplayRow>>, HclError> {
        if !Arc::ptr_eq(records, &self.baseline) {
            return Ok(Arc::new(self.group(records)?));
        }
        if let Some(rows) = &self.cache {
            trace!("Replaying cached baseline table");
            return Ok(Arc::clone(rows));
        }
        let rows = Arc::new(self.group(records)?);
        self.cache = Some(Arc::clone(&rows));
        Ok(rows)
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    fn cell_text(&self, column: &ResolvedColumn, record: &Record) -> Result<String, HclError> {
        let parts = column
            .fields
            .iter()
            .map(|&idx| self.renderer.render_at(idx, record.value(idx)))
            .collect::<Result<Vec<_>, HclError>>()?;
        Ok(parts.join(LINE_BREAK))
    }

    fn group(&self, records: &[Record]) -> Result<Vec<DisplayRow>, HclError> {
        let start_time = Instant::now();
        let mut rows: Vec<DisplayRow> = Vec::with_capacity(records.len());
        let Some(first) = records.first() else {
            return Ok(rows);
        };

        let mut band = 0;
        let mut band_value = first.value(self.band_idx);
        // (row, cell) position of the last emitted cell of every column
        let mut history: Vec<Option<(usize, usize)>> = vec![None; self.columns.len()];

        for (row_idx, record) in records.iter().enumerate() {
            if record.value(self.band_idx) != band_value {
                band = 1 - band;
                band_value = record.value(self.band_idx);
            }

            let mut cells = Vec::with_capacity(self.columns.len());
            for (col_idx, column) in self.columns.iter().enumerate() {
                let text = self.cell_text(column, record)?;

                if !column.unmerged
                    && let Some((r, c)) = history[col_idx]
                {
                    let previous = &mut rows[r].cells[c];
                    if previous.text == text {
                        previous.span += 1;
                        continue;
                    }
                }

                let mut style_class = if column.unmerged {
                    support_class(record.value(self.style_idx))?.to_string()
                } else {
                    BAND_CLASSES[band].to_string()
                };
                if column.hidden {
                    style_class = format!("{style_class} {HIDDEN_CLASS}");
                }

                history[col_idx] = Some((row_idx, cells.len()));
                cells.push(DisplayCell {
                    column: col_idx,
                    text,
                    span: 1,
                    style_class,
                });
            }
            rows.push(DisplayRow { cells });
        }

        debug!(
            "Grouped {} records into table in {}ms",
            records.len(),
            start_time.elapsed().as_millis()
        );
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RecordStore;
    use crate::store::tests::{device, scenario, store};

    fn builder(store: &RecordStore) -> TableBuilder {
        let config = store.config();
        TableBuilder::new(
            config,
            FieldRenderer::for_table(&config.schema).unwrap(),
            store.all_records(),
        )
        .unwrap()
    }

    fn column_cells(rows: &[DisplayRow], column: usize) -> Vec<(String, usize)> {
        rows.iter()
            .flat_map(|r| r.cells.iter())
            .filter(|c| c.column == column)
            .map(|c| (c.text.clone(), c.span))
            .collect()
    }

    #[test]
    fn scenario_merges_manufacturer_cells() {
        let store = store(scenario());
        let rows = builder(&store).build(&store.all_records()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            column_cells(&rows, 0),
            vec![("APC".to_string(), 2), ("Eaton".to_string(), 1)]
        );
        // Driver cells never merge and follow the support level palette
        let drivers: Vec<&DisplayCell> = rows
            .iter()
            .flat_map(|r| r.cells.iter())
            .filter(|c| c.column == 2)
            .collect();
        assert_eq!(drivers.len(), 3);
        assert!(drivers.iter().all(|c| c.span == 1));
        assert_eq!(drivers[0].style_class, "green");
        assert_eq!(drivers[2].style_class, "yellow");
        assert_eq!(drivers[2].text, "snmp-ups");
    }

    #[test]
    fn second_row_only_holds_uncovered_cells() {
        let store = store(scenario());
        let rows = builder(&store).build(&store.all_records()).unwrap();
        let columns: Vec<usize> = rows[1].cells.iter().map(|c| c.column).collect();
        assert_eq!(columns, vec![2]);
        assert_eq!(rows[0].cells.len(), 4);
    }

    #[test]
    fn model_and_comment_share_a_cell() {
        let store = store(vec![Record::new([
            "APC",
            "ups",
            "4",
            "Smart-UPS",
            "serial cable",
            "apcsmart",
        ])]);
        let rows = builder(&store).build(&store.all_records()).unwrap();
        assert_eq!(rows[0].cells[1].text, "Smart-UPS\nserial cable");
        assert_eq!(rows[0].cells[3].text, "****");
        assert_eq!(rows[0].cells[3].style_class, "even hidden");
    }

    #[test]
    fn bands_flip_on_manufacturer_change() {
        let store = store(vec![
            device("APC", "A", "usbhid-ups", "5"),
            device("APC", "B", "apcsmart", "5"),
            device("Belkin", "C", "usbhid-ups", "3"),
            device("Cyber Power", "D", "usbhid-ups", "3"),
        ]);
        let rows = builder(&store).build(&store.all_records()).unwrap();
        let bands: Vec<&str> = rows
            .iter()
            .map(|r| {
                r.cells
                    .iter()
                    .find(|c| c.column == 1)
                    .map(|c| c.style_class.as_str())
                    .unwrap()
            })
            .collect();
        assert_eq!(bands, vec!["even", "even", "odd", "even"]);
    }

    #[test]
    fn identical_adjacent_text_always_merges() {
        let store = store(vec![
            device("APC", "Back-UPS", "usbhid-ups", "5"),
            device("APC", "Back-UPS", "usbhid-ups", "5"),
            device("APC", "Smart-UPS", "usbhid-ups", "5"),
            device("Belkin", "Smart-UPS", "usbhid-ups", "5"),
        ]);
        let rows = builder(&store).build(&store.all_records()).unwrap();
        assert_eq!(
            column_cells(&rows, 1),
            vec![("Back-UPS\n".to_string(), 2), ("Smart-UPS\n".to_string(), 2)]
        );
        let total: usize = column_cells(&rows, 0).iter().map(|(_, s)| s).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn baseline_is_cached_and_other_sets_recompute() {
        let store = store(scenario());
        let mut builder = builder(&store);
        assert!(!builder.is_cached());
        let first = builder.build(&store.all_records()).unwrap();
        assert!(builder.is_cached());
        let second = builder.build(&store.all_records()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let copy = Arc::new((*store.all_records()).clone());
        let third = builder.build(&copy).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(first, third);
    }

    #[test]
    fn empty_input_yields_no_rows() {
        let store = store(scenario());
        let mut builder = builder(&store);
        let rows = builder.build(&Arc::new(Vec::new())).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn bad_support_level_aborts_the_build() {
        let store = store(vec![device("APC", "A", "usbhid-ups", "9")]);
        let res = builder(&store).build(&store.all_records());
        assert!(matches!(res, Err(HclError::SchemaViolation { .. })));
    }
}
