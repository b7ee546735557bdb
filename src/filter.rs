use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::catalog::CatalogConfig;
use crate::domain::HclError;
use crate::render::FieldRenderer;
use crate::store::Record;

/// Control value meaning "no filter applied".
pub const UNSET_VALUE: &str = "-1";
pub const UNSET_LABEL: &str = "---";
/// Label of an offered value that renders as empty text, e.g. support level 0.
pub const EMPTY_LABEL: &str = "(none)";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Unset,
    Value(String),
}

impl Selection {
    pub fn from_control(value: &str) -> Self {
        if value == UNSET_VALUE {
            Selection::Unset
        } else {
            Selection::Value(value.to_string())
        }
    }

    pub fn control_value(&self) -> &str {
        match self {
            Selection::Unset => UNSET_VALUE,
            Selection::Value(v) => v,
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Selection::Value(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

impl FilterOption {
    fn unset() -> Self {
        Self {
            value: UNSET_VALUE.to_string(),
            label: UNSET_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterDefinition {
    pub control: String,
    pub title: String,
    pub field_name: String,
    pub field: usize,
    pub selection: Selection,
    pub options: Vec<FilterOption>,
}

impl FilterDefinition {
    /// Position of the current selection in the option list.
    pub fn selected_index(&self) -> Option<usize> {
        let value = self.selection.control_value();
        self.options.iter().position(|o| o.value == value)
    }

    fn offers(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }
}

/// Keeps the records whose rendered value matches every active selection.
/// Without an active selection the input set itself is returned.
pub fn apply_filters(
    all: &Arc<Vec<Record>>,
    definitions: &[FilterDefinition],
    renderer: &FieldRenderer,
) -> Result<Arc<Vec<Record>>, HclError> {
    let active: Vec<(usize, &str)> = definitions
        .iter()
        .filter_map(|d| match &d.selection {
            Selection::Value(v) => Some((d.field, v.as_str())),
            Selection::Unset => None,
        })
        .collect();
    if active.is_empty() {
        return Ok(Arc::clone(all));
    }

    let mut filtered = Vec::new();
    'records: for record in all.iter() {
        for &(field, value) in active.iter() {
            if renderer.render_at(field, record.value(field))? != value {
                continue 'records;
            }
        }
        filtered.push(record.clone());
    }
    trace!("{} of {} records pass the filters", filtered.len(), all.len());
    Ok(Arc::new(filtered))
}

/// Unique rendered values of the definition's field, sorted, behind the unset
/// option. Records with an empty raw value are not offered.
pub fn populate_options(
    records: &[Record],
    definition: &FilterDefinition,
    renderer: &FieldRenderer,
) -> Result<Vec<FilterOption>, HclError> {
    let mut values = BTreeSet::new();
    for record in records {
        let raw = record.value(definition.field);
        if raw.is_empty() {
            continue;
        }
        values.insert(renderer.render_at(definition.field, raw)?);
    }
    let mut options = Vec::with_capacity(values.len() + 1);
    options.push(FilterOption::unset());
    options.extend(values.into_iter().map(|v| FilterOption {
        label: if v.is_empty() {
            EMPTY_LABEL.to_string()
        } else {
            v.clone()
        },
        value: v,
    }));
    Ok(options)
}

pub struct FilterEngine {
    renderer: FieldRenderer,
    definitions: Vec<FilterDefinition>,
}

impl FilterEngine {
    pub fn new(
        config: &CatalogConfig,
        renderer: FieldRenderer,
        all: &[Record],
    ) -> Result<Self, HclError> {
        let mut definitions = Vec::with_capacity(config.filters.len());
        for binding in config.filters.iter() {
            let mut definition = FilterDefinition {
                control: binding.control.clone(),
                title: binding.title.clone(),
                field_name: binding.field.clone(),
                field: config.schema.index_of(&binding.field)?,
                selection: Selection::Unset,
                options: Vec::new(),
            };
            definition.options = populate_options(all, &definition, &renderer)?;
            debug!(
                "Filter {} offers {} values",
                definition.control,
                definition.options.len() - 1
            );
            definitions.push(definition);
        }
        Ok(Self {
            renderer,
            definitions,
        })
    }

    pub fn definitions(&self) -> &[FilterDefinition] {
        &self.definitions
    }

    pub fn definition(&self, control: &str) -> Result<&FilterDefinition, HclError> {
        self.definitions
            .iter()
            .find(|d| d.control == control)
            .ok_or_else(|| HclError::UnknownFilter(control.to_string()))
    }

    fn position(&self, control: &str) -> Result<usize, HclError> {
        self.definitions
            .iter()
            .position(|d| d.control == control)
            .ok_or_else(|| HclError::UnknownFilter(control.to_string()))
    }

    pub fn apply(&self, all: &Arc<Vec<Record>>) -> Result<Arc<Vec<Record>>, HclError> {
        apply_filters(all, &self.definitions, &self.renderer)
    }

    /// Changes the selection of `control` and narrows `all` accordingly. Every
    /// other control is repopulated from the narrowed set; `control` keeps its
    /// options and selection. A sibling selection that is no longer offered is
    /// unset and the set narrowed again, so the result always matches the
    /// selections left standing.
    pub fn select(
        &mut self,
        control: &str,
        selection: Selection,
        all: &Arc<Vec<Record>>,
    ) -> Result<Arc<Vec<Record>>, HclError> {
        let changed = self.position(control)?;
        info!("Filter {} set to {}", control, selection.control_value());
        self.definitions[changed].selection = selection;

        loop {
            let filtered = self.apply(all)?;
            let mut reverted = false;
            for idx in 0..self.definitions.len() {
                if idx == changed {
                    continue;
                }
                let options = populate_options(&filtered, &self.definitions[idx], &self.renderer)?;
                let definition = &mut self.definitions[idx];
                definition.options = options;
                if definition.selection.is_set()
                    && !definition.offers(definition.selection.control_value())
                {
                    debug!(
                        "Selection {} of filter {} no longer offered",
                        definition.selection.control_value(),
                        definition.control
                    );
                    definition.selection = Selection::Unset;
                    reverted = true;
                }
            }
            if !reverted {
                return Ok(filtered);
            }
        }
    }

    /// Unsets every control and repopulates all of them from `all`.
    pub fn reset(&mut self, all: &Arc<Vec<Record>>) -> Result<Arc<Vec<Record>>, HclError> {
        for idx in 0..self.definitions.len() {
            let options = populate_options(all, &self.definitions[idx], &self.renderer)?;
            let definition = &mut self.definitions[idx];
            definition.options = options;
            definition.selection = Selection::Unset;
        }
        info!("Filters reset");
        Ok(Arc::clone(all))
    }

    /// Applies name/value pairs as handed in from a query string. A value may be
    /// an offered option or a raw field value rendering to one; anything else is
    /// ignored.
    pub fn apply_initial(
        &mut self,
        pairs: &[(String, String)],
        all: &Arc<Vec<Record>>,
    ) -> Result<Arc<Vec<Record>>, HclError> {
        let mut filtered = self.apply(all)?;
        for (control, value) in pairs {
            let Ok(definition) = self.definition(control) else {
                warn!("Ignoring unknown filter {control}");
                continue;
            };
            let selection = if value == UNSET_VALUE {
                Selection::Unset
            } else if definition.offers(value) {
                Selection::Value(value.clone())
            } else {
                match self.renderer.render(&definition.field_name, value) {
                    Ok(rendered) if definition.offers(&rendered) => Selection::Value(rendered),
                    _ => {
                        warn!("Filter {control} does not offer {value}, ignoring");
                        continue;
                    }
                }
            };
            filtered = self.select(control, selection, all)?;
        }
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RecordStore;
    use crate::store::tests::{device, scenario, store};

    fn engine(store: &RecordStore) -> FilterEngine {
        let config = store.config();
        FilterEngine::new(
            config,
            FieldRenderer::for_filters(&config.schema).unwrap(),
            &store.all_records(),
        )
        .unwrap()
    }

    fn labels(engine: &FilterEngine, control: &str) -> Vec<String> {
        engine
            .definition(control)
            .unwrap()
            .options
            .iter()
            .map(|o| o.label.clone())
            .collect()
    }

    fn bigger_store() -> RecordStore {
        store(vec![
            device("APC", "Back-UPS", "usbhid-ups", "5"),
            device("APC", "Smart-UPS", "apcsmart", "4"),
            device("APC", "AP9630", "snmp-ups", "4"),
            device("Eaton", "5E", "usbhid-ups", "3"),
            device("Eaton", "Network-M2", "snmp-ups", "3"),
            device("Tripp Lite", "OMNI", "tripplite_usb", "2"),
        ])
    }

    #[test]
    fn selection_wire_values() {
        assert_eq!(Selection::from_control("-1"), Selection::Unset);
        assert_eq!(
            Selection::from_control("APC"),
            Selection::Value("APC".to_string())
        );
        assert_eq!(Selection::Unset.control_value(), "-1");
    }

    #[test]
    fn initial_options_are_sorted_and_unique() {
        let store = store(scenario());
        let engine = engine(&store);
        assert_eq!(labels(&engine, "manufacturer"), vec!["---", "APC", "Eaton"]);
        assert_eq!(labels(&engine, "connection"), vec!["---", "Network", "USB"]);
        assert_eq!(labels(&engine, "support-level"), vec!["---", "***", "*****"]);
        assert_eq!(
            labels(&engine, "device-type"),
            vec!["---", "Uninterruptible Power Supply"]
        );
    }

    #[test]
    fn empty_values_are_not_offered() {
        let store = store(vec![
            device("", "A", "usbhid-ups", "0"),
            device("APC", "B", "usbhid-ups", "1"),
        ]);
        let engine = engine(&store);
        assert_eq!(labels(&engine, "manufacturer"), vec!["---", "APC"]);
        assert_eq!(labels(&engine, "support-level"), vec!["---", "(none)", "*"]);
    }

    #[test]
    fn support_level_zero_can_be_selected() {
        let store = store(vec![
            device("APC", "Legacy", "genericups", "0"),
            device("Eaton", "5E", "usbhid-ups", "3"),
        ]);
        let all = store.all_records();
        let mut engine = engine(&store);
        let values: Vec<String> = engine
            .definition("support-level")
            .unwrap()
            .options
            .iter()
            .map(|o| o.value.clone())
            .collect();
        assert_eq!(values, vec!["-1", "", "***"]);

        let filtered = engine
            .apply_initial(&[("support-level".to_string(), "0".to_string())], &all)
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].value(3), "Legacy");
        assert_eq!(
            engine.definition("support-level").unwrap().selection,
            Selection::Value(String::new())
        );
    }

    #[test]
    fn filtering_by_connection_narrows_siblings() {
        let store = store(scenario());
        let mut engine = engine(&store);
        let all = store.all_records();
        let filtered = engine
            .select("connection", Selection::Value("Network".into()), &all)
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].value(0), "Eaton");
        assert_eq!(labels(&engine, "manufacturer"), vec!["---", "Eaton"]);
        // The changed control keeps its options
        assert_eq!(labels(&engine, "connection"), vec!["---", "Network", "USB"]);
        assert_eq!(
            engine.definition("connection").unwrap().selection,
            Selection::Value("Network".into())
        );
    }

    #[test]
    fn filters_compose_and_preserve_order() {
        let store = bigger_store();
        let all = store.all_records();
        let mut engine = engine(&store);
        engine
            .select("manufacturer", Selection::Value("APC".into()), &all)
            .unwrap();
        let filtered = engine
            .select("support-level", Selection::Value("****".into()), &all)
            .unwrap();
        let models: Vec<&str> = filtered.iter().map(|r| r.value(3)).collect();
        // apcsmart sorts before snmp-ups
        assert_eq!(models, vec!["Smart-UPS", "AP9630"]);

        let positions: Vec<usize> = filtered
            .iter()
            .map(|r| all.iter().position(|a| a == r).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn selection_survives_only_while_offered() {
        let store = bigger_store();
        let all = store.all_records();
        let mut engine = engine(&store);
        engine
            .select("manufacturer", Selection::Value("Eaton".into()), &all)
            .unwrap();
        engine
            .select("connection", Selection::Value("USB".into()), &all)
            .unwrap();
        assert!(engine.definition("manufacturer").unwrap().selection.is_set());

        let filtered = engine
            .select("support-level", Selection::Value("**".into()), &all)
            .unwrap();
        assert_eq!(
            engine.definition("manufacturer").unwrap().selection,
            Selection::Unset
        );
        assert_eq!(
            engine.definition("connection").unwrap().selection,
            Selection::Unset
        );
        // Only the standing support level constrains the result
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].value(0), "Tripp Lite");
        assert_eq!(filtered, engine.apply(&all).unwrap());
        assert_eq!(labels(&engine, "manufacturer"), vec!["---", "Tripp Lite"]);
        assert_eq!(labels(&engine, "model"), vec!["---", "OMNI"]);
    }

    #[test]
    fn unmatched_selection_leaves_siblings_empty() {
        let store = bigger_store();
        let all = store.all_records();
        let mut engine = engine(&store);
        let filtered = engine
            .select("support-level", Selection::Value("*".into()), &all)
            .unwrap();
        assert!(filtered.is_empty());
        assert_eq!(labels(&engine, "manufacturer"), vec!["---"]);
        assert_eq!(labels(&engine, "connection"), vec!["---"]);
    }

    #[test]
    fn unset_filters_return_the_input_set() {
        let store = store(scenario());
        let engine = engine(&store);
        let all = store.all_records();
        assert!(Arc::ptr_eq(&engine.apply(&all).unwrap(), &all));
    }

    #[test]
    fn reapplying_is_idempotent() {
        let store = bigger_store();
        let all = store.all_records();
        let mut engine = engine(&store);
        let first = engine
            .select("connection", Selection::Value("Network".into()), &all)
            .unwrap();
        let again = engine.apply(&all).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn reset_restores_everything() {
        let store = bigger_store();
        let all = store.all_records();
        let mut engine = engine(&store);
        let before: Vec<Vec<String>> = engine
            .definitions()
            .iter()
            .map(|d| d.options.iter().map(|o| o.value.clone()).collect())
            .collect();
        engine
            .select("connection", Selection::Value("Network".into()), &all)
            .unwrap();
        let reset = engine.reset(&all).unwrap();
        assert!(Arc::ptr_eq(&reset, &all));
        let after: Vec<Vec<String>> = engine
            .definitions()
            .iter()
            .map(|d| d.options.iter().map(|o| o.value.clone()).collect())
            .collect();
        assert_eq!(before, after);
        assert!(engine.definitions().iter().all(|d| !d.selection.is_set()));
    }

    #[test]
    fn initial_pairs_accept_raw_and_rendered_values() {
        let store = bigger_store();
        let all = store.all_records();
        let mut engine = engine(&store);
        let pairs = vec![
            ("support-level".to_string(), "3".to_string()),
            ("connection".to_string(), "Network".to_string()),
            ("colour".to_string(), "red".to_string()),
            ("manufacturer".to_string(), "Nobody".to_string()),
        ];
        let filtered = engine.apply_initial(&pairs, &all).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].value(3), "Network-M2");
        assert_eq!(
            engine.definition("support-level").unwrap().selection,
            Selection::Value("***".into())
        );
    }

    #[test]
    fn unknown_control_is_an_error() {
        let store = store(scenario());
        let mut engine = engine(&store);
        let res = engine.select("vendor", Selection::Unset, &store.all_records());
        assert!(matches!(res, Err(HclError::UnknownFilter(_))));
    }
}
