//! Static layout of the device catalog.
//!
//! A [`CatalogConfig`] is built once at startup and shared (behind an `Arc`) by the
//! store, the table builder and the filter engine. Nothing in it changes afterwards.

use crate::domain::HclError;

pub const MANUFACTURER: &str = "manufacturer";
pub const DEVICE_TYPE: &str = "device-type";
pub const SUPPORT_LEVEL: &str = "support-level";
pub const MODEL: &str = "model";
pub const COMMENT: &str = "comment";
pub const DRIVER: &str = "driver";

/// Ordered field names of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    names: Vec<String>,
}

impl FieldSchema {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Result<usize, HclError> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| HclError::UnknownField(name.to_string()))
    }
}

/// One table column, made of one or more fields joined by a line break.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnGroup {
    pub name: String,
    pub title: String,
    pub fields: Vec<String>,
    pub hidden: bool,
}

impl ColumnGroup {
    pub fn new(name: &str, title: &str, fields: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            hidden: false,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}

/// Binding between a filter control (by id) and the field it narrows.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterBinding {
    pub control: String,
    pub title: String,
    pub field: String,
}

impl FilterBinding {
    pub fn new(control: &str, title: &str, field: &str) -> Self {
        Self {
            control: control.to_string(),
            title: title.to_string(),
            field: field.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub schema: FieldSchema,
    pub columns: Vec<ColumnGroup>,
    pub filters: Vec<FilterBinding>,
    /// Primary and secondary sort keys.
    pub sort_keys: (String, String),
    /// Field whose changes flip the even/odd band.
    pub band_field: String,
    /// Field that selects the palette class of the unmerged column.
    pub style_field: String,
    /// Column groups containing this field never merge across rows.
    pub unmerged_field: String,
}

impl CatalogConfig {
    /// Layout of the NUT hardware compatibility list.
    pub fn nut() -> Self {
        Self {
            schema: FieldSchema::new([
                MANUFACTURER,
                DEVICE_TYPE,
                SUPPORT_LEVEL,
                MODEL,
                COMMENT,
                DRIVER,
            ]),
            columns: vec![
                ColumnGroup::new(MANUFACTURER, "Manufacturer", &[MANUFACTURER]),
                ColumnGroup::new(MODEL, "Model", &[MODEL, COMMENT]),
                ColumnGroup::new(DRIVER, "Driver", &[DRIVER]),
                ColumnGroup::new(SUPPORT_LEVEL, "Support Level", &[SUPPORT_LEVEL]).hidden(),
            ],
            filters: vec![
                FilterBinding::new(SUPPORT_LEVEL, "Support level", SUPPORT_LEVEL),
                FilterBinding::new(DEVICE_TYPE, "Device type", DEVICE_TYPE),
                FilterBinding::new(MANUFACTURER, "Manufacturer", MANUFACTURER),
                FilterBinding::new(MODEL, "Model", MODEL),
                FilterBinding::new("connection", "Connection", DRIVER),
            ],
            sort_keys: (MANUFACTURER.to_string(), DRIVER.to_string()),
            band_field: MANUFACTURER.to_string(),
            style_field: SUPPORT_LEVEL.to_string(),
            unmerged_field: DRIVER.to_string(),
        }
    }

    /// Checks that every field the layout refers to exists in the schema.
    pub fn validate(&self) -> Result<(), HclError> {
        let referenced = self
            .columns
            .iter()
            .flat_map(|c| c.fields.iter())
            .chain(self.filters.iter().map(|f| &f.field))
            .chain([
                &self.sort_keys.0,
                &self.sort_keys.1,
                &self.band_field,
                &self.style_field,
                &self.unmerged_field,
            ]);
        for name in referenced {
            self.schema.index_of(name)?;
        }
        Ok(())
    }
}
