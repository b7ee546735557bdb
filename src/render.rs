use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::catalog::{DEVICE_TYPE, DRIVER, FieldSchema, SUPPORT_LEVEL};
use crate::domain::HclError;

/// Style class per support level, indexed by the level itself.
pub const SUPPORT_LEVEL_CLASSES: [&str; 6] = ["", "red", "orange", "yellow", "blue", "green"];

pub const CONNECTION_USB: &str = "USB";
pub const CONNECTION_NETWORK: &str = "Network";
pub const CONNECTION_SERIAL: &str = "Serial";

static USB_DRIVERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("bcmxcp_usb|blazer_usb|richcomm_usb|tripplite_usb|usbhid-ups")
        .expect("usb driver pattern")
});
static NETWORK_DRIVERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("snmp-ups|netxml-ups").expect("network driver pattern"));

pub type RenderFn = fn(&str) -> Result<String, HclError>;

pub fn support_level(raw: &str) -> Result<usize, HclError> {
    let level: usize = raw
        .trim()
        .parse()
        .map_err(|_| HclError::schema(SUPPORT_LEVEL, raw, "not an integer"))?;
    if level >= SUPPORT_LEVEL_CLASSES.len() {
        return Err(HclError::schema(
            SUPPORT_LEVEL,
            raw,
            format!("expected 0..{}", SUPPORT_LEVEL_CLASSES.len()),
        ));
    }
    Ok(level)
}

pub fn support_class(raw: &str) -> Result<&'static str, HclError> {
    Ok(SUPPORT_LEVEL_CLASSES[support_level(raw)?])
}

pub fn render_stars(raw: &str) -> Result<String, HclError> {
    Ok("*".repeat(support_level(raw)?))
}

pub fn connection_type(driver: &str) -> &'static str {
    if USB_DRIVERS.is_match(driver) {
        CONNECTION_USB
    } else if NETWORK_DRIVERS.is_match(driver) {
        CONNECTION_NETWORK
    } else {
        CONNECTION_SERIAL
    }
}

pub fn render_connection(raw: &str) -> Result<String, HclError> {
    Ok(connection_type(raw).to_string())
}

pub fn render_device_type(raw: &str) -> Result<String, HclError> {
    let name = match raw {
        "pdu" => "Power Distribution Unit",
        "ups" => "Uninterruptible Power Supply",
        "scd" => "Solar Controller Device",
        _ => return Err(HclError::schema(DEVICE_TYPE, raw, "unknown device type")),
    };
    Ok(name.to_string())
}

/// Maps raw field values to what the user sees. Fields without a registered
/// function render unchanged.
#[derive(Debug, Clone)]
pub struct FieldRenderer {
    schema: FieldSchema,
    renderers: Vec<Option<RenderFn>>,
}

impl FieldRenderer {
    pub fn new(schema: &FieldSchema, table: HashMap<String, RenderFn>) -> Result<Self, HclError> {
        let mut renderers = vec![None; schema.len()];
        for (field, f) in table {
            renderers[schema.index_of(&field)?] = Some(f);
        }
        Ok(Self {
            schema: schema.clone(),
            renderers,
        })
    }

    /// Renderers used to compare and offer filter values.
    pub fn for_filters(schema: &FieldSchema) -> Result<Self, HclError> {
        let table: HashMap<String, RenderFn> = HashMap::from([
            (SUPPORT_LEVEL.to_string(), render_stars as RenderFn),
            (DRIVER.to_string(), render_connection as RenderFn),
            (DEVICE_TYPE.to_string(), render_device_type as RenderFn),
        ]);
        Self::new(schema, table)
    }

    /// Renderers used for table cells; the driver name stays verbatim there.
    pub fn for_table(schema: &FieldSchema) -> Result<Self, HclError> {
        let table: HashMap<String, RenderFn> = HashMap::from([
            (SUPPORT_LEVEL.to_string(), render_stars as RenderFn),
            (DEVICE_TYPE.to_string(), render_device_type as RenderFn),
        ]);
        Self::new(schema, table)
    }

    pub fn render(&self, field: &str, raw: &str) -> Result<String, HclError> {
        self.render_at(self.schema.index_of(field)?, raw)
    }

    pub fn render_at(&self, idx: usize, raw: &str) -> Result<String, HclError> {
        match self.renderers[idx] {
            Some(f) => f(raw),
            None => Ok(raw.to_string()),
        }
    }
}
