//! Reads the NUT `driver.list`: tab separated, double quoted, `#` comments.

use polars::prelude::*;
use rayon::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::catalog::FieldSchema;
use crate::domain::HclError;
use crate::store::Record;

fn check_file(path: &Path) -> Result<(), HclError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => HclError::FileNotFound,
        ErrorKind::PermissionDenied => HclError::PermissionDenied,
        _ => HclError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(HclError::LoadingFailed("Not a file!".into()));
    }
    Ok(())
}

fn scan_device_list(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(false)
        .with_separator(b'\t')
        .with_quote_char(Some(b'"'))
        .with_comment_prefix(Some("#".into()))
        .with_infer_schema_length(Some(0))
        .with_missing_is_null(false)
        .with_truncate_ragged_lines(true)
        .finish()
}

/// Column values as strings; `None` marks a field the line did not have.
fn load_column(df: &DataFrame, col_name: &str) -> Result<Vec<Option<String>>, PolarsError> {
    let col = df.column(col_name)?.cast(&DataType::String)?;
    let series = col.str()?;
    Ok(series
        .into_iter()
        .map(|value| value.map(|s| s.trim_end().to_string()))
        .collect())
}

#[instrument(skip(schema))]
pub fn load_device_list(path: &PathBuf, schema: &FieldSchema) -> Result<Vec<Record>, HclError> {
    check_file(path)?;
    let start_time = Instant::now();

    let df = scan_device_list(path)?.collect()?;
    if df.width() < schema.len() {
        return Err(HclError::LoadingFailed(format!(
            "expected {} fields per device, found {}",
            schema.len(),
            df.width()
        )));
    }

    // Columns are converted in parallel, one per thread
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .take(schema.len())
        .map(|n| n.to_string())
        .collect();
    let columns = names
        .par_iter()
        .map(|name| load_column(&df, name))
        .collect::<Result<Vec<_>, PolarsError>>()?;

    let mut records = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let mut values = Vec::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            match &column[row] {
                Some(v) => values.push(v.clone()),
                None => {
                    return Err(HclError::schema(
                        &schema.names()[idx],
                        "",
                        format!("device {} is missing this field", row + 1),
                    ));
                }
            }
        }
        records.push(Record::new(values));
    }

    info!(
        "Loading {} devices took {}ms ...",
        records.len(),
        start_time.elapsed().as_millis()
    );
    debug!("Columns: {:?}", names);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogConfig;

    const FIXTURE: &str = "tests/fixtures/driver.list";

    #[test]
    fn loads_fixture() {
        let schema = CatalogConfig::nut().schema;
        let records = load_device_list(&PathBuf::from(FIXTURE), &schema).unwrap();
        assert_eq!(records.len(), 10);
        assert_eq!(
            records[0].values(),
            &["American Power Conversion", "ups", "4", "Back-UPS Pro USB", "", "usbhid-ups"]
        );
        assert!(records.iter().all(|r| r.len() == schema.len()));
        assert_eq!(records[9].value(1), "pdu");
    }

    #[test]
    fn missing_file_is_reported() {
        let schema = CatalogConfig::nut().schema;
        let res = load_device_list(&PathBuf::from("tests/fixtures/nope.list"), &schema);
        assert!(matches!(res, Err(HclError::FileNotFound)));
    }

    #[test]
    fn directories_are_rejected() {
        let schema = CatalogConfig::nut().schema;
        let res = load_device_list(&PathBuf::from("tests/fixtures"), &schema);
        assert!(matches!(res, Err(HclError::LoadingFailed(_))));
    }
}
