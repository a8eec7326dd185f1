//! Dataset CSV persistence: `file_name,page_number,text,ocr_used,label`.

use std::io;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::models::record::{Dataset, ExtractionMethod, PageRecord};

#[derive(Debug, Serialize, Deserialize)]
struct DatasetRow {
    file_name: String,
    page_number: u32,
    #[serde(default)]
    text: String,
    #[serde(deserialize_with = "deserialize_flag")]
    ocr_used: bool,
    #[serde(default)]
    label: Option<String>,
}

impl From<&PageRecord> for DatasetRow {
    fn from(record: &PageRecord) -> Self {
        Self {
            file_name: record.document_name.clone(),
            page_number: record.page_index,
            text: record.text.clone(),
            ocr_used: record.extraction_method.is_ocr(),
            label: record.label.clone(),
        }
    }
}

impl From<DatasetRow> for PageRecord {
    fn from(row: DatasetRow) -> Self {
        Self {
            document_name: row.file_name,
            page_index: row.page_number,
            text: row.text,
            extraction_method: if row.ocr_used {
                ExtractionMethod::Ocr
            } else {
                ExtractionMethod::Direct
            },
            label: row.label.filter(|l| !l.is_empty()),
        }
    }
}

// Accepts `true`/`false` as well as the `True`/`False`/`1`/`0` spellings of other tools.
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "invalid ocr_used value: {}",
            other
        ))),
    }
}

/// Write every record, usable or not, as CSV.
pub fn write_records<W: io::Write>(writer: W, records: &[PageRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(DatasetRow::from(record))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write records to a CSV file.
pub fn save_records(path: &Path, records: &[PageRecord]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_records(file, records)?;
    info!("Saved {} page records to {}", records.len(), path.display());
    Ok(())
}

/// Read every record from CSV.
pub fn read_records<R: io::Read>(reader: R) -> Result<Vec<PageRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for row in rdr.deserialize::<DatasetRow>() {
        records.push(PageRecord::from(row?));
    }
    Ok(records)
}

/// Read a dataset from CSV, dropping rows with empty text or label.
///
/// Returns the dataset and the number of dropped rows.
pub fn read_dataset<R: io::Read>(reader: R) -> Result<(Dataset, usize)> {
    let records = read_records(reader)?;
    let total = records.len();
    let (dataset, dropped) = Dataset::from_records(records);
    if dropped > 0 {
        warn!("Dropped {} of {} dataset rows with empty text or label", dropped, total);
    }
    Ok((dataset, dropped))
}

/// Load a dataset CSV file.
pub fn load_dataset(path: &Path) -> Result<(Dataset, usize)> {
    let file = std::fs::File::open(path)?;
    read_dataset(file)
}
