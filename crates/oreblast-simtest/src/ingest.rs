//! CSV ingestion for sample tables.
//!
//! Produces the `{data, errors}` shape the engine expects from its upstream
//! collaborator: `data[0]` is the header and every cell is trimmed. Records
//! the CSV reader cannot decode are reported in `errors` and left out.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use oreblast_logic::grid::REQUIRED_COLUMNS;

#[derive(Debug, Default)]
pub struct IngestedCsv {
    pub data: Vec<Vec<String>>,
    pub errors: Vec<String>,
}

pub fn read_csv_path(path: &Path) -> Result<IngestedCsv> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening sample file {}", path.display()))?;
    Ok(read_csv(file))
}

pub fn read_csv<R: Read>(reader: R) -> IngestedCsv {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut out = IngestedCsv::default();
    for (i, record) in rdr.records().enumerate() {
        match record {
            Ok(rec) => {
                if rec.iter().all(|f| f.is_empty()) {
                    continue;
                }
                out.data.push(rec.iter().map(|f| f.to_string()).collect());
            }
            Err(e) => out.errors.push(format!("line {}: {}", i + 1, e)),
        }
    }
    out
}

/// Required columns missing from the header, in canonical order.
pub fn missing_columns(header: &[String]) -> Vec<&'static str> {
    REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|required| !header.iter().any(|h| h.trim().eq_ignore_ascii_case(required)))
        .collect()
}

/// Header validation the engine assumes has already happened.
pub fn validate_headers(ingested: &IngestedCsv) -> Result<()> {
    let Some(header) = ingested.data.first() else {
        anyhow::bail!("sample file is empty");
    };
    let missing = missing_columns(header);
    anyhow::ensure!(
        missing.is_empty(),
        "sample file is missing required columns: {}",
        missing.join(", ")
    );
    anyhow::ensure!(
        ingested.data.len() > 1,
        "sample file has a header but no data rows"
    );
    Ok(())
}
