//! Persistence of the historical tables. The run reads them once from the
//! consolidated directory and writes them back in full to the output
//! directory. CSV exports carry the canonical column names in order.

use crate::error::Result;
use crate::schema::{CanonicalSaleRecord, Client, ClientPeriodSummary, HistoricalTables, RunConfig};
use crate::table::RawTable;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

pub fn load_tables(config: &RunConfig) -> Result<HistoricalTables> {
    let summary_path = config.summary_path();
    let detail_path = config.detail_path();

    info!("Loading summary table from {}", summary_path.display());
    let summaries: Vec<ClientPeriodSummary> = read_json(&summary_path)?;

    info!("Loading detail table from {}", detail_path.display());
    let records: Vec<CanonicalSaleRecord> = read_json(&detail_path)?;

    debug!(
        "Loaded {} summary rows and {} detail rows",
        summaries.len(),
        records.len()
    );
    Ok(HistoricalTables::new(summaries, records))
}

/// Writes both tables to the output directory and returns the two paths.
pub fn save_tables(config: &RunConfig, tables: &HistoricalTables) -> Result<(PathBuf, PathBuf)> {
    let summary_path = config.output_path(&config.summary_file);
    let detail_path = config.output_path(&config.detail_file);

    write_json(&summary_path, &tables.summaries)?;
    write_json(&detail_path, &tables.records)?;

    info!(
        "Saved {} summary rows to {} and {} detail rows to {}",
        tables.summaries.len(),
        summary_path.display(),
        tables.records.len(),
        detail_path.display()
    );
    Ok((summary_path, detail_path))
}

/// Reads a raw client table serialized as JSON, matching the reader
/// signature of [`crate::run::ConsolidationRun::run_from_disk`].
pub fn read_raw_table_json(path: &Path, _client: Client) -> Result<RawTable> {
    read_json(path)
}

pub fn export_summaries_csv<W: std::io::Write>(writer: W, rows: &[ClientPeriodSummary]) -> Result<()> {
    write_csv(writer, rows)
}

pub fn export_records_csv<W: std::io::Write>(writer: W, rows: &[CanonicalSaleRecord]) -> Result<()> {
    write_csv(writer, rows)
}

fn write_csv<W: std::io::Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::{MonthCode, Period};

    #[test]
    fn test_csv_headers_follow_contract() {
        let rows = vec![ClientPeriodSummary::new(
            Client::Makro,
            Period::new(MonthCode::Jul, 2025),
            101,
        )];
        let mut buffer = Vec::new();
        export_summaries_csv(&mut buffer, &rows).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Mes,año,cliente,Unidades,NumMes"));
        assert_eq!(lines.next(), Some("JUL,2025,MAKRO SUPERMAYORISTA SAS,101,7"));
    }

    #[test]
    fn test_detail_csv_header() {
        let record = CanonicalSaleRecord {
            product_id: "7701".to_string(),
            client: "FARMATODO COLOMBIA SA".to_string(),
            month: "JUL".to_string(),
            year: 2025,
            store: "FARMATODO ANDINO".to_string(),
            city: "BOGOTA".to_string(),
            description: "NAT CREMA".to_string(),
            units: 7,
            month_number: 7,
        };
        let mut buffer = Vec::new();
        export_records_csv(&mut buffer, &[record]).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text.lines().next(),
            Some("EAN,cliente,Mes,año,Tienda,Ciudad,Descripcion,Unidades,NumMes")
        );
    }
}
