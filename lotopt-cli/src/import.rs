use anyhow::{Context, Result};
use chrono::NaiveDate;
use lotopt_db::rusqlite::Connection;
use std::path::Path;

use lotopt_core::config::{DataConfig, GenerationConfig};
use lotopt_db::db::insert_draw;
use lotopt_db::models::{parse_numbers, validate_draw, Draw};

/// Converts a date in the configured input format to ISO `YYYY-MM-DD`.
pub fn parse_date(raw: &str, format: &str) -> Result<String> {
    let date = NaiveDate::parse_from_str(raw.trim(), format)
        .with_context(|| format!("Invalid date '{}' (expected {})", raw.trim(), format))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

fn field(record: &csv::StringRecord, idx: usize) -> Result<&str> {
    record
        .get(idx)
        .map(str::trim)
        .with_context(|| format!("Missing field at index {}", idx))
}

fn parse_record(
    record: &csv::StringRecord,
    data: &DataConfig,
    generation: &GenerationConfig,
) -> Result<Draw> {
    let date = parse_date(field(record, 0)?, &data.date_format)?;
    let numbers = parse_numbers(field(record, 1)?, data.number_separator)?;
    validate_draw(&numbers, generation.number_pool, generation.numbers_to_draw)
        .with_context(|| format!("Invalid draw on {}", date))?;

    Ok(Draw::new(0, date, numbers))
}

fn reader(path: &Path, data: &DataConfig) -> Result<csv::Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
        .has_headers(data.has_header)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Cannot open {:?}", path))
}

#[derive(Debug, Default)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn import_csv(
    conn: &Connection,
    path: &Path,
    data: &DataConfig,
    generation: &GenerationConfig,
) -> Result<ImportResult> {
    let mut reader = reader(path, data)?;

    let tx = conn
        .unchecked_transaction()
        .context("Cannot start transaction")?;

    let mut result = ImportResult::default();

    for record_result in reader.records() {
        result.total_records += 1;
        let line = result.total_records;
        match record_result {
            Ok(record) => match parse_record(&record, data, generation) {
                Ok(draw) => match insert_draw(&tx, &draw) {
                    Ok(true) => result.inserted += 1,
                    Ok(false) => result.skipped += 1,
                    Err(e) => {
                        log::error!("Insert failed for record {}: {:#}", line, e);
                        result.errors += 1;
                    }
                },
                Err(e) => {
                    log::warn!("Skipping record {}: {:#}", line, e);
                    result.errors += 1;
                }
            },
            Err(e) => {
                log::warn!("Cannot read record {}: {}", line, e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Commit failed")?;
    log::info!(
        "Imported {:?}: {} inserted, {} duplicates, {} errors",
        path,
        result.inserted,
        result.skipped,
        result.errors
    );
    Ok(result)
}

/// First record of the latest-draw file, or `None` when the file does not exist.
pub fn read_latest(
    path: &Path,
    data: &DataConfig,
    generation: &GenerationConfig,
) -> Result<Option<Draw>> {
    if !path.exists() {
        return Ok(None);
    }
    let mut reader = reader(path, data)?;
    match reader.records().next() {
        Some(record) => {
            let record = record.with_context(|| format!("Cannot read {:?}", path))?;
            Ok(Some(parse_record(&record, data, generation)?))
        }
        None => Ok(None),
    }
}
