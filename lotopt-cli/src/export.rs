use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use lotopt_core::report::AnalysisReport;
use lotopt_core::{Combination, StatsTable};
use lotopt_db::models::join_numbers;

pub const STATS_FILE: &str = "number_stats.csv";
pub const RESULTS_FILE: &str = "generated_sets.csv";
pub const REPORT_FILE: &str = "analysis_report.json";

fn prepare(dir: &Path, name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("Cannot create directory {:?}", dir))?;
    Ok(dir.join(name))
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| format!("{:.3}", v)).unwrap_or_default()
}

/// One record per pool number.
pub fn write_number_stats(dir: &Path, stats: &StatsTable) -> Result<PathBuf> {
    let path = prepare(dir, STATS_FILE)?;
    let mut wtr = csv::Writer::from_path(&path).with_context(|| format!("Cannot write {:?}", path))?;

    wtr.write_record([
        "number",
        "frequency",
        "last_seen_gap",
        "average_gap",
        "gap_variety",
        "historical_gaps",
        "is_overdue",
        "is_cold",
        "is_prime",
    ])?;
    for stat in stats.iter() {
        wtr.write_record([
            stat.number.to_string(),
            stat.frequency.to_string(),
            stat.last_seen_gap.to_string(),
            optional(stat.average_gap),
            stat.gap_variety.to_string(),
            stat.historical_gaps
                .iter()
                .map(|g| g.to_string())
                .collect::<Vec<_>>()
                .join("-"),
            stat.is_overdue.to_string(),
            stat.is_cold.to_string(),
            stat.is_prime.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(path)
}

/// One row per combination, members as comma-separated integers.
pub fn write_generated_sets(dir: &Path, combinations: &[&Combination]) -> Result<PathBuf> {
    let path = prepare(dir, RESULTS_FILE)?;
    let mut out = String::new();
    for combo in combinations {
        out.push_str(&join_numbers(combo.numbers(), ','));
        out.push('\n');
    }
    std::fs::write(&path, out).with_context(|| format!("Cannot write {:?}", path))?;
    Ok(path)
}

pub fn write_report(dir: &Path, report: &AnalysisReport) -> Result<PathBuf> {
    let path = prepare(dir, REPORT_FILE)?;
    let file = File::create(&path).with_context(|| format!("Cannot write {:?}", path))?;
    serde_json::to_writer_pretty(file, report).context("Cannot serialize report")?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotopt_core::config::{Config, GenerationConfig};
    use lotopt_core::report::build_report;
    use lotopt_core::analyze;
    use lotopt_db::models::Draw;

    fn history() -> Vec<Draw> {
        vec![
            Draw::new(1, "2024-01-03", vec![1, 2, 3, 4, 5, 6]),
            Draw::new(2, "2024-01-02", vec![1, 7, 8, 9, 10, 11]),
            Draw::new(3, "2024-01-01", vec![1, 12, 13, 14, 15, 16]),
        ]
    }

    #[test]
    fn test_number_stats_one_record_per_number() {
        let dir = tempfile::tempdir().unwrap();
        let config = GenerationConfig {
            number_pool: 20,
            ..GenerationConfig::default()
        };
        let stats = analyze(&history(), &config);
        let path = write_number_stats(&dir.path().join("stats"), &stats).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 20);
        assert_eq!(&records[0][0], "1");
        assert_eq!(&records[0][1], "3");
        assert_eq!(&records[0][3], "1.000");
        assert_eq!(&records[0][5], "1-1");
        assert_eq!(&records[19][3], "");
    }

    #[test]
    fn test_generated_sets_format() {
        let dir = tempfile::tempdir().unwrap();
        let config = GenerationConfig {
            number_pool: 49,
            ..GenerationConfig::default()
        };
        let a = Combination::new(vec![40, 3, 17, 22, 9, 31], &config).unwrap();
        let b = Combination::new(vec![1, 2, 3, 4, 5, 6], &config).unwrap();
        let path = write_generated_sets(dir.path(), &[&a, &b]).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content, "3,9,17,22,31,40\n1,2,3,4,5,6\n");
    }

    #[test]
    fn test_report_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.generation.number_pool = 20;
        let stats = analyze(&history(), &config.generation);
        let report = build_report(&history(), &stats, &config);
        let path = write_report(dir.path(), &report).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["draws_analyzed"], 3);
        assert_eq!(value["frequency"]["top"][0]["number"], 1);
    }
}
