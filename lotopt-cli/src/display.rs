use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::import::ImportResult;
use lotopt_core::backtest::{BacktestResult, Heat, LatestDrawCheck};
use lotopt_core::report::{AnalysisReport, Section};
use lotopt_core::validator::ValidationResult;
use lotopt_core::{GenerationReport, RequestOutcome, StatsTable};
use lotopt_db::models::Draw;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn format_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

fn format_list(numbers: &[u8]) -> String {
    if numbers.is_empty() {
        return "—".to_string();
    }
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("No draws to display.");
        return;
    }

    let mut table = new_table(vec!["#", "Date", "Numbers"]);
    for draw in draws {
        table.add_row(vec![
            draw.index.to_string(),
            draw.date.clone(),
            format_numbers(&draw.numbers),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import finished:");
    println!("  Records read       : {}", result.total_records);
    println!("  Inserted           : {}", result.inserted);
    println!("  Duplicates skipped : {}", result.skipped);
    if result.errors > 0 {
        println!("  Errors             : {}", result.errors);
    }
}

pub fn display_stats(stats: &StatsTable) {
    println!("\n📊 Number statistics over {} draws\n", stats.draws_analyzed());
    if stats.is_degenerate() {
        println!("Empty history: every number is maximally overdue.\n");
    }

    let mut table = new_table(vec!["Number", "Frequency", "Gap", "Avg gap", "Variety", "Status"]);
    for stat in stats.iter() {
        let (status, color) = if stat.is_cold {
            ("cold", Color::Blue)
        } else if stat.is_overdue {
            ("overdue", Color::Yellow)
        } else {
            ("", Color::White)
        };
        table.add_row(vec![
            Cell::new(format!("{:2}", stat.number)),
            Cell::new(stat.frequency),
            Cell::new(stat.last_seen_gap),
            Cell::new(
                stat.average_gap
                    .map(|g| format!("{:.1}", g))
                    .unwrap_or_else(|| "—".to_string()),
            ),
            Cell::new(stat.gap_variety),
            Cell::new(status).fg(color),
        ]);
    }
    println!("{table}");
}

pub fn display_report(report: &AnalysisReport, sections: &[Section]) {
    println!("\n🔎 Analysis of the last {} draws", report.draws_analyzed);

    for section in sections {
        println!("\n── {} ──", section);
        match section {
            Section::Frequency => {
                let mut table = new_table(vec!["Number", "Count"]);
                for nc in &report.frequency.top {
                    table.add_row(vec![nc.number.to_string(), nc.count.to_string()]);
                }
                println!("{table}");
            }
            Section::Temperature => {
                println!("  hot : {}", format_list(&report.temperature.hot));
                println!("  warm: {}", format_list(&report.temperature.warm));
                println!("  cold: {}", format_list(&report.temperature.cold));
            }
            Section::OddEven => print_distribution("Odd members", &report.odd_even),
            Section::Sums => match &report.sums {
                Some(s) => println!("  min {}  max {}  mean {:.1}", s.min, s.max, s.mean),
                None => println!("  no draws"),
            },
            Section::HighLow => print_distribution("Low members", &report.high_low),
            Section::Primes => print_distribution("Prime members", &report.primes),
            Section::Gaps => {
                let mut table = new_table(vec!["Gap", "Occurrences"]);
                for (gap, count) in &report.gaps.common_gaps {
                    table.add_row(vec![gap.to_string(), count.to_string()]);
                }
                println!("{table}");
                println!("  wide-gap numbers: {}", format_list(&report.gaps.wide_gap_numbers));
                let overdue: Vec<u8> = report.overdue.iter().map(|o| o.number).collect();
                println!("  overdue numbers : {}", format_list(&overdue));
            }
            Section::Combinations => {
                for (size, combos) in &report.combinations {
                    let mut table = new_table(vec!["Numbers", "Count"]);
                    for combo in combos.iter().take(20) {
                        table.add_row(vec![format_numbers(&combo.numbers), combo.count.to_string()]);
                    }
                    println!("  size {} ({} recurring)", size, combos.len());
                    println!("{table}");
                }
            }
        }
    }
}

fn print_distribution(label: &str, dist: &std::collections::BTreeMap<usize, u32>) {
    let mut table = new_table(vec![label, "Draws"]);
    for (k, v) in dist {
        table.add_row(vec![k.to_string(), v.to_string()]);
    }
    println!("{table}");
}

pub fn display_generation(report: &GenerationReport) {
    println!("\n🎲 Generated combinations (seed {})\n", report.base_seed);

    let mut table = new_table(vec!["#", "Numbers", "Strategy", "Attempts"]);
    for (i, outcome) in report.outcomes.iter().enumerate() {
        match outcome {
            RequestOutcome::Accepted {
                combination,
                strategy,
                attempts,
            } => {
                table.add_row(vec![
                    Cell::new(i + 1),
                    Cell::new(format_numbers(combination.numbers())),
                    Cell::new(strategy),
                    Cell::new(attempts),
                ]);
            }
            RequestOutcome::Exhausted {
                strategy,
                attempts,
                last_failure,
            } => {
                let reason = last_failure
                    .as_ref()
                    .map(|r| r.failure_reasons().join("; "))
                    .unwrap_or_else(|| "no attempts".to_string());
                table.add_row(vec![
                    Cell::new(i + 1),
                    Cell::new(format!("exhausted: {}", reason)).fg(Color::Red),
                    Cell::new(strategy),
                    Cell::new(attempts),
                ]);
            }
        }
    }
    println!("{table}");
}

pub fn display_validation(result: &ValidationResult) {
    let verdict = if result.is_valid() { "VALID" } else { "INVALID" };
    println!("\n{} → {}\n", result.combination, verdict);

    let mut table = new_table(vec!["Rule", "Result", "Detail"]);
    for outcome in &result.outcomes {
        let (label, color) = if outcome.passed {
            ("pass", Color::Green)
        } else {
            ("fail", Color::Red)
        };
        table.add_row(vec![
            Cell::new(outcome.rule),
            Cell::new(label).fg(color),
            Cell::new(&outcome.detail),
        ]);
    }
    println!("{table}");
}

pub fn display_backtest(results: &[BacktestResult], alert_threshold: usize) {
    println!("\n📈 Backtest (alert at {}+ matches)\n", alert_threshold);
    if results.is_empty() {
        println!("No combinations to test.");
        return;
    }

    let width = results
        .iter()
        .map(|r| r.match_distribution.len())
        .max()
        .unwrap_or(0);
    let mut header: Vec<String> = vec!["Numbers".to_string()];
    header.extend((0..width).map(|m| format!("{}", m)));
    header.push("Success".to_string());

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    for r in results {
        let mut row: Vec<String> = vec![format_numbers(r.combination.numbers())];
        row.extend((0..width).map(|m| r.match_distribution.get(m).copied().unwrap_or(0).to_string()));
        row.push(format!("{:.2}%", r.success_rate * 100.0));
        table.add_row(row);
    }
    println!("{table}");
}

pub fn display_latest(date: &str, check: &LatestDrawCheck) {
    println!("\n🆕 Latest draw {}: {}\n", date, format_numbers(&check.numbers));

    let mut table = new_table(vec!["Number", "Status", "Frequency"]);
    for member in &check.members {
        let color = match member.heat {
            Heat::Hot => Color::Red,
            Heat::Cold => Color::Blue,
            Heat::Neutral => Color::White,
        };
        table.add_row(vec![
            Cell::new(member.number),
            Cell::new(member.heat).fg(color),
            Cell::new(member.frequency),
        ]);
    }
    println!("{table}");
    println!(
        "hot {} / cold {} / neutral {}",
        check.count(Heat::Hot),
        check.count(Heat::Cold),
        check.count(Heat::Neutral)
    );
}
