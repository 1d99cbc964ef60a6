mod display;
mod export;
mod import;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use lotopt_core::backtest::{backtest, check_latest};
use lotopt_core::config::Config;
use lotopt_core::report::{build_report, Section};
use lotopt_core::{analyze, generate, Combination, GenerationRequest, Strategy, Validator};
use lotopt_db::db::{count_draws, db_path, fetch_history, fetch_last_draws, migrate, open_db};
use lotopt_db::models::Draw;
use lotopt_db::rusqlite::Connection;

use crate::display::{
    display_backtest, display_draws, display_generation, display_import_summary, display_latest,
    display_report, display_stats, display_validation,
};

#[derive(Parser)]
#[command(name = "lotopt", about = "Lottery history analysis and constrained combination generator")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default configuration file and create the data directories
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Import draws from a CSV file
    Import {
        /// CSV file (defaults to data.historical_path)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Print the database location
    DbPath,

    /// List the latest draws
    List {
        /// Number of draws to show
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Per-number statistics and the history report
    Analyze {
        /// Restrict the report to the most recent draws
        #[arg(short, long)]
        test_draws: Option<usize>,

        /// Show every section regardless of the display settings
        #[arg(long)]
        show_all: bool,

        /// Hide a report section
        #[arg(long, value_enum)]
        hide: Vec<Section>,

        /// Write the stats CSV and the JSON report
        #[arg(long)]
        save: bool,
    },

    /// Generate combinations satisfying the configured rules
    Generate {
        /// Number of combinations
        #[arg(short = 'n', long)]
        sets: Option<usize>,

        #[arg(short, long, value_enum)]
        strategy: Option<Strategy>,

        /// Attempts per combination before giving up
        #[arg(short, long)]
        retry_budget: Option<u32>,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Write accepted combinations to the results file
        #[arg(long)]
        save: bool,
    },

    /// Check one combination against every rule
    Check {
        #[arg(required = true, num_args = 1..)]
        numbers: Vec<u8>,
    },

    /// Replay freshly generated combinations against past draws
    Backtest {
        #[arg(short, long)]
        test_draws: Option<usize>,

        /// Minimum matches counted as a success
        #[arg(long)]
        threshold: Option<usize>,

        #[arg(short = 'n', long)]
        sets: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Classify the latest draw file against the history
    Latest,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    if let Command::Init { force } = cli.command {
        return cmd_init(&cli.config, force);
    }

    let config = Config::load(&cli.config)
        .with_context(|| format!("Invalid configuration {:?}", cli.config))?;
    let path = db_path(&config.data.db_path);
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Init { .. } => Ok(()),
        Command::Import { file } => cmd_import(&conn, &config, file),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&conn, last),
        Command::Analyze {
            test_draws,
            show_all,
            hide,
            save,
        } => cmd_analyze(&conn, config, test_draws, show_all, &hide, save),
        Command::Generate {
            sets,
            strategy,
            retry_budget,
            seed,
            save,
        } => {
            let request = GenerationRequest {
                strategy: strategy.unwrap_or(config.output.strategy),
                count: sets.unwrap_or(config.output.sets),
                retry_budget: retry_budget.unwrap_or(config.output.retry_budget),
                seed: seed.or(config.output.seed),
            };
            cmd_generate(&conn, &config, &request, save)
        }
        Command::Check { numbers } => cmd_check(&conn, &config, numbers),
        Command::Backtest {
            test_draws,
            threshold,
            sets,
            seed,
        } => cmd_backtest(&conn, config, test_draws, threshold, sets, seed),
        Command::Latest => cmd_latest(&conn, &config),
    }
}

fn cmd_init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!("{:?} already exists (use --force to overwrite)", config_path);
    }
    let config = Config::default();
    std::fs::write(config_path, config.to_yaml()?)
        .with_context(|| format!("Cannot write {:?}", config_path))?;

    for dir in [&config.data.stats_dir, &config.data.results_dir] {
        std::fs::create_dir_all(dir).with_context(|| format!("Cannot create {:?}", dir))?;
    }
    if let Some(parent) = config.data.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    println!("Wrote {}", config_path.display());
    println!("Next: place your history at {} and run: lotopt import", config.data.historical_path.display());
    Ok(())
}

fn load_history(conn: &Connection) -> Result<Option<Vec<Draw>>> {
    if count_draws(conn)? == 0 {
        println!("Empty database. Run first: lotopt import");
        return Ok(None);
    }
    Ok(Some(fetch_history(conn)?))
}

fn cmd_import(conn: &Connection, config: &Config, file: Option<PathBuf>) -> Result<()> {
    let file = file.unwrap_or_else(|| config.data.historical_path.clone());
    let result = import::import_csv(conn, &file, &config.data, &config.generation)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(conn: &Connection, last: u32) -> Result<()> {
    if count_draws(conn)? == 0 {
        println!("Empty database. Run first: lotopt import");
        return Ok(());
    }
    let draws = fetch_last_draws(conn, last)?;
    display_draws(&draws);
    Ok(())
}

fn cmd_analyze(
    conn: &Connection,
    mut config: Config,
    test_draws: Option<usize>,
    show_all: bool,
    hide: &[Section],
    save: bool,
) -> Result<()> {
    let Some(history) = load_history(conn)? else {
        return Ok(());
    };
    if test_draws.is_some() {
        config.analysis.test_draws = test_draws;
    }

    let stats = analyze(&history, &config.generation);
    let report = build_report(&history, &stats, &config);

    display_stats(&stats);
    let sections: Vec<Section> = Section::ALL
        .into_iter()
        .filter(|s| show_all || s.enabled_in(&config.display))
        .filter(|s| !hide.contains(s))
        .collect();
    display_report(&report, &sections);

    if save {
        let stats_path = export::write_number_stats(&config.data.stats_dir, &stats)?;
        let report_path = export::write_report(&config.data.stats_dir, &report)?;
        println!("\nSaved {} and {}", stats_path.display(), report_path.display());
    }
    Ok(())
}

fn cmd_generate(
    conn: &Connection,
    config: &Config,
    request: &GenerationRequest,
    save: bool,
) -> Result<()> {
    let history = fetch_history(conn)?;
    if history.is_empty() {
        log::warn!("No history loaded; overdue statistics are placeholders");
    }
    let stats = analyze(&history, &config.generation);
    let report = generate(&stats, &config.generation, request)?;
    display_generation(&report);

    let exhausted = report.exhausted();
    if !exhausted.is_empty() {
        println!(
            "{} of {} requests found no valid combination within {} attempts; consider loosening the rules.",
            exhausted.len(),
            request.count,
            request.retry_budget
        );
    }

    if save {
        let path = export::write_generated_sets(&config.data.results_dir, &report.accepted())?;
        println!("Saved {}", path.display());
    }
    Ok(())
}

fn cmd_check(conn: &Connection, config: &Config, numbers: Vec<u8>) -> Result<()> {
    let combination = Combination::new(numbers, &config.generation)?;
    let history = fetch_history(conn)?;
    let stats = analyze(&history, &config.generation);
    let result = Validator::new(&stats, &config.generation)?.validate(&combination)?;
    display_validation(&result);
    Ok(())
}

/// Command-line overrides go through the same validation as the file.
fn apply_backtest_overrides(
    mut config: Config,
    test_draws: Option<usize>,
    threshold: Option<usize>,
) -> Result<Config> {
    if let Some(n) = test_draws {
        config.backtest.test_draws = n;
    }
    if let Some(t) = threshold {
        config.backtest.alert_threshold = t;
    }
    config.validate().context("Invalid backtest options")?;
    Ok(config)
}

fn cmd_backtest(
    conn: &Connection,
    config: Config,
    test_draws: Option<usize>,
    threshold: Option<usize>,
    sets: Option<usize>,
    seed: Option<u64>,
) -> Result<()> {
    let config = apply_backtest_overrides(config, test_draws, threshold)?;
    let Some(history) = load_history(conn)? else {
        return Ok(());
    };

    let stats = analyze(&history, &config.generation);
    let request = GenerationRequest {
        strategy: config.output.strategy,
        count: sets.unwrap_or(config.output.sets),
        retry_budget: config.output.retry_budget,
        seed: seed.or(config.output.seed),
    };
    let generated = generate(&stats, &config.generation, &request)?;
    let combinations: Vec<Combination> = generated.accepted().into_iter().cloned().collect();

    let results = backtest(
        &combinations,
        &history,
        &config.backtest,
        config.generation.numbers_to_draw,
    );
    display_backtest(&results, config.backtest.alert_threshold);
    Ok(())
}

fn cmd_latest(conn: &Connection, config: &Config) -> Result<()> {
    let Some(latest) = import::read_latest(&config.data.latest_path, &config.data, &config.generation)? else {
        println!("No latest draw at {}", config.data.latest_path.display());
        return Ok(());
    };
    let history = fetch_history(conn)?;
    let stats = analyze(&history, &config.generation);
    let check = check_latest(&latest.numbers, &stats, &config.analysis.recency_bins);
    display_latest(&latest.date, &check);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotopt_core::error::ConfigError;

    #[test]
    fn test_backtest_overrides_applied() {
        let config = apply_backtest_overrides(Config::default(), Some(50), Some(3)).unwrap();
        assert_eq!(config.backtest.test_draws, 50);
        assert_eq!(config.backtest.alert_threshold, 3);

        let config = apply_backtest_overrides(Config::default(), None, None).unwrap();
        assert_eq!(config.backtest.alert_threshold, 4);
    }

    #[test]
    fn test_backtest_threshold_above_draw_size_rejected() {
        let err = apply_backtest_overrides(Config::default(), None, Some(7)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::AlertThreshold { threshold: 7, count: 6 })
        ));
    }
}
