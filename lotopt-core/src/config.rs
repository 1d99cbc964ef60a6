use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, LoadError};
use crate::generator::Strategy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub generation: GenerationConfig,
    pub output: OutputConfig,
    pub analysis: AnalysisConfig,
    pub display: DisplayConfig,
    pub backtest: BacktestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub historical_path: PathBuf,
    pub latest_path: PathBuf,
    pub db_path: PathBuf,
    pub stats_dir: PathBuf,
    pub results_dir: PathBuf,
    pub has_header: bool,
    /// chrono format of the date column, e.g. `%m/%d/%y`.
    pub date_format: String,
    pub number_separator: char,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            historical_path: PathBuf::from("data/historical.csv"),
            latest_path: PathBuf::from("data/latest_draw.csv"),
            db_path: PathBuf::from("data/lotopt.db"),
            stats_dir: PathBuf::from("data/stats"),
            results_dir: PathBuf::from("data/results"),
            has_header: false,
            date_format: "%m/%d/%y".to_string(),
            number_separator: '-',
        }
    }
}

/// Everything the analyzer, validator and generator read during one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub number_pool: u8,
    pub numbers_to_draw: usize,
    pub strategies: Vec<Strategy>,
    /// Largest number counted as low by `high_low` and the report's high/low section.
    pub low_number_max: u8,
    /// `prime` seeds its drafts with primes above this value.
    pub high_prime_min: u8,
    pub weights: StrategyWeights,
    pub rules: Rules,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            number_pool: 55,
            numbers_to_draw: 6,
            strategies: vec![
                Strategy::Weighted,
                Strategy::Balanced,
                Strategy::Random,
                Strategy::HighLow,
                Strategy::Prime,
            ],
            low_number_max: 10,
            high_prime_min: 35,
            weights: StrategyWeights::default(),
            rules: Rules::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyWeights {
    pub overdue_boost: f64,
    pub cold_boost: f64,
    pub gap_penalty: f64,
}

impl Default for StrategyWeights {
    fn default() -> Self {
        Self {
            overdue_boost: 2.0,
            cold_boost: 3.0,
            gap_penalty: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub sum: SumRule,
    pub overdue: OverdueRule,
    pub gaps: GapRule,
    pub primes: PrimeRule,
    pub parity: ParityRule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SumRule {
    pub enabled: bool,
    pub min_sum: u32,
    pub max_sum: u32,
}

impl Default for SumRule {
    fn default() -> Self {
        Self {
            enabled: true,
            min_sum: 100,
            max_sum: 200,
        }
    }
}

/// `threshold` and `cold_threshold` also drive the analyzer's overdue/cold flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverdueRule {
    pub enabled: bool,
    pub threshold: u32,
    pub cold_threshold: u32,
    pub min_include: usize,
    pub max_include: usize,
}

impl Default for OverdueRule {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 25,
            cold_threshold: 50,
            min_include: 1,
            max_include: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GapRule {
    pub enabled: bool,
    pub max_avg_gap: f64,
    pub max_single_gap: u32,
    /// Checked by `validate` only, never while generating.
    pub min_variety: usize,
}

impl Default for GapRule {
    fn default() -> Self {
        Self {
            enabled: true,
            max_avg_gap: 10.0,
            max_single_gap: 25,
            min_variety: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimeRule {
    pub enabled: bool,
    pub min_primes: usize,
}

impl Default for PrimeRule {
    fn default() -> Self {
        Self {
            enabled: true,
            min_primes: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParityRule {
    pub enabled: bool,
    /// Expected share of even members.
    pub target_ratio: f64,
    pub tolerance: f64,
}

impl Default for ParityRule {
    fn default() -> Self {
        Self {
            enabled: true,
            target_ratio: 0.5,
            tolerance: 0.17,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub sets: usize,
    pub retry_budget: u32,
    pub strategy: Strategy,
    pub seed: Option<u64>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sets: 4,
            retry_budget: 1000,
            strategy: Strategy::Auto,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Size of the report window, `None` for the full history.
    pub test_draws: Option<usize>,
    pub top_range: usize,
    pub recency_bins: RecencyBins,
    pub combinations: CombinationSizes,
    pub min_combination_count: u32,
    pub gap_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            test_draws: None,
            top_range: 10,
            recency_bins: RecencyBins::default(),
            combinations: CombinationSizes::default(),
            min_combination_count: 2,
            gap_threshold: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RecencyBins {
    pub hot: u32,
    pub warm: u32,
    pub cold: u32,
}

impl Default for RecencyBins {
    fn default() -> Self {
        Self {
            hot: 3,
            warm: 10,
            cold: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombinationSizes {
    pub pairs: bool,
    pub triplets: bool,
    pub quadruplets: bool,
    pub quintuplets: bool,
    pub sixtuplets: bool,
}

impl Default for CombinationSizes {
    fn default() -> Self {
        Self {
            pairs: true,
            triplets: true,
            quadruplets: false,
            quintuplets: false,
            sixtuplets: false,
        }
    }
}

impl CombinationSizes {
    pub fn enabled_sizes(&self) -> Vec<usize> {
        [
            (2, self.pairs),
            (3, self.triplets),
            (4, self.quadruplets),
            (5, self.quintuplets),
            (6, self.sixtuplets),
        ]
        .into_iter()
        .filter(|&(_, on)| on)
        .map(|(size, _)| size)
        .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub show_frequency: bool,
    pub show_temperature: bool,
    pub show_odd_even: bool,
    pub show_sums: bool,
    pub show_high_low: bool,
    pub show_primes: bool,
    pub show_gaps: bool,
    pub show_combinations: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_frequency: true,
            show_temperature: true,
            show_odd_even: true,
            show_sums: true,
            show_high_low: true,
            show_primes: true,
            show_gaps: true,
            show_combinations: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub test_draws: usize,
    pub alert_threshold: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            test_draws: 120,
            alert_threshold: 4,
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.number_pool == 0 {
            return Err(ConfigError::PoolSize(0));
        }
        if self.numbers_to_draw == 0 || self.numbers_to_draw > self.number_pool as usize {
            return Err(ConfigError::DrawSize {
                count: self.numbers_to_draw,
                pool: self.number_pool,
            });
        }

        let rules = &self.rules;
        let weights = &self.weights;
        for (field, value) in [
            ("max_avg_gap", rules.gaps.max_avg_gap),
            ("target_ratio", rules.parity.target_ratio),
            ("tolerance", rules.parity.tolerance),
            ("overdue_boost", weights.overdue_boost),
            ("cold_boost", weights.cold_boost),
            ("gap_penalty", weights.gap_penalty),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
        }

        if rules.sum.min_sum > rules.sum.max_sum {
            return Err(ConfigError::SumBounds {
                min: rules.sum.min_sum,
                max: rules.sum.max_sum,
            });
        }
        if rules.overdue.min_include > rules.overdue.max_include {
            return Err(ConfigError::OverdueBounds {
                min: rules.overdue.min_include,
                max: rules.overdue.max_include,
            });
        }
        if rules.overdue.cold_threshold < rules.overdue.threshold {
            return Err(ConfigError::ColdThreshold {
                threshold: rules.overdue.threshold,
                cold: rules.overdue.cold_threshold,
            });
        }
        if !(rules.gaps.max_avg_gap > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "max_avg_gap",
                value: rules.gaps.max_avg_gap,
            });
        }
        if rules.gaps.max_single_gap == 0 {
            return Err(ConfigError::NonPositive {
                field: "max_single_gap",
                value: 0.0,
            });
        }
        if !(0.0..=1.0).contains(&rules.parity.target_ratio) {
            return Err(ConfigError::TargetRatio(rules.parity.target_ratio));
        }
        if !(rules.parity.tolerance >= 0.0) {
            return Err(ConfigError::Tolerance(rules.parity.tolerance));
        }

        if !(weights.overdue_boost >= 1.0) {
            return Err(ConfigError::WeightTooSmall {
                field: "overdue_boost",
                min: 1.0,
                value: weights.overdue_boost,
            });
        }
        if !(weights.cold_boost >= weights.overdue_boost) {
            return Err(ConfigError::WeightTooSmall {
                field: "cold_boost",
                min: weights.overdue_boost,
                value: weights.cold_boost,
            });
        }
        // The selection weights of the whole pool must sum to a finite value.
        let max_boost = f64::MAX / (self.number_pool as f64 + 1.0);
        if weights.cold_boost > max_boost {
            return Err(ConfigError::WeightTooLarge {
                field: "cold_boost",
                max: max_boost,
                value: weights.cold_boost,
            });
        }
        if !(weights.gap_penalty > 0.0 && weights.gap_penalty <= 1.0) {
            return Err(ConfigError::GapPenalty(weights.gap_penalty));
        }

        if self.enabled_strategies().is_empty() {
            return Err(ConfigError::NoStrategy);
        }
        Ok(())
    }

    /// Concrete strategies only; `auto` in the list is ignored.
    pub fn enabled_strategies(&self) -> Vec<Strategy> {
        let mut enabled: Vec<Strategy> = Vec::new();
        for &s in &self.strategies {
            if s != Strategy::Auto && !enabled.contains(&s) {
                enabled.push(s);
            }
        }
        enabled
    }

    pub fn is_enabled(&self, strategy: Strategy) -> bool {
        self.enabled_strategies().contains(&strategy)
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.generation.validate()?;

        let bins = self.analysis.recency_bins;
        if bins.hot > bins.warm || bins.warm > bins.cold {
            return Err(ConfigError::RecencyBins {
                hot: bins.hot,
                warm: bins.warm,
                cold: bins.cold,
            });
        }
        if self.backtest.alert_threshold > self.generation.numbers_to_draw {
            return Err(ConfigError::AlertThreshold {
                threshold: self.backtest.alert_threshold,
                count: self.generation.numbers_to_draw,
            });
        }
        Ok(())
    }

    /// Missing sections and fields keep their defaults.
    pub fn from_yaml_str(raw: &str) -> Result<Self, LoadError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yml::from_str(raw)?;
        Ok(config)
    }

    /// Loads and validates `path`. A missing file falls back to the defaults.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let config = match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_yaml_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Config {:?} not found, using defaults", path);
                Self::default()
            }
            Err(e) => return Err(e.into()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, LoadError> {
        Ok(serde_yml::to_string(self)?)
    }
}
