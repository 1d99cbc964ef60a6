//! Error types for the analysis and generation engine.

use thiserror::Error;

/// Inconsistent thresholds. Always reported before analysis or generation starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("number_pool must be between 1 and 255, got {0}")]
    PoolSize(u32),

    #[error("numbers_to_draw must be between 1 and number_pool {pool}, got {count}")]
    DrawSize { count: usize, pool: u8 },

    #[error("min_sum {min} > max_sum {max}")]
    SumBounds { min: u32, max: u32 },

    #[error("min_include {min} > max_include {max}")]
    OverdueBounds { min: usize, max: usize },

    #[error("cold_threshold {cold} < overdue threshold {threshold}")]
    ColdThreshold { threshold: u32, cold: u32 },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("target_ratio must lie in [0, 1], got {0}")]
    TargetRatio(f64),

    #[error("tolerance must not be negative, got {0}")]
    Tolerance(f64),

    #[error("{field} must be >= {min}, got {value}")]
    WeightTooSmall {
        field: &'static str,
        min: f64,
        value: f64,
    },

    #[error("{field} must be <= {max}, got {value}")]
    WeightTooLarge {
        field: &'static str,
        max: f64,
        value: f64,
    },

    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("gap_penalty must lie in (0, 1], got {0}")]
    GapPenalty(f64),

    #[error("no generation strategy enabled")]
    NoStrategy,

    #[error("recency bins must satisfy hot <= warm <= cold, got {hot}/{warm}/{cold}")]
    RecencyBins { hot: u32, warm: u32, cold: u32 },

    #[error("alert_threshold {threshold} exceeds numbers_to_draw {count}")]
    AlertThreshold { threshold: usize, count: usize },
}

/// A combination that does not fit the configured pool. Caller bug, not a statistical outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("combination has {got} numbers, expected {expected}")]
    WrongCount { expected: usize, got: usize },

    #[error("number {number} out of range (1-{pool})")]
    OutOfRange { number: u8, pool: u8 },

    #[error("duplicate number {0}")]
    Duplicate(u8),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid combination: {0}")]
    Shape(#[from] ShapeError),

    #[error("statistics cover {got} numbers but the pool has {expected}")]
    StatsMismatch { expected: usize, got: usize },

    #[error("invalid selection weights: {0}")]
    Weights(#[from] rand::distr::weighted::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}
