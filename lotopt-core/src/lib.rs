pub mod analysis;
pub mod backtest;
pub mod combination;
pub mod config;
pub mod error;
pub mod generator;
pub mod report;
pub mod validator;

pub use analysis::{analyze, NumberStat, StatsTable};
pub use combination::Combination;
pub use config::{Config, GenerationConfig};
pub use error::{Error, Result};
pub use generator::{generate, GenerationReport, GenerationRequest, RequestOutcome, Strategy};
pub use validator::{validate, ValidationResult, Validator};
