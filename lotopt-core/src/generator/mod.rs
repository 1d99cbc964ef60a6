mod sampler;
mod strategy;

pub use strategy::{Band, Strategy};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::analysis::StatsTable;
use crate::combination::Combination;
use crate::config::GenerationConfig;
use crate::error::Result;
use crate::validator::{CheckContext, ValidationResult, Validator};
use strategy::Drafter;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub strategy: Strategy,
    pub count: usize,
    pub retry_budget: u32,
    /// `None` draws a fresh base seed, reported back in [`GenerationReport::base_seed`].
    pub seed: Option<u64>,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            strategy: Strategy::Auto,
            count: 4,
            retry_budget: 1000,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    Accepted {
        combination: Combination,
        strategy: Strategy,
        attempts: u32,
    },
    Exhausted {
        strategy: Strategy,
        attempts: u32,
        last_failure: Option<ValidationResult>,
    },
}

impl RequestOutcome {
    pub fn combination(&self) -> Option<&Combination> {
        match self {
            RequestOutcome::Accepted { combination, .. } => Some(combination),
            RequestOutcome::Exhausted { .. } => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RequestOutcome::Exhausted { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            RequestOutcome::Accepted { attempts, .. } | RequestOutcome::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub base_seed: u64,
    /// Strategy after fallback; `Auto` resolves per request.
    pub strategy: Strategy,
    pub outcomes: Vec<RequestOutcome>,
}

impl GenerationReport {
    pub fn accepted(&self) -> Vec<&Combination> {
        self.outcomes.iter().filter_map(|o| o.combination()).collect()
    }

    /// Indices of the requests that ran out of retries.
    pub fn exhausted(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| o.is_exhausted())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn total_attempts(&self) -> u64 {
        self.outcomes.iter().map(|o| o.attempts() as u64).sum()
    }
}

/// Runs `request.count` independent draft/validate loops.
///
/// Request `i` samples from its own `StdRng` seeded with `base_seed + i`, so the
/// output only depends on the inputs and the base seed, not on thread scheduling.
pub fn generate(
    stats: &StatsTable,
    config: &GenerationConfig,
    request: &GenerationRequest,
) -> Result<GenerationReport> {
    let validator = Validator::new(stats, config)?;
    let drafter = Drafter::new(stats, config);
    let enabled = config.enabled_strategies();

    let strategy = match request.strategy {
        Strategy::Auto => Strategy::Auto,
        s if config.is_enabled(s) || s == Strategy::Random => s,
        s => {
            log::warn!("Strategy {} is disabled, falling back to random", s);
            Strategy::Random
        }
    };

    let base_seed = request.seed.unwrap_or_else(|| rand::rng().random());

    let outcomes = (0..request.count)
        .into_par_iter()
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(i as u64));
            let concrete = match strategy {
                Strategy::Auto if enabled.is_empty() => Strategy::Random,
                Strategy::Auto => enabled[rng.random_range(0..enabled.len())],
                s => s,
            };
            run_request(&drafter, &validator, concrete, request.retry_budget, &mut rng)
        })
        .collect::<Result<Vec<_>>>()?;

    let report = GenerationReport {
        base_seed,
        strategy,
        outcomes,
    };

    let exhausted = report.exhausted();
    if !exhausted.is_empty() {
        log::warn!(
            "{} of {} requests exhausted their retry budget of {}",
            exhausted.len(),
            request.count,
            request.retry_budget
        );
    }
    log::info!(
        "Generated {} combinations ({} attempts, seed {})",
        report.accepted().len(),
        report.total_attempts(),
        base_seed
    );

    Ok(report)
}

fn run_request(
    drafter: &Drafter<'_>,
    validator: &Validator<'_>,
    strategy: Strategy,
    retry_budget: u32,
    rng: &mut StdRng,
) -> Result<RequestOutcome> {
    let mut last_failure = None;

    for attempt in 1..=retry_budget {
        let combination = drafter.draft(strategy, rng)?;
        let result = validator.evaluate(&combination, CheckContext::Generation);
        if result.is_valid() {
            log::debug!("{} accepted {} after {} attempts", strategy, combination, attempt);
            return Ok(RequestOutcome::Accepted {
                combination,
                strategy,
                attempts: attempt,
            });
        }
        last_failure = Some(result);
    }

    Ok(RequestOutcome::Exhausted {
        strategy,
        attempts: retry_budget,
        last_failure,
    })
}
