use std::fmt;

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::sampler::{sample_uniform, sample_without_replacement};
use crate::analysis::properties::PrimeTable;
use crate::analysis::{NumberStat, StatsTable};
use crate::combination::Combination;
use crate::config::GenerationConfig;
use crate::error::Result;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Strategy {
    /// Overdue numbers weighted up, off-profile numbers weighted down.
    Weighted,
    /// Fixed quotas per overdue/parity band.
    Balanced,
    /// Uniform baseline.
    Random,
    /// Half the members at or below `low_number_max`, the rest above.
    HighLow,
    /// One or two primes above `high_prime_min`, the rest non-prime.
    Prime,
    /// One enabled strategy picked at random per request.
    #[default]
    Auto,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Weighted => write!(f, "weighted"),
            Strategy::Balanced => write!(f, "balanced"),
            Strategy::Random => write!(f, "random"),
            Strategy::HighLow => write!(f, "high_low"),
            Strategy::Prime => write!(f, "prime"),
            Strategy::Auto => write!(f, "auto"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    Cold,
    Overdue,
    Normal,
}

impl Band {
    pub fn of(stat: &NumberStat) -> Self {
        if stat.is_cold {
            Band::Cold
        } else if stat.is_overdue {
            Band::Overdue
        } else {
            Band::Normal
        }
    }

    /// Cold numbers are overdue too.
    fn is_overdue(self) -> bool {
        self != Band::Normal
    }
}

/// Per-run sampling state shared read-only by every request.
pub(crate) struct Drafter<'a> {
    config: &'a GenerationConfig,
    weights: Vec<(u8, f64)>,
    members: Vec<(u8, Band)>,
    overdue_share: f64,
    primes: PrimeTable,
}

impl<'a> Drafter<'a> {
    pub(crate) fn new(stats: &StatsTable, config: &'a GenerationConfig) -> Self {
        let weights = stats
            .iter()
            .map(|s| (s.number, selection_weight(s, config)))
            .collect();
        let members: Vec<(u8, Band)> = stats.iter().map(|s| (s.number, Band::of(s))).collect();
        let overdue = members.iter().filter(|(_, b)| b.is_overdue()).count();
        let overdue_share = if members.is_empty() {
            0.0
        } else {
            overdue as f64 / members.len() as f64
        };

        Self {
            config,
            weights,
            members,
            overdue_share,
            primes: PrimeTable::new(config.number_pool),
        }
    }

    #[cfg(test)]
    pub(crate) fn weights(&self) -> &[(u8, f64)] {
        &self.weights
    }

    /// `strategy` must already be concrete.
    pub(crate) fn draft(&self, strategy: Strategy, rng: &mut StdRng) -> Result<Combination> {
        let k = self.config.numbers_to_draw;
        let numbers = match strategy {
            Strategy::Weighted => sample_without_replacement(&self.weights, k, rng)?,
            Strategy::Balanced => self.draft_balanced(rng),
            Strategy::HighLow => self.draft_high_low(rng),
            Strategy::Prime => self.draft_prime(rng),
            Strategy::Random | Strategy::Auto => sample_uniform(self.config.number_pool, k, rng),
        };
        Ok(Combination::from_distinct(numbers))
    }

    fn draft_balanced(&self, rng: &mut StdRng) -> Vec<u8> {
        let k = self.config.numbers_to_draw;
        let rules = &self.config.rules;

        let mut overdue_left = if rules.overdue.enabled {
            let lo = rules.overdue.min_include.min(k);
            let hi = rules.overdue.max_include.min(k).max(lo);
            rng.random_range(lo..=hi)
        } else {
            (self.overdue_share * k as f64).round() as usize
        }
        .min(k);
        let mut normal_left = k - overdue_left;
        // One overdue slot goes to a cold number when there is one.
        let mut cold_left = usize::from(overdue_left > 0);

        let mut even_left = if rules.parity.enabled {
            (rules.parity.target_ratio * k as f64).round() as usize
        } else {
            k / 2
        }
        .min(k);
        let mut odd_left = k - even_left;

        let mut available = self.members.clone();
        let mut selected = Vec::with_capacity(k);

        for _ in 0..k {
            let want_overdue = pick_side(overdue_left, normal_left, rng);
            let want_cold = want_overdue && cold_left > 0;
            let want_even = pick_side(even_left, odd_left, rng);

            let matches = |(n, band): &(u8, Band), by_cold: bool, by_status: bool, by_parity: bool| {
                (!by_cold || !want_cold || *band == Band::Cold)
                    && (!by_status || band.is_overdue() == want_overdue)
                    && (!by_parity || (n % 2 == 0) == want_even)
            };
            // Relax the cold preference first, then parity, then status, when a band runs dry.
            let tiers = [
                (true, true, true),
                (false, true, true),
                (false, true, false),
                (false, false, true),
                (false, false, false),
            ];
            let candidates: Vec<usize> = tiers
                .iter()
                .map(|&(c, s, p)| {
                    available
                        .iter()
                        .enumerate()
                        .filter(|&(_, m)| matches(m, c, s, p))
                        .map(|(i, _)| i)
                        .collect::<Vec<_>>()
                })
                .find(|c| !c.is_empty())
                .unwrap_or_default();
            if candidates.is_empty() {
                break;
            }

            let idx = candidates[rng.random_range(0..candidates.len())];
            let (number, band) = available.remove(idx);
            if band == Band::Cold {
                cold_left = cold_left.saturating_sub(1);
            }
            if band.is_overdue() {
                overdue_left = overdue_left.saturating_sub(1);
            } else {
                normal_left = normal_left.saturating_sub(1);
            }
            if number % 2 == 0 {
                even_left = even_left.saturating_sub(1);
            } else {
                odd_left = odd_left.saturating_sub(1);
            }
            selected.push(number);
        }

        selected
    }

    fn draft_high_low(&self, rng: &mut StdRng) -> Vec<u8> {
        let k = self.config.numbers_to_draw;
        let (low, high): (Vec<u8>, Vec<u8>) = (1..=self.config.number_pool)
            .partition(|&n| n <= self.config.low_number_max);
        let want_low = (k / 2).max(1).min(k);
        fill_from_sides(&low, want_low, &high, k, rng)
    }

    /// Falls back to every prime of the pool when none lies above `high_prime_min`.
    fn draft_prime(&self, rng: &mut StdRng) -> Vec<u8> {
        let k = self.config.numbers_to_draw;
        let mut primes: Vec<u8> = self
            .primes
            .primes()
            .filter(|&p| p > self.config.high_prime_min)
            .collect();
        if primes.is_empty() {
            primes = self.primes.primes().collect();
        }
        let non_primes: Vec<u8> = (1..=self.config.number_pool)
            .filter(|&n| !self.primes.is_prime(n))
            .collect();

        let want_primes = rng.random_range(1..=2usize).min(k);
        let mut selected = fill_from_sides(&primes, want_primes, &non_primes, k, rng);
        if selected.len() < k {
            // Only primes at or below the threshold are left to complete the draft.
            let rest: Vec<u8> = self
                .primes
                .primes()
                .filter(|p| !selected.contains(p))
                .collect();
            selected.extend(pick(&rest, k - selected.len(), rng));
        }
        selected
    }
}

/// `want_first` members from `first`, the rest from `second`. A side that runs
/// short is topped up from the other one.
fn fill_from_sides(first: &[u8], want_first: usize, second: &[u8], k: usize, rng: &mut StdRng) -> Vec<u8> {
    let from_first = want_first.min(first.len());
    let from_second = (k - from_first).min(second.len());
    let from_first = (k - from_second).min(first.len());

    let mut selected = pick(first, from_first, rng);
    selected.extend(pick(second, from_second, rng));
    selected
}

fn pick(from: &[u8], count: usize, rng: &mut StdRng) -> Vec<u8> {
    rand::seq::index::sample(rng, from.len(), count.min(from.len()))
        .into_iter()
        .map(|i| from[i])
        .collect()
}

/// True for the first side, with probability proportional to what is left on each side.
fn pick_side(first: usize, second: usize, rng: &mut StdRng) -> bool {
    match (first, second) {
        (0, 0) => rng.random_bool(0.5),
        (_, 0) => true,
        (0, _) => false,
        (a, b) => rng.random_range(0..a + b) < a,
    }
}

fn selection_weight(stat: &NumberStat, config: &GenerationConfig) -> f64 {
    let weights = &config.weights;
    let mut w = 1.0;
    if stat.is_cold {
        w *= weights.cold_boost;
    } else if stat.is_overdue {
        w *= weights.overdue_boost;
    }
    if config.rules.gaps.enabled {
        if let Some(gap) = stat.mean_neighbor_gap {
            if gap > config.rules.gaps.max_avg_gap {
                w *= weights.gap_penalty;
            }
        }
    }
    w
}
