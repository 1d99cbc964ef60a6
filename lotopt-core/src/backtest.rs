use std::fmt;

use serde::Serialize;

use lotopt_db::models::Draw;

use crate::analysis::StatsTable;
use crate::combination::Combination;
use crate::config::{BacktestConfig, RecencyBins};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub combination: Combination,
    /// Index `m` holds the number of draws sharing exactly `m` members.
    pub match_distribution: Vec<u32>,
    pub best_match: usize,
    /// Share of draws with at least `alert_threshold` matches; 0 over an empty window.
    pub success_rate: f64,
}

impl BacktestResult {
    pub fn draws_tested(&self) -> u32 {
        self.match_distribution.iter().sum()
    }
}

/// Replays each combination against the `config.test_draws` most recent draws.
pub fn backtest(
    combinations: &[Combination],
    history: &[Draw],
    config: &BacktestConfig,
    numbers_to_draw: usize,
) -> Vec<BacktestResult> {
    let window = &history[..config.test_draws.min(history.len())];

    let results: Vec<BacktestResult> = combinations
        .iter()
        .map(|combination| {
            let mut match_distribution = vec![0u32; numbers_to_draw + 1];
            let mut hits = 0usize;
            for draw in window {
                let matches = combination
                    .numbers()
                    .iter()
                    .filter(|&&n| draw.contains(n))
                    .count();
                if matches >= match_distribution.len() {
                    match_distribution.resize(matches + 1, 0);
                }
                match_distribution[matches] += 1;
                if matches >= config.alert_threshold {
                    hits += 1;
                }
            }

            let best_match = match_distribution
                .iter()
                .rposition(|&c| c > 0)
                .unwrap_or(0);
            let success_rate = if window.is_empty() {
                0.0
            } else {
                hits as f64 / window.len() as f64
            };

            BacktestResult {
                combination: combination.clone(),
                match_distribution,
                best_match,
                success_rate,
            }
        })
        .collect();

    log::info!(
        "Backtested {} combinations over {} draws",
        results.len(),
        window.len()
    );
    for r in results.iter().filter(|r| r.success_rate > 0.0) {
        log::debug!("{} reached {} matches", r.combination, r.best_match);
    }
    results
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Heat {
    Hot,
    Cold,
    Neutral,
}

impl fmt::Display for Heat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Heat::Hot => write!(f, "hot"),
            Heat::Cold => write!(f, "cold"),
            Heat::Neutral => write!(f, "neutral"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberCheck {
    pub number: u8,
    pub heat: Heat,
    pub frequency: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestDrawCheck {
    pub numbers: Vec<u8>,
    pub members: Vec<NumberCheck>,
}

impl LatestDrawCheck {
    pub fn count(&self, heat: Heat) -> usize {
        self.members.iter().filter(|m| m.heat == heat).count()
    }
}

/// Classifies each member of a fresh draw against the history in `stats`.
///
/// Hot when last seen within `bins.hot` draws, cold past `bins.cold` or never drawn.
pub fn check_latest(numbers: &[u8], stats: &StatsTable, bins: &RecencyBins) -> LatestDrawCheck {
    let mut sorted = numbers.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let members = sorted
        .iter()
        .map(|&number| match stats.get(number) {
            Some(stat) => {
                let heat = if stat.never_drawn() || stat.last_seen_gap > bins.cold {
                    Heat::Cold
                } else if stat.last_seen_gap <= bins.hot {
                    Heat::Hot
                } else {
                    Heat::Neutral
                };
                NumberCheck {
                    number,
                    heat,
                    frequency: stat.frequency,
                }
            }
            None => NumberCheck {
                number,
                heat: Heat::Cold,
                frequency: 0,
            },
        })
        .collect();

    LatestDrawCheck {
        numbers: sorted,
        members,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::config::GenerationConfig;

    fn draw(index: u32, numbers: &[u8]) -> Draw {
        Draw::new(index, "2024-01-01", numbers.to_vec())
    }

    fn combo(numbers: &[u8]) -> Combination {
        Combination::from_distinct(numbers.to_vec())
    }

    #[test]
    fn test_match_distribution() {
        let history = vec![
            draw(1, &[1, 2, 3, 4, 5, 6]),
            draw(2, &[1, 2, 3, 4, 40, 41]),
            draw(3, &[30, 31, 32, 33, 34, 35]),
        ];
        let config = BacktestConfig {
            test_draws: 10,
            alert_threshold: 4,
        };
        let results = backtest(&[combo(&[1, 2, 3, 4, 5, 6])], &history, &config, 6);
        let r = &results[0];
        assert_eq!(r.match_distribution, vec![1, 0, 0, 0, 1, 0, 1]);
        assert_eq!(r.draws_tested(), 3);
        assert_eq!(r.best_match, 6);
        assert!((r.success_rate - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_window_uses_most_recent_draws() {
        let history = vec![draw(1, &[10, 11, 12, 13, 14, 15]), draw(2, &[1, 2, 3, 4, 5, 6])];
        let config = BacktestConfig {
            test_draws: 1,
            alert_threshold: 1,
        };
        let results = backtest(&[combo(&[1, 2, 3, 4, 5, 6])], &history, &config, 6);
        assert_eq!(results[0].draws_tested(), 1);
        assert_eq!(results[0].success_rate, 0.0);
    }

    #[test]
    fn test_empty_history() {
        let results = backtest(&[combo(&[1, 2, 3, 4, 5, 6])], &[], &BacktestConfig::default(), 6);
        assert_eq!(results[0].draws_tested(), 0);
        assert_eq!(results[0].success_rate, 0.0);
        assert_eq!(results[0].best_match, 0);
    }

    #[test]
    fn test_check_latest_heat() {
        let config = GenerationConfig {
            number_pool: 20,
            ..GenerationConfig::default()
        };
        let mut history = vec![draw(1, &[1, 2, 3, 4, 5, 6])];
        history.extend((2..=5).map(|i| draw(i, &[7, 8, 9, 10, 11, 12])));
        history.push(draw(6, &[13, 14, 15, 16, 17, 18]));
        let stats = analyze(&history, &config);
        let bins = RecencyBins {
            hot: 0,
            warm: 2,
            cold: 4,
        };

        let check = check_latest(&[20, 1, 13, 7], &stats, &bins);
        assert_eq!(check.numbers, vec![1, 7, 13, 20]);
        let heat: Vec<Heat> = check.members.iter().map(|m| m.heat).collect();
        assert_eq!(heat, vec![Heat::Hot, Heat::Neutral, Heat::Cold, Heat::Cold]);
        assert_eq!(check.members[1].frequency, 4);
        assert_eq!(check.members[3].frequency, 0);
        assert_eq!(check.count(Heat::Cold), 2);
    }
}
