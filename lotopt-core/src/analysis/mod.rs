pub mod properties;

use serde::Serialize;

use lotopt_db::models::Draw;

use crate::config::GenerationConfig;
use properties::PrimeTable;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberStat {
    pub number: u8,
    pub frequency: u32,
    /// Draws since the last occurrence; the history length if never drawn.
    pub last_seen_gap: u32,
    /// Distances between successive occurrences, most recent first.
    pub historical_gaps: Vec<u32>,
    /// `None` with fewer than two occurrences.
    pub average_gap: Option<f64>,
    pub gap_variety: usize,
    /// Mean distance to the next-lower member of the draws this number appeared in.
    pub mean_neighbor_gap: Option<f64>,
    pub is_overdue: bool,
    pub is_cold: bool,
    pub is_prime: bool,
}

impl NumberStat {
    pub fn never_drawn(&self) -> bool {
        self.frequency == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsTable {
    draws_analyzed: usize,
    stats: Vec<NumberStat>,
}

impl StatsTable {
    /// `stats` must hold one entry per pool number; it is reordered by number.
    pub fn from_parts(draws_analyzed: usize, mut stats: Vec<NumberStat>) -> Self {
        stats.sort_by_key(|s| s.number);
        Self {
            draws_analyzed,
            stats,
        }
    }

    pub fn get(&self, number: u8) -> Option<&NumberStat> {
        if number == 0 {
            return None;
        }
        self.stats
            .get(number as usize - 1)
            .filter(|s| s.number == number)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NumberStat> {
        self.stats.iter()
    }

    pub fn as_slice(&self) -> &[NumberStat] {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn draws_analyzed(&self) -> usize {
        self.draws_analyzed
    }

    /// True when the history was empty and every statistic is a placeholder.
    pub fn is_degenerate(&self) -> bool {
        self.draws_analyzed == 0
    }

    pub fn undefined_averages(&self) -> usize {
        self.stats.iter().filter(|s| s.average_gap.is_none()).count()
    }

    pub fn overdue_numbers(&self) -> Vec<u8> {
        self.stats
            .iter()
            .filter(|s| s.is_overdue)
            .map(|s| s.number)
            .collect()
    }

    pub fn is_overdue(&self, number: u8) -> bool {
        self.get(number).is_some_and(|s| s.is_overdue)
    }
}

/// Per-number statistics over `history`, most recent draw first.
pub fn analyze(history: &[Draw], config: &GenerationConfig) -> StatsTable {
    let size = config.number_pool as usize;
    let overdue = &config.rules.overdue;
    let primes = PrimeTable::new(config.number_pool);

    let mut occurrences: Vec<Vec<usize>> = vec![Vec::new(); size];
    let mut neighbor_gaps: Vec<Vec<u32>> = vec![Vec::new(); size];

    for (t, draw) in history.iter().enumerate() {
        let mut numbers = draw.numbers.clone();
        numbers.sort_unstable();
        numbers.dedup();

        let mut previous: Option<u8> = None;
        for &n in &numbers {
            let idx = n as usize;
            if idx == 0 || idx > size {
                continue;
            }
            occurrences[idx - 1].push(t);
            if let Some(p) = previous {
                neighbor_gaps[idx - 1].push((n - p) as u32);
            }
            previous = Some(n);
        }
    }

    let history_len = history.len() as u32;
    let stats: Vec<NumberStat> = (1..=config.number_pool)
        .map(|number| {
            let occ = &occurrences[number as usize - 1];
            let neighbors = &neighbor_gaps[number as usize - 1];

            let last_seen_gap = occ.first().map(|&t| t as u32).unwrap_or(history_len);
            let historical_gaps: Vec<u32> = occ.windows(2).map(|w| (w[1] - w[0]) as u32).collect();
            let never_drawn = occ.is_empty();

            NumberStat {
                number,
                frequency: occ.len() as u32,
                last_seen_gap,
                average_gap: mean(&historical_gaps),
                gap_variety: distinct_count(&historical_gaps),
                historical_gaps,
                mean_neighbor_gap: mean(neighbors),
                is_overdue: never_drawn || last_seen_gap >= overdue.threshold,
                is_cold: never_drawn || last_seen_gap >= overdue.cold_threshold,
                is_prime: primes.is_prime(number),
            }
        })
        .collect();

    let table = StatsTable::from_parts(history.len(), stats);
    if table.is_degenerate() {
        log::warn!("Empty history: every number is treated as maximally overdue");
    } else {
        log::debug!(
            "Analyzed {} draws, {} numbers without a defined average gap",
            table.draws_analyzed(),
            table.undefined_averages()
        );
    }
    table
}

fn mean(values: &[u32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64)
}

fn distinct_count(values: &[u32]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

#[cfg(test)]
pub(crate) fn make_test_draws(n: usize, pool: u8) -> Vec<Draw> {
    (0..n)
        .map(|i| {
            let base = (i * 7 % pool as usize) as u8;
            let numbers: Vec<u8> = (0..6u8)
                .map(|k| (base + k * 8) % pool + 1)
                .collect();
            Draw::new(i as u32 + 1, format!("2024-01-{:02}", (i % 28) + 1), numbers)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pool: u8) -> GenerationConfig {
        let mut config = GenerationConfig {
            number_pool: pool,
            ..GenerationConfig::default()
        };
        config.rules.overdue.threshold = 3;
        config.rules.overdue.cold_threshold = 5;
        config
    }

    fn draw(index: u32, numbers: &[u8]) -> Draw {
        Draw::new(index, "2024-01-01", numbers.to_vec())
    }

    #[test]
    fn test_gaps_newest_first() {
        // Number 1 appears at t=0, 2 and 5.
        let history = vec![
            draw(1, &[1, 2, 3, 4, 5, 6]),
            draw(2, &[7, 8, 9, 10, 11, 12]),
            draw(3, &[1, 8, 9, 10, 11, 12]),
            draw(4, &[7, 8, 9, 10, 11, 12]),
            draw(5, &[7, 8, 9, 10, 11, 12]),
            draw(6, &[1, 8, 9, 10, 11, 12]),
        ];
        let table = analyze(&history, &config(20));
        let one = table.get(1).unwrap();

        assert_eq!(one.frequency, 3);
        assert_eq!(one.last_seen_gap, 0);
        assert_eq!(one.historical_gaps, vec![2, 3]);
        assert_eq!(one.average_gap, Some(2.5));
        assert_eq!(one.gap_variety, 2);
        assert!(!one.is_overdue);
    }

    #[test]
    fn test_single_occurrence_has_undefined_average() {
        let history = vec![
            draw(1, &[7, 8, 9, 10, 11, 12]),
            draw(2, &[2, 8, 9, 10, 11, 12]),
        ];
        let table = analyze(&history, &config(20));
        let two = table.get(2).unwrap();
        assert_eq!(two.frequency, 1);
        assert_eq!(two.last_seen_gap, 1);
        assert!(two.historical_gaps.is_empty());
        assert_eq!(two.average_gap, None);
        assert_eq!(two.gap_variety, 0);
    }

    #[test]
    fn test_never_drawn_is_maximally_overdue() {
        let history = vec![draw(1, &[1, 2, 3, 4, 5, 6]), draw(2, &[1, 2, 3, 4, 5, 6])];
        let table = analyze(&history, &config(20));
        let twenty = table.get(20).unwrap();
        assert_eq!(twenty.last_seen_gap, 2);
        assert!(twenty.never_drawn());
        assert!(twenty.is_overdue);
        assert!(twenty.is_cold);
    }

    #[test]
    fn test_overdue_and_cold_tiers() {
        // Number 1 last seen 4 draws ago: overdue (>= 3) but not cold (< 5).
        let mut history: Vec<Draw> = (0..4).map(|i| draw(i + 1, &[7, 8, 9, 10, 11, 12])).collect();
        history.push(draw(5, &[1, 8, 9, 10, 11, 12]));
        let table = analyze(&history, &config(20));
        let one = table.get(1).unwrap();
        assert_eq!(one.last_seen_gap, 4);
        assert!(one.is_overdue);
        assert!(!one.is_cold);
    }

    #[test]
    fn test_empty_history_is_degenerate() {
        let table = analyze(&[], &config(49));
        assert!(table.is_degenerate());
        assert_eq!(table.len(), 49);
        assert_eq!(table.undefined_averages(), 49);
        for stat in table.iter() {
            assert_eq!(stat.last_seen_gap, 0);
            assert!(stat.is_overdue);
            assert!(stat.historical_gaps.is_empty());
        }
    }

    #[test]
    fn test_historical_gaps_length_invariant() {
        let history = make_test_draws(40, 49);
        let table = analyze(&history, &config(49));
        for stat in table.iter() {
            let expected = (stat.frequency as usize).max(1) - 1;
            assert_eq!(stat.historical_gaps.len(), expected, "number {}", stat.number);
            assert_eq!(stat.average_gap.is_some(), stat.frequency >= 2);
        }
    }

    #[test]
    fn test_mean_neighbor_gap() {
        let history = vec![draw(1, &[1, 5, 9, 20, 30, 40]), draw(2, &[2, 3, 9, 21, 31, 41])];
        let table = analyze(&history, &config(49));
        // 9 follows 5 (gap 4) then 3 (gap 6).
        assert_eq!(table.get(9).unwrap().mean_neighbor_gap, Some(5.0));
        assert_eq!(table.get(1).unwrap().mean_neighbor_gap, None);
    }

    #[test]
    fn test_out_of_pool_numbers_ignored() {
        let history = vec![Draw {
            index: 1,
            date: "2024-01-01".to_string(),
            numbers: vec![0, 3, 4, 5, 6, 60],
        }];
        let table = analyze(&history, &config(49));
        assert_eq!(table.len(), 49);
        assert_eq!(table.get(3).unwrap().frequency, 1);
        assert!(table.get(0).is_none());
        assert!(table.get(60).is_none());
    }

    #[test]
    fn test_primality_flag() {
        let table = analyze(&[], &config(20));
        let primes: Vec<u8> = table.iter().filter(|s| s.is_prime).map(|s| s.number).collect();
        assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19]);
    }
}
