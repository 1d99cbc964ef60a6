use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;

use lotopt_db::models::Draw;

use crate::analysis::properties::PrimeTable;
use crate::analysis::StatsTable;
use crate::config::{Config, DisplayConfig, RecencyBins};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, clap::ValueEnum)]
pub enum Section {
    Frequency,
    Temperature,
    OddEven,
    Sums,
    HighLow,
    Primes,
    Gaps,
    Combinations,
}

impl Section {
    pub const ALL: [Section; 8] = [
        Section::Frequency,
        Section::Temperature,
        Section::OddEven,
        Section::Sums,
        Section::HighLow,
        Section::Primes,
        Section::Gaps,
        Section::Combinations,
    ];

    pub fn enabled_in(self, display: &DisplayConfig) -> bool {
        match self {
            Section::Frequency => display.show_frequency,
            Section::Temperature => display.show_temperature,
            Section::OddEven => display.show_odd_even,
            Section::Sums => display.show_sums,
            Section::HighLow => display.show_high_low,
            Section::Primes => display.show_primes,
            Section::Gaps => display.show_gaps,
            Section::Combinations => display.show_combinations,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Frequency => "frequency",
            Section::Temperature => "temperature",
            Section::OddEven => "odd-even",
            Section::Sums => "sums",
            Section::HighLow => "high-low",
            Section::Primes => "primes",
            Section::Gaps => "gaps",
            Section::Combinations => "combinations",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumberCount {
    pub number: u8,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyStats {
    pub top: Vec<NumberCount>,
    /// Every drawn number, most frequent first.
    pub all: Vec<NumberCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Temperature {
    pub hot: Vec<u8>,
    pub warm: Vec<u8>,
    pub cold: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SumStats {
    pub min: u32,
    pub max: u32,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapStats {
    /// Neighbour gap -> occurrences.
    pub common_gaps: BTreeMap<u32, u32>,
    /// Numbers whose mean neighbour gap exceeds `gap_threshold`.
    pub wide_gap_numbers: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecurringCombination {
    pub numbers: Vec<u8>,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverdueEntry {
    pub number: u8,
    pub draws_since_last: u32,
    pub average_gap: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub draws_analyzed: usize,
    pub frequency: FrequencyStats,
    pub temperature: Temperature,
    /// Odd members per draw -> draws.
    pub odd_even: BTreeMap<usize, u32>,
    /// `None` over an empty window.
    pub sums: Option<SumStats>,
    /// Members `<= low_number_max` per draw -> draws.
    pub high_low: BTreeMap<usize, u32>,
    /// Prime members per draw -> draws.
    pub primes: BTreeMap<usize, u32>,
    pub gaps: GapStats,
    /// Combination size -> recurring combinations, most frequent first.
    pub combinations: BTreeMap<usize, Vec<RecurringCombination>>,
    /// Overdue numbers over the whole analyzed history.
    pub overdue: Vec<OverdueEntry>,
}

/// Builds the report over the `analysis.test_draws` most recent draws of `history`.
pub fn build_report(history: &[Draw], stats: &StatsTable, config: &Config) -> AnalysisReport {
    let analysis = &config.analysis;
    let pool = config.generation.number_pool;

    let window = match analysis.test_draws {
        Some(n) => &history[..n.min(history.len())],
        None => history,
    };
    let draws: Vec<Vec<u8>> = window.iter().map(|d| normalized(d, pool)).collect();

    let report = AnalysisReport {
        draws_analyzed: draws.len(),
        frequency: frequency_stats(&draws, pool, analysis.top_range),
        temperature: temperature(&draws, pool, analysis.recency_bins),
        odd_even: distribution(&draws, |n| n % 2 == 1),
        sums: sum_stats(&draws),
        high_low: distribution(&draws, |n| n <= config.generation.low_number_max),
        primes: {
            let primes = PrimeTable::new(pool);
            distribution(&draws, |n| primes.is_prime(n))
        },
        gaps: gap_stats(&draws, analysis.gap_threshold),
        combinations: analysis
            .combinations
            .enabled_sizes()
            .into_iter()
            .map(|size| {
                (
                    size,
                    recurring_combinations(&draws, size, analysis.min_combination_count),
                )
            })
            .collect(),
        overdue: stats
            .iter()
            .filter(|s| s.is_overdue)
            .map(|s| OverdueEntry {
                number: s.number,
                draws_since_last: s.last_seen_gap,
                average_gap: s.average_gap,
            })
            .collect(),
    };

    log::info!(
        "Analysis report over {} draws ({} overdue numbers)",
        report.draws_analyzed,
        report.overdue.len()
    );
    report
}

fn normalized(draw: &Draw, pool: u8) -> Vec<u8> {
    let mut numbers: Vec<u8> = draw
        .numbers
        .iter()
        .copied()
        .filter(|n| (1..=pool).contains(n))
        .collect();
    numbers.sort_unstable();
    numbers.dedup();
    numbers
}

fn frequency_stats(draws: &[Vec<u8>], pool: u8, top_range: usize) -> FrequencyStats {
    let mut counts = vec![0u32; pool as usize];
    for draw in draws {
        for &n in draw {
            counts[n as usize - 1] += 1;
        }
    }

    let mut all: Vec<NumberCount> = counts
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c > 0)
        .map(|(i, &count)| NumberCount {
            number: i as u8 + 1,
            count,
        })
        .collect();
    all.sort_by(|a, b| b.count.cmp(&a.count).then(a.number.cmp(&b.number)));

    FrequencyStats {
        top: all.iter().take(top_range).copied().collect(),
        all,
    }
}

/// Recency is the index of the latest draw containing the number; never drawn counts as cold.
/// Numbers with `warm < recency <= cold` land in no bin.
fn temperature(draws: &[Vec<u8>], pool: u8, bins: RecencyBins) -> Temperature {
    let mut temp = Temperature {
        hot: Vec::new(),
        warm: Vec::new(),
        cold: Vec::new(),
    };
    for number in 1..=pool {
        match draws.iter().position(|d| d.binary_search(&number).is_ok()) {
            Some(r) if (r as u32) <= bins.hot => temp.hot.push(number),
            Some(r) if (r as u32) <= bins.warm => temp.warm.push(number),
            Some(r) if (r as u32) <= bins.cold => {}
            _ => temp.cold.push(number),
        }
    }
    temp
}

fn distribution(draws: &[Vec<u8>], pred: impl Fn(u8) -> bool) -> BTreeMap<usize, u32> {
    let mut dist = BTreeMap::new();
    for draw in draws {
        let hits = draw.iter().filter(|&&n| pred(n)).count();
        *dist.entry(hits).or_insert(0) += 1;
    }
    dist
}

fn sum_stats(draws: &[Vec<u8>]) -> Option<SumStats> {
    let sums: Vec<u32> = draws
        .iter()
        .map(|d| d.iter().map(|&n| n as u32).sum())
        .collect();
    let min = *sums.iter().min()?;
    let max = *sums.iter().max()?;
    let mean = sums.iter().map(|&s| s as f64).sum::<f64>() / sums.len() as f64;
    Some(SumStats { min, max, mean })
}

fn gap_stats(draws: &[Vec<u8>], threshold: f64) -> GapStats {
    let mut common_gaps = BTreeMap::new();
    let mut per_number: BTreeMap<u8, (u32, u32)> = BTreeMap::new();

    for draw in draws {
        for pair in draw.windows(2) {
            let gap = (pair[1] - pair[0]) as u32;
            *common_gaps.entry(gap).or_insert(0) += 1;
            let entry = per_number.entry(pair[1]).or_insert((0, 0));
            entry.0 += gap;
            entry.1 += 1;
        }
    }

    let wide_gap_numbers = per_number
        .into_iter()
        .filter(|&(_, (total, n))| total as f64 / n as f64 > threshold)
        .map(|(number, _)| number)
        .collect();

    GapStats {
        common_gaps,
        wide_gap_numbers,
    }
}

fn recurring_combinations(draws: &[Vec<u8>], size: usize, min_count: u32) -> Vec<RecurringCombination> {
    let mut counts: HashMap<Vec<u8>, u32> = HashMap::new();
    let mut current = Vec::with_capacity(size);
    for draw in draws {
        for_each_subset(draw, size, 0, &mut current, &mut |subset: &[u8]| {
            *counts.entry(subset.to_vec()).or_insert(0) += 1;
        });
    }

    let mut recurring: Vec<RecurringCombination> = counts
        .into_iter()
        .filter(|&(_, count)| count >= min_count)
        .map(|(numbers, count)| RecurringCombination { numbers, count })
        .collect();
    recurring.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.numbers.cmp(&b.numbers)));
    recurring
}

fn for_each_subset(
    items: &[u8],
    size: usize,
    start: usize,
    current: &mut Vec<u8>,
    visit: &mut impl FnMut(&[u8]),
) {
    if current.len() == size {
        visit(current);
        return;
    }
    for i in start..items.len() {
        if items.len() - i < size - current.len() {
            break;
        }
        current.push(items[i]);
        for_each_subset(items, size, i + 1, current, visit);
        current.pop();
    }
}
