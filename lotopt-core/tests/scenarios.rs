use lotopt_core::error::{Error, ShapeError};
use lotopt_core::validator::Rule;
use lotopt_core::{analyze, generate, validate, Combination, GenerationConfig, GenerationRequest, Strategy};
use lotopt_db::models::Draw;

fn config() -> GenerationConfig {
    GenerationConfig {
        number_pool: 49,
        numbers_to_draw: 6,
        ..GenerationConfig::default()
    }
}

fn draw(index: u32, numbers: &[u8]) -> Draw {
    Draw::new(index, format!("2024-{:02}-01", index % 12 + 1), numbers.to_vec())
}

/// Newest first; each draw shifts a spread of six numbers, never touching `skip`.
fn rolling_history(len: u32, skip: u8) -> Vec<Draw> {
    (0..len)
        .map(|i| {
            let numbers: Vec<u8> = (0..6u32)
                .map(|k| ((i * 5 + k * 8) % 49) as u8 + 1)
                .map(|n| if n == skip { n % 49 + 1 } else { n })
                .collect();
            draw(i + 1, &numbers)
        })
        .collect()
}

#[test]
fn number_absent_from_thirty_draws_is_overdue() {
    let mut config = config();
    config.rules.overdue.threshold = 25;
    let history = rolling_history(30, 7);
    assert!(history.iter().all(|d| !d.contains(7)));

    let stats = analyze(&history, &config);
    let seven = stats.get(7).unwrap();
    assert_eq!(seven.last_seen_gap, 30);
    assert!(seven.is_overdue);
    assert_eq!(seven.average_gap, None);
}

#[test]
fn number_last_drawn_thirty_draws_ago() {
    let mut config = config();
    config.rules.overdue.threshold = 25;
    let mut history = rolling_history(30, 7);
    history.push(draw(31, &[7, 20, 30, 40, 45, 49]));

    let seven = analyze(&history, &config).get(7).cloned().unwrap();
    assert_eq!(seven.frequency, 1);
    assert_eq!(seven.last_seen_gap, 30);
    assert!(seven.is_overdue);
    assert!(seven.historical_gaps.is_empty());
    assert_eq!(seven.average_gap, None);
}

#[test]
fn low_sum_combination_fails_with_reason() {
    let mut config = config();
    config.rules.sum.min_sum = 100;
    let stats = analyze(&rolling_history(40, 0), &config);
    let combo = Combination::new(vec![6, 5, 4, 3, 2, 1], &config).unwrap();

    let result = validate(&combo, &stats, &config).unwrap();
    assert!(!result.is_valid());
    let sum = result.outcome(Rule::SumBounds).unwrap();
    assert!(!sum.passed);
    assert!(sum.detail.contains("21 < min_sum 100"), "{}", sum.detail);

    // Same inputs, same diagnostics.
    assert_eq!(validate(&combo, &stats, &config).unwrap(), result);
}

#[test]
fn every_rule_reported_without_short_circuit() {
    let config = config();
    let stats = analyze(&rolling_history(40, 0), &config);
    let combo = Combination::new(vec![1, 2, 3, 4, 5, 6], &config).unwrap();
    let result = validate(&combo, &stats, &config).unwrap();
    let rules: Vec<Rule> = result.outcomes.iter().map(|o| o.rule).collect();
    assert_eq!(
        rules,
        vec![
            Rule::SumBounds,
            Rule::OverdueInclusion,
            Rule::NumberGap,
            Rule::PrimeCount,
            Rule::ParityRatio
        ]
    );
}

#[test]
fn wrong_shape_is_a_caller_error() {
    let config = config();
    assert!(matches!(
        Combination::new(vec![1, 2, 3], &config),
        Err(ShapeError::WrongCount { expected: 6, got: 3 })
    ));
    assert!(matches!(
        Combination::new(vec![1, 2, 3, 4, 5, 50], &config),
        Err(ShapeError::OutOfRange { number: 50, .. })
    ));
    assert!(matches!(
        Combination::new(vec![1, 2, 3, 4, 5, 5], &config),
        Err(ShapeError::Duplicate(5))
    ));

    let five = GenerationConfig {
        numbers_to_draw: 5,
        ..config.clone()
    };
    let combo = Combination::new(vec![1, 2, 3, 4, 5], &five).unwrap();
    let stats = analyze(&[], &config);
    assert!(matches!(
        validate(&combo, &stats, &config),
        Err(Error::Shape(_))
    ));
}

#[test]
fn unsatisfiable_thresholds_exhaust_all_requests() {
    let mut config = config();
    // Six numbers from 1..=49 never sum past 279.
    config.rules.sum.min_sum = 300;
    config.rules.sum.max_sum = 400;
    let stats = analyze(&rolling_history(50, 0), &config);

    let request = GenerationRequest {
        strategy: Strategy::Random,
        count: 5,
        retry_budget: 1000,
        seed: Some(7),
    };
    let report = generate(&stats, &config, &request).unwrap();
    assert!(report.accepted().is_empty());
    assert_eq!(report.exhausted().len(), 5);
}

#[test]
fn inconsistent_thresholds_rejected_before_generation() {
    let mut config = config();
    config.rules.sum.min_sum = 200;
    config.rules.sum.max_sum = 100;
    let stats = analyze(&rolling_history(10, 0), &config);
    let result = generate(&stats, &config, &GenerationRequest::default());
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn generation_is_reproducible_with_a_seed() {
    let config = config();
    let stats = analyze(&rolling_history(80, 0), &config);
    let request = GenerationRequest {
        strategy: Strategy::Auto,
        count: 6,
        retry_budget: 500,
        seed: Some(1234),
    };
    let a = generate(&stats, &config, &request).unwrap();
    let b = generate(&stats, &config, &request).unwrap();
    assert_eq!(a.base_seed, 1234);
    assert_eq!(a.outcomes, b.outcomes);

    for combo in a.accepted() {
        assert_eq!(combo.len(), 6);
        assert!(combo.numbers().windows(2).all(|w| w[0] < w[1]));
        assert!(combo.numbers().iter().all(|&n| (1..=49).contains(&n)));
    }
}

#[test]
fn weighted_strategy_favours_overdue_numbers() {
    let mut config = config();
    config.rules.sum.enabled = false;
    config.rules.overdue.enabled = false;
    config.rules.gaps.enabled = false;
    config.rules.primes.enabled = false;
    config.rules.parity.enabled = false;

    // 1..=8 never appear, so they are overdue; the rest are drawn constantly.
    let history: Vec<Draw> = (0..40u32)
        .map(|i| {
            let numbers: Vec<u8> = (0..6u32).map(|k| ((i * 7 + k * 6) % 41) as u8 + 9).collect();
            draw(i + 1, &numbers)
        })
        .collect();
    let stats = analyze(&history, &config);
    assert!((1..=8).all(|n| stats.is_overdue(n)));

    let request = GenerationRequest {
        strategy: Strategy::Weighted,
        count: 400,
        retry_budget: 1,
        seed: Some(99),
    };
    let report = generate(&stats, &config, &request).unwrap();
    assert_eq!(report.accepted().len(), 400);

    let mut counts = [0u32; 50];
    for combo in report.accepted() {
        for &n in combo.numbers() {
            counts[n as usize] += 1;
        }
    }
    let overdue_mean = counts[1..=8].iter().sum::<u32>() as f64 / 8.0;
    let normal: Vec<u32> = (9..=49)
        .filter(|&n| !stats.is_overdue(n as u8))
        .map(|n| counts[n])
        .collect();
    let normal_mean = normal.iter().sum::<u32>() as f64 / normal.len() as f64;
    assert!(
        overdue_mean > normal_mean,
        "overdue {:.1} vs normal {:.1}",
        overdue_mean,
        normal_mean
    );
}
