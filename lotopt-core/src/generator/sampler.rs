use rand::distr::weighted::{Error as WeightError, WeightedIndex};
use rand::prelude::Distribution;
use rand::rngs::StdRng;

/// Draws `count` distinct numbers, each pick proportional to its remaining weight.
pub(crate) fn sample_without_replacement(
    weights: &[(u8, f64)],
    count: usize,
    rng: &mut StdRng,
) -> Result<Vec<u8>, WeightError> {
    let mut available: Vec<(u8, f64)> = weights.to_vec();
    let mut selected = Vec::with_capacity(count);

    for _ in 0..count.min(weights.len()) {
        let w: Vec<f64> = available.iter().map(|(_, w)| *w).collect();
        if w.iter().any(|x| !x.is_finite()) {
            return Err(WeightError::InvalidWeight);
        }
        if !w.iter().sum::<f64>().is_finite() {
            return Err(WeightError::Overflow);
        }
        let dist = WeightedIndex::new(&w)?;
        let idx = dist.sample(rng);

        let (number, _) = available.remove(idx);
        selected.push(number);
    }

    Ok(selected)
}

/// Uniform draw of `count` distinct numbers from `[1, pool]`.
pub(crate) fn sample_uniform(pool: u8, count: usize, rng: &mut StdRng) -> Vec<u8> {
    rand::seq::index::sample(rng, pool as usize, count.min(pool as usize))
        .into_iter()
        .map(|i| (i + 1) as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_weighted_sample_is_distinct() {
        let weights: Vec<(u8, f64)> = (1..=49).map(|n| (n, 1.0 + n as f64 * 0.1)).collect();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let mut picked = sample_without_replacement(&weights, 6, &mut rng).unwrap();
            picked.sort_unstable();
            picked.dedup();
            assert_eq!(picked.len(), 6);
        }
    }

    #[test]
    fn test_zero_weight_never_picked() {
        let mut weights: Vec<(u8, f64)> = (1..=10).map(|n| (n, 1.0)).collect();
        weights[0].1 = 0.0;
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let picked = sample_without_replacement(&weights, 5, &mut rng).unwrap();
            assert!(!picked.contains(&1));
        }
    }

    #[test]
    fn test_all_zero_weights_is_an_error() {
        let weights: Vec<(u8, f64)> = (1..=10).map(|n| (n, 0.0)).collect();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(sample_without_replacement(&weights, 3, &mut rng).is_err());
    }

    #[test]
    fn test_non_finite_weights_are_an_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut weights: Vec<(u8, f64)> = (1..=10).map(|n| (n, 1.0)).collect();
        weights[3].1 = f64::INFINITY;
        assert_eq!(
            sample_without_replacement(&weights, 3, &mut rng),
            Err(WeightError::InvalidWeight)
        );

        let huge: Vec<(u8, f64)> = (1..=10).map(|n| (n, f64::MAX)).collect();
        assert_eq!(
            sample_without_replacement(&huge, 3, &mut rng),
            Err(WeightError::Overflow)
        );
    }

    #[test]
    fn test_uniform_sample_in_range() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..100 {
            let mut picked = sample_uniform(49, 6, &mut rng);
            assert_eq!(picked.len(), 6);
            assert!(picked.iter().all(|&n| (1..=49).contains(&n)));
            picked.sort_unstable();
            picked.dedup();
            assert_eq!(picked.len(), 6);
        }
    }

    #[test]
    fn test_seed_determinism() {
        let weights: Vec<(u8, f64)> = (1..=49).map(|n| (n, n as f64)).collect();
        let a = sample_without_replacement(&weights, 6, &mut StdRng::seed_from_u64(123)).unwrap();
        let b = sample_without_replacement(&weights, 6, &mut StdRng::seed_from_u64(123)).unwrap();
        assert_eq!(a, b);
    }
}
