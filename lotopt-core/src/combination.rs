use std::fmt;

use serde::Serialize;

use crate::config::GenerationConfig;
use crate::error::ShapeError;

/// Sorted, duplicate-free set of pool numbers of the configured size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Combination(Vec<u8>);

impl Combination {
    pub fn new(mut numbers: Vec<u8>, config: &GenerationConfig) -> Result<Self, ShapeError> {
        check_shape(&numbers, config.number_pool, config.numbers_to_draw)?;
        numbers.sort_unstable();
        Ok(Self(numbers))
    }

    /// Internal constructor for drafts that are already distinct and in range.
    pub(crate) fn from_distinct(mut numbers: Vec<u8>) -> Self {
        numbers.sort_unstable();
        debug_assert!(numbers.windows(2).all(|w| w[0] < w[1]));
        Self(numbers)
    }

    pub fn numbers(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, number: u8) -> bool {
        self.0.binary_search(&number).is_ok()
    }

    /// Re-checks the shape against a (possibly different) configuration.
    pub fn check(&self, config: &GenerationConfig) -> Result<(), ShapeError> {
        check_shape(&self.0, config.number_pool, config.numbers_to_draw)
    }
}

fn check_shape(numbers: &[u8], pool: u8, expected: usize) -> Result<(), ShapeError> {
    if numbers.len() != expected {
        return Err(ShapeError::WrongCount {
            expected,
            got: numbers.len(),
        });
    }
    let mut seen = vec![false; pool as usize + 1];
    for &n in numbers {
        if n < 1 || n > pool {
            return Err(ShapeError::OutOfRange { number: n, pool });
        }
        if seen[n as usize] {
            return Err(ShapeError::Duplicate(n));
        }
        seen[n as usize] = true;
    }
    Ok(())
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&joined)
    }
}
