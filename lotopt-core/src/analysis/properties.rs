use crate::combination::Combination;

pub fn is_prime(n: u8) -> bool {
    if n < 2 {
        return false;
    }
    let n = n as u32;
    (2..).take_while(|d| d * d <= n).all(|d| n % d != 0)
}

/// Sieve over `[0, pool]`, built once per pool size.
#[derive(Debug, Clone)]
pub struct PrimeTable {
    flags: Vec<bool>,
}

impl PrimeTable {
    pub fn new(pool: u8) -> Self {
        let size = pool as usize + 1;
        let mut flags = vec![true; size];
        for f in flags.iter_mut().take(2) {
            *f = false;
        }
        let mut i = 2;
        while i * i < size {
            if flags[i] {
                let mut j = i * i;
                while j < size {
                    flags[j] = false;
                    j += i;
                }
            }
            i += 1;
        }
        Self { flags }
    }

    pub fn is_prime(&self, n: u8) -> bool {
        self.flags.get(n as usize).copied().unwrap_or(false)
    }

    pub fn primes(&self) -> impl Iterator<Item = u8> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p)
            .map(|(n, _)| n as u8)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CombinationProperties {
    pub sum: u32,
    pub even_count: usize,
    pub odd_count: usize,
    pub even_ratio: f64,
    pub prime_count: usize,
    /// Differences between adjacent members, ascending order.
    pub differences: Vec<u32>,
}

impl CombinationProperties {
    pub fn of(combination: &Combination, primes: &PrimeTable) -> Self {
        Self::of_numbers(combination.numbers(), primes)
    }

    /// `numbers` must be sorted ascending.
    pub fn of_numbers(numbers: &[u8], primes: &PrimeTable) -> Self {
        let sum = numbers.iter().map(|&n| n as u32).sum();
        let even_count = numbers.iter().filter(|&&n| n % 2 == 0).count();
        let odd_count = numbers.len() - even_count;
        let even_ratio = if numbers.is_empty() {
            0.0
        } else {
            even_count as f64 / numbers.len() as f64
        };
        let prime_count = numbers.iter().filter(|&&n| primes.is_prime(n)).count();
        let differences = numbers
            .windows(2)
            .map(|w| (w[1] - w[0]) as u32)
            .collect();

        Self {
            sum,
            even_count,
            odd_count,
            even_ratio,
            prime_count,
            differences,
        }
    }

    pub fn average_difference(&self) -> Option<f64> {
        if self.differences.is_empty() {
            return None;
        }
        Some(self.differences.iter().sum::<u32>() as f64 / self.differences.len() as f64)
    }

    pub fn max_difference(&self) -> Option<u32> {
        self.differences.iter().copied().max()
    }

    pub fn difference_variety(&self) -> usize {
        let mut distinct = self.differences.clone();
        distinct.sort_unstable();
        distinct.dedup();
        distinct.len()
    }
}
