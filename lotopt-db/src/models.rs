use anyhow::{bail, Context, Result};

/// One historical draw. `index` is the position in the fetched view
/// (1 = most recent), `date` is ISO `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draw {
    pub index: u32,
    pub date: String,
    pub numbers: Vec<u8>,
}

impl Draw {
    pub fn new(index: u32, date: impl Into<String>, mut numbers: Vec<u8>) -> Self {
        numbers.sort_unstable();
        Self {
            index,
            date: date.into(),
            numbers,
        }
    }

    pub fn contains(&self, number: u8) -> bool {
        self.numbers.contains(&number)
    }
}

pub fn validate_draw(numbers: &[u8], number_pool: u8, numbers_to_draw: usize) -> Result<()> {
    if numbers.len() != numbers_to_draw {
        bail!(
            "Draw has {} numbers, expected {}",
            numbers.len(),
            numbers_to_draw
        );
    }
    for &n in numbers {
        if n < 1 || n > number_pool {
            bail!("Number {} out of range (1-{})", n, number_pool);
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                bail!("Duplicate number: {}", numbers[i]);
            }
        }
    }
    Ok(())
}

/// Parses `"3-14-15-92"` style number lists.
pub fn parse_numbers(raw: &str, separator: char) -> Result<Vec<u8>> {
    raw.split(separator)
        .map(|s| {
            let s = s.trim();
            s.parse::<u8>()
                .with_context(|| format!("Cannot parse number '{}'", s))
        })
        .collect()
}

pub fn join_numbers(numbers: &[u8], separator: char) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(&separator.to_string())
}
