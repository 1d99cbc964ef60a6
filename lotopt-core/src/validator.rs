use std::fmt;

use serde::Serialize;

use crate::analysis::properties::{CombinationProperties, PrimeTable};
use crate::analysis::StatsTable;
use crate::combination::Combination;
use crate::config::GenerationConfig;
use crate::error::{Error, Result};

const RATIO_EPSILON: f64 = 1e-9;

/// Rules in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    SumBounds,
    OverdueInclusion,
    NumberGap,
    PrimeCount,
    ParityRatio,
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::SumBounds => "sum_bounds",
            Rule::OverdueInclusion => "overdue_inclusion",
            Rule::NumberGap => "number_gap",
            Rule::PrimeCount => "prime_count",
            Rule::ParityRatio => "parity_ratio",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleOutcome {
    pub rule: Rule,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub combination: Combination,
    pub outcomes: Vec<RuleOutcome>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }

    pub fn outcome(&self, rule: Rule) -> Option<&RuleOutcome> {
        self.outcomes.iter().find(|o| o.rule == rule)
    }

    pub fn failure_reasons(&self) -> Vec<String> {
        self.failures()
            .map(|o| format!("{}: {}", o.rule, o.detail))
            .collect()
    }
}

/// The gap variety check only applies when scoring existing combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckContext {
    Analysis,
    Generation,
}

/// Rule evaluation bound to one stats table and one configuration.
pub struct Validator<'a> {
    stats: &'a StatsTable,
    config: &'a GenerationConfig,
    primes: PrimeTable,
}

impl<'a> Validator<'a> {
    pub fn new(stats: &'a StatsTable, config: &'a GenerationConfig) -> Result<Self> {
        config.validate()?;
        if stats.len() != config.number_pool as usize {
            return Err(Error::StatsMismatch {
                expected: config.number_pool as usize,
                got: stats.len(),
            });
        }
        Ok(Self {
            stats,
            config,
            primes: PrimeTable::new(config.number_pool),
        })
    }

    pub fn validate(&self, combination: &Combination) -> Result<ValidationResult> {
        combination.check(self.config)?;
        Ok(self.evaluate(combination, CheckContext::Analysis))
    }

    /// Runs every enabled rule without checking the combination's shape.
    pub fn evaluate(&self, combination: &Combination, context: CheckContext) -> ValidationResult {
        let rules = &self.config.rules;
        let props = CombinationProperties::of(combination, &self.primes);
        let mut outcomes = Vec::with_capacity(5);

        if rules.sum.enabled {
            outcomes.push(self.check_sum(&props));
        }
        if rules.overdue.enabled {
            outcomes.push(self.check_overdue(combination));
        }
        if rules.gaps.enabled {
            outcomes.push(self.check_gaps(&props, context));
        }
        if rules.primes.enabled {
            outcomes.push(self.check_primes(&props));
        }
        if rules.parity.enabled {
            outcomes.push(self.check_parity(&props));
        }

        ValidationResult {
            combination: combination.clone(),
            outcomes,
        }
    }

    fn check_sum(&self, props: &CombinationProperties) -> RuleOutcome {
        let rule = &self.config.rules.sum;
        let (passed, detail) = if props.sum < rule.min_sum {
            (false, format!("sum {} < min_sum {}", props.sum, rule.min_sum))
        } else if props.sum > rule.max_sum {
            (false, format!("sum {} > max_sum {}", props.sum, rule.max_sum))
        } else {
            (
                true,
                format!("sum {} within [{}, {}]", props.sum, rule.min_sum, rule.max_sum),
            )
        };
        RuleOutcome {
            rule: Rule::SumBounds,
            passed,
            detail,
        }
    }

    fn check_overdue(&self, combination: &Combination) -> RuleOutcome {
        let rule = &self.config.rules.overdue;
        let count = combination
            .numbers()
            .iter()
            .filter(|&&n| self.stats.is_overdue(n))
            .count();
        let (passed, detail) = if count < rule.min_include {
            (
                false,
                format!("{} overdue numbers < min_include {}", count, rule.min_include),
            )
        } else if count > rule.max_include {
            (
                false,
                format!("{} overdue numbers > max_include {}", count, rule.max_include),
            )
        } else {
            (
                true,
                format!(
                    "{} overdue numbers within [{}, {}]",
                    count, rule.min_include, rule.max_include
                ),
            )
        };
        RuleOutcome {
            rule: Rule::OverdueInclusion,
            passed,
            detail,
        }
    }

    fn check_gaps(&self, props: &CombinationProperties, context: CheckContext) -> RuleOutcome {
        let rule = &self.config.rules.gaps;
        let mut problems = Vec::new();

        let average = props.average_difference();
        if let Some(avg) = average {
            if avg > rule.max_avg_gap {
                problems.push(format!("average gap {:.2} > max_avg_gap {:.2}", avg, rule.max_avg_gap));
            }
        }
        let largest = props.max_difference();
        if let Some(max) = largest {
            if max > rule.max_single_gap {
                problems.push(format!("largest gap {} > max_single_gap {}", max, rule.max_single_gap));
            }
        }
        let variety = props.difference_variety();
        if context == CheckContext::Analysis && variety < rule.min_variety {
            problems.push(format!("{} distinct gaps < min_variety {}", variety, rule.min_variety));
        }

        let passed = problems.is_empty();
        let detail = if passed {
            format!(
                "average gap {:.2}, largest gap {}, {} distinct gaps",
                average.unwrap_or(0.0),
                largest.unwrap_or(0),
                variety
            )
        } else {
            problems.join("; ")
        };
        RuleOutcome {
            rule: Rule::NumberGap,
            passed,
            detail,
        }
    }

    fn check_primes(&self, props: &CombinationProperties) -> RuleOutcome {
        let rule = &self.config.rules.primes;
        let passed = props.prime_count >= rule.min_primes;
        let detail = if passed {
            format!("{} primes >= min_primes {}", props.prime_count, rule.min_primes)
        } else {
            format!("{} primes < min_primes {}", props.prime_count, rule.min_primes)
        };
        RuleOutcome {
            rule: Rule::PrimeCount,
            passed,
            detail,
        }
    }

    fn check_parity(&self, props: &CombinationProperties) -> RuleOutcome {
        let rule = &self.config.rules.parity;
        let deviation = (props.even_ratio - rule.target_ratio).abs();
        let passed = deviation <= rule.tolerance + RATIO_EPSILON;
        let detail = if passed {
            format!(
                "even ratio {:.2} within {:.2} ± {:.2}",
                props.even_ratio, rule.target_ratio, rule.tolerance
            )
        } else {
            format!(
                "even ratio {:.2} off target {:.2} by {:.2} > tolerance {:.2}",
                props.even_ratio, rule.target_ratio, deviation, rule.tolerance
            )
        };
        RuleOutcome {
            rule: Rule::ParityRatio,
            passed,
            detail,
        }
    }
}

/// Full diagnostics for one combination. Shape violations are errors, rule failures are not.
pub fn validate(
    combination: &Combination,
    stats: &StatsTable,
    config: &GenerationConfig,
) -> Result<ValidationResult> {
    Validator::new(stats, config)?.validate(combination)
}
