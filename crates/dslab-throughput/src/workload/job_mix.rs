//! Declarative job mix.

use serde::{Deserialize, Serialize};

/// One duration of a job mix entry together with its relative weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationVariant {
    pub minutes: u32,
    pub ratio: f64,
}

/// `count` jobs of `nodes` nodes each, split between `durations` proportionally to their ratios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMixEntry {
    pub nodes: u32,
    pub count: u32,
    pub durations: Vec<DurationVariant>,
}

impl JobMixEntry {
    pub fn total_ratio(&self) -> f64 {
        self.durations.iter().map(|d| d.ratio).sum()
    }

    /// Number of jobs generated for each duration variant, in declaration order.
    pub fn variant_counts(&self) -> Vec<u32> {
        let ratios = self.durations.iter().map(|d| d.ratio).collect::<Vec<_>>();
        variant_counts(self.count, &ratios)
    }
}

/// Splits `count` instances between variants proportionally to `ratios`.
///
/// Every share is rounded independently, then the rounding error is fixed by
/// one-unit steps over the variants in round-robin order: increments go only to variants
/// with a positive ratio, decrements only to variants with a positive count.
/// The result always sums to `count` unless no variant has a positive ratio, in which case
/// all counts are zero.
pub fn variant_counts(count: u32, ratios: &[f64]) -> Vec<u32> {
    let total_ratio: f64 = ratios.iter().filter(|r| **r > 0.).sum();
    if ratios.is_empty() || !(total_ratio > 0.) || !total_ratio.is_finite() {
        return vec![0; ratios.len()];
    }

    let mut counts = ratios
        .iter()
        .map(|&ratio| {
            if ratio > 0. {
                (count as f64 * ratio / total_ratio).round() as i64
            } else {
                0
            }
        })
        .collect::<Vec<i64>>();

    let mut diff = count as i64 - counts.iter().sum::<i64>();
    let mut idx = 0;
    while diff != 0 {
        if diff > 0 && ratios[idx] > 0. {
            counts[idx] += 1;
            diff -= 1;
        } else if diff < 0 && counts[idx] > 0 {
            counts[idx] -= 1;
            diff += 1;
        }
        idx = (idx + 1) % counts.len();
    }

    counts.into_iter().map(|c| c as u32).collect()
}
