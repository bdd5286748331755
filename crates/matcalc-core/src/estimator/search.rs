use super::*;
use std::cmp::Ordering;

/// Enumerates single-width and two-width roll combinations for `target_width`.
///
/// Exact combinations must cover the target and overshoot it by at most
/// `overage_cap`; loose combinations must not exceed it. `priority_of` gives the
/// catalog preference of a width, lower is better.
pub fn search_width_combinations(
    target_width: u32,
    mode: FitMode,
    widths: &[u32],
    overage_cap: u32,
    priority_of: impl Fn(u32) -> u32,
) -> Vec<WidthCombination> {
    if target_width == 0 {
        return Vec::new();
    }

    let upper = target_width.saturating_add(overage_cap);
    let accepts = |total: u32| match mode {
        FitMode::Exact => total >= target_width && total <= upper,
        FitMode::Loose => total <= target_width,
    };
    let exceeds = |total: u32| match mode {
        FitMode::Exact => total > upper,
        FitMode::Loose => total > target_width,
    };
    let build = |solutions: Vec<WidthCount>, priority: f64| {
        let total_width = solutions
            .iter()
            .fold(0u32, |sum, s| sum.saturating_add(s.width.saturating_mul(s.count)));
        let waste = i64::from(total_width) - i64::from(target_width);
        let waste_percent = match mode {
            FitMode::Exact => waste as f64 / f64::from(total_width) * 100.0,
            FitMode::Loose => waste as f64 / f64::from(target_width) * 100.0,
        };
        WidthCombination {
            mode,
            same_width: solutions.len() == 1,
            roll_count: solutions.iter().map(|s| s.count).sum(),
            solutions,
            total_width,
            waste,
            waste_percent,
            priority,
            preferred: false,
        }
    };

    let widths: Vec<u32> = widths.iter().copied().filter(|w| *w > 0).collect();
    let mut combinations = Vec::new();

    for &width in &widths {
        for count in 1..=MAX_SINGLE_WIDTH_COUNT {
            let total = width.saturating_mul(count);
            if exceeds(total) {
                break;
            }
            if accepts(total) {
                combinations.push(build(
                    vec![WidthCount { width, count }],
                    f64::from(priority_of(width)),
                ));
                // a larger count of the same width only adds overshoot
                if mode == FitMode::Exact {
                    break;
                }
            }
        }
    }

    for (i, &first) in widths.iter().enumerate() {
        for &second in &widths[i + 1..] {
            let priority = (f64::from(priority_of(first)) + f64::from(priority_of(second))) / 2.0;
            for first_count in 1..=MAX_PAIR_WIDTH_COUNT {
                for second_count in 1..=MAX_PAIR_WIDTH_COUNT {
                    let total = first
                        .saturating_mul(first_count)
                        .saturating_add(second.saturating_mul(second_count));
                    if accepts(total) {
                        combinations.push(build(
                            vec![
                                WidthCount {
                                    width: first,
                                    count: first_count,
                                },
                                WidthCount {
                                    width: second,
                                    count: second_count,
                                },
                            ],
                            priority,
                        ));
                    }
                }
            }
        }
    }

    combinations.sort_by(|a, b| {
        a.waste_percent
            .abs()
            .total_cmp(&b.waste_percent.abs())
            .then_with(|| b.same_width.cmp(&a.same_width))
            .then_with(|| a.priority.total_cmp(&b.priority))
            .then_with(|| a.roll_count.cmp(&b.roll_count))
    });

    combinations
}

/// Flags single-width candidates named by the preferred-width rule for `target_width`.
pub(super) fn mark_preferred(
    candidates: &mut [WidthCombination],
    config: &EstimatorConfig,
    target_width: u32,
) {
    let Some(rule) = config.preferred_rule(target_width) else {
        return;
    };

    for candidate in candidates.iter_mut() {
        let [only] = candidate.solutions.as_slice() else {
            continue;
        };
        if rule
            .prefer
            .iter()
            .any(|p| p.width == only.width && p.count == only.count && p.mode == candidate.mode)
        {
            candidate.preferred = true;
        }
    }
}

/// A width combination priced for a concrete roll length and split count
#[derive(Debug, Clone, PartialEq)]
pub struct PricedCombination {
    pub combination: WidthCombination,
    pub price: u64,
    /// Signed difference between the used width and the target
    pub width_diff: i64,
    pub rolls: u32,
}

impl PricedCombination {
    pub fn covers(&self) -> bool {
        self.width_diff >= 0
    }
}

/// Total order used to pick one candidate: covering first, then fewer rolls,
/// less absolute waste, lower price, preferred rule, single width, catalog priority.
pub fn compare_candidates(a: &PricedCombination, b: &PricedCombination) -> Ordering {
    b.covers()
        .cmp(&a.covers())
        .then_with(|| a.rolls.cmp(&b.rolls))
        .then_with(|| a.width_diff.abs().cmp(&b.width_diff.abs()))
        .then_with(|| a.price.cmp(&b.price))
        .then_with(|| b.combination.preferred.cmp(&a.combination.preferred))
        .then_with(|| b.combination.same_width.cmp(&a.combination.same_width))
        .then_with(|| a.combination.priority.total_cmp(&b.combination.priority))
}
