use super::search::mark_preferred;
use super::*;
use std::collections::HashSet;
use tracing::{trace, warn};

/// Picks the side the roll width runs along. A side that is already a multiple of
/// the 50cm length step is cut as the length; otherwise the shorter side is the width.
pub fn preferred_roll_axis(width: u32, height: u32) -> Axis {
    let width_on_step = width % ROLL_LENGTH_STEP_CM == 0;
    let height_on_step = height % ROLL_LENGTH_STEP_CM == 0;

    match (width_on_step, height_on_step) {
        (true, false) => Axis::Height,
        (false, true) => Axis::Width,
        _ if width <= height => Axis::Width,
        _ => Axis::Height,
    }
}

/// Rounds a roll length up to the 50cm step, unless rounding down falls short
/// by no more than `relaxation`. Never shorter than one step.
pub fn resolve_length(target_length: u32, relaxation: u32) -> u32 {
    let floor = floor_div(target_length, ROLL_LENGTH_STEP_CM) * ROLL_LENGTH_STEP_CM;
    let shortfall = target_length - floor;

    let length = if floor > 0 && shortfall > 0 && shortfall <= relaxation {
        floor
    } else {
        ceil_div(target_length, ROLL_LENGTH_STEP_CM).saturating_mul(ROLL_LENGTH_STEP_CM)
    };
    length.max(ROLL_LENGTH_STEP_CM)
}

/// Splits a length that exceeds the longest available roll into equal rolls,
/// each rounded up to the 50cm step. Returns `(roll_length, split_count)`.
///
/// The maximum is first floored to the 50cm step, so no roll is ever longer
/// than it. A maximum shorter than one step means no limit.
pub fn split_length(length: u32, max_length: Option<u32>) -> (u32, u32) {
    let max_length = max_length
        .map(|max| floor_div(max, ROLL_LENGTH_STEP_CM) * ROLL_LENGTH_STEP_CM)
        .filter(|max| *max >= ROLL_LENGTH_STEP_CM);

    match max_length {
        Some(max) if length > max => {
            let splits = ceil_div(length, max);
            let roll_length = ceil_div(length, splits.saturating_mul(ROLL_LENGTH_STEP_CM))
                * ROLL_LENGTH_STEP_CM;
            (roll_length, splits)
        }
        _ => (length, 1),
    }
}

/// Candidate pools searched for every roll, as `(bound, overage cap)`:
/// loose, exact and extended exact.
fn candidate_pools(config: &EstimatorConfig) -> [(FitMode, u32); 3] {
    [
        (FitMode::Loose, 0),
        (FitMode::Exact, config.exact_overage_cap_cm),
        (FitMode::Exact, config.extended_overage_cap_cm),
    ]
}

/// Covers a rectangle with roll goods.
///
/// Searches width combinations across the loose, exact and extended pools,
/// prices each against the rounded and split roll length and keeps the best by
/// [`compare_candidates`]. The calc mode does not apply to rolls.
/// `force_axis` overrides which side the roll width runs along.
pub fn cover_roll(
    ctx: &PricingContext<'_>,
    width: u32,
    height: u32,
    pet: bool,
    force_axis: Option<Axis>,
) -> Option<CoverageResult> {
    if width == 0 || height == 0 || !within_dimension_limit(width, height) {
        return None;
    }

    let width_axis = force_axis.unwrap_or_else(|| preferred_roll_axis(width, height));
    let (target_width, target_length) = match width_axis {
        Axis::Width => (width, height),
        Axis::Height => (height, width),
    };

    let widths = ctx.available_widths();
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for (bound, cap) in candidate_pools(ctx.config) {
        for combination in
            search_width_combinations(target_width, bound, &widths, cap, |w| ctx.width_priority(w))
        {
            let mut key: Vec<(u32, u32)> = combination
                .solutions
                .iter()
                .map(|s| (s.width, s.count))
                .collect();
            key.sort_unstable();
            if seen.insert(key) {
                candidates.push(combination);
            }
        }
    }
    trace!(target_width, candidates = candidates.len(), "roll width candidates");
    if candidates.is_empty() {
        return None;
    }
    mark_preferred(&mut candidates, ctx.config, target_width);

    let calculated_length = resolve_length(target_length, ctx.config.length_relaxation_cm);
    let (roll_length, split_count) = split_length(calculated_length, ctx.max_roll_length());
    let units_per_roll = roll_length / ROLL_LENGTH_STEP_CM;

    let best = candidates
        .into_iter()
        .filter_map(|combination| {
            let mut price: u64 = 0;
            for solution in &combination.solutions {
                let Some(unit_price) = ctx.roll_price(solution.width) else {
                    warn!(
                        product = ctx.product,
                        thickness = ctx.thickness,
                        width = solution.width,
                        "no roll price, candidate dropped"
                    );
                    return None;
                };
                let units = units_per_roll * solution.count * split_count;
                price = unit_price
                    .saturating_mul(u64::from(units))
                    .saturating_add(price);
            }
            Some(PricedCombination {
                price,
                width_diff: i64::from(combination.total_width) - i64::from(target_width),
                rolls: combination.roll_count * split_count,
                combination,
            })
        })
        .min_by(compare_candidates)?;

    let used_width = best.combination.total_width;
    let total_length = roll_length * split_count;
    let coverage = match width_axis {
        Axis::Width => Extent {
            width: used_width,
            height: total_length,
        },
        Axis::Height => Extent {
            width: total_length,
            height: used_width,
        },
    };
    let used_area = u64::from(used_width) * u64::from(total_length);
    let actual_area = u64::from(width) * u64::from(height);

    let thickness = ctx.thickness_label();
    let breakdown = best
        .combination
        .solutions
        .iter()
        .map(|s| LineItem::Roll {
            thickness: thickness.clone(),
            width: s.width,
            roll_length,
            count: s.count,
            split_count,
            units: pet.then_some(units_per_roll * s.count * split_count),
        })
        .collect();

    let shipping_memos = if pet {
        vec![ShippingMemo {
            cuts: best
                .combination
                .solutions
                .iter()
                .map(|s| CutRequest {
                    width: s.width,
                    length: roll_length,
                    rolls: s.count * split_count,
                })
                .collect(),
        }]
    } else {
        Vec::new()
    };

    debug!(
        width,
        height,
        ?width_axis,
        used_width,
        roll_length,
        split_count,
        price = best.price,
        "roll covering"
    );

    let plan = RollPlan {
        width_axis,
        target_width,
        target_length,
        calculated_length,
        roll_length,
        split_count,
        used_width,
        combination: best.combination,
    };

    Some(CoverageResult {
        label: format!("{} - {}", ctx.catalog.name, thickness),
        price: best.price,
        breakdown,
        coverage_width: coverage.width,
        coverage_height: coverage.height,
        waste_percent: waste_percent(used_area, actual_area),
        fit_messages: fit_messages(
            width,
            height,
            coverage.width,
            coverage.height,
            FitContext::Roll,
        ),
        counts: UnitCounts::Rolls {
            rolls: best.rolls,
            roll_units: units_per_roll * best.rolls,
        },
        visualization: layout::roll_layout(Extent { width, height }, coverage, &plan),
        roll_plan: Some(plan),
        shipping_memos,
    })
}
